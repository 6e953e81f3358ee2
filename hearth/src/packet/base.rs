use anyhow::{Context as _, anyhow};
use hearth_mailbox::Message;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Protocol payload carried in the data of a [`Message`] with a fixed type tag.
pub trait Packet: Serialize + DeserializeOwned {
    const KIND: &'static str;

    fn to_message(&self) -> Message {
        // Serializing plain structs into a Vec cannot fail.
        let data = bincode::serialize(self).unwrap();
        Message::new(Self::KIND, data)
    }

    fn from_message(message: &Message) -> Result<Self, anyhow::Error> {
        if message.kind() != Self::KIND {
            return Err(anyhow!(
                "Expected '{}' message, got '{}'",
                Self::KIND,
                message.kind()
            ));
        }
        bincode::deserialize(&message.data)
            .with_context(|| format!("Failed to decode '{}' payload", Self::KIND))
    }
}
