use anyhow::anyhow;
use hearth_mailbox::Message;
use serde::{Deserialize, Serialize};

use super::Packet;

/// Text exchanged between instances of the same app on different peers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleMessage {
    pub text: String,
}

impl SimpleMessage {
    pub const KIND: &'static str = "simple_msg";

    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_message(message: &Message) -> Result<Self, anyhow::Error> {
        if message.kind() != Self::KIND {
            return Err(anyhow!("Expected simple message, got '{}'", message.kind()));
        }
        let text = String::from_utf8(message.data.clone())
            .map_err(|_| anyhow!("Simple message is not valid UTF-8"))?;
        Ok(Self { text })
    }
}

impl From<SimpleMessage> for Message {
    fn from(value: SimpleMessage) -> Self {
        Message::new(SimpleMessage::KIND, value.text.into_bytes())
    }
}

/// Announces an app placed into a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppPacket {
    pub conversation_id: String,
    pub app_id: String,
    pub name: String,
    pub code: String,
}

impl Packet for NewAppPacket {
    const KIND: &'static str = "new_app";
}
