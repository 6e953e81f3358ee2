use crate::{Message, PostOffice};

/// Outbound side of the transport.
///
/// Sending is fire-and-forget: delivery and ordering belong to the transport.
pub trait Outbox: Send + Sync {
    fn send(&self, contact_id: &str, message: Message);
}

/// Outbox whose every contact answers from the local post office.
///
/// Messages go through the wire codec on the way, so what arrives is what a
/// remote peer would have decoded, stamped as sent by the contact.
#[derive(Clone)]
pub struct LoopbackOutbox {
    post_office: PostOffice,
}

impl LoopbackOutbox {
    pub fn new(post_office: PostOffice) -> Self {
        Self { post_office }
    }
}

impl Outbox for LoopbackOutbox {
    fn send(&self, contact_id: &str, message: Message) {
        let bytes = message.serialize();
        let message = match Message::deserialize(&bytes) {
            Ok(message) => message.sent_from(contact_id),
            Err(err) => {
                tracing::warn!(contact_id, %err, "Dropping undecodable message");
                return;
            }
        };
        if !self.post_office.deliver(message) {
            tracing::debug!(contact_id, "Loopback message dropped");
        }
    }
}
