use crate::models::{ContactInfo, ContactList};

/// Notifications raised by a conversation dispatcher towards the application
/// chrome (tab highlighting, contact selector).
pub trait ConversationListener: Send + Sync {
    fn on_alert(&self, conversation_id: &str);

    /// `candidates` are directory contacts not yet in the conversation.
    fn on_contacts_updated(
        &self,
        conversation_id: &str,
        contacts: &ContactList,
        candidates: Vec<ContactInfo>,
    );
}

pub(super) struct StubListener;

impl ConversationListener for StubListener {
    fn on_alert(&self, conversation_id: &str) {
        _ = conversation_id;
    }

    fn on_contacts_updated(
        &self,
        conversation_id: &str,
        contacts: &ContactList,
        candidates: Vec<ContactInfo>,
    ) {
        _ = conversation_id;
        _ = contacts;
        _ = candidates;
    }
}
