use std::sync::Arc;

use hearth_mailbox::Mailbox;
use uuid::Uuid;

use crate::models::{ContactInfo, ContactList};

/// Contact set, hosted app ids and inbound mailbox of one conversation.
///
/// Only the conversation dispatcher mutates it after construction.
pub struct Conversation {
    id: String,
    mailbox: Arc<Mailbox>,
    contacts: ContactList,
    app_ids: Vec<String>,
    synced: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_id(Uuid::now_v7().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self::with_contacts(id, ContactList::new())
    }

    pub fn with_contacts(id: impl Into<String>, contacts: ContactList) -> Self {
        let id = id.into();
        Self {
            mailbox: Mailbox::new(id.clone()),
            id,
            contacts,
            app_ids: Vec::new(),
            synced: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    pub fn contacts(&self) -> &ContactList {
        &self.contacts
    }

    pub fn app_ids(&self) -> &[String] {
        &self.app_ids
    }

    pub fn has_app(&self, app_id: &str) -> bool {
        self.app_ids.iter().any(|id| id == app_id)
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub(crate) fn add_contact(&mut self, contact: ContactInfo) -> bool {
        self.contacts.add(contact)
    }

    pub(crate) fn remove_contact(&mut self, id: &str) -> Option<ContactInfo> {
        self.contacts.remove(id)
    }

    pub(crate) fn set_contacts(&mut self, contacts: ContactList) {
        self.contacts = contacts;
    }

    pub(crate) fn add_app_id(&mut self, app_id: &str) -> bool {
        if self.has_app(app_id) {
            return false;
        }
        self.app_ids.push(app_id.to_string());
        true
    }

    pub(crate) fn set_synced(&mut self, synced: bool) {
        self.synced = synced;
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
