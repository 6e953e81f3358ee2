use std::collections::HashSet;

use parking_lot::RwLock;

use crate::models::{ContactInfo, ContactList};

use super::UserService;

/// In-memory [`UserService`].
pub struct LocalUserService {
    name: String,
    contacts: RwLock<ContactList>,
    online: RwLock<HashSet<String>>,
}

impl LocalUserService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contacts: RwLock::new(ContactList::new()),
            online: RwLock::new(HashSet::new()),
        }
    }

    pub fn add_contact(&self, contact: ContactInfo) {
        self.contacts.write().add(contact);
    }

    pub fn remove_contact(&self, id: &str) {
        self.contacts.write().remove(id);
        self.online.write().remove(id);
    }

    pub fn set_online(&self, id: &str, online: bool) {
        let mut set = self.online.write();
        if online {
            set.insert(id.to_string());
        } else {
            set.remove(id);
        }
    }
}

impl UserService for LocalUserService {
    fn self_name(&self) -> String {
        self.name.clone()
    }

    fn by_id(&self, id: &str) -> Option<ContactInfo> {
        self.contacts.read().by_id(id).cloned()
    }

    fn contacts(&self) -> Vec<ContactInfo> {
        self.contacts.read().iter().cloned().collect()
    }

    fn contact_available(&self, id: &str) -> bool {
        self.contacts.read().contains(id) && self.online.read().contains(id)
    }
}
