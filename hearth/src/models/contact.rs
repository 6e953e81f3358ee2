use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub id: String,
    // Display name obtained from the directory.
    pub name: String,
}

impl ContactInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Ordered set of contacts keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactList {
    contacts: Vec<ContactInfo>,
}

impl ContactList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ContactInfo> {
        self.contacts.get(index)
    }

    pub fn by_id(&self, id: &str) -> Option<&ContactInfo> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id(id).is_some()
    }

    /// Adds the contact, or refreshes its name if the id is already present.
    /// Returns `true` when the contact was not a member before.
    pub fn add(&mut self, contact: ContactInfo) -> bool {
        match self.contacts.iter_mut().find(|c| c.id == contact.id) {
            Some(existing) => {
                existing.name = contact.name;
                false
            }
            None => {
                self.contacts.push(contact);
                true
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<ContactInfo> {
        let index = self.contacts.iter().position(|c| c.id == id)?;
        Some(self.contacts.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContactInfo> {
        self.contacts.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.contacts.iter().map(|c| c.id.clone()).collect()
    }
}

impl FromIterator<ContactInfo> for ContactList {
    fn from_iter<T: IntoIterator<Item = ContactInfo>>(iter: T) -> Self {
        let mut list = Self::new();
        for contact in iter {
            list.add(contact);
        }
        list
    }
}
