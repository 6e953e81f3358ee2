use crate::models::ContactInfo;

/// Directory of the local user and their known contacts.
///
/// Implemented by the contact-list persistence layer; the conversation core
/// only reads from it.
pub trait UserService: Send + Sync {
    fn self_name(&self) -> String;

    fn by_id(&self, id: &str) -> Option<ContactInfo>;

    fn contacts(&self) -> Vec<ContactInfo>;

    fn contact_available(&self, id: &str) -> bool;
}
