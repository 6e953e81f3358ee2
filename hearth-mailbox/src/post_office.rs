use std::collections::{HashMap, hash_map};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::{Mailbox, Message};

/// Routes inbound messages to mailboxes by their `to` address.
///
/// Only weak references are kept, a mailbox dropped by its owner stops
/// receiving without an explicit unregister.
#[derive(Clone, Default)]
pub struct PostOffice {
    boxes: Arc<RwLock<HashMap<String, Weak<Mailbox>>>>,
}

impl PostOffice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, mailbox: &Arc<Mailbox>) {
        let mut boxes = self.boxes.write();
        match boxes.entry(mailbox.address().to_string()) {
            hash_map::Entry::Occupied(mut entry) => {
                if entry.get().strong_count() > 0 {
                    tracing::warn!(address = mailbox.address(), "Replacing live mailbox");
                }
                entry.insert(Arc::downgrade(mailbox));
            }
            hash_map::Entry::Vacant(entry) => {
                entry.insert(Arc::downgrade(mailbox));
            }
        }
    }

    /// Unregisters `mailbox`. A different mailbox registered later under the
    /// same address stays routed.
    pub fn remove(&self, mailbox: &Arc<Mailbox>) {
        let mut boxes = self.boxes.write();
        if let hash_map::Entry::Occupied(entry) = boxes.entry(mailbox.address().to_string()) {
            if Weak::ptr_eq(entry.get(), &Arc::downgrade(mailbox)) {
                entry.remove();
            } else {
                tracing::debug!(address = mailbox.address(), "Mailbox already replaced");
            }
        }
    }

    pub fn has(&self, address: &str) -> bool {
        self.boxes
            .read()
            .get(address)
            .is_some_and(|mailbox| mailbox.strong_count() > 0)
    }

    /// Delivers a message into the mailbox named by `meta.to`.
    ///
    /// Returns `false` when no live mailbox has that address.
    pub fn deliver(&self, message: Message) -> bool {
        let mailbox = self
            .boxes
            .read()
            .get(&message.meta.to)
            .and_then(Weak::upgrade);
        match mailbox {
            Some(mailbox) => {
                tracing::trace!(address = %message.meta.to, kind = %message.meta.kind, "Delivering message");
                mailbox.push_inbox(message);
                true
            }
            None => {
                tracing::debug!(address = %message.meta.to, "No mailbox for message");
                self.boxes.write().retain(|_, mailbox| mailbox.strong_count() > 0);
                false
            }
        }
    }
}
