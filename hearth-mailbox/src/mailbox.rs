use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::Message;

/// FIFO queue of inbound messages for one address.
///
/// Producers (transport threads) push, the owning view pops on its own tick.
pub struct Mailbox {
    address: String,
    inbox: Mutex<VecDeque<Message>>,
}

impl Mailbox {
    pub fn new(address: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            address: address.into(),
            inbox: Mutex::new(VecDeque::new()),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn push_inbox(&self, message: Message) {
        self.inbox.lock().push_back(message);
    }

    /// Pops the oldest message without blocking.
    pub fn pop_inbox(&self) -> Option<Message> {
        self.inbox.lock().pop_front()
    }

    pub fn inbox_len(&self) -> usize {
        self.inbox.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inbox.lock().is_empty()
    }
}
