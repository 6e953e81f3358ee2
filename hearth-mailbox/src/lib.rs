pub mod byteio;

mod mailbox;
mod message;
mod outbox;
mod post_office;

pub use mailbox::*;
pub use message::*;
pub use outbox::*;
pub use post_office::*;
