mod app;
mod base;
mod conversation;

pub use app::*;
pub use base::*;
pub use conversation::*;
