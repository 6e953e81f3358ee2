mod dispatcher;
mod listener;
mod state;

pub use dispatcher::*;
pub use listener::*;
pub use state::*;
