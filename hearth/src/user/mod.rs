mod local;
mod service;

pub use local::*;
pub use service::*;
