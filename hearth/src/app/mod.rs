mod api;
mod control;
mod factory;
mod gate;
mod host;
mod lua;
mod registry;
mod sandbox;

pub use api::*;
pub use control::*;
pub use factory::*;
pub use gate::*;
pub use host::*;
pub use lua::*;
pub use registry::*;
pub use sandbox::*;
