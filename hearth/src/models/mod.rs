mod contact;
mod item;
mod types;

pub use contact::*;
pub use item::*;
pub use types::*;
