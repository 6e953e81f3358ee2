use super::{ControlFactory, HeadlessControls, LuaSandbox, Sandbox};

/// Supplies the per-app collaborators a conversation needs to host apps.
pub trait AppFactory {
    fn create_sandbox(&self) -> Box<dyn Sandbox>;

    fn create_controls(&self) -> Box<dyn ControlFactory>;
}

/// Lua sandboxes with headless controls.
#[derive(Clone, Copy, Debug, Default)]
pub struct LuaAppFactory;

impl AppFactory for LuaAppFactory {
    fn create_sandbox(&self) -> Box<dyn Sandbox> {
        Box::new(LuaSandbox::new())
    }

    fn create_controls(&self) -> Box<dyn ControlFactory> {
        Box::new(HeadlessControls)
    }
}
