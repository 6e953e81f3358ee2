use super::{ScriptFault, SharedApi};

/// Script interpreter hosting one app.
///
/// `bind` registers the capability classes and exposes `api` to scripts; it
/// is called exactly once, before any other method.
pub trait Sandbox {
    fn bind(&mut self, api: SharedApi) -> Result<(), anyhow::Error>;

    fn load_and_run(&mut self, name: &str, source: &str) -> Result<(), ScriptFault>;

    fn invoke(&mut self, callback: &str, args: &[String]) -> Result<(), ScriptFault>;
}
