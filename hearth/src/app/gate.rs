use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Failure raised while running script code, as shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptFault(String);

impl ScriptFault {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            Self("unknown".to_string())
        } else {
            Self(message)
        }
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScriptFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ScriptFault {}

/// Runs one sandbox entry point so that nothing unwinds past it.
pub fn guarded<F>(call: F) -> Result<(), ScriptFault>
where
    F: FnOnce() -> Result<(), ScriptFault>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(ScriptFault::new(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown".to_string()
    }
}
