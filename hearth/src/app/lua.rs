use anyhow::anyhow;
use mlua::{
    ChunkMode, Function, Lua, MetaMethod, Table, UserData, UserDataMethods, UserDataRef, Value,
    Variadic,
};

use super::{CallbackSlot, Sandbox, ScriptFault, SharedApi, WidgetId};

/// Classes registered into every Lua sandbox and the methods each exposes.
pub const CAPABILITIES: &[(&str, &[&str])] = &[
    (
        "Api",
        &[
            "print",
            "button",
            "edit",
            "text_edit",
            "total_contacts",
            "last_contact",
            "contact",
            "when_message_received",
            "send",
            "send_to",
        ],
    ),
    ("contact", &["id", "name", "online"]),
    (
        "button",
        &[
            "id",
            "get_text",
            "set_text",
            "get_callback",
            "when_clicked",
            "enabled",
            "enable",
            "disable",
        ],
    ),
    (
        "edit",
        &[
            "id",
            "get_text",
            "set_text",
            "get_edited_callback",
            "when_edited",
            "get_finished_callback",
            "when_finished",
            "enabled",
            "enable",
            "disable",
        ],
    ),
    (
        "text_edit",
        &[
            "id",
            "get_text",
            "set_text",
            "get_edited_callback",
            "when_edited",
            "enabled",
            "enable",
            "disable",
        ],
    ),
];

// Globals a hosted script must not reach.
const BLOCKED_GLOBALS: &[&str] = &[
    "io", "os", "package", "require", "debug", "dofile", "loadfile", "collectgarbage", "print",
];

// `load` restricted to source text; binary chunks are not verified by Lua.
const TEXT_ONLY_LOAD: &str = r##"
local load = load
return function(chunk, name, _, ...)
    if select("#", ...) > 0 then
        return load(chunk, name, "t", ...)
    end
    return load(chunk, name, "t")
end
"##;

/// Lua 5.4 interpreter exposing the capability API as the global `app`.
pub struct LuaSandbox {
    lua: Lua,
}

impl LuaSandbox {
    pub fn new() -> Self {
        Self { lua: Lua::new() }
    }
}

impl Default for LuaSandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox for LuaSandbox {
    fn bind(&mut self, api: SharedApi) -> Result<(), anyhow::Error> {
        let globals = self.lua.globals();
        for name in BLOCKED_GLOBALS {
            globals
                .set(*name, Value::Nil)
                .map_err(|e| anyhow!("Failed to remove global '{}': {}", name, e))?;
        }
        let load: Function = self
            .lua
            .load(TEXT_ONLY_LOAD)
            .set_name("=load")
            .eval()
            .map_err(|e| anyhow!("Failed to wrap load: {}", e))?;
        globals
            .set("load", load)
            .map_err(|e| anyhow!("Failed to replace load: {}", e))?;
        let string: Table = globals
            .get("string")
            .map_err(|e| anyhow!("Failed to get string library: {}", e))?;
        string
            .set("dump", Value::Nil)
            .map_err(|e| anyhow!("Failed to remove string.dump: {}", e))?;
        globals
            .set("app", ApiRef { api })
            .map_err(|e| anyhow!("Failed to bind app api: {}", e))?;
        Ok(())
    }

    fn load_and_run(&mut self, name: &str, source: &str) -> Result<(), ScriptFault> {
        self.lua
            .load(source)
            .set_name(format!("={name}"))
            .set_mode(ChunkMode::Text)
            .exec()
            .map_err(fault)
    }

    fn invoke(&mut self, callback: &str, args: &[String]) -> Result<(), ScriptFault> {
        let function: Function = self
            .lua
            .globals()
            .get(callback)
            .map_err(|_| ScriptFault::new(format!("callback '{callback}' is not a function")))?;
        let args: Variadic<String> = args.iter().cloned().collect();
        function.call::<()>(args).map_err(fault)
    }
}

fn fault(err: mlua::Error) -> ScriptFault {
    ScriptFault::new(err.to_string())
}

struct ApiRef {
    api: SharedApi,
}

impl UserData for ApiRef {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("print", |_, this, text: String| {
            this.api.borrow_mut().print(&text);
            Ok(())
        });
        methods.add_method("button", |_, this, (text, row, col): (String, i32, i32)| {
            let id = this.api.borrow_mut().place_button(&text, row, col);
            Ok(ButtonRef(ControlRef::new(id, this.api.clone())))
        });
        methods.add_method("edit", |_, this, (text, row, col): (String, i32, i32)| {
            let id = this.api.borrow_mut().place_edit(&text, row, col);
            Ok(EditRef(ControlRef::new(id, this.api.clone())))
        });
        methods.add_method("text_edit", |_, this, (text, row, col): (String, i32, i32)| {
            let id = this.api.borrow_mut().place_text_edit(&text, row, col);
            Ok(TextEditRef(ControlRef::new(id, this.api.clone())))
        });
        methods.add_method("total_contacts", |_, this, ()| {
            Ok(this.api.borrow().total_contacts())
        });
        methods.add_method("last_contact", |_, this, ()| Ok(this.api.borrow().last_contact()));
        methods.add_method("contact", |_, this, index: i64| {
            let id = this.api.borrow().contact(index);
            Ok(ContactRef {
                id,
                api: this.api.clone(),
            })
        });
        methods.add_method("when_message_received", |_, this, name: String| {
            this.api.borrow_mut().set_message_callback(&name);
            Ok(())
        });
        methods.add_method("send", |_, this, text: String| {
            this.api.borrow().send(&text);
            Ok(())
        });
        methods.add_method(
            "send_to",
            |_, this, (contact, text): (UserDataRef<ContactRef>, String)| {
                this.api.borrow().send_to(&contact.id, &text);
                Ok(())
            },
        );
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("Api({})", this.api.borrow().app_id()))
        });
    }
}

struct ContactRef {
    id: String,
    api: SharedApi,
}

impl UserData for ContactRef {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("id", |_, this, ()| Ok(this.id.clone()));
        methods.add_method("name", |_, this, ()| Ok(this.api.borrow().contact_name(&this.id)));
        methods.add_method("online", |_, this, ()| {
            Ok(this.api.borrow().contact_online(&this.id))
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("contact({})", this.id))
        });
    }
}

struct ControlRef {
    id: WidgetId,
    api: SharedApi,
}

impl ControlRef {
    fn new(id: WidgetId, api: SharedApi) -> Self {
        Self { id, api }
    }
}

trait ControlHandle: UserData + 'static {
    const CLASS: &'static str;

    fn control(&self) -> &ControlRef;
}

struct ButtonRef(ControlRef);

struct EditRef(ControlRef);

struct TextEditRef(ControlRef);

impl ControlHandle for ButtonRef {
    const CLASS: &'static str = "button";

    fn control(&self) -> &ControlRef {
        &self.0
    }
}

impl ControlHandle for EditRef {
    const CLASS: &'static str = "edit";

    fn control(&self) -> &ControlRef {
        &self.0
    }
}

impl ControlHandle for TextEditRef {
    const CLASS: &'static str = "text_edit";

    fn control(&self) -> &ControlRef {
        &self.0
    }
}

fn add_control_methods<T, M>(methods: &mut M)
where
    T: ControlHandle,
    M: UserDataMethods<T>,
{
    methods.add_method("id", |_, this, ()| Ok(this.control().id.to_string()));
    methods.add_method("get_text", |_, this, ()| {
        let control = this.control();
        Ok(control.api.borrow().get_text(&control.id))
    });
    methods.add_method("set_text", |_, this, text: String| {
        let control = this.control();
        control.api.borrow_mut().set_text(&control.id, &text);
        Ok(())
    });
    methods.add_method("enabled", |_, this, ()| {
        let control = this.control();
        Ok(control.api.borrow().enabled(&control.id))
    });
    methods.add_method("enable", |_, this, ()| {
        let control = this.control();
        control.api.borrow_mut().enable(&control.id);
        Ok(())
    });
    methods.add_method("disable", |_, this, ()| {
        let control = this.control();
        control.api.borrow_mut().disable(&control.id);
        Ok(())
    });
    methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
        Ok(format!("{}({})", T::CLASS, this.control().id))
    });
}

fn add_callback_methods<T, M>(methods: &mut M, getter: &str, setter: &str, slot: CallbackSlot)
where
    T: ControlHandle,
    M: UserDataMethods<T>,
{
    methods.add_method(getter, move |_, this, ()| {
        let control = this.control();
        Ok(control.api.borrow().get_callback(&control.id, slot))
    });
    methods.add_method(setter, move |_, this, name: String| {
        let control = this.control();
        control.api.borrow_mut().set_callback(&control.id, slot, &name);
        Ok(())
    });
}

impl UserData for ButtonRef {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        add_control_methods(methods);
        add_callback_methods(methods, "get_callback", "when_clicked", CallbackSlot::Clicked);
    }
}

impl UserData for EditRef {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        add_control_methods(methods);
        add_callback_methods(
            methods,
            "get_edited_callback",
            "when_edited",
            CallbackSlot::Edited,
        );
        add_callback_methods(
            methods,
            "get_finished_callback",
            "when_finished",
            CallbackSlot::Finished,
        );
    }
}

impl UserData for TextEditRef {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        add_control_methods(methods);
        add_callback_methods(
            methods,
            "get_edited_callback",
            "when_edited",
            CallbackSlot::Edited,
        );
    }
}
