use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use hearth::app::{
    AppHost, AppState, CallbackSlot, ControlEvent, ControlKind, HeadlessControls, LuaSandbox,
    Sandbox, ScriptFault, SharedApi, WidgetId, CAPABILITIES, EMPTY_CONTACT_ID,
};
use hearth::models::{ContactInfo, ContactList};
use hearth::packet::SimpleMessage;
use hearth::user::LocalUserService;
use hearth_mailbox::{Message, Outbox};
use parking_lot::Mutex;

#[derive(Default)]
struct RecordingOutbox {
    sent: Mutex<Vec<(String, Message)>>,
}

impl RecordingOutbox {
    fn sent(&self) -> Vec<(String, Message)> {
        self.sent.lock().clone()
    }
}

impl Outbox for RecordingOutbox {
    fn send(&self, contact_id: &str, message: Message) {
        self.sent.lock().push((contact_id.to_string(), message));
    }
}

/// Sandbox that records which callbacks the host asks for.
struct RecordingSandbox {
    invoked: Rc<RefCell<Vec<(String, Vec<String>)>>>,
}

impl Sandbox for RecordingSandbox {
    fn bind(&mut self, _api: SharedApi) -> Result<(), anyhow::Error> {
        Ok(())
    }

    fn load_and_run(&mut self, _name: &str, _source: &str) -> Result<(), ScriptFault> {
        Ok(())
    }

    fn invoke(&mut self, callback: &str, args: &[String]) -> Result<(), ScriptFault> {
        self.invoked
            .borrow_mut()
            .push((callback.to_string(), args.to_vec()));
        Ok(())
    }
}

struct PanickingSandbox;

impl Sandbox for PanickingSandbox {
    fn bind(&mut self, _api: SharedApi) -> Result<(), anyhow::Error> {
        Ok(())
    }

    fn load_and_run(&mut self, _name: &str, _source: &str) -> Result<(), ScriptFault> {
        panic!("interpreter state corrupted");
    }

    fn invoke(&mut self, _callback: &str, _args: &[String]) -> Result<(), ScriptFault> {
        Ok(())
    }
}

fn users() -> Arc<LocalUserService> {
    let users = Arc::new(LocalUserService::new("Me"));
    users.add_contact(ContactInfo::new("alice", "Alice"));
    users.add_contact(ContactInfo::new("bob", "Bob"));
    users.set_online("alice", true);
    users
}

fn two_contacts() -> ContactList {
    [
        ContactInfo::new("alice", "Alice"),
        ContactInfo::new("bob", "Bob"),
    ]
    .into_iter()
    .collect()
}

fn lua_host(contacts: ContactList) -> (AppHost, Arc<RecordingOutbox>) {
    let outbox = Arc::new(RecordingOutbox::default());
    let host = AppHost::new(
        "app-1",
        "demo",
        contacts,
        users(),
        outbox.clone(),
        Box::new(HeadlessControls),
        Box::new(LuaSandbox::new()),
    )
    .expect("failed to create app host");
    (host, outbox)
}

fn recording_host() -> (AppHost, Rc<RefCell<Vec<(String, Vec<String>)>>>) {
    let invoked = Rc::new(RefCell::new(Vec::new()));
    let host = AppHost::new(
        "app-2",
        "recorder",
        two_contacts(),
        users(),
        Arc::new(RecordingOutbox::default()),
        Box::new(HeadlessControls),
        Box::new(RecordingSandbox {
            invoked: invoked.clone(),
        }),
    )
    .expect("failed to create app host");
    (host, invoked)
}

fn texts(host: &AppHost) -> Vec<String> {
    host.output().into_iter().map(|line| line.text).collect()
}

fn only_control(host: &AppHost, kind: ControlKind) -> WidgetId {
    let layout = host.api().borrow().registry().layout();
    let mut ids = layout
        .into_iter()
        .filter(|(_, k, _)| *k == kind)
        .map(|(id, _, _)| id);
    let id = ids.next().expect("no control of that kind");
    assert!(ids.next().is_none(), "more than one control of that kind");
    id
}

#[test]
fn test_host_is_bound_after_construction() {
    let (host, _) = lua_host(two_contacts());
    assert_eq!(host.state(), AppState::Bound);
}

#[test]
fn test_placed_handles_are_unique_and_non_empty() {
    let (mut host, _) = lua_host(two_contacts());
    host.run(
        r#"
        for i = 0, 19 do
            app:button("b" .. i, i, 0)
            app:edit("e" .. i, i, 1)
            app:text_edit("t" .. i, i, 2)
        end
        "#,
    )
    .unwrap();

    let layout = host.api().borrow().registry().layout();
    assert_eq!(layout.len(), 60);
    let ids: HashSet<_> = layout.iter().map(|(id, _, _)| id.clone()).collect();
    assert_eq!(ids.len(), 60);
    assert!(ids.iter().all(|id| !id.as_str().is_empty()));
}

#[test]
fn test_reset_drops_queued_events_for_cleared_handles() {
    let (mut host, _) = lua_host(two_contacts());
    host.run(
        r#"
        b = app:button("go", 0, 0)
        b:when_clicked("clicked")
        function clicked() app:print("clicked") end
        "#,
    )
    .unwrap();
    let old = only_control(&host, ControlKind::Button);

    // The toolkit already queued a click when the app is reset.
    host.queue_event(ControlEvent {
        id: old.clone(),
        slot: CallbackSlot::Clicked,
    });
    host.reset_widgets();
    assert_eq!(host.state(), AppState::Bound);
    assert!(host.api().borrow().registry().resolve(&old).is_none());

    host.run("app:button('again', 0, 0)").unwrap();
    host.button_clicked(&old);
    host.pump_events();

    assert_eq!(host.state(), AppState::Active);
    assert!(!texts(&host).contains(&"clicked".to_string()));
}

#[test]
fn test_stale_lua_handles_are_inert() {
    let (mut host, _) = lua_host(two_contacts());
    host.run(
        r#"
        e = app:edit("before", 0, 0)
        function poke()
            e:set_text("after")
            e:disable()
            app:print("[" .. e:get_text() .. "]")
            app:print(tostring(e:enabled()))
        end
        "#,
    )
    .unwrap();
    host.reset_widgets();

    host.invoke_callback("poke", &[]).unwrap();

    assert_eq!(texts(&host), vec!["[]".to_string(), "false".to_string()]);
}

#[test]
fn test_send_to_unissued_contact_is_dropped() {
    let (mut host, outbox) = lua_host(two_contacts());
    host.run(
        r#"
        local nobody = app:contact(99)
        app:print(nobody:id())
        app:send_to(nobody, "hello")
        "#,
    )
    .unwrap();
    host.api().borrow().send_to("mallory", "hello");

    assert_eq!(texts(&host), vec![EMPTY_CONTACT_ID.to_string()]);
    assert!(outbox.sent().is_empty());
}

#[test]
fn test_send_to_known_contact() {
    let (mut host, outbox) = lua_host(two_contacts());
    host.run(r#"app:send_to(app:contact(app:last_contact()), "hi bob")"#)
        .unwrap();

    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "bob");
    assert_eq!(sent[0].1.meta.to, "app-1");
    assert_eq!(
        SimpleMessage::from_message(&sent[0].1).unwrap().text,
        "hi bob"
    );
}

#[test]
fn test_send_broadcasts_to_every_contact() {
    let (mut host, outbox) = lua_host(two_contacts());
    host.run(r#"app:send("ping")"#).unwrap();

    let recipients: Vec<_> = outbox.sent().into_iter().map(|(to, _)| to).collect();
    assert_eq!(recipients, vec!["alice".to_string(), "bob".to_string()]);
}

#[test]
fn test_contact_counts() {
    let script = r#"
        app:print(tostring(app:total_contacts()))
        app:print(tostring(app:last_contact()))
    "#;

    let (mut host, _) = lua_host(two_contacts());
    host.run(script).unwrap();
    assert_eq!(texts(&host), vec!["2".to_string(), "1".to_string()]);

    let (mut empty, _) = lua_host(ContactList::new());
    empty.run(script).unwrap();
    assert_eq!(texts(&empty), vec!["0".to_string(), "-1".to_string()]);
}

#[test]
fn test_contact_reference_looks_up_at_call_time() {
    let (mut host, _) = lua_host(two_contacts());
    host.run(
        r#"
        alice = app:contact(0)
        function show()
            app:print(alice:name() .. ":" .. tostring(alice:online()))
        end
        show()
        "#,
    )
    .unwrap();
    host.remove_contact("alice");
    host.invoke_callback("show", &[]).unwrap();

    assert_eq!(
        texts(&host),
        vec!["Alice:true".to_string(), ":false".to_string()]
    );
}

#[test]
fn test_print_is_attributed_to_local_user() {
    let (mut host, _) = lua_host(two_contacts());
    host.run(r#"app:print("hello")"#).unwrap();
    let output = host.output();
    assert_eq!(output.len(), 1);
    assert_eq!(output[0].author, "Me");
    assert!(!output[0].is_error());
}

#[test]
fn test_runtime_error_is_reported_once() {
    let (mut host, _) = lua_host(two_contacts());
    let fault = host.run("error()").unwrap_err();

    assert!(!fault.message().is_empty());
    let output = host.output();
    assert_eq!(output.len(), 1);
    assert!(output[0].is_error());
    assert_eq!(output[0].author, "demo");
    assert_eq!(host.state(), AppState::Bound);
}

#[test]
fn test_syntax_error_is_reported_and_host_survives() {
    let (mut host, _) = lua_host(two_contacts());
    let fault = host.run("this is not lua").unwrap_err();
    assert!(!fault.message().is_empty());
    assert_eq!(host.output().len(), 1);

    host.run(r#"app:print("still alive")"#).unwrap();
    assert_eq!(texts(&host)[1], "still alive");
    assert_eq!(host.state(), AppState::Active);
}

#[test]
fn test_empty_script_is_a_fault() {
    let (mut host, _) = lua_host(two_contacts());
    assert!(host.run("   ").is_err());
    assert!(host.output()[0].is_error());
}

#[test]
fn test_blocked_globals_are_unavailable() {
    let (mut host, _) = lua_host(two_contacts());
    assert!(host.run("os.exit(1)").is_err());
    assert!(host.run("io.write('x')").is_err());
    assert!(host.run("require('socket')").is_err());
    assert!(host.run("print('to stdout')").is_err());
    assert_eq!(host.output().len(), 4);
}

#[test]
fn test_script_cannot_load_bytecode() {
    let (mut host, _) = lua_host(two_contacts());
    host.run(
        r#"
        assert(string.dump == nil, "string.dump is reachable")
        assert(not pcall(function()
            return load(string.dump(function() return 42 end), "x", "b")
        end))
        local f, err = load("\27Lua\84\0", "x", "b")
        assert(f == nil, "binary chunk loaded")
        app:print(err)
        local g = load("return 7", "seven", "bt")
        app:print(tostring(g()))
        local env = { value = 9 }
        local h = load("return value", "env", "t", env)
        app:print(tostring(h()))
        "#,
    )
    .unwrap();

    let output = texts(&host);
    assert_eq!(output.len(), 3);
    assert!(output[0].contains("binary chunk"), "{}", output[0]);
    assert_eq!(output[1], "7");
    assert_eq!(output[2], "9");
}

#[test]
fn test_run_rejects_binary_source() {
    let (mut host, _) = lua_host(two_contacts());
    let fault = host.run("\u{1b}Lua\u{54}\0garbage").unwrap_err();
    assert!(fault.message().contains("binary chunk"), "{}", fault);
    assert_eq!(host.state(), AppState::Bound);
    assert_eq!(host.output().len(), 1);
}

#[test]
fn test_panicking_sandbox_is_contained() {
    let mut host = AppHost::new(
        "app-3",
        "broken",
        two_contacts(),
        users(),
        Arc::new(RecordingOutbox::default()),
        Box::new(HeadlessControls),
        Box::new(PanickingSandbox),
    )
    .unwrap();

    let fault = host.run("anything").unwrap_err();
    assert_eq!(fault.message(), "interpreter state corrupted");
    assert_eq!(
        host.output()[0].text,
        "error: interpreter state corrupted".to_string()
    );
}

#[test]
fn test_missing_callback_function_is_a_fault() {
    let (mut host, _) = lua_host(two_contacts());
    host.run(
        r#"
        b = app:button("go", 0, 0)
        b:when_clicked("not_defined")
        "#,
    )
    .unwrap();
    let id = only_control(&host, ControlKind::Button);
    host.button_clicked(&id);

    let output = texts(&host);
    assert_eq!(output.len(), 1);
    assert!(output[0].contains("not_defined"), "got {:?}", output);
}

#[test]
fn test_ui_event_invokes_latest_callback_only() {
    let (mut host, invoked) = recording_host();
    host.run("loaded").unwrap();
    let id = host.api().borrow_mut().place_button("go", 0, 0);
    host.api()
        .borrow_mut()
        .set_callback(&id, CallbackSlot::Clicked, "first");
    host.api()
        .borrow_mut()
        .set_callback(&id, CallbackSlot::Clicked, "second");

    host.button_clicked(&id);

    assert_eq!(*invoked.borrow(), vec![("second".to_string(), vec![])]);
}

#[test]
fn test_events_are_routed_by_slot() {
    let (mut host, invoked) = recording_host();
    host.run("loaded").unwrap();
    let edit = host.api().borrow_mut().place_edit("", 0, 0);
    {
        let mut api = host.api().borrow_mut();
        api.set_callback(&edit, CallbackSlot::Edited, "on_edit");
        api.set_callback(&edit, CallbackSlot::Finished, "on_done");
        // Buttons only click: this registration is ignored.
        api.set_callback(&edit, CallbackSlot::Clicked, "on_click");
    }

    host.button_clicked(&edit);
    host.edit_finished(&edit);
    host.type_text(&edit, "abc");
    host.text_edit_edited(&edit);

    let names: Vec<_> = invoked.borrow().iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(names, vec!["on_done".to_string(), "on_edit".to_string()]);
}

#[test]
fn test_events_before_script_load_are_ignored() {
    let (mut host, invoked) = recording_host();
    let id = host.api().borrow_mut().place_button("go", 0, 0);
    host.api()
        .borrow_mut()
        .set_callback(&id, CallbackSlot::Clicked, "early");
    host.button_clicked(&id);
    assert!(invoked.borrow().is_empty());
}

#[test]
fn test_button_click_updates_edit_and_chains_edit_callback() {
    let (mut host, _) = lua_host(two_contacts());
    host.run(
        r#"
        count = 0
        b = app:button("+1", 0, 0)
        e = app:edit("0", 0, 1)
        b:when_clicked("increment")
        e:when_edited("edited")
        function increment()
            count = count + 1
            e:set_text(tostring(count))
            app:print("clicked " .. count)
        end
        function edited()
            app:print("edit now " .. e:get_text())
        end
        "#,
    )
    .unwrap();
    let button = only_control(&host, ControlKind::Button);

    host.button_clicked(&button);
    host.button_clicked(&button);

    // The edit callback runs after the click callback returned.
    assert_eq!(
        texts(&host),
        vec![
            "clicked 1".to_string(),
            "edit now 1".to_string(),
            "clicked 2".to_string(),
            "edit now 2".to_string(),
        ]
    );
}

#[test]
fn test_callbacks_are_readable_from_script() {
    let (mut host, _) = lua_host(two_contacts());
    host.run(
        r#"
        local t = app:text_edit("", 0, 0)
        t:when_edited("changed")
        app:print(t:get_edited_callback())
        local e = app:edit("", 1, 0)
        e:when_finished("done")
        app:print(e:get_finished_callback())
        app:print("[" .. e:get_edited_callback() .. "]")
        "#,
    )
    .unwrap();
    assert_eq!(
        texts(&host),
        vec!["changed".to_string(), "done".to_string(), "[]".to_string()]
    );
}

#[test]
fn test_message_callback_receives_app_messages() {
    let (mut host, _) = lua_host(two_contacts());
    host.run(
        r#"
        app:when_message_received("got")
        function got(text) app:print("got " .. text) end
        "#,
    )
    .unwrap();
    host.mailbox()
        .push_inbox(Message::from(SimpleMessage::new("one")).sent_from("alice"));
    host.mailbox().push_inbox(Message::new("weird", vec![1]));
    host.mailbox()
        .push_inbox(Message::from(SimpleMessage::new("two")).sent_from("bob"));

    assert_eq!(host.check_mail(), 3);
    assert_eq!(
        texts(&host),
        vec!["got one".to_string(), "got two".to_string()]
    );
}

#[test]
fn test_message_callback_overwrites_and_reset_clears() {
    let (mut host, invoked) = recording_host();
    host.run("loaded").unwrap();
    host.api().borrow_mut().set_message_callback("a");
    host.api().borrow_mut().set_message_callback("b");
    host.message_received(SimpleMessage::new("x"));
    assert_eq!(
        *invoked.borrow(),
        vec![("b".to_string(), vec!["x".to_string()])]
    );

    host.reset_widgets();
    host.run("loaded").unwrap();
    host.message_received(SimpleMessage::new("y"));
    assert_eq!(invoked.borrow().len(), 1);
}

#[test]
fn test_every_capability_is_registered() {
    let (mut host, _) = lua_host(two_contacts());
    let mut script = String::from(
        r#"
        local objects = {
            Api = app,
            contact = app:contact(0),
            button = app:button("", 0, 0),
            edit = app:edit("", 0, 1),
            text_edit = app:text_edit("", 0, 2),
        }
        "#,
    );
    for (class, methods) in CAPABILITIES {
        for method in *methods {
            script.push_str(&format!(
                "assert(type(objects[\"{class}\"].{method}) == \"function\", \"{class}.{method}\")\n"
            ));
        }
    }
    host.run(&script).unwrap();
    assert!(host.output().is_empty());
}
