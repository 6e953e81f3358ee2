use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use hearth_mailbox::{Mailbox, Outbox};
use tokio::sync::mpsc;

use crate::models::{ContactList, OutputLine};
use crate::packet::SimpleMessage;
use crate::user::UserService;

use super::{
    CallbackSlot, ControlEvent, ControlFactory, ControlKind, Sandbox, ScriptApi, ScriptFault,
    SharedApi, WidgetId, guarded,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Constructed, capabilities not yet registered with the sandbox.
    Unbound,
    /// Sandbox may be invoked, no script loaded.
    Bound,
    /// Script loaded, callbacks may fire.
    Active,
}

/// One hosted app: its capability API, its sandbox and its mailbox.
///
/// All sandbox calls go through [`guarded`], and callbacks only ever start
/// from `&mut self` methods, so no two callbacks of an app overlap. Control
/// events raised while a callback runs are queued and delivered after it
/// returns.
pub struct AppHost {
    id: String,
    name: String,
    code: String,
    api: SharedApi,
    sandbox: Box<dyn Sandbox>,
    state: AppState,
    mailbox: Arc<Mailbox>,
    events_tx: mpsc::UnboundedSender<ControlEvent>,
    events_rx: mpsc::UnboundedReceiver<ControlEvent>,
}

impl AppHost {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        contacts: ContactList,
        user_service: Arc<dyn UserService>,
        outbox: Arc<dyn Outbox>,
        controls: Box<dyn ControlFactory>,
        sandbox: Box<dyn Sandbox>,
    ) -> Result<Self, anyhow::Error> {
        let id = id.into();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let api = ScriptApi::new(
            id.clone(),
            contacts,
            user_service,
            outbox,
            controls,
            events_tx.clone(),
        );
        let mailbox = Mailbox::new(id.clone());
        let mut host = Self {
            id,
            name: name.into(),
            code: String::new(),
            api: Rc::new(RefCell::new(api)),
            sandbox,
            state: AppState::Unbound,
            mailbox,
            events_tx,
            events_rx,
        };
        host.bind()?;
        Ok(host)
    }

    fn bind(&mut self) -> Result<(), anyhow::Error> {
        assert_eq!(self.state, AppState::Unbound, "App is already bound");
        self.sandbox.bind(self.api.clone())?;
        self.state = AppState::Bound;
        tracing::debug!(app_id = %self.id, "App bound");
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source of the last script passed to [`AppHost::run`].
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    pub fn api(&self) -> &SharedApi {
        &self.api
    }

    pub fn output(&self) -> Vec<OutputLine> {
        self.api.borrow().output().to_vec()
    }

    pub fn contacts(&self) -> ContactList {
        self.api.borrow().contacts().clone()
    }

    pub fn set_contacts(&mut self, contacts: ContactList) {
        self.api.borrow_mut().set_contacts(contacts);
    }

    pub fn remove_contact(&mut self, contact_id: &str) -> bool {
        self.api.borrow_mut().remove_contact(contact_id)
    }

    /// Loads and runs `code`. A fault is shown as one `error: ...` output line
    /// attributed to the app and returned.
    pub fn run(&mut self, code: &str) -> Result<(), ScriptFault> {
        assert_ne!(self.state, AppState::Unbound, "App is not bound");
        self.code = code.to_string();
        let result = if code.trim().is_empty() {
            Err(ScriptFault::new("script is empty"))
        } else {
            let name = self.name.clone();
            let sandbox = &mut self.sandbox;
            guarded(|| sandbox.load_and_run(&name, code))
        };
        match &result {
            Ok(()) => {
                self.state = AppState::Active;
                tracing::debug!(app_id = %self.id, "App script loaded");
            }
            Err(fault) => self.report(fault),
        }
        self.pump_events();
        result
    }

    /// Calls the script function `callback` with `args`, reporting any fault.
    pub fn invoke_callback(&mut self, callback: &str, args: &[String]) -> Result<(), ScriptFault> {
        let sandbox = &mut self.sandbox;
        let result = guarded(|| sandbox.invoke(callback, args));
        if let Err(fault) = &result {
            self.report(fault);
        }
        result
    }

    fn report(&mut self, fault: &ScriptFault) {
        tracing::warn!(app_id = %self.id, %fault, "Script fault");
        let line = OutputLine::new(self.name.clone(), format!("error: {fault}"));
        self.api.borrow_mut().push_output(line);
    }

    pub fn button_clicked(&mut self, id: &WidgetId) {
        self.raise(id, ControlKind::Button, CallbackSlot::Clicked);
    }

    pub fn edit_edited(&mut self, id: &WidgetId) {
        self.raise(id, ControlKind::Edit, CallbackSlot::Edited);
    }

    pub fn edit_finished(&mut self, id: &WidgetId) {
        self.raise(id, ControlKind::Edit, CallbackSlot::Finished);
    }

    pub fn text_edit_edited(&mut self, id: &WidgetId) {
        self.raise(id, ControlKind::TextEdit, CallbackSlot::Edited);
    }

    /// Simulates user input into a text control: sets its text, which raises
    /// the control's own change event.
    pub fn type_text(&mut self, id: &WidgetId, text: &str) {
        self.api.borrow_mut().set_text(id, text);
        self.pump_events();
    }

    fn raise(&mut self, id: &WidgetId, kind: ControlKind, slot: CallbackSlot) {
        let live = self.api.borrow().registry().resolve_kind(id, kind).is_some();
        if !live {
            tracing::trace!(app_id = %self.id, %id, "Ignoring event for unknown control");
            return;
        }
        self.queue_event(ControlEvent {
            id: id.clone(),
            slot,
        });
        self.pump_events();
    }

    /// Queues an event as a toolkit would, without delivering it yet.
    pub fn queue_event(&self, event: ControlEvent) {
        if let Err(err) = self.events_tx.send(event) {
            tracing::error!(?err, "Cannot queue control event");
        }
    }

    /// Delivers queued control events in order. Returns how many were taken.
    pub fn pump_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            count += 1;
            self.deliver(event);
        }
        count
    }

    fn deliver(&mut self, event: ControlEvent) {
        if self.state != AppState::Active {
            return;
        }
        // Events for handles cleared by a reset resolve to nothing here.
        let callback = self.api.borrow().callback_for(&event.id, event.slot);
        if let Some(callback) = callback {
            tracing::trace!(app_id = %self.id, id = %event.id, callback, "Control callback");
            _ = self.invoke_callback(&callback, &[]);
        }
    }

    pub fn message_received(&mut self, message: SimpleMessage) {
        if self.state != AppState::Active {
            return;
        }
        let callback = self.api.borrow().message_callback().map(str::to_string);
        if let Some(callback) = callback {
            _ = self.invoke_callback(&callback, &[message.text]);
        }
        self.pump_events();
    }

    /// Drains the app mailbox into the message callback.
    pub fn check_mail(&mut self) -> usize {
        let mut count = 0;
        while let Some(message) = self.mailbox.pop_inbox() {
            count += 1;
            match SimpleMessage::from_message(&message) {
                Ok(message) => self.message_received(message),
                Err(err) => {
                    tracing::warn!(app_id = %self.id, ?err, "Ignoring app message");
                }
            }
        }
        self.pump_events();
        count
    }

    /// Clears every control, the output and the message callback. The
    /// sandbox stays bound; run a script again to reactivate the app.
    pub fn reset_widgets(&mut self) {
        self.api.borrow_mut().reset();
        if self.state == AppState::Active {
            self.state = AppState::Bound;
        }
        tracing::debug!(app_id = %self.id, "App widgets reset");
    }
}
