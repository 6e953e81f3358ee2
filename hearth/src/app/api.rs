use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use hearth_mailbox::{Message, Outbox};
use tokio::sync::mpsc;

use crate::models::{ContactList, OutputLine};
use crate::packet::SimpleMessage;
use crate::user::UserService;

use super::{
    CallbackSlot, ControlEvent, ControlFactory, ControlKind, HandleRegistry, Placement, WidgetId,
};

/// Id of the contact reference handed out for an out-of-range index.
pub const EMPTY_CONTACT_ID: &str = "0";

/// Capability API instance shared between a host and its sandbox bindings.
pub type SharedApi = Rc<RefCell<ScriptApi>>;

/// Everything a hosted script is allowed to do.
///
/// Controls are only reachable through [`WidgetId`] handles; operations on a
/// stale handle or an unknown contact are silent no-ops.
pub struct ScriptApi {
    app_id: String,
    contacts: ContactList,
    user_service: Arc<dyn UserService>,
    outbox: Arc<dyn Outbox>,
    registry: HandleRegistry,
    output: Vec<OutputLine>,
    message_callback: Option<String>,
}

impl ScriptApi {
    pub fn new(
        app_id: impl Into<String>,
        contacts: ContactList,
        user_service: Arc<dyn UserService>,
        outbox: Arc<dyn Outbox>,
        controls: Box<dyn ControlFactory>,
        events_tx: mpsc::UnboundedSender<ControlEvent>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            contacts,
            user_service,
            outbox,
            registry: HandleRegistry::new(controls, events_tx),
            output: Vec::new(),
            message_callback: None,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    pub fn output(&self) -> &[OutputLine] {
        &self.output
    }

    pub fn contacts(&self) -> &ContactList {
        &self.contacts
    }

    pub fn set_contacts(&mut self, contacts: ContactList) {
        self.contacts = contacts;
    }

    pub fn remove_contact(&mut self, id: &str) -> bool {
        self.contacts.remove(id).is_some()
    }

    pub fn push_output(&mut self, line: OutputLine) {
        self.output.push(line);
    }

    pub fn print(&mut self, text: &str) {
        let author = self.user_service.self_name();
        self.output.push(OutputLine::new(author, text));
    }

    pub fn place_button(&mut self, label: &str, row: i32, col: i32) -> WidgetId {
        self.registry
            .create(ControlKind::Button, label, Placement { row, col })
    }

    pub fn place_edit(&mut self, text: &str, row: i32, col: i32) -> WidgetId {
        self.registry
            .create(ControlKind::Edit, text, Placement { row, col })
    }

    pub fn place_text_edit(&mut self, text: &str, row: i32, col: i32) -> WidgetId {
        self.registry
            .create(ControlKind::TextEdit, text, Placement { row, col })
    }

    pub fn get_text(&self, id: &WidgetId) -> String {
        self.registry
            .resolve(id)
            .map(|record| record.control().text())
            .unwrap_or_default()
    }

    pub fn set_text(&mut self, id: &WidgetId, text: &str) {
        if let Some(record) = self.registry.resolve_mut(id) {
            record.control_mut().set_text(text);
        }
    }

    pub fn enabled(&self, id: &WidgetId) -> bool {
        self.registry
            .resolve(id)
            .is_some_and(|record| record.control().is_enabled())
    }

    pub fn enable(&mut self, id: &WidgetId) {
        self.set_enabled(id, true);
    }

    pub fn disable(&mut self, id: &WidgetId) {
        self.set_enabled(id, false);
    }

    fn set_enabled(&mut self, id: &WidgetId, enabled: bool) {
        if let Some(record) = self.registry.resolve_mut(id) {
            record.control_mut().set_enabled(enabled);
        }
    }

    pub fn set_callback(&mut self, id: &WidgetId, slot: CallbackSlot, name: &str) {
        if let Some(record) = self.registry.resolve_mut(id) {
            record.set_callback(slot, name);
        }
    }

    pub fn get_callback(&self, id: &WidgetId, slot: CallbackSlot) -> String {
        self.registry
            .resolve(id)
            .map(|record| record.callback(slot).to_string())
            .unwrap_or_default()
    }

    pub fn total_contacts(&self) -> usize {
        self.contacts.len()
    }

    pub fn last_contact(&self) -> i64 {
        self.contacts.len() as i64 - 1
    }

    /// Id of the contact at `index`, or [`EMPTY_CONTACT_ID`] when out of range.
    pub fn contact(&self, index: i64) -> String {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.contacts.get(index))
            .map(|contact| contact.id.clone())
            .unwrap_or_else(|| EMPTY_CONTACT_ID.to_string())
    }

    pub fn contact_name(&self, id: &str) -> String {
        self.contacts
            .by_id(id)
            .map(|contact| contact.name.clone())
            .unwrap_or_default()
    }

    pub fn contact_online(&self, id: &str) -> bool {
        self.contacts.contains(id) && self.user_service.contact_available(id)
    }

    /// Sends `text` to every contact of the app.
    pub fn send(&self, text: &str) {
        for contact in self.contacts.iter() {
            self.outbox.send(&contact.id, self.app_message(text));
        }
    }

    pub fn send_to(&self, contact_id: &str, text: &str) {
        if !self.contacts.contains(contact_id) {
            tracing::debug!(app_id = %self.app_id, contact_id, "Dropping message to unknown contact");
            return;
        }
        self.outbox.send(contact_id, self.app_message(text));
    }

    pub fn set_message_callback(&mut self, name: &str) {
        self.message_callback = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
    }

    pub fn message_callback(&self) -> Option<&str> {
        self.message_callback.as_deref()
    }

    /// Name of the script function bound to `slot` of a live control.
    pub fn callback_for(&self, id: &WidgetId, slot: CallbackSlot) -> Option<String> {
        let record = self.registry.resolve(id)?;
        let name = record.callback(slot);
        (!name.is_empty()).then(|| name.to_string())
    }

    /// Drops every control, the output and the message callback.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.output.clear();
        self.message_callback = None;
    }

    fn app_message(&self, text: &str) -> Message {
        Message::from(SimpleMessage::new(text)).addressed_to(self.app_id.clone())
    }
}
