use tokio::sync::mpsc;

use super::WidgetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Button,
    // Single-line text field.
    Edit,
    // Multi-line text field.
    TextEdit,
}

impl ControlKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Edit => "edit",
            Self::TextEdit => "text_edit",
        }
    }

    /// Whether a control of this kind ever raises events for `slot`.
    pub fn accepts(&self, slot: CallbackSlot) -> bool {
        matches!(
            (self, slot),
            (Self::Button, CallbackSlot::Clicked)
                | (Self::Edit, CallbackSlot::Edited)
                | (Self::Edit, CallbackSlot::Finished)
                | (Self::TextEdit, CallbackSlot::Edited)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackSlot {
    Clicked,
    Edited,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlEvent {
    pub id: WidgetId,
    pub slot: CallbackSlot,
}

/// Sink a UI control raises its activation/change signals into.
#[derive(Clone)]
pub struct ControlEvents {
    id: WidgetId,
    tx: mpsc::UnboundedSender<ControlEvent>,
}

impl ControlEvents {
    pub fn new(id: WidgetId, tx: mpsc::UnboundedSender<ControlEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> &WidgetId {
        &self.id
    }

    pub fn emit(&self, slot: CallbackSlot) {
        let event = ControlEvent {
            id: self.id.clone(),
            slot,
        };
        if let Err(err) = self.tx.send(event) {
            tracing::debug!(?err, "Control event receiver is gone");
        }
    }
}

/// Live UI control owned by a handle registry.
pub trait Control {
    fn text(&self) -> String;

    fn set_text(&mut self, text: &str);

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);
}

pub trait ControlFactory {
    fn construct(&self, kind: ControlKind, text: &str, events: ControlEvents) -> Box<dyn Control>;
}

/// Controls without a toolkit behind them.
///
/// Text fields raise `Edited` whenever their text actually changes, including
/// programmatic changes, the same way toolkit text-changed signals behave.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadlessControls;

impl ControlFactory for HeadlessControls {
    fn construct(&self, kind: ControlKind, text: &str, events: ControlEvents) -> Box<dyn Control> {
        Box::new(HeadlessControl {
            kind,
            text: text.to_string(),
            enabled: true,
            events,
        })
    }
}

struct HeadlessControl {
    kind: ControlKind,
    text: String,
    enabled: bool,
    events: ControlEvents,
}

impl Control for HeadlessControl {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        if self.text == text {
            return;
        }
        self.text = text.to_string();
        if self.kind != ControlKind::Button {
            self.events.emit(CallbackSlot::Edited);
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_edit_emits_on_change_only() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = WidgetId::generate();
        let mut edit =
            HeadlessControls.construct(ControlKind::Edit, "a", ControlEvents::new(id.clone(), tx));
        edit.set_text("a");
        assert!(rx.try_recv().is_err());
        edit.set_text("b");
        assert_eq!(
            rx.try_recv().unwrap(),
            ControlEvent {
                id,
                slot: CallbackSlot::Edited
            }
        );
    }

    #[test]
    fn test_headless_button_is_silent_on_relabel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut button = HeadlessControls.construct(
            ControlKind::Button,
            "go",
            ControlEvents::new(WidgetId::generate(), tx),
        );
        button.set_text("stop");
        assert_eq!(button.text(), "stop");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_slots_per_kind() {
        assert!(ControlKind::Button.accepts(CallbackSlot::Clicked));
        assert!(!ControlKind::Button.accepts(CallbackSlot::Edited));
        assert!(ControlKind::Edit.accepts(CallbackSlot::Finished));
        assert!(!ControlKind::TextEdit.accepts(CallbackSlot::Finished));
    }
}
