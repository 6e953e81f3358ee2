use std::sync::Arc;

use anyhow::anyhow;
use hearth_mailbox::{Encryption, Message, Outbox, PostOffice};
use uuid::Uuid;

use crate::app::{AppFactory, AppHost, LuaAppFactory};
use crate::models::{ContactAlert, ContactInfo, ContactList, ConversationItem};
use crate::packet::{
    ContactAddedPacket, ContactConnectedPacket, ContactDisconnectedPacket, ContactRemovedPacket,
    ConversationSyncedPacket, NewAppPacket, Packet,
};
use crate::user::UserService;

use super::{Conversation, ConversationListener, StubListener};

/// Drains a conversation's mailbox and turns each message into a state
/// transition, a display item, or both.
///
/// The dispatcher does not own a timer: call [`ConversationDispatcher::tick`]
/// periodically from whatever loop drives the UI.
pub struct ConversationDispatcher {
    conversation: Conversation,
    apps: Vec<AppHost>,
    items: Vec<ConversationItem>,
    user_service: Arc<dyn UserService>,
    outbox: Arc<dyn Outbox>,
    post_office: PostOffice,
    app_factory: Box<dyn AppFactory>,
    listener: Arc<dyn ConversationListener>,
}

impl ConversationDispatcher {
    pub fn new(
        conversation: Conversation,
        user_service: Arc<dyn UserService>,
        outbox: Arc<dyn Outbox>,
        post_office: PostOffice,
    ) -> Self {
        post_office.add(conversation.mailbox());
        Self {
            conversation,
            apps: Vec::new(),
            items: Vec::new(),
            user_service,
            outbox,
            post_office,
            app_factory: Box::new(LuaAppFactory),
            listener: Arc::new(StubListener),
        }
    }

    pub fn with_listener<L>(mut self, listener: Arc<L>) -> Self
    where
        L: ConversationListener + 'static,
    {
        self.listener = listener;
        self
    }

    pub fn with_app_factory<F>(mut self, app_factory: F) -> Self
    where
        F: AppFactory + 'static,
    {
        self.app_factory = Box::new(app_factory);
        self
    }

    pub fn id(&self) -> &str {
        self.conversation.id()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn items(&self) -> &[ConversationItem] {
        &self.items
    }

    pub fn apps(&self) -> &[AppHost] {
        &self.apps
    }

    pub fn app(&self, app_id: &str) -> Option<&AppHost> {
        self.apps.iter().find(|app| app.id() == app_id)
    }

    pub fn app_mut(&mut self, app_id: &str) -> Option<&mut AppHost> {
        self.apps.iter_mut().find(|app| app.id() == app_id)
    }

    /// Directory contacts that can still be added to the conversation.
    pub fn selectable_contacts(&self) -> Vec<ContactInfo> {
        self.user_service
            .contacts()
            .into_iter()
            .filter(|contact| !self.conversation.contacts().contains(&contact.id))
            .collect()
    }

    /// Applies every queued conversation message, then lets each hosted app
    /// drain its own mailbox. Returns how many conversation messages were
    /// taken from the mailbox.
    ///
    /// A message that fails to apply ends the drain for this tick; messages
    /// behind it stay queued for the next one.
    pub fn tick(&mut self) -> usize {
        let mut processed = 0;
        if let Err(err) = self.check_mail(&mut processed) {
            tracing::error!(
                conversation_id = %self.conversation.id(),
                ?err,
                "Error in check_mail"
            );
        }
        for app in &mut self.apps {
            app.check_mail();
        }
        processed
    }

    fn check_mail(&mut self, processed: &mut usize) -> Result<(), anyhow::Error> {
        while let Some(message) = self.conversation.mailbox().pop_inbox() {
            *processed += 1;
            tracing::trace!(
                conversation_id = %self.conversation.id(),
                kind = message.kind(),
                "Dispatching message"
            );
            self.apply(message)?;
        }
        Ok(())
    }

    fn apply(&mut self, message: Message) -> Result<(), anyhow::Error> {
        match message.kind() {
            NewAppPacket::KIND => self.on_new_app(&message),
            ConversationSyncedPacket::KIND => self.on_synced(&message),
            ContactRemovedPacket::KIND => self.on_contact_removed(&message),
            ContactAddedPacket::KIND => self.on_contact_added(&message),
            ContactConnectedPacket::KIND => {
                ContactConnectedPacket::from_message(&message)?;
                self.refresh_contacts();
                Ok(())
            }
            ContactDisconnectedPacket::KIND => {
                let packet = ContactDisconnectedPacket::from_message(&message)?;
                if self.conversation.contacts().contains(&packet.contact_id) {
                    self.refresh_contacts();
                }
                Ok(())
            }
            _ => {
                self.items.push(ConversationItem::Unknown {
                    text: message.to_string(),
                });
                Ok(())
            }
        }
    }

    fn on_new_app(&mut self, message: &Message) -> Result<(), anyhow::Error> {
        if !message.is_symmetric() {
            return Err(anyhow!(
                "Expected symmetric encryption for new app, got {}",
                message.meta.encryption
            ));
        }
        let packet = NewAppPacket::from_message(message)?;
        if !self.is_current(&packet.conversation_id) {
            return Ok(());
        }
        if self.conversation.has_app(&packet.app_id) {
            tracing::debug!(app_id = %packet.app_id, "App already hosted");
            return Ok(());
        }
        self.host_app(&packet.app_id, &packet.name, &packet.code)?;
        self.listener.on_alert(self.conversation.id());
        Ok(())
    }

    fn on_synced(&mut self, message: &Message) -> Result<(), anyhow::Error> {
        let packet = ConversationSyncedPacket::from_message(message)?;
        if !self.is_current(&packet.conversation_id) {
            return Ok(());
        }
        let contacts: ContactList = packet
            .contact_ids
            .iter()
            .filter_map(|id| self.user_service.by_id(id))
            .collect();
        self.conversation.set_contacts(contacts);
        self.conversation.set_synced(true);
        self.refresh_contacts();
        self.listener.on_alert(self.conversation.id());
        Ok(())
    }

    fn on_contact_removed(&mut self, message: &Message) -> Result<(), anyhow::Error> {
        let packet = ContactRemovedPacket::from_message(message)?;
        if !self.is_current(&packet.conversation_id) {
            return Ok(());
        }
        let Some(contact) = self.user_service.by_id(&packet.contact_id) else {
            return Ok(());
        };
        // Already gone: a replayed removal must not alert twice.
        if self.conversation.remove_contact(&contact.id).is_none() {
            return Ok(());
        }
        self.items.push(ConversationItem::Contact {
            contact_id: contact.id.clone(),
            name: contact.name,
            alert: ContactAlert::Quit,
        });
        for app in &mut self.apps {
            app.remove_contact(&contact.id);
        }
        self.refresh_contacts();
        self.listener.on_alert(self.conversation.id());
        Ok(())
    }

    fn on_contact_added(&mut self, message: &Message) -> Result<(), anyhow::Error> {
        let packet = ContactAddedPacket::from_message(message)?;
        if !self.is_current(&packet.conversation_id) {
            return Ok(());
        }
        let Some(contact) = self.user_service.by_id(&packet.contact_id) else {
            return Ok(());
        };
        if !self.join(contact) {
            return Ok(());
        }
        self.listener.on_alert(self.conversation.id());
        Ok(())
    }

    fn is_current(&self, conversation_id: &str) -> bool {
        let current = conversation_id == self.conversation.id();
        if !current {
            tracing::trace!(
                conversation_id = %self.conversation.id(),
                target = conversation_id,
                "Ignoring message for another conversation"
            );
        }
        current
    }

    // Adds a member with its display item; `false` if it already was one.
    fn join(&mut self, contact: ContactInfo) -> bool {
        if !self.conversation.add_contact(contact.clone()) {
            return false;
        }
        self.items.push(ConversationItem::Contact {
            contact_id: contact.id,
            name: contact.name,
            alert: ContactAlert::Joined,
        });
        self.refresh_contacts();
        true
    }

    fn host_app(&mut self, app_id: &str, name: &str, code: &str) -> Result<(), anyhow::Error> {
        let mut app = AppHost::new(
            app_id,
            name,
            self.conversation.contacts().clone(),
            self.user_service.clone(),
            self.outbox.clone(),
            self.app_factory.create_controls(),
            self.app_factory.create_sandbox(),
        )?;
        // Registered first so replies to messages sent while loading arrive.
        self.post_office.add(app.mailbox());
        if let Err(fault) = app.run(code) {
            tracing::warn!(app_id, %fault, "App script failed to load");
        }
        self.apps.push(app);
        self.conversation.add_app_id(app_id);
        self.items.push(ConversationItem::App {
            app_id: app_id.to_string(),
            name: name.to_string(),
        });
        tracing::debug!(conversation_id = %self.conversation.id(), app_id, "Hosting app");
        Ok(())
    }

    /// Re-resolves member names and pushes the member list to every app and
    /// the contact selector.
    pub fn refresh_contacts(&mut self) {
        let contacts: ContactList = self
            .conversation
            .contacts()
            .iter()
            .map(|contact| {
                self.user_service
                    .by_id(&contact.id)
                    .unwrap_or_else(|| contact.clone())
            })
            .collect();
        self.conversation.set_contacts(contacts.clone());
        for app in &mut self.apps {
            app.set_contacts(contacts.clone());
        }
        self.listener.on_contacts_updated(
            self.conversation.id(),
            &contacts,
            self.selectable_contacts(),
        );
    }

    /// Adds a directory contact to the conversation and tells the existing
    /// members. Returns `false` if the contact is unknown or already a member.
    pub fn add_contact(&mut self, contact_id: &str) -> bool {
        let Some(contact) = self.user_service.by_id(contact_id) else {
            return false;
        };
        let members = self.conversation.contacts().ids();
        if !self.join(contact) {
            return false;
        }
        let packet = ContactAddedPacket {
            conversation_id: self.conversation.id().to_string(),
            contact_id: contact_id.to_string(),
        };
        self.broadcast(&members, packet.to_message());
        true
    }

    /// Hosts a new app locally and announces it to every member.
    pub fn place_app(&mut self, name: &str, code: &str) -> Result<String, anyhow::Error> {
        let app_id = Uuid::now_v7().to_string();
        self.host_app(&app_id, name, code)?;
        let packet = NewAppPacket {
            conversation_id: self.conversation.id().to_string(),
            app_id: app_id.clone(),
            name: name.to_string(),
            code: code.to_string(),
        };
        let message = packet.to_message().with_encryption(Encryption::Symmetric);
        self.broadcast(&self.conversation.contacts().ids(), message);
        Ok(app_id)
    }

    fn broadcast(&self, contact_ids: &[String], message: Message) {
        let message = message.addressed_to(self.conversation.id());
        for contact_id in contact_ids {
            self.outbox.send(contact_id, message.clone());
        }
    }
}

impl Drop for ConversationDispatcher {
    fn drop(&mut self) {
        self.post_office.remove(self.conversation.mailbox());
        for app in &self.apps {
            self.post_office.remove(app.mailbox());
        }
    }
}
