use serde::{Deserialize, Serialize};

use super::Packet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSyncedPacket {
    pub conversation_id: String,
    pub contact_ids: Vec<String>,
}

impl Packet for ConversationSyncedPacket {
    const KIND: &'static str = "conversation_synced";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactAddedPacket {
    pub conversation_id: String,
    pub contact_id: String,
}

impl Packet for ContactAddedPacket {
    const KIND: &'static str = "contact_added";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRemovedPacket {
    pub conversation_id: String,
    pub contact_id: String,
}

impl Packet for ContactRemovedPacket {
    const KIND: &'static str = "contact_removed";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactConnectedPacket {
    pub contact_id: String,
}

impl Packet for ContactConnectedPacket {
    const KIND: &'static str = "contact_connected";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDisconnectedPacket {
    pub contact_id: String,
}

impl Packet for ContactDisconnectedPacket {
    const KIND: &'static str = "contact_disconnected";
}
