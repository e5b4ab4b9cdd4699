use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_NAMESPACE: &str = "urn:x-cast:gmusic.viz.attempts";

/// One inbound message from a cast-style sender.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMessage {
    /// Channel the message was sent on; absent means the bus's own.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteCommand {
    TogglePause,
}

impl RemoteCommand {
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "message" | "togglePause" => Some(RemoteCommand::TogglePause),
            _ => None,
        }
    }
}

/// Receiving end of a message bus bound to a single namespace.
pub struct MessageBus {
    namespace: String,
    inbox: VecDeque<RemoteMessage>,
}

impl MessageBus {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            inbox: VecDeque::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn deliver(&mut self, message: RemoteMessage) {
        self.inbox.push_back(message);
    }

    /// Drain the inbox into commands, dropping off-namespace and
    /// unrecognized messages.
    pub fn take_commands(&mut self) -> Vec<RemoteCommand> {
        let mut commands = Vec::new();
        while let Some(msg) = self.inbox.pop_front() {
            if let Some(ns) = &msg.namespace {
                if ns != &self.namespace {
                    log::debug!("Ignoring message on foreign namespace {}", ns);
                    continue;
                }
            }
            log::info!(
                "Message type: {} from: {} data: {}",
                msg.kind,
                msg.sender_id,
                msg.data
            );
            match RemoteCommand::from_kind(&msg.kind) {
                Some(cmd) => commands.push(cmd),
                None => log::warn!("Unrecognized remote message type: {}", msg.kind),
            }
        }
        commands
    }
}
