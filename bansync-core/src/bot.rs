//! Bot dispatch
//!
//! [`BanSyncBot`] owns the link registry and routes every inbound
//! [`BotEvent`] to the matching handler:
//!
//! - owner messages become link/unlink commands
//! - membership changes go through the propagation decider and the resulting
//!   intents are executed through the transport
//! - owner invites are accepted with a bounded retry
//!
//! Events are handled one at a time in arrival order. Transport failures are
//! logged and never abort the handling of later intents or events; registry
//! persistence failures are returned to the caller.

use crate::command::BotCommand;
use crate::config::BotConfig;
use crate::propagation::{ActionIntent, MembershipEvent, PropagationDecider};
use crate::registry::{JsonFileStore, LinkOutcome, LinkRegistry, LinkStore, RegistryError};
use crate::retry::{retry, RetryPolicy};
use crate::telemetry;
use crate::transport::{Transport, TransportError};
use crate::types::{RoomAlias, RoomId, UserId};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub const SELF_LINK_REPLY: &str = "You cannot link a room to itself!";
pub const UNLINKED_REPLY: &str = "Unlinked this channel!";
pub const NOT_LINKED_REPLY: &str = "This channel is not linked anywhere!";
pub const SAVE_FAILED_REPLY: &str = "Failed to save link state";
pub const NOT_LOADED_REPLY: &str = "Link state is not loaded yet, try again later";

/// Failures that stop the bot's event loop
#[derive(Debug, Error)]
pub enum BotError {
    /// Link state could not be persisted after a command
    #[error("Link registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// A text message posted in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMessage {
    pub room_id: RoomId,
    pub sender: UserId,
    pub body: String,
}

/// An invitation for the bot to join a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteEvent {
    pub room_id: RoomId,
    pub sender: UserId,
    #[serde(default)]
    pub room_name: Option<String>,
}

/// Everything the bot reacts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotEvent {
    Message(RoomMessage),
    Membership(MembershipEvent),
    Invite(InviteEvent),
}

/// Event dispatcher for the ban sync bot
pub struct BanSyncBot<T: Transport, S: LinkStore = JsonFileStore> {
    owner: UserId,
    registry: LinkRegistry<S>,
    decider: PropagationDecider,
    transport: Arc<T>,
    join_policy: RetryPolicy,
}

impl<T: Transport, S: LinkStore> BanSyncBot<T, S> {
    /// `own_user` is the bot's identity, `owner` the only user it obeys
    pub fn new(
        own_user: UserId,
        owner: UserId,
        registry: LinkRegistry<S>,
        transport: Arc<T>,
    ) -> Self {
        Self {
            owner,
            registry,
            decider: PropagationDecider::new(own_user),
            transport,
            join_policy: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &BotConfig, registry: LinkRegistry<S>, transport: Arc<T>) -> Self {
        Self::new(config.user_id.clone(), config.owner.clone(), registry, transport)
            .with_join_policy(config.join_retry.clone())
    }

    pub fn with_join_policy(mut self, policy: RetryPolicy) -> Self {
        self.join_policy = policy;
        self
    }

    pub fn registry(&self) -> &LinkRegistry<S> {
        &self.registry
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Process events until the sender side of `events` is dropped
    pub async fn run(&mut self, mut events: mpsc::Receiver<BotEvent>) -> Result<(), BotError> {
        info!("Bot event loop started");
        while let Some(event) = events.recv().await {
            self.handle_event(event).await?;
        }
        info!("Event stream closed, bot event loop finished");
        Ok(())
    }

    pub async fn handle_event(&mut self, event: BotEvent) -> Result<(), BotError> {
        match event {
            BotEvent::Message(message) => self.handle_message(&message).await,
            BotEvent::Membership(event) => {
                self.handle_membership(&event).await;
                Ok(())
            }
            BotEvent::Invite(invite) => {
                self.handle_invite(&invite).await;
                Ok(())
            }
        }
    }

    async fn handle_message(&mut self, message: &RoomMessage) -> Result<(), BotError> {
        if message.sender != self.owner {
            return Ok(());
        }
        let Some(command) = BotCommand::parse(&message.body) else {
            return Ok(());
        };

        counter!(telemetry::COMMANDS_HANDLED, "command" => command.name()).increment(1);
        debug!(room = %message.room_id, command = command.name(), "Handling owner command");

        match command {
            BotCommand::Link { alias } => self.link_room(&message.room_id, &alias).await,
            BotCommand::Unlink => self.unlink_room(&message.room_id).await,
        }
    }

    async fn link_room(&mut self, room: &RoomId, alias: &RoomAlias) -> Result<(), BotError> {
        let target = match self.transport.resolve_alias(alias).await {
            Ok(target) => target,
            Err(e) => {
                warn!(%alias, error = %e, "Failed to resolve room alias");
                self.reply(room, &format!("Failed to resolve room alias {}", alias))
                    .await;
                return Ok(());
            }
        };

        if &target == room {
            self.reply(room, SELF_LINK_REPLY).await;
            return Ok(());
        }

        match self.registry.link_channels(room, &target) {
            Ok(LinkOutcome::AlreadyLinked) => {
                self.reply(room, &format!("This room is already linked to {}", alias))
                    .await;
            }
            Ok(LinkOutcome::NotLoaded) => {
                self.reply(room, NOT_LOADED_REPLY).await;
            }
            Ok(_) => {
                self.reply(room, &format!("Linked this room to {}", alias))
                    .await;
            }
            Err(RegistryError::SelfLink(_)) => {
                self.reply(room, SELF_LINK_REPLY).await;
            }
            Err(e) => {
                error!(%room, %target, error = %e, "Failed to persist link");
                self.reply(room, SAVE_FAILED_REPLY).await;
                return Err(e.into());
            }
        }
        Ok(())
    }

    async fn unlink_room(&mut self, room: &RoomId) -> Result<(), BotError> {
        match self.registry.unlink_channels(room) {
            Ok(true) => self.reply(room, UNLINKED_REPLY).await,
            Ok(false) => self.reply(room, NOT_LINKED_REPLY).await,
            Err(e) => {
                error!(%room, error = %e, "Failed to persist unlink");
                self.reply(room, SAVE_FAILED_REPLY).await;
                return Err(e.into());
            }
        }
        Ok(())
    }

    async fn handle_membership(&self, event: &MembershipEvent) {
        let intents = self.decider.decide(&self.registry, event);
        for intent in &intents {
            counter!(telemetry::INTENTS_EMITTED, "kind" => intent.kind()).increment(1);
            if let Err(e) = self.execute(intent).await {
                counter!(telemetry::INTENTS_FAILED, "kind" => intent.kind()).increment(1);
                warn!(
                    room = %intent.room(),
                    user = %intent.user(),
                    kind = intent.kind(),
                    error = %e,
                    "Failed to mirror membership change"
                );
            }
        }
    }

    async fn execute(&self, intent: &ActionIntent) -> Result<(), TransportError> {
        match intent {
            ActionIntent::Ban { room, user, reason } => {
                self.transport.ban(room, user, reason.as_deref()).await
            }
            ActionIntent::Unban { room, user } => self.transport.unban(room, user).await,
        }
    }

    async fn handle_invite(&self, invite: &InviteEvent) {
        if invite.sender != self.owner {
            debug!(room = %invite.room_id, sender = %invite.sender, "Ignoring invite");
            return;
        }

        let name = invite.room_name.as_deref().unwrap_or(invite.room_id.as_str());
        info!(room = %invite.room_id, name, "Got invite, joining");

        let transport = &*self.transport;
        let room = &invite.room_id;
        let joined = retry(&self.join_policy, "join room", move |_attempt| {
            counter!(telemetry::JOIN_ATTEMPTS).increment(1);
            transport.join(room)
        })
        .await;

        match joined {
            Ok(()) => info!(room = %invite.room_id, name, "Joined room"),
            Err(e) => error!(room = %invite.room_id, name, error = %e, "Unable to join room"),
        }
    }

    async fn reply(&self, room: &RoomId, body: &str) {
        if let Err(e) = self.transport.send_text(room, body).await {
            warn!(%room, error = %e, "Failed to send reply");
        }
    }
}
