//! Ban synchronisation between linked chat rooms
//!
//! The link registry stores which rooms are linked; the propagation decider
//! turns a ban or unban in one room into mirrored actions for every linked
//! room; the bot wires both to a [`transport::Transport`].

pub mod bot;
pub mod command;
pub mod config;
pub mod logging;
pub mod propagation;
pub mod registry;
pub mod retry;
pub mod telemetry;
pub mod transport;
pub mod types;

pub use bot::{BanSyncBot, BotError, BotEvent, InviteEvent, RoomMessage};
pub use config::{BotConfig, ConfigError};
pub use logging::{init_logging, LogLevel};
pub use propagation::{ActionIntent, LinkLookup, Membership, MembershipEvent, PropagationDecider};
pub use registry::{LinkGroup, LinkOutcome, LinkRegistry, RegistryError};
pub use types::{RoomAlias, RoomId, UserId};
