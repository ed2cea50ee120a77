//! Links three rooms and shows which actions a ban in one of them produces
//!
//! Run with:
//! ```bash
//! cargo run --example propagation_demo
//! ```

use bansync_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use bansync_core::registry::{LinkRegistry, MemoryStore};
use bansync_core::{Membership, MembershipEvent, PropagationDecider, RoomId, UserId};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_with_config(LogConfig::new(LogLevel::Debug).with_target(false))?;

    let mut registry = LinkRegistry::new(MemoryStore::new());
    registry.load()?;
    registry.link_channels(&RoomId::from("!lobby:example.org"), &RoomId::from("!dev:example.org"))?;
    registry.link_channels(&RoomId::from("!dev:example.org"), &RoomId::from("!ops:example.org"))?;

    let decider = PropagationDecider::new(UserId::from("@banbot:example.org"));
    let event = MembershipEvent {
        room_id: RoomId::from("!lobby:example.org"),
        sender: UserId::from("@mod:example.org"),
        target: UserId::from("@spammer:example.org"),
        membership: Some(Membership::Ban),
        prev_membership: Some(Membership::Join),
        reason: Some("spam".to_string()),
    };

    for intent in decider.decide(&registry, &event) {
        info!(kind = intent.kind(), room = %intent.room(), user = %intent.user(), "Intent");
    }
    Ok(())
}
