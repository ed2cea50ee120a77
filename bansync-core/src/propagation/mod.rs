//! Propagation Decider
//!
//! Turns one inbound membership event into the set of ban/unban intents that
//! mirror it across linked rooms. The decider only reads link state through
//! [`LinkLookup`] and never tracks whether intents were delivered.
//!
//! ```text
//! MembershipEvent --> PropagationDecider --> Vec<ActionIntent> --> Transport
//!                            |
//!                            v
//!                     LinkLookup (registry)
//! ```

pub mod event;
pub mod intent;

pub use event::{Membership, MembershipEvent, MembershipTransition};
pub use intent::ActionIntent;

use crate::registry::{LinkRegistry, LinkStore};
use crate::types::{RoomId, UserId};
use tracing::{debug, trace};

/// Read access to link state
pub trait LinkLookup {
    /// Every room linked to `room`, excluding `room` itself
    fn linked_rooms(&self, room: &RoomId) -> Vec<RoomId>;
}

impl<S: LinkStore> LinkLookup for LinkRegistry<S> {
    fn linked_rooms(&self, room: &RoomId) -> Vec<RoomId> {
        self.get_linked_channels(room)
    }
}

/// Decides which mirrored actions a membership event requires
#[derive(Debug, Clone)]
pub struct PropagationDecider {
    own_user: UserId,
}

impl PropagationDecider {
    /// `own_user` is the bot's identity; events it sent are never mirrored
    pub fn new(own_user: UserId) -> Self {
        Self { own_user }
    }

    pub fn own_user(&self) -> &UserId {
        &self.own_user
    }

    pub fn decide<L: LinkLookup + ?Sized>(
        &self,
        links: &L,
        event: &MembershipEvent,
    ) -> Vec<ActionIntent> {
        if event.sender == self.own_user {
            trace!(room = %event.room_id, "Ignoring own membership event");
            return Vec::new();
        }

        let transition = event.transition();
        if transition == MembershipTransition::Other {
            return Vec::new();
        }

        let linked = links.linked_rooms(&event.room_id);
        if linked.is_empty() {
            return Vec::new();
        }

        debug!(
            room = %event.room_id,
            user = %event.target,
            ?transition,
            targets = linked.len(),
            "Propagating membership change"
        );

        linked
            .into_iter()
            .map(|room| match transition {
                MembershipTransition::Ban => ActionIntent::Ban {
                    room,
                    user: event.target.clone(),
                    reason: event.reason.clone(),
                },
                _ => ActionIntent::Unban {
                    room,
                    user: event.target.clone(),
                },
            })
            .collect()
    }
}
