//! Membership events consumed from the transport

use crate::types::{RoomId, UserId};
use serde::{Deserialize, Serialize};

/// Room membership state of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Join,
    Invite,
    Leave,
    Ban,
    Knock,
}

/// A change of one user's membership in one room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEvent {
    /// Room the change happened in
    pub room_id: RoomId,
    /// Who performed the change
    pub sender: UserId,
    /// Whose membership changed
    pub target: UserId,
    /// New membership; absent when the server omitted it
    #[serde(default)]
    pub membership: Option<Membership>,
    #[serde(default)]
    pub prev_membership: Option<Membership>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl MembershipEvent {
    pub fn transition(&self) -> MembershipTransition {
        MembershipTransition::classify(self.membership, self.prev_membership)
    }
}

/// The closed set of transitions the decider cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipTransition {
    Ban,
    /// Leaving (or an unspecified membership) straight out of a ban
    Unban,
    Other,
}

impl MembershipTransition {
    pub fn classify(current: Option<Membership>, previous: Option<Membership>) -> Self {
        match (current, previous) {
            (Some(Membership::Ban), _) => Self::Ban,
            (Some(Membership::Leave) | None, Some(Membership::Ban)) => Self::Unban,
            _ => Self::Other,
        }
    }
}
