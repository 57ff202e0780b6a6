//! Which stored slot of a relationship belongs to a given user.

use database::relationship::VipFlag;
use database::Relationship;

/// A user's position in a relationship record, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Counterpart,
}

impl Role {
    /// The VIP flag this role owns: its grant of trust toward the other party.
    pub fn own_vip_flag(&self) -> VipFlag {
        match self {
            Role::Initiator => VipFlag::InitiatorMarksCounterpart,
            Role::Counterpart => VipFlag::CounterpartMarksInitiator,
        }
    }

    /// Read the flag this role owns from a record.
    pub fn read_own_vip_flag(&self, relationship: &Relationship) -> bool {
        match self {
            Role::Initiator => relationship.initiator_marks_counterpart_vip,
            Role::Counterpart => relationship.counterpart_marks_initiator_vip,
        }
    }
}

/// Resolve `user_id`'s role in `relationship`, or `None` if they are not a party.
pub fn role_of(relationship: &Relationship, user_id: &str) -> Option<Role> {
    if relationship.initiator_id == user_id {
        Some(Role::Initiator)
    } else if relationship.counterpart_id == user_id {
        Some(Role::Counterpart)
    } else {
        None
    }
}
