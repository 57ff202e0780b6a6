//! VIP authorization gate.

use database::Relationship;

use crate::role::role_of;

/// Does `grantor` consider `beneficiary` a VIP?
///
/// Reads only the flag owned by `grantor`. The two directions are independent.
/// Anyone who is not exactly the two parties of the record gets `false`.
pub fn is_vip(relationship: &Relationship, grantor: &str, beneficiary: &str) -> bool {
    if grantor == beneficiary {
        return false;
    }
    match role_of(relationship, grantor) {
        Some(role) if relationship.other_party(grantor) == Some(beneficiary) => {
            role.read_own_vip_flag(relationship)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use database::RelationshipStatus;

    fn accepted(initiator_vip: bool, counterpart_vip: bool) -> Relationship {
        Relationship {
            id: "r1".to_string(),
            initiator_id: "alice".to_string(),
            counterpart_id: "bob".to_string(),
            status: RelationshipStatus::Accepted,
            created_at: Utc::now(),
            blocked_by: None,
            ringtone: "default".to_string(),
            initiator_marks_counterpart_vip: initiator_vip,
            counterpart_marks_initiator_vip: counterpart_vip,
        }
    }

    #[test]
    fn test_reads_grantor_owned_flag() {
        // Bob (counterpart) trusts Alice; Alice does not trust Bob.
        let rel = accepted(false, true);
        assert!(is_vip(&rel, "bob", "alice"));
        assert!(!is_vip(&rel, "alice", "bob"));

        let rel = accepted(true, false);
        assert!(is_vip(&rel, "alice", "bob"));
        assert!(!is_vip(&rel, "bob", "alice"));
    }

    #[test]
    fn test_strangers_are_never_vip() {
        let rel = accepted(true, true);
        assert!(!is_vip(&rel, "carol", "alice"));
        assert!(!is_vip(&rel, "alice", "carol"));
        assert!(!is_vip(&rel, "alice", "alice"));
    }
}
