//! Ping classes and the policies attached to them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// String-coded ping class.
///
/// The set is open: unknown codes are carried as [`PingType::Other`] and are
/// neither gated nor limited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PingType {
    Emergency,
    Battery,
    Status,
    Other(String),
}

impl PingType {
    /// Parse an already-normalized (trimmed, lowercase) code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "emergency" => PingType::Emergency,
            "battery" => PingType::Battery,
            "status" => PingType::Status,
            other => PingType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PingType::Emergency => "emergency",
            PingType::Battery => "battery",
            PingType::Status => "status",
            PingType::Other(code) => code,
        }
    }

    /// Requires the receiver's VIP grant to the sender.
    pub fn is_vip_gated(&self) -> bool {
        matches!(self, PingType::Emergency | PingType::Battery)
    }

    /// Subject to the daily per-pair quota.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PingType::Emergency)
    }
}

impl From<String> for PingType {
    fn from(code: String) -> Self {
        PingType::from_code(&code.trim().to_lowercase())
    }
}

impl From<PingType> for String {
    fn from(ping_type: PingType) -> Self {
        ping_type.as_str().to_string()
    }
}

impl fmt::Display for PingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policies() {
        assert!(PingType::Emergency.is_vip_gated());
        assert!(PingType::Emergency.is_rate_limited());
        assert!(PingType::Battery.is_vip_gated());
        assert!(!PingType::Battery.is_rate_limited());
        assert!(!PingType::Status.is_vip_gated());
        assert!(!PingType::from_code("arrived").is_vip_gated());
    }

    #[test]
    fn test_serde_uses_codes() {
        let parsed: PingType = serde_json::from_str("\"Emergency\"").unwrap();
        assert_eq!(parsed, PingType::Emergency);
        assert_eq!(serde_json::to_string(&PingType::from_code("arrived")).unwrap(), "\"arrived\"");
    }
}
