pub mod route53;

use std::fmt;

use async_trait::async_trait;

pub use route53::Route53Provider;

/// TTL, in seconds, written on every upserted record.
pub const RECORD_TTL: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => f.write_str("A"),
        }
    }
}

/// A single replace-or-create change against one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpsert {
    pub zone_id: String,
    pub name: String,
    pub record_type: RecordType,
    pub ttl: i64,
    pub value: String,
}

impl RecordUpsert {
    /// An `A` record pointing `name` at `address` with the standard TTL.
    pub fn a_record(zone_id: impl Into<String>, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            name: name.into(),
            record_type: RecordType::A,
            ttl: RECORD_TTL,
            value: address.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid change: {0}")]
    InvalidChange(String),

    #[error("{0}")]
    Api(String),
}

/// Capability to submit one record upsert to a DNS backend.
///
/// Implementations make exactly one mutating call and never retry; the
/// returned string is the backend's raw response, kept for diagnostics.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    async fn upsert_record(&self, change: &RecordUpsert) -> Result<String, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_record_uses_fixed_type_and_ttl() {
        let change = RecordUpsert::a_record("Z123", "home.example.com", "203.0.113.7");
        assert_eq!(change.record_type, RecordType::A);
        assert_eq!(change.ttl, 300);
        assert_eq!(change.value, "203.0.113.7");
        assert_eq!(change.record_type.to_string(), "A");
    }
}
