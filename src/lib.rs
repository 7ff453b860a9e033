//! Dynamic DNS over Route 53.
//!
//! An HTTP endpoint authenticates callers with a shared token and points an
//! `A` record at the address reported by the fronting proxy. The companion
//! [`updater`] polls that endpoint from the network whose address changes.

pub mod api;
pub mod config;
pub mod handler;
pub mod provider;
pub mod response;
pub mod updater;

pub use config::{Config, DdnsConfig};
pub use handler::{UpdateHandler, UpdateRequest};
pub use provider::{DnsProvider, RecordUpsert, Route53Provider};
pub use response::{Response, Status};
