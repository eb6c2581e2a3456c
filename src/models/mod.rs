//! Domain models for mikrotik-gateway

pub mod block;
pub mod domain;

pub use block::{BlockOutcome, BlockVariant, BlockedEntry};
pub use domain::{Domain, DomainPair};
