//! nexa-core: shared plumbing for the NEXA web tier.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod utils;
