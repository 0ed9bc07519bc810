//! Platform API navigation.
//!
//! The platform publishes its endpoints as HAL-style `_links` on a root
//! resource. [`PlatformClient`] discovers them, caches them as a [`LinkMap`],
//! and drives the card registration workflow on top.

mod client;
mod links;
mod models;

pub use client::{INCOMPATIBLE_CONTRACT, PlatformClient};
pub use links::{
    Link, LinkMap, REL_ENCRYPTION_KEYS, REL_HEALTH, REL_PAYMENT_CARDS, REL_SELF, REQUIRED_RELATIONS,
};
pub use models::{
    HealthStatus, KeyExchangeRecord, KeyExchangeRequest, RegistrationRequest, RegistrationResult,
    RootResource,
};
