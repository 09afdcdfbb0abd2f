//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    FamilyDirectory, FixtureFamilyDirectory, FixtureInventoryLedger, FixtureMerchantRegistry,
    FixtureNotificationCenter, FixtureOrderAggregator, FixtureTokenVerifier, InventoryLedger,
    MerchantRegistry, NotificationCenter, OrderAggregator, TokenVerifier,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Resolves bearer tokens to users.
    pub tokens: Arc<dyn TokenVerifier>,
    pub families: Arc<dyn FamilyDirectory>,
    pub inventory: Arc<dyn InventoryLedger>,
    pub merchants: Arc<dyn MerchantRegistry>,
    pub orders: Arc<dyn OrderAggregator>,
    pub notifications: Arc<dyn NotificationCenter>,
}

impl HttpState {
    /// State backed entirely by fixture ports.
    ///
    /// Useful for smoke runs without a database and as a base for tests that
    /// replace a single port.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use pantry::domain::ports::FixtureInventoryLedger;
    /// use pantry::inbound::http::state::HttpState;
    ///
    /// let state = HttpState {
    ///     inventory: Arc::new(FixtureInventoryLedger),
    ///     ..HttpState::fixtures()
    /// };
    /// let _families = state.families.clone();
    /// ```
    pub fn fixtures() -> Self {
        Self {
            tokens: Arc::new(FixtureTokenVerifier),
            families: Arc::new(FixtureFamilyDirectory),
            inventory: Arc::new(FixtureInventoryLedger),
            merchants: Arc::new(FixtureMerchantRegistry),
            orders: Arc::new(FixtureOrderAggregator),
            notifications: Arc::new(FixtureNotificationCenter),
        }
    }
}
