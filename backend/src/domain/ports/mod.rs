//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`FamilyDirectory`, `InventoryLedger`, `MerchantRegistry`,
//! `OrderAggregator`, `NotificationCenter`, `Notifier`) are called by inbound
//! adapters and by other services. Driven ports (the repositories and
//! `TokenVerifier`) are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod family_directory;
mod family_repository;
mod inventory_ledger;
mod inventory_repository;
mod merchant_registry;
mod merchant_repository;
mod notification_center;
mod notification_repository;
mod order_aggregator;
mod order_repository;
mod token_verifier;
mod user_repository;

#[cfg(test)]
pub use family_directory::MockFamilyDirectory;
pub use family_directory::{
    AddMemberRequest, FamilyDirectory, FamilyMembership, FamilyOverview, FixtureFamilyDirectory,
};
#[cfg(test)]
pub use family_repository::MockFamilyRepository;
pub use family_repository::{FamilyRepository, FamilyRepositoryError, FixtureFamilyRepository};
#[cfg(test)]
pub use inventory_ledger::MockInventoryLedger;
pub use inventory_ledger::{FixtureInventoryLedger, InventoryLedger};
#[cfg(test)]
pub use inventory_repository::MockInventoryRepository;
pub use inventory_repository::{
    FixtureInventoryRepository, InventoryRepository, InventoryRepositoryError, ItemRevision,
};
#[cfg(test)]
pub use merchant_registry::MockMerchantRegistry;
pub use merchant_registry::{FixtureMerchantRegistry, MerchantRegistry};
#[cfg(test)]
pub use merchant_repository::MockMerchantRepository;
pub use merchant_repository::{
    FixtureMerchantRepository, MerchantRepository, MerchantRepositoryError,
};
#[cfg(test)]
pub use notification_center::{MockNotificationCenter, MockNotifier};
pub use notification_center::{
    FixtureNotificationCenter, FixtureNotifier, NotificationCenter, NotificationFeed, Notifier,
    SendNotificationRequest,
};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{
    FixtureNotificationRepository, NotificationRepository, NotificationRepositoryError,
};
#[cfg(test)]
pub use order_aggregator::MockOrderAggregator;
pub use order_aggregator::{FixtureOrderAggregator, OrderAggregator, RestockRequest};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{FixtureOrderRepository, OrderRepository, OrderRepositoryError};
#[cfg(test)]
pub use token_verifier::MockTokenVerifier;
pub use token_verifier::{FixtureTokenVerifier, TokenVerifier, TokenVerifierError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{FixtureUserRepository, UserRepository, UserRepositoryError};
