//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the domain repository
//! ports backed by PostgreSQL via Diesel, with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Business rules live in the domain services; the one exception is
//!   inventory merge-on-add, which must be atomic and therefore runs inside a
//!   transaction here.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Constraint mapping**: unique violations are identified by constraint
//!   name and surfaced as typed port errors.
//!
//! # Example
//!
//! ```ignore
//! use pantry::outbound::persistence::{DbPool, DieselInventoryRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/pantry")).await?;
//! let items = DieselInventoryRepository::new(pool);
//! ```

pub(crate) mod diesel_helpers;
mod diesel_family_repository;
mod diesel_inventory_repository;
mod diesel_merchant_repository;
mod diesel_notification_repository;
mod diesel_order_repository;
mod diesel_token_verifier;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_family_repository::DieselFamilyRepository;
pub use diesel_inventory_repository::DieselInventoryRepository;
pub use diesel_merchant_repository::DieselMerchantRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_order_repository::DieselOrderRepository;
pub use diesel_token_verifier::DieselTokenVerifier;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
