//! Builders wiring Diesel adapters and domain services into [`HttpState`].

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use pantry::domain::{
    FamilyService, InventoryService, MerchantService, NotificationFanout, NotificationService,
    OrderService,
};
use pantry::inbound::http::state::HttpState;
use pantry::outbound::persistence::{
    DbPool, DieselFamilyRepository, DieselInventoryRepository, DieselMerchantRepository,
    DieselNotificationRepository, DieselOrderRepository, DieselTokenVerifier,
    DieselUserRepository,
};

use super::ServerConfig;

type Fanout = NotificationFanout<DieselNotificationRepository, DieselFamilyRepository>;
type Directory = FamilyService<DieselFamilyRepository, DieselUserRepository, Fanout>;

/// Build handler state from configuration.
///
/// Without a database pool every port is a fixture, which keeps the server
/// bootable for smoke tests and OpenAPI browsing.
pub(super) fn build_http_state(config: &ServerConfig) -> HttpState {
    match &config.db_pool {
        Some(pool) => build_pooled_state(pool, Arc::new(DefaultClock)),
        None => HttpState::fixtures(),
    }
}

fn build_pooled_state(pool: &DbPool, clock: Arc<dyn Clock>) -> HttpState {
    let family_repo = Arc::new(DieselFamilyRepository::new(pool.clone()));
    let user_repo = Arc::new(DieselUserRepository::new(pool.clone()));
    let inventory_repo = Arc::new(DieselInventoryRepository::new(pool.clone()));
    let merchant_repo = Arc::new(DieselMerchantRepository::new(pool.clone()));
    let notification_repo = Arc::new(DieselNotificationRepository::new(pool.clone()));
    let order_repo = Arc::new(DieselOrderRepository::new(pool.clone()));

    let fanout: Arc<Fanout> = Arc::new(NotificationFanout::new(
        notification_repo.clone(),
        family_repo.clone(),
        clock.clone(),
    ));
    let directory: Arc<Directory> = Arc::new(FamilyService::new(
        family_repo,
        user_repo,
        fanout.clone(),
        clock.clone(),
    ));

    HttpState {
        tokens: Arc::new(DieselTokenVerifier::new(pool.clone(), clock.clone())),
        families: directory.clone(),
        inventory: Arc::new(InventoryService::new(
            inventory_repo.clone(),
            directory.clone(),
            fanout.clone(),
            clock.clone(),
        )),
        merchants: Arc::new(MerchantService::new(
            merchant_repo.clone(),
            directory.clone(),
            clock.clone(),
        )),
        orders: Arc::new(OrderService::new(
            order_repo,
            merchant_repo,
            inventory_repo,
            directory.clone(),
            fanout.clone(),
            clock.clone(),
        )),
        notifications: Arc::new(NotificationService::new(
            notification_repo,
            directory,
            fanout,
            clock,
        )),
    }
}
