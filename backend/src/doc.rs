//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler, the health probes, and the
//! bearer token security scheme. Swagger UI serves it in debug builds and
//! `cargo run --bin openapi-dump` prints it for client generation.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{FamilyMembership, FamilyOverview};
use crate::domain::{
    AddItemOutcome, ClassifiedItem, Error, ErrorCode, Family, FamilyMember, FamilySettings,
    FamilySettingsPatch, Merchant, Notification, NotificationView, Order, UpdateItemOutcome,
};
use crate::inbound::http::families::{AddMemberBody, CreateFamilyRequest, JoinFamilyRequest};
use crate::inbound::http::inventory::{AddItemRequest, UpdateItemRequest};
use crate::inbound::http::merchants::{CreateMerchantRequest, UpdateMerchantRequest};
use crate::inbound::http::notifications::{
    MarkAllReadResponse, SendNotificationBody, UnreadCountResponse,
};
use crate::inbound::http::orders::{
    CreateOrderRequest, OrderLineRequest, RestockOrderRequest, UpdateStatusRequest,
};
use crate::inbound::http::schemas::{
    ItemPageSchema, MerchantPageSchema, NotificationFeedSchema, NotificationPageSchema,
    OrderPageSchema,
};

/// Name of the bearer security scheme.
const BEARER_SCHEME: &str = "BearerToken";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Pantry API",
        description = "Family-shared grocery inventory, merchants, orders and notifications."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::families::create_family,
        crate::inbound::http::families::join_family,
        crate::inbound::http::families::current_family,
        crate::inbound::http::families::update_settings,
        crate::inbound::http::families::add_member,
        crate::inbound::http::families::remove_member,
        crate::inbound::http::families::leave_family,
        crate::inbound::http::inventory::list_items,
        crate::inbound::http::inventory::low_stock_items,
        crate::inbound::http::inventory::expiring_items,
        crate::inbound::http::inventory::add_item,
        crate::inbound::http::inventory::update_item,
        crate::inbound::http::inventory::delete_item,
        crate::inbound::http::merchants::list_merchants,
        crate::inbound::http::merchants::create_merchant,
        crate::inbound::http::merchants::get_merchant,
        crate::inbound::http::merchants::update_merchant,
        crate::inbound::http::merchants::delete_merchant,
        crate::inbound::http::orders::list_orders,
        crate::inbound::http::orders::get_order,
        crate::inbound::http::orders::create_order,
        crate::inbound::http::orders::create_restock_order,
        crate::inbound::http::orders::update_order_status,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::unread_count,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::notifications::mark_all_read,
        crate::inbound::http::notifications::send_notification,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Family,
        FamilyMember,
        FamilySettings,
        FamilySettingsPatch,
        FamilyMembership,
        FamilyOverview,
        CreateFamilyRequest,
        JoinFamilyRequest,
        AddMemberBody,
        ClassifiedItem,
        AddItemOutcome,
        UpdateItemOutcome,
        AddItemRequest,
        UpdateItemRequest,
        ItemPageSchema,
        Merchant,
        CreateMerchantRequest,
        UpdateMerchantRequest,
        MerchantPageSchema,
        Order,
        OrderLineRequest,
        CreateOrderRequest,
        RestockOrderRequest,
        UpdateStatusRequest,
        OrderPageSchema,
        Notification,
        NotificationView,
        NotificationPageSchema,
        NotificationFeedSchema,
        SendNotificationBody,
        UnreadCountResponse,
        MarkAllReadResponse,
    )),
    tags(
        (name = "families", description = "Family membership and settings"),
        (name = "inventory", description = "Shared inventory ledger"),
        (name = "merchants", description = "Family merchant registry"),
        (name = "orders", description = "Orders and restocking"),
        (name = "notifications", description = "Member notification inbox"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
