//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::{ServerConfig, ServerSettings};
#[cfg(feature = "metrics")]
pub use metrics::make_metrics;

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;
use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use pantry::Trace;
#[cfg(debug_assertions)]
use pantry::doc::ApiDoc;
use pantry::inbound::http::families::{
    add_member, create_family, current_family, join_family, leave_family, remove_member,
    update_settings,
};
use pantry::inbound::http::health::{HealthState, live, ready};
use pantry::inbound::http::inventory::{
    add_item, delete_item, expiring_items, list_items, low_stock_items, update_item,
};
use pantry::inbound::http::merchants::{
    create_merchant, delete_merchant, get_merchant, list_merchants, update_merchant,
};
use pantry::inbound::http::notifications::{
    list_notifications, mark_all_read, mark_read, send_notification, unread_count,
};
use pantry::inbound::http::orders::{
    create_order, create_restock_order, get_order, list_orders, update_order_status,
};
use pantry::inbound::http::state::HttpState;
use pantry::inbound::http::validation::{json_config, path_config, query_config};

/// Register every `/api/v1` handler.
///
/// Literal segments such as `/inventory/low-stock` are registered before the
/// `{id}` routes that would otherwise capture them.
fn api_scope() -> actix_web::Scope {
    web::scope("/api/v1")
        .service(create_family)
        .service(join_family)
        .service(leave_family)
        .service(current_family)
        .service(update_settings)
        .service(add_member)
        .service(remove_member)
        .service(list_items)
        .service(low_stock_items)
        .service(expiring_items)
        .service(add_item)
        .service(update_item)
        .service(delete_item)
        .service(list_merchants)
        .service(create_merchant)
        .service(get_merchant)
        .service(update_merchant)
        .service(delete_merchant)
        .service(list_orders)
        .service(create_restock_order)
        .service(create_order)
        .service(get_order)
        .service(update_order_status)
        .service(list_notifications)
        .service(unread_count)
        .service(mark_all_read)
        .service(send_notification)
        .service(mark_read)
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .wrap(Trace)
        .service(api_scope())
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(&config));
    let server_health_state = health_state.clone();
    let ServerConfig {
        bind_addr,
        db_pool: _,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(server_health_state.clone(), http_state.clone());

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
