//! Test helpers for inbound HTTP components.

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::{AUTHORIZATION, HeaderName};
use actix_web::{App, web};

use crate::domain::UserId;

use super::state::HttpState;
use super::validation::{json_config, path_config, query_config};

/// Build an app carrying `state` and the same extractor settings as the
/// server. Callers add the handlers under test.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
}

/// `Authorization` header accepted by the fixture token verifier.
pub fn bearer(user_id: &UserId) -> (HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {user_id}"))
}
