//! OpenAPI schema definitions for paginated requests and responses.
//!
//! [`pagination::Paginated`] lives in a framework-free crate and does not
//! derive `ToSchema`. The wrappers here describe each concrete page shape
//! for the generated document; handlers still serialise the real envelope.

use pagination::PageRequest;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ClassifiedItem, Merchant, NotificationView, Order};

/// Pagination parameters shared by list endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size, capped at 100.
    pub limit: Option<u32>,
}

impl From<PageParams> for PageRequest {
    fn from(params: PageParams) -> Self {
        Self::new(params.page, params.limit)
    }
}

/// Page of inventory items.
#[derive(ToSchema)]
#[schema(as = ItemPage, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ItemPageSchema {
    items: Vec<ClassifiedItem>,
    /// Matching items across all pages.
    #[schema(example = 42)]
    total_count: u64,
    /// One-based page number.
    #[schema(example = 1)]
    page: u32,
    has_more: bool,
}

/// Page of merchants.
#[derive(ToSchema)]
#[schema(as = MerchantPage, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct MerchantPageSchema {
    items: Vec<Merchant>,
    total_count: u64,
    page: u32,
    has_more: bool,
}

/// Page of orders, newest first.
#[derive(ToSchema)]
#[schema(as = OrderPage, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct OrderPageSchema {
    items: Vec<Order>,
    total_count: u64,
    page: u32,
    has_more: bool,
}

/// Page of notifications as seen by the caller.
#[derive(ToSchema)]
#[schema(as = NotificationPage, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct NotificationPageSchema {
    items: Vec<NotificationView>,
    total_count: u64,
    page: u32,
    has_more: bool,
}

/// Notification page together with the caller's unread count.
#[derive(ToSchema)]
#[schema(as = NotificationFeed, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct NotificationFeedSchema {
    notifications: NotificationPageSchema,
    #[schema(example = 3)]
    unread_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[rstest]
    fn page_schemas_use_envelope_field_names() {
        let schema_json = schema_to_json::<ItemPageSchema>();
        for field in ["items", "totalCount", "page", "hasMore"] {
            assert!(schema_json.contains(field), "missing {field}");
        }
    }

    #[rstest]
    fn schema_names_drop_the_suffix() {
        assert_eq!(ItemPageSchema::name(), "ItemPage");
        assert_eq!(NotificationFeedSchema::name(), "NotificationFeed");
    }

    #[rstest]
    #[case(None, None, 1, 20)]
    #[case(Some(0), Some(500), 1, 100)]
    #[case(Some(4), Some(10), 4, 10)]
    fn page_params_normalise(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] expected_page: u32,
        #[case] expected_limit: u32,
    ) {
        let request = PageRequest::from(PageParams { page, limit });
        assert_eq!(request.page(), expected_page);
        assert_eq!(request.limit(), expected_limit);
    }

    #[rstest]
    fn feed_schema_carries_unread_count() {
        let schema_json = schema_to_json::<NotificationFeedSchema>();
        assert!(schema_json.contains("unreadCount"));
    }
}
