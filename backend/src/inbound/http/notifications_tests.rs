//! Tests for the notification handlers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test;
use pagination::{PageRequest, Paginated};
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::domain::ports::MockNotificationCenter;
use crate::domain::test_support::fixed_now;
use crate::domain::{FamilyId, NotificationType, NotificationView};
use crate::inbound::http::test_utils::{bearer, test_app};

fn notification(recipients: Vec<UserId>) -> Notification {
    Notification {
        id: NotificationId::random(),
        family_id: FamilyId::random(),
        kind: NotificationType::Custom,
        title: "Dinner".to_owned(),
        message: "Pizza tonight".to_owned(),
        data: Value::Null,
        recipients,
        sent_by: None,
        sent_at: fixed_now(),
    }
}

macro_rules! app {
    ($center:expr) => {
        test::init_service(
            test_app(HttpState {
                notifications: Arc::new($center),
                ..HttpState::fixtures()
            })
            .service(
                web::scope("/api/v1")
                    .service(list_notifications)
                    .service(unread_count)
                    .service(mark_all_read)
                    .service(send_notification)
                    .service(mark_read),
            ),
        )
        .await
    };
}

#[actix_web::test]
async fn feed_carries_read_state_and_unread_count() {
    let caller = UserId::random();
    let mut center = MockNotificationCenter::new();
    center
        .expect_list_notifications()
        .withf(move |user, page| *user == caller && page.page() == 1)
        .return_once(move |_, page: PageRequest| {
            let view = NotificationView {
                notification: notification(vec![caller]),
                is_read: false,
                read_at: None,
            };
            Ok(NotificationFeed {
                notifications: Paginated::new(vec![view], 1, page),
                unread_count: 1,
            })
        });
    let app = app!(center);

    let request = test::TestRequest::get()
        .uri("/api/v1/notifications")
        .insert_header(bearer(&caller))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(body["unreadCount"], 1);
    assert_eq!(body["notifications"]["items"][0]["isRead"], false);
    assert_eq!(body["notifications"]["items"][0]["type"], "custom");
}

#[actix_web::test]
async fn unread_count_is_wrapped_in_an_object() {
    let mut center = MockNotificationCenter::new();
    center.expect_unread_count().return_once(|_| Ok(4));
    let app = app!(center);

    let request = test::TestRequest::get()
        .uri("/api/v1/notifications/unread-count")
        .insert_header(bearer(&UserId::random()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(body, json!({ "unreadCount": 4 }));
}

#[actix_web::test]
async fn read_all_reports_how_many_were_marked() {
    let mut center = MockNotificationCenter::new();
    center.expect_mark_all_read().return_once(|_| Ok(0));
    let app = app!(center);

    let request = test::TestRequest::post()
        .uri("/api/v1/notifications/read-all")
        .insert_header(bearer(&UserId::random()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(body, json!({ "marked": 0 }));
}

#[actix_web::test]
async fn mark_read_forwards_the_identifier() {
    let notification_id = NotificationId::random();
    let mut center = MockNotificationCenter::new();
    center
        .expect_mark_read()
        .withf(move |_, id| *id == notification_id)
        .times(2)
        .returning(|_, _| Ok(()));
    let app = app!(center);
    let caller = UserId::random();

    for _ in 0..2 {
        let request = test::TestRequest::post()
            .uri(&format!("/api/v1/notifications/{notification_id}/read"))
            .insert_header(bearer(&caller))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[actix_web::test]
async fn send_deduplicates_recipients() {
    let member = UserId::random();
    let mut center = MockNotificationCenter::new();
    center
        .expect_send()
        .withf(move |_, request| {
            request.recipients == vec![member]
                && request.text.title() == "Dinner"
                && request.data == json!({ "meal": "pizza" })
        })
        .return_once(move |_, _| Ok(notification(vec![member])));
    let app = app!(center);

    let request = test::TestRequest::post()
        .uri("/api/v1/notifications/send")
        .insert_header(bearer(&UserId::random()))
        .set_json(json!({
            "title": "Dinner",
            "message": "Pizza tonight",
            "recipients": [member.to_string(), member.to_string()],
            "data": { "meal": "pizza" }
        }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[rstest]
#[case(json!({ "title": "", "message": "hi" }), "title")]
#[case(json!({ "title": "Hi", "message": " " }), "message")]
#[case(json!({ "title": "Hi", "message": "hi", "recipients": ["bob"] }), "recipients")]
#[actix_web::test]
async fn send_rejects_invalid_bodies(#[case] body: Value, #[case] field: &str) {
    let mut center = MockNotificationCenter::new();
    center.expect_send().never();
    let app = app!(center);

    let request = test::TestRequest::post()
        .uri("/api/v1/notifications/send")
        .insert_header(bearer(&UserId::random()))
        .set_json(body)
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload: Value = test::read_body_json(response).await;
    assert_eq!(payload["details"]["field"], field);
}

#[actix_web::test]
async fn recipients_outside_the_family_are_rejected() {
    let mut center = MockNotificationCenter::new();
    center
        .expect_send()
        .return_once(|_, _| Err(Error::invalid_request("recipients must be active family members")));
    let app = app!(center);

    let request = test::TestRequest::post()
        .uri("/api/v1/notifications/send")
        .insert_header(bearer(&UserId::random()))
        .set_json(json!({
            "title": "Hi",
            "message": "hello",
            "recipients": [UserId::random().to_string()]
        }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
