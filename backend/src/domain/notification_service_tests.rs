//! Tests for notification fan-out and the member inbox.

use std::sync::Arc;

use pagination::{PageRequest, Paginated};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::FamilyRole;
use crate::domain::ports::{
    MockFamilyDirectory, MockFamilyRepository, MockNotificationRepository, MockNotifier,
};
use crate::domain::test_support::{FixedClock, fixed_now, member, membership};

struct Tenant {
    id: FamilyId,
    alice: UserId,
    bob: UserId,
}

#[fixture]
fn family() -> Tenant {
    Tenant {
        id: FamilyId::random(),
        alice: UserId::random(),
        bob: UserId::random(),
    }
}

fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::new(fixed_now()))
}

fn text() -> NotificationText {
    NotificationText::new("Dinner", "Pizza tonight").expect("valid text")
}

fn families_with_members(family: &Tenant) -> MockFamilyRepository {
    let members = vec![
        member(family.id, family.alice, FamilyRole::Owner),
        member(family.id, family.bob, FamilyRole::Member),
    ];
    let mut families = MockFamilyRepository::new();
    families
        .expect_list_members()
        .times(1)
        .return_once(move |_| Ok(members));
    families
}

fn directory_for(family: &Tenant, caller: UserId) -> MockFamilyDirectory {
    let resolved = membership(caller, family.id, FamilyRole::Member);
    let mut directory = MockFamilyDirectory::new();
    directory
        .expect_resolve_membership()
        .returning(move |_| Ok(resolved.clone()));
    directory
}

fn inbox(
    repo: MockNotificationRepository,
    directory: MockFamilyDirectory,
) -> NotificationService<MockNotificationRepository, MockFamilyDirectory, MockNotifier> {
    NotificationService::new(
        Arc::new(repo),
        Arc::new(directory),
        Arc::new(MockNotifier::new()),
        clock(),
    )
}

#[rstest]
#[tokio::test]
async fn fanout_defaults_recipients_to_active_members(family: Tenant) {
    let expected = vec![family.alice, family.bob];
    let mut repo = MockNotificationRepository::new();
    repo.expect_create()
        .withf(move |n: &Notification| n.recipients == expected)
        .times(1)
        .return_once(|_| Ok(()));

    let fanout = NotificationFanout::new(
        Arc::new(repo),
        Arc::new(families_with_members(&family)),
        clock(),
    );
    let created = fanout
        .notify(
            &family.id,
            NewNotification::broadcast(NotificationType::NewItem, text(), json!({})),
        )
        .await
        .expect("fan-out succeeds");

    assert_eq!(created.family_id, family.id);
    assert_eq!(created.sent_at, fixed_now());
    assert_eq!(created.recipients.len(), 2);
}

#[rstest]
#[tokio::test]
async fn fanout_deduplicates_explicit_recipients(family: Tenant) {
    let mut repo = MockNotificationRepository::new();
    repo.expect_create().times(1).return_once(|_| Ok(()));

    let fanout = NotificationFanout::new(
        Arc::new(repo),
        Arc::new(families_with_members(&family)),
        clock(),
    );
    let mut request = NewNotification::broadcast(NotificationType::Custom, text(), json!({}));
    request.recipients = vec![family.bob, family.bob];

    let created = fanout.notify(&family.id, request).await.expect("fan-out");
    assert_eq!(created.recipients, vec![family.bob]);
}

#[rstest]
#[tokio::test]
async fn fanout_rejects_recipients_outside_the_family(family: Tenant) {
    let mut repo = MockNotificationRepository::new();
    repo.expect_create().times(0);

    let fanout = NotificationFanout::new(
        Arc::new(repo),
        Arc::new(families_with_members(&family)),
        clock(),
    );
    let mut request = NewNotification::broadcast(NotificationType::Custom, text(), json!({}));
    request.recipients = vec![family.alice, UserId::random()];

    let err = fanout
        .notify(&family.id, request)
        .await
        .expect_err("stranger rejected");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn list_reports_unread_count(family: Tenant) {
    let caller = family.bob;
    let mut repo = MockNotificationRepository::new();
    repo.expect_list_for_member()
        .withf(move |family_id, user_id, _| *family_id == family.id && *user_id == caller)
        .times(1)
        .return_once(|_, _, page| Ok(Paginated::new(Vec::new(), 0, page)));
    repo.expect_unread_count()
        .times(1)
        .return_once(|_, _| Ok(3));

    let feed = inbox(repo, directory_for(&family, caller))
        .list_notifications(&caller, PageRequest::default())
        .await
        .expect("feed");
    assert_eq!(feed.unread_count, 3);
}

#[rstest]
#[tokio::test]
async fn mark_read_is_repeatable(family: Tenant) {
    let caller = family.alice;
    let notification_id = NotificationId::random();
    let mut repo = MockNotificationRepository::new();
    repo.expect_find_in_family().times(2).returning(move |_, id| {
        Ok(Some(Notification {
            id: *id,
            family_id: family.id,
            kind: NotificationType::Custom,
            title: "t".to_owned(),
            message: "m".to_owned(),
            data: json!({}),
            recipients: vec![caller],
            sent_by: None,
            sent_at: fixed_now(),
        }))
    });
    repo.expect_mark_read()
        .withf(move |id, user, read_at| {
            *id == notification_id && *user == caller && *read_at == fixed_now()
        })
        .times(2)
        .returning(|_, _, _| Ok(()));

    let service = inbox(repo, directory_for(&family, caller));
    service
        .mark_read(&caller, &notification_id)
        .await
        .expect("first read");
    service
        .mark_read(&caller, &notification_id)
        .await
        .expect("second read is harmless");
}

#[rstest]
#[tokio::test]
async fn mark_read_hides_notifications_of_other_families(family: Tenant) {
    let caller = family.bob;
    let mut repo = MockNotificationRepository::new();
    repo.expect_find_in_family()
        .withf(move |family_id, _| *family_id == family.id)
        .times(1)
        .return_once(|_, _| Ok(None));
    repo.expect_mark_read().times(0);

    let err = inbox(repo, directory_for(&family, caller))
        .mark_read(&caller, &NotificationId::random())
        .await
        .expect_err("not visible");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn inbox_requires_membership() {
    let mut directory = MockFamilyDirectory::new();
    directory
        .expect_resolve_membership()
        .times(1)
        .return_once(|_| Err(Error::not_part_of_family()));
    let mut repo = MockNotificationRepository::new();
    repo.expect_unread_count().times(0);

    let err = inbox(repo, directory)
        .unread_count(&UserId::random())
        .await
        .expect_err("no family");
    assert_eq!(err.code(), ErrorCode::NotPartOfFamily);
}

#[rstest]
#[tokio::test]
async fn repository_outage_maps_to_service_unavailable(family: Tenant) {
    let caller = family.alice;
    let mut repo = MockNotificationRepository::new();
    repo.expect_mark_all_read()
        .times(1)
        .return_once(|_, _, _| Err(NotificationRepositoryError::connection("refused")));

    let err = inbox(repo, directory_for(&family, caller))
        .mark_all_read(&caller)
        .await
        .expect_err("outage");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn send_marks_sender_and_custom_type(family: Tenant) {
    let caller = family.alice;
    let mut notifier = MockNotifier::new();
    notifier
        .expect_notify()
        .withf(move |family_id, n: &NewNotification| {
            *family_id == family.id
                && n.kind == NotificationType::Custom
                && n.sent_by == Some(caller)
        })
        .times(1)
        .return_once(move |family_id, n| {
            Ok(Notification {
                id: NotificationId::random(),
                family_id: *family_id,
                kind: n.kind,
                title: n.text.title().to_owned(),
                message: n.text.message().to_owned(),
                data: n.data,
                recipients: vec![caller],
                sent_by: n.sent_by,
                sent_at: fixed_now(),
            })
        });

    let service = NotificationService::new(
        Arc::new(MockNotificationRepository::new()),
        Arc::new(directory_for(&family, caller)),
        Arc::new(notifier),
        clock(),
    );
    let sent = service
        .send(
            &caller,
            SendNotificationRequest {
                text: text(),
                recipients: Vec::new(),
                data: json!({ "note": "bring drinks" }),
            },
        )
        .await
        .expect("sent");
    assert_eq!(sent.title, "Dinner");
}

#[tokio::test]
async fn notify_quietly_swallows_failures() {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_notify()
        .times(1)
        .return_once(|_, _| Err(Error::service_unavailable("down")));

    notify_quietly(
        &notifier,
        &FamilyId::random(),
        NotificationType::LowStock,
        "Low stock",
        "Milk is running low".to_owned(),
        json!({}),
    )
    .await;
}
