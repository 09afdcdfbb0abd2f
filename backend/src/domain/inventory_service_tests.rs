//! Tests for the inventory ledger service.

use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};
use pagination::PageRequest;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockFamilyDirectory, MockInventoryRepository, MockNotifier};
use crate::domain::test_support::{FixedClock, fixed_now, item, membership, today};
use crate::domain::{
    ErrorCode, ExpiryStatus, FamilyId, FamilyRole, ItemCategory, ItemField, ItemName, ItemUnit,
    NewNotification,
};

type Service = InventoryService<MockInventoryRepository, MockFamilyDirectory, MockNotifier>;

struct Harness {
    family_id: FamilyId,
    caller: UserId,
    settings: FamilySettings,
    items: MockInventoryRepository,
    notifier: MockNotifier,
}

impl Harness {
    fn into_service(self) -> Service {
        let mut resolved = membership(self.caller, self.family_id, FamilyRole::Member);
        resolved.settings = self.settings;
        let mut directory = MockFamilyDirectory::new();
        directory
            .expect_resolve_membership()
            .returning(move |_| Ok(resolved.clone()));
        InventoryService::new(
            Arc::new(self.items),
            Arc::new(directory),
            Arc::new(self.notifier),
            Arc::new(FixedClock::new(fixed_now())),
        )
    }
}

#[fixture]
fn harness() -> Harness {
    Harness {
        family_id: FamilyId::random(),
        caller: UserId::random(),
        settings: FamilySettings::default(),
        items: MockInventoryRepository::new(),
        notifier: MockNotifier::new(),
    }
}

fn new_item(name: &str, quantity: u32) -> NewInventoryItem {
    NewInventoryItem {
        name: ItemName::new(name).expect("valid name"),
        quantity,
        unit: ItemUnit::default(),
        category: ItemCategory::Dairy,
        barcode: None,
        expiry_date: None,
        image_url: None,
        notes: None,
    }
}

fn days_from_today(days: i64) -> Option<NaiveDate> {
    Some(today() + TimeDelta::days(days))
}

#[rstest]
#[tokio::test]
async fn add_item_builds_candidate_in_callers_family(mut harness: Harness) {
    let family_id = harness.family_id;
    let caller = harness.caller;
    harness
        .items
        .expect_add_or_merge()
        .withf(move |c: &InventoryItem| {
            c.family_id == family_id
                && c.created_by == caller
                && c.quantity == 2
                && c.lifecycle == ItemLifecycle::Active
                && c.created_at == fixed_now()
        })
        .times(1)
        .returning(|candidate| {
            Ok(AddItemOutcome {
                item: candidate.clone(),
                is_duplicate: false,
                previous_quantity: None,
            })
        });
    harness
        .notifier
        .expect_notify()
        .withf(move |fid, n: &NewNotification| {
            *fid == family_id && n.kind == NotificationType::NewItem && n.recipients.is_empty()
        })
        .times(1)
        .returning(|_, _| Err(Error::internal("not under test")));

    let outcome = harness
        .into_service()
        .add_item(&caller, new_item("Milk", 2))
        .await
        .expect("item added");

    assert!(!outcome.is_duplicate);
    assert_eq!(outcome.previous_quantity, None);
}

#[rstest]
#[tokio::test]
async fn merge_reports_previous_quantity_without_notifying(mut harness: Harness) {
    let family_id = harness.family_id;
    let caller = harness.caller;
    harness.items.expect_add_or_merge().times(1).return_once(move |_| {
        let mut existing = item(family_id, "Milk", 5);
        existing.quantity = 8;
        Ok(AddItemOutcome {
            item: existing,
            is_duplicate: true,
            previous_quantity: Some(5),
        })
    });
    harness.notifier.expect_notify().never();

    let outcome = harness
        .into_service()
        .add_item(&caller, new_item("milk", 3))
        .await
        .expect("merged");

    assert!(outcome.is_duplicate);
    assert_eq!(outcome.previous_quantity, Some(5));
    assert_eq!(outcome.item.quantity, 8);
}

#[rstest]
#[tokio::test]
async fn new_item_notification_respects_settings(mut harness: Harness) {
    harness.settings.notify_new_items = false;
    let caller = harness.caller;
    harness
        .items
        .expect_add_or_merge()
        .returning(|candidate| {
            Ok(AddItemOutcome {
                item: candidate.clone(),
                is_duplicate: false,
                previous_quantity: None,
            })
        });
    harness.notifier.expect_notify().never();

    harness
        .into_service()
        .add_item(&caller, new_item("Bread", 1))
        .await
        .expect("item added");
}

#[rstest]
#[tokio::test]
async fn empty_patch_is_rejected(harness: Harness) {
    let caller = harness.caller;
    let err = harness
        .into_service()
        .update_item(&caller, &ItemId::random(), ItemPatch::default())
        .await
        .expect_err("empty patch");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn update_of_missing_item_is_not_found(mut harness: Harness) {
    let caller = harness.caller;
    harness
        .items
        .expect_update()
        .times(1)
        .return_once(|_, _, _, _| Ok(None));
    harness.notifier.expect_notify().never();

    let patch = ItemPatch {
        quantity: Some(1),
        ..ItemPatch::default()
    };
    let err = harness
        .into_service()
        .update_item(&caller, &ItemId::random(), patch)
        .await
        .expect_err("missing item");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(5, 1, true)]
#[case(5, 0, true)]
#[case(5, 2, false)]
#[case(1, 0, false)]
#[tokio::test]
async fn low_stock_fires_only_when_crossing_threshold(
    mut harness: Harness,
    #[case] before: u32,
    #[case] after: u32,
    #[case] fires: bool,
) {
    let family_id = harness.family_id;
    let caller = harness.caller;
    let previous = item(family_id, "Eggs", before);
    let item_id = previous.id;
    harness
        .items
        .expect_update()
        .withf(move |fid, iid, patch: &ItemPatch, at| {
            *fid == family_id && *iid == item_id && patch.quantity == Some(after) && *at == fixed_now()
        })
        .times(1)
        .return_once(move |_, _, _, _| {
            let mut current = previous.clone();
            current.quantity = after;
            Ok(Some(ItemRevision { previous, current }))
        });
    harness
        .notifier
        .expect_notify()
        .withf(|_, n: &NewNotification| n.kind == NotificationType::LowStock)
        .times(usize::from(fires))
        .returning(|_, _| Err(Error::internal("not under test")));

    let patch = ItemPatch {
        quantity: Some(after),
        ..ItemPatch::default()
    };
    let outcome = harness
        .into_service()
        .update_item(&caller, &item_id, patch)
        .await
        .expect("updated");

    assert_eq!(outcome.item.quantity, after);
    assert_eq!(outcome.updated, vec![ItemField::Quantity]);
}

#[rstest]
#[tokio::test]
async fn update_reports_only_changed_fields(mut harness: Harness) {
    let family_id = harness.family_id;
    let caller = harness.caller;
    let previous = item(family_id, "Cheese", 3);
    let item_id = previous.id;
    harness.items.expect_update().return_once(move |_, _, _, _| {
        let mut current = previous.clone();
        current.category = ItemCategory::Dairy;
        Ok(Some(ItemRevision { previous, current }))
    });
    harness.notifier.expect_notify().never();

    let patch = ItemPatch {
        quantity: Some(3),
        category: Some(ItemCategory::Dairy),
        ..ItemPatch::default()
    };
    let outcome = harness
        .into_service()
        .update_item(&caller, &item_id, patch)
        .await
        .expect("updated");

    assert_eq!(outcome.updated, vec![ItemField::Category]);
}

#[rstest]
#[tokio::test]
async fn rename_onto_existing_name_conflicts(mut harness: Harness) {
    let caller = harness.caller;
    let item_id = ItemId::random();
    harness
        .items
        .expect_update()
        .return_once(|_, _, _, _| Err(InventoryRepositoryError::duplicate_name("Milk")));

    let patch = ItemPatch {
        name: Some(ItemName::new("Milk").expect("valid name")),
        ..ItemPatch::default()
    };
    let err = harness
        .into_service()
        .update_item(&caller, &item_id, patch)
        .await
        .expect_err("duplicate name");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn delete_maps_missing_rows_to_not_found(mut harness: Harness, #[case] existed: bool) {
    let caller = harness.caller;
    harness
        .items
        .expect_soft_delete()
        .times(1)
        .return_once(move |_, _, _| Ok(existed));

    let result = harness
        .into_service()
        .delete_item(&caller, &ItemId::random())
        .await;

    match result {
        Ok(()) => assert!(existed),
        Err(err) => {
            assert!(!existed);
            assert_eq!(err.code(), ErrorCode::NotFound);
        }
    }
}

#[rstest]
#[tokio::test]
async fn list_classifies_items_for_today(mut harness: Harness) {
    let family_id = harness.family_id;
    let caller = harness.caller;
    harness
        .items
        .expect_list()
        .withf(move |fid, _| *fid == family_id)
        .return_once(move |fid, query: &ItemListQuery| {
            let mut expired = item(*fid, "Yoghurt", 4);
            expired.expiry_date = days_from_today(-1);
            let mut expiring = item(*fid, "Milk", 1);
            expiring.expiry_date = days_from_today(1);
            let fresh = item(*fid, "Rice", 9);
            Ok(Paginated::new(vec![expired, expiring, fresh], 3, query.page))
        });

    let page = harness
        .into_service()
        .list_items(&caller, ItemListQuery::default())
        .await
        .expect("listed");

    let statuses: Vec<_> = page
        .items
        .iter()
        .map(|c| (c.expiry_status, c.is_low_stock))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (ExpiryStatus::Expired, false),
            (ExpiryStatus::Expiring, true),
            (ExpiryStatus::Fresh, false),
        ]
    );
    assert_eq!(page.total_count, 3);
    assert_eq!(page.page, PageRequest::default().page());
}

#[rstest]
#[tokio::test]
async fn low_stock_uses_family_threshold(mut harness: Harness) {
    harness.settings.low_stock_threshold = 4;
    let caller = harness.caller;
    harness
        .items
        .expect_list_low_stock()
        .withf(|_, threshold| *threshold == 4)
        .times(1)
        .return_once(|fid, _| Ok(vec![item(*fid, "Tea", 2)]));

    let items = harness
        .into_service()
        .low_stock_items(&caller)
        .await
        .expect("listed");

    assert_eq!(items.len(), 1);
    assert!(items[0].is_low_stock);
}

#[rstest]
#[tokio::test]
async fn expiring_uses_warning_window(mut harness: Harness) {
    harness.settings.expiry_warning_days = 5;
    let caller = harness.caller;
    let cutoff = today() + TimeDelta::days(5);
    harness
        .items
        .expect_list_expiring()
        .withf(move |_, c| *c == cutoff)
        .times(1)
        .return_once(|fid, _| {
            let mut soon = item(*fid, "Ham", 3);
            soon.expiry_date = days_from_today(4);
            Ok(vec![soon])
        });

    let items = harness
        .into_service()
        .expiring_items(&caller)
        .await
        .expect("listed");

    assert_eq!(items[0].expiry_status, ExpiryStatus::Expiring);
}

#[rstest]
#[tokio::test]
async fn outage_is_service_unavailable(mut harness: Harness) {
    let caller = harness.caller;
    harness
        .items
        .expect_list_low_stock()
        .return_once(|_, _| Err(InventoryRepositoryError::connection("pool timed out")));

    let err = harness
        .into_service()
        .low_stock_items(&caller)
        .await
        .expect_err("outage");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[case(5, 1, 1, true)]
#[case(1, 0, 1, false)]
#[case(2, 2, 1, false)]
#[case(3, 3, 3, false)]
fn crossing_detection(
    #[case] before: u32,
    #[case] after: u32,
    #[case] threshold: u32,
    #[case] expected: bool,
) {
    assert_eq!(crossed_into_low_stock(before, after, threshold), expected);
}
