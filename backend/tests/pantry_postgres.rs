//! End-to-end flows through the domain services and Diesel adapters.
//!
//! Each test provisions its own database cloned from the migration template,
//! seeds users directly, and then drives the family directory, inventory
//! ledger and notification inbox exactly as the HTTP layer would.

use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future::join_all;
use mockable::{Clock, DefaultClock};
use pagination::PageRequest;
use pantry::domain::ports::{
    FamilyDirectory, InventoryLedger, NotificationCenter, SendNotificationRequest,
};
use pantry::domain::{
    ErrorCode, FamilyName, FamilyService, InventoryService, ItemCategory, ItemListQuery, ItemName,
    ItemSortBy, ItemUnit, NewInventoryItem, NotificationFanout, NotificationService,
    NotificationText, SortOrder, UserId,
};
use pantry::outbound::persistence::{
    DbPool, DieselFamilyRepository, DieselInventoryRepository, DieselNotificationRepository,
    DieselUserRepository, PoolConfig,
};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use serde_json::json;
use tokio::runtime::Runtime;
use uuid::Uuid;

mod support;

use support::embedded_postgres::seed_user;
use support::{handle_cluster_setup_failure, provision_template_database, shared_cluster};

type Fanout = NotificationFanout<DieselNotificationRepository, DieselFamilyRepository>;
type Directory = FamilyService<DieselFamilyRepository, DieselUserRepository, Fanout>;
type Ledger = InventoryService<DieselInventoryRepository, Directory, Fanout>;
type Inbox = NotificationService<DieselNotificationRepository, Directory, Fanout>;

struct TestContext {
    runtime: Runtime,
    directory: Arc<Directory>,
    ledger: Ledger,
    inbox: Inbox,
    users: Vec<UserId>,
    _database: TemporaryDatabase,
}

const SEEDED_USERS: [(&str, &str); 3] = [
    ("Ada", "+15550100001"),
    ("Grace", "+15550100002"),
    ("Linus", "+15550100003"),
];

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let temp_db = provision_template_database(cluster)?;
    let database_url = temp_db.url().to_owned();

    let mut users = Vec::with_capacity(SEEDED_USERS.len());
    for (name, phone) in SEEDED_USERS {
        let id = Uuid::new_v4();
        seed_user(&database_url, id, name, phone)?;
        users.push(UserId::new(id));
    }

    let config = PoolConfig::new(database_url.as_str())
        .with_max_size(4)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let families = Arc::new(DieselFamilyRepository::new(pool.clone()));
    let notifications = Arc::new(DieselNotificationRepository::new(pool.clone()));
    let fanout = Arc::new(NotificationFanout::new(
        notifications.clone(),
        families.clone(),
        clock.clone(),
    ));
    let directory = Arc::new(FamilyService::new(
        families,
        Arc::new(DieselUserRepository::new(pool.clone())),
        fanout.clone(),
        clock.clone(),
    ));
    let ledger = InventoryService::new(
        Arc::new(DieselInventoryRepository::new(pool)),
        directory.clone(),
        fanout.clone(),
        clock.clone(),
    );
    let inbox = NotificationService::new(notifications, directory.clone(), fanout, clock);

    Ok(TestContext {
        runtime,
        directory,
        ledger,
        inbox,
        users,
        _database: temp_db,
    })
}

#[fixture]
fn context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn family_name(raw: &str) -> FamilyName {
    FamilyName::new(raw).expect("valid family name")
}

fn new_item(name: &str, quantity: u32) -> NewInventoryItem {
    NewInventoryItem {
        name: ItemName::new(name).expect("valid item name"),
        quantity,
        unit: ItemUnit::default(),
        category: ItemCategory::Dairy,
        barcode: None,
        expiry_date: None,
        image_url: None,
        notes: None,
    }
}

#[rstest]
fn adding_an_existing_name_merges_ignoring_case(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: adding_an_existing_name_merges_ignoring_case skipped");
        return;
    };
    let owner = ctx.users[0];

    ctx.runtime.block_on(async {
        ctx.directory
            .create_family(&owner, family_name("Lovelace"))
            .await
            .expect("create family");

        let first = ctx
            .ledger
            .add_item(&owner, new_item("Milk", 2))
            .await
            .expect("add milk");
        assert!(!first.is_duplicate);
        assert_eq!(first.previous_quantity, None);

        let merged = ctx
            .ledger
            .add_item(&owner, new_item("  MILK ", 3))
            .await
            .expect("merge milk");
        assert!(merged.is_duplicate);
        assert_eq!(merged.previous_quantity, Some(2));
        assert_eq!(merged.item.id, first.item.id);
        assert_eq!(merged.item.quantity, 5);
        assert_eq!(merged.item.name.as_ref(), "Milk");

        let page = ctx
            .ledger
            .list_items(&owner, ItemListQuery::default())
            .await
            .expect("list items");
        assert_eq!(page.total_count, 1);
    });
}

#[rstest]
fn concurrent_adds_of_one_name_collapse_into_one_item(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_adds_of_one_name_collapse_into_one_item skipped");
        return;
    };
    let owner = ctx.users[0];

    ctx.runtime.block_on(async {
        ctx.directory
            .create_family(&owner, family_name("Lovelace"))
            .await
            .expect("create family");

        let adds = [("Milk", 1), ("milk", 2), ("MILK", 3)]
            .into_iter()
            .map(|(name, quantity)| ctx.ledger.add_item(&owner, new_item(name, quantity)));
        let outcomes: Vec<_> = join_all(adds)
            .await
            .into_iter()
            .map(|outcome| outcome.expect("concurrent add"))
            .collect();

        let inserted = outcomes.iter().filter(|o| !o.is_duplicate).count();
        assert_eq!(inserted, 1, "exactly one add creates the row");
        let first_id = outcomes.first().map(|o| o.item.id).expect("outcome");
        assert!(outcomes.iter().all(|o| o.item.id == first_id));

        let page = ctx
            .ledger
            .list_items(&owner, ItemListQuery::default())
            .await
            .expect("list items");
        assert_eq!(page.total_count, 1);
        let milk = page.items.first().expect("merged item");
        assert_eq!(milk.item.quantity, 6);
    });
}

#[rstest]
fn names_that_grow_when_lowercased_are_stored(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: names_that_grow_when_lowercased_are_stored skipped");
        return;
    };
    let owner = ctx.users[0];
    let name = "\u{130}".repeat(100);

    ctx.runtime.block_on(async {
        ctx.directory
            .create_family(&owner, family_name("Lovelace"))
            .await
            .expect("create family");

        let first = ctx
            .ledger
            .add_item(&owner, new_item(&name, 1))
            .await
            .expect("add long dotted name");
        let again = ctx
            .ledger
            .add_item(&owner, new_item(&name, 1))
            .await
            .expect("merge long dotted name");
        assert!(again.is_duplicate);
        assert_eq!(again.item.id, first.item.id);
        assert_eq!(again.item.quantity, 2);
    });
}

#[rstest]
#[case(SortOrder::Asc, ["Yoghurt", "Cream", "Honey"])]
#[case(SortOrder::Desc, ["Cream", "Yoghurt", "Honey"])]
fn items_without_expiry_sort_last(
    context: Option<TestContext>,
    #[case] order: SortOrder,
    #[case] expected: [&str; 3],
) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: items_without_expiry_sort_last skipped");
        return;
    };
    let owner = ctx.users[0];
    let date = |day| NaiveDate::from_ymd_opt(2030, 1, day).expect("valid date");

    ctx.runtime.block_on(async {
        ctx.directory
            .create_family(&owner, family_name("Lovelace"))
            .await
            .expect("create family");
        let stock = [
            ("Honey", None),
            ("Cream", Some(date(20))),
            ("Yoghurt", Some(date(5))),
        ];
        for (name, expiry) in stock {
            let mut item = new_item(name, 4);
            item.expiry_date = expiry;
            ctx.ledger.add_item(&owner, item).await.expect("add item");
        }

        let query = ItemListQuery {
            sort_by: ItemSortBy::ExpiryDate,
            sort_order: order,
            ..ItemListQuery::default()
        };
        let page = ctx
            .ledger
            .list_items(&owner, query)
            .await
            .expect("list items");
        let names: Vec<&str> = page.items.iter().map(|i| i.item.name.as_ref()).collect();
        assert_eq!(names, expected);
    });
}

#[rstest]
fn single_eggs_lead_quantity_order_and_are_low_stock(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: single_eggs_lead_quantity_order_and_are_low_stock skipped");
        return;
    };
    let owner = ctx.users[0];

    ctx.runtime.block_on(async {
        let created = ctx
            .directory
            .create_family(&owner, family_name("Lovelace"))
            .await
            .expect("create family");
        assert_eq!(created.family.settings.low_stock_threshold, 1);

        for (name, quantity) in [("Milk", 3), ("Eggs", 1), ("Bread", 2)] {
            ctx.ledger
                .add_item(&owner, new_item(name, quantity))
                .await
                .expect("add item");
        }

        let query = ItemListQuery {
            sort_by: ItemSortBy::Quantity,
            sort_order: SortOrder::Asc,
            ..ItemListQuery::default()
        };
        let page = ctx
            .ledger
            .list_items(&owner, query)
            .await
            .expect("list items");
        let eggs = page.items.first().expect("first item");
        assert_eq!(eggs.item.name.as_ref(), "Eggs");
        assert!(eggs.is_low_stock);
        assert!(page.items.iter().skip(1).all(|i| !i.is_low_stock));

        let low = ctx
            .ledger
            .low_stock_items(&owner)
            .await
            .expect("low stock");
        let names: Vec<&str> = low.iter().map(|i| i.item.name.as_ref()).collect();
        assert_eq!(names, vec!["Eggs"]);
    });
}

#[rstest]
fn deleted_items_do_not_absorb_new_adds(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: deleted_items_do_not_absorb_new_adds skipped");
        return;
    };
    let owner = ctx.users[0];

    ctx.runtime.block_on(async {
        ctx.directory
            .create_family(&owner, family_name("Lovelace"))
            .await
            .expect("create family");
        let first = ctx
            .ledger
            .add_item(&owner, new_item("Eggs", 6))
            .await
            .expect("add eggs");
        ctx.ledger
            .delete_item(&owner, &first.item.id)
            .await
            .expect("delete eggs");

        let again = ctx
            .ledger
            .add_item(&owner, new_item("eggs", 12))
            .await
            .expect("re-add eggs");
        assert!(!again.is_duplicate);
        assert_ne!(again.item.id, first.item.id);
        assert_eq!(again.item.quantity, 12);
    });
}

#[rstest]
fn families_cannot_reach_each_others_items(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: families_cannot_reach_each_others_items skipped");
        return;
    };
    let (first_owner, second_owner) = (ctx.users[0], ctx.users[1]);

    ctx.runtime.block_on(async {
        ctx.directory
            .create_family(&first_owner, family_name("Lovelace"))
            .await
            .expect("create first family");
        ctx.directory
            .create_family(&second_owner, family_name("Hopper"))
            .await
            .expect("create second family");

        let item = ctx
            .ledger
            .add_item(&first_owner, new_item("Butter", 1))
            .await
            .expect("add butter")
            .item;

        let page = ctx
            .ledger
            .list_items(&second_owner, ItemListQuery::default())
            .await
            .expect("list second family");
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());

        let err = ctx
            .ledger
            .delete_item(&second_owner, &item.id)
            .await
            .expect_err("foreign item must be invisible");
        assert_eq!(err.code(), ErrorCode::NotFound);

        let low_stock = ctx
            .ledger
            .low_stock_items(&second_owner)
            .await
            .expect("low stock for second family");
        assert!(low_stock.is_empty());
    });
}

#[rstest]
fn a_user_holds_one_active_membership(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: a_user_holds_one_active_membership skipped");
        return;
    };
    let (first_owner, second_owner, joiner) = (ctx.users[0], ctx.users[1], ctx.users[2]);

    ctx.runtime.block_on(async {
        let first = ctx
            .directory
            .create_family(&first_owner, family_name("Lovelace"))
            .await
            .expect("create first family");
        let second = ctx
            .directory
            .create_family(&second_owner, family_name("Hopper"))
            .await
            .expect("create second family");
        assert_ne!(first.family.invite_code, second.family.invite_code);

        ctx.directory
            .join_family(&joiner, first.family.invite_code.clone())
            .await
            .expect("join first family");

        let err = ctx
            .directory
            .join_family(&joiner, second.family.invite_code.clone())
            .await
            .expect_err("second membership must be rejected");
        assert_eq!(err.code(), ErrorCode::Conflict);

        ctx.directory
            .leave_family(&joiner)
            .await
            .expect("leave first family");
        let joined = ctx
            .directory
            .join_family(&joiner, second.family.invite_code.clone())
            .await
            .expect("join second family after leaving");
        assert_eq!(joined.family.id, second.family.id);

        let overview = ctx
            .directory
            .family_overview(&first_owner)
            .await
            .expect("first family overview");
        assert_eq!(overview.members.len(), 1, "departed members are hidden");
    });
}

#[rstest]
fn read_state_is_tracked_per_recipient(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: read_state_is_tracked_per_recipient skipped");
        return;
    };
    let (owner, member) = (ctx.users[0], ctx.users[1]);

    ctx.runtime.block_on(async {
        let created = ctx
            .directory
            .create_family(&owner, family_name("Lovelace"))
            .await
            .expect("create family");
        ctx.directory
            .join_family(&member, created.family.invite_code.clone())
            .await
            .expect("join family");

        let owner_before = ctx.inbox.unread_count(&owner).await.expect("owner count");
        let member_before = ctx.inbox.unread_count(&member).await.expect("member count");

        let sent = ctx
            .inbox
            .send(
                &owner,
                SendNotificationRequest {
                    text: NotificationText::new("Dinner", "Pizza tonight").expect("valid text"),
                    recipients: Vec::new(),
                    data: json!({}),
                },
            )
            .await
            .expect("send broadcast");

        assert_eq!(
            ctx.inbox.unread_count(&owner).await.expect("owner count"),
            owner_before + 1
        );
        assert_eq!(
            ctx.inbox.unread_count(&member).await.expect("member count"),
            member_before + 1
        );

        ctx.inbox
            .mark_read(&member, &sent.id)
            .await
            .expect("mark read");
        ctx.inbox
            .mark_read(&member, &sent.id)
            .await
            .expect("marking read twice is harmless");
        assert_eq!(
            ctx.inbox.unread_count(&member).await.expect("member count"),
            member_before
        );
        assert_eq!(
            ctx.inbox.unread_count(&owner).await.expect("owner count"),
            owner_before + 1,
            "one member's read must not affect another"
        );

        let feed = ctx
            .inbox
            .list_notifications(&member, PageRequest::default())
            .await
            .expect("member feed");
        let view = feed
            .notifications
            .items
            .iter()
            .find(|view| view.notification.id == sent.id)
            .expect("broadcast in feed");
        assert!(view.is_read);
        assert!(view.read_at.is_some());

        ctx.inbox.mark_all_read(&owner).await.expect("read all");
        assert_eq!(ctx.inbox.unread_count(&owner).await.expect("owner count"), 0);
    });
}

#[rstest]
fn every_family_notification_counts_for_every_member(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: every_family_notification_counts_for_every_member skipped");
        return;
    };
    let (owner, late_joiner) = (ctx.users[0], ctx.users[1]);

    ctx.runtime.block_on(async {
        let created = ctx
            .directory
            .create_family(&owner, family_name("Lovelace"))
            .await
            .expect("create family");
        let addressed = ctx
            .inbox
            .send(
                &owner,
                SendNotificationRequest {
                    text: NotificationText::new("Note", "For the owner").expect("valid text"),
                    recipients: vec![owner],
                    data: json!({}),
                },
            )
            .await
            .expect("send to owner only");

        ctx.directory
            .join_family(&late_joiner, created.family.invite_code.clone())
            .await
            .expect("join family");

        let feed = ctx
            .inbox
            .list_notifications(&late_joiner, PageRequest::default())
            .await
            .expect("joiner feed");
        assert!(
            feed.notifications
                .items
                .iter()
                .any(|view| view.notification.id == addressed.id && !view.is_read)
        );
        let unread = ctx
            .inbox
            .unread_count(&late_joiner)
            .await
            .expect("joiner count");
        assert_eq!(unread, feed.notifications.total_count);
        assert_eq!(feed.unread_count, unread);

        ctx.inbox
            .mark_read(&late_joiner, &addressed.id)
            .await
            .expect("mark earlier notification read");
        assert_eq!(
            ctx.inbox.unread_count(&late_joiner).await.expect("count"),
            unread - 1
        );

        let marked = ctx
            .inbox
            .mark_all_read(&late_joiner)
            .await
            .expect("read all");
        assert_eq!(marked, unread - 1);
        assert_eq!(ctx.inbox.unread_count(&late_joiner).await.expect("count"), 0);
    });
}

#[rstest]
fn outsiders_see_no_notifications(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: outsiders_see_no_notifications skipped");
        return;
    };
    let (owner, outsider) = (ctx.users[0], ctx.users[2]);

    ctx.runtime.block_on(async {
        ctx.directory
            .create_family(&owner, family_name("Lovelace"))
            .await
            .expect("create family");

        let err = ctx
            .inbox
            .unread_count(&outsider)
            .await
            .expect_err("outsider has no family");
        assert_eq!(err.code(), ErrorCode::NotPartOfFamily);
    });
}
