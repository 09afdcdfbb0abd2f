//! Shared builders and test doubles for domain service tests.

use std::sync::Mutex;

use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use super::{
    Family, FamilyId, FamilyMember, FamilyName, FamilyRole, FamilySettings, InventoryItem,
    InviteCode, ItemCategory, ItemId, ItemLifecycle, ItemName, ItemUnit, Membership, PersonName,
    PhoneNumber, UserId,
};

/// Clock pinned to a settable instant.
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        match self.0.lock() {
            Ok(mut guard) => *guard += delta,
            Err(_) => panic!("clock mutex poisoned"),
        }
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        match self.0.lock() {
            Ok(guard) => *guard,
            Err(_) => panic!("clock mutex poisoned"),
        }
    }
}

/// Noon UTC on 2024-03-15.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn today() -> NaiveDate {
    fixed_now().date_naive()
}

pub fn membership(user_id: UserId, family_id: FamilyId, role: FamilyRole) -> Membership {
    Membership {
        user_id,
        family_id,
        role,
        settings: FamilySettings::default(),
    }
}

pub fn family(id: FamilyId, owner: UserId) -> Family {
    Family {
        id,
        name: FamilyName::new("The Testers").expect("valid name"),
        invite_code: InviteCode::parse("ABC123").expect("valid code"),
        owner_id: owner,
        settings: FamilySettings::default(),
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

pub fn member(family_id: FamilyId, user_id: UserId, role: FamilyRole) -> FamilyMember {
    FamilyMember {
        user_id,
        family_id,
        role,
        name: PersonName::new("Test Member").expect("valid name"),
        phone: PhoneNumber::new("+15550100001").expect("valid phone"),
        joined_at: fixed_now(),
    }
}

pub fn item(family_id: FamilyId, name: &str, quantity: u32) -> InventoryItem {
    InventoryItem {
        id: ItemId::random(),
        family_id,
        name: ItemName::new(name).expect("valid name"),
        barcode: None,
        quantity,
        unit: ItemUnit::default(),
        category: ItemCategory::Other,
        expiry_date: None,
        image_url: None,
        notes: None,
        created_by: UserId::random(),
        lifecycle: ItemLifecycle::Active,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}
