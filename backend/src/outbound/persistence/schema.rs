//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Users known to the service, keyed by phone number.
    users (id) {
        id -> Uuid,
        name -> Varchar,
        phone -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Bearer tokens stored as SHA-256 hex digests.
    access_tokens (token_hash) {
        token_hash -> Varchar,
        user_id -> Uuid,
        created_at -> Timestamptz,
        expires_at -> Nullable<Timestamptz>,
        revoked_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Families with their settings document.
    families (id) {
        id -> Uuid,
        name -> Varchar,
        invite_code -> Varchar,
        owner_id -> Uuid,
        settings -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Membership history. At most one active row per user.
    family_members (id) {
        id -> Uuid,
        family_id -> Uuid,
        user_id -> Uuid,
        role -> Varchar,
        is_active -> Bool,
        joined_at -> Timestamptz,
        left_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Family inventory. `name_normalized` is the lowercase name used for
    /// the active-name uniqueness index.
    inventory_items (id) {
        id -> Uuid,
        family_id -> Uuid,
        name -> Varchar,
        name_normalized -> Text,
        barcode -> Nullable<Varchar>,
        quantity -> Int4,
        unit -> Varchar,
        category -> Varchar,
        expiry_date -> Nullable<Date>,
        image_url -> Nullable<Text>,
        notes -> Nullable<Varchar>,
        created_by -> Uuid,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    merchants (id) {
        id -> Uuid,
        family_id -> Uuid,
        name -> Varchar,
        merchant_type -> Varchar,
        phone -> Nullable<Varchar>,
        email -> Nullable<Varchar>,
        address -> Nullable<Varchar>,
        categories -> Array<Text>,
        notes -> Nullable<Varchar>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    orders (id) {
        id -> Uuid,
        family_id -> Uuid,
        merchant_id -> Nullable<Uuid>,
        status -> Varchar,
        created_by -> Uuid,
        notes -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Order lines in insertion order.
    order_items (id) {
        id -> Uuid,
        order_id -> Uuid,
        position -> Int4,
        name -> Varchar,
        quantity -> Int4,
        unit -> Varchar,
        notes -> Nullable<Varchar>,
        inventory_item_id -> Nullable<Uuid>,
    }
}

diesel::table! {
    notifications (id) {
        id -> Uuid,
        family_id -> Uuid,
        kind -> Varchar,
        title -> Varchar,
        message -> Varchar,
        data -> Jsonb,
        recipient_ids -> Array<Uuid>,
        sent_by -> Nullable<Uuid>,
        sent_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (notification, reader).
    notification_reads (notification_id, user_id) {
        notification_id -> Uuid,
        user_id -> Uuid,
        read_at -> Timestamptz,
    }
}

diesel::joinable!(access_tokens -> users (user_id));
diesel::joinable!(family_members -> users (user_id));
diesel::joinable!(family_members -> families (family_id));
diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(notification_reads -> notifications (notification_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    access_tokens,
    families,
    family_members,
    inventory_items,
    merchants,
    orders,
    order_items,
    notifications,
    notification_reads,
);
