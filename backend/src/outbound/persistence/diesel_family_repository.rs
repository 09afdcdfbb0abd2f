//! PostgreSQL-backed `FamilyRepository` implementation using Diesel ORM.
//!
//! The partial unique index `family_members_one_active_per_user` is the
//! authority for one-family-per-user; violations surface as
//! [`FamilyRepositoryError::AlreadyMember`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{FamilyRepository, FamilyRepositoryError};
use crate::domain::{
    Family, FamilyId, FamilyMember, FamilyName, FamilyRole, FamilySettings, InviteCode,
    Membership, UserId,
};

use super::diesel_helpers::{
    collect_rows, map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::diesel_user_repository::row_to_user;
use super::models::{FamilyMemberRow, FamilyRow, NewFamilyMemberRow, NewFamilyRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{families, family_members, users};

const INVITE_CODE_CONSTRAINT: &str = "families_invite_code_key";
const ACTIVE_MEMBER_CONSTRAINT: &str = "family_members_one_active_per_user";

/// Diesel-backed implementation of the [`FamilyRepository`] port.
#[derive(Clone)]
pub struct DieselFamilyRepository {
    pool: DbPool,
}

impl DieselFamilyRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> FamilyRepositoryError {
    map_basic_pool_error(error, FamilyRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> FamilyRepositoryError {
    map_basic_diesel_error(
        error,
        FamilyRepositoryError::query,
        FamilyRepositoryError::connection,
    )
}

/// Map write failures, translating the uniqueness constraints this table
/// family relies on.
fn map_write_error(
    error: diesel::result::Error,
    family: Option<&Family>,
    user_id: &UserId,
) -> FamilyRepositoryError {
    match unique_violation(&error) {
        Some(ACTIVE_MEMBER_CONSTRAINT) => FamilyRepositoryError::already_member(user_id.to_string()),
        Some(INVITE_CODE_CONSTRAINT) => FamilyRepositoryError::invite_code_taken(
            family.map_or_else(String::new, |f| f.invite_code.as_ref().to_owned()),
        ),
        _ => map_diesel_error(error),
    }
}

fn settings_from_value(value: serde_json::Value) -> Result<FamilySettings, String> {
    serde_json::from_value(value).map_err(|err| format!("invalid family settings: {err}"))
}

fn settings_to_value(settings: &FamilySettings) -> Result<serde_json::Value, FamilyRepositoryError> {
    serde_json::to_value(settings)
        .map_err(|err| FamilyRepositoryError::query(format!("encode settings: {err}")))
}

fn parse_role(raw: &str) -> Result<FamilyRole, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

fn row_to_family(row: FamilyRow) -> Result<Family, String> {
    Ok(Family {
        id: FamilyId::new(row.id),
        name: FamilyName::new(&row.name).map_err(|err| err.to_string())?,
        invite_code: InviteCode::parse(&row.invite_code).map_err(|err| err.to_string())?,
        owner_id: UserId::new(row.owner_id),
        settings: settings_from_value(row.settings)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_member((member, user): (FamilyMemberRow, UserRow)) -> Result<FamilyMember, String> {
    let user = row_to_user(user)?;
    Ok(FamilyMember {
        user_id: UserId::new(member.user_id),
        family_id: FamilyId::new(member.family_id),
        role: parse_role(&member.role)?,
        name: user.name,
        phone: user.phone,
        joined_at: member.joined_at,
    })
}

#[async_trait]
impl FamilyRepository for DieselFamilyRepository {
    async fn find_membership(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Membership>, FamilyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(FamilyMemberRow, serde_json::Value)> = family_members::table
            .inner_join(families::table)
            .filter(family_members::user_id.eq(user_id.as_uuid()))
            .filter(family_members::is_active.eq(true))
            .select((FamilyMemberRow::as_select(), families::settings))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|(member, settings)| {
            Ok::<_, String>(Membership {
                user_id: UserId::new(member.user_id),
                family_id: FamilyId::new(member.family_id),
                role: parse_role(&member.role)?,
                settings: settings_from_value(settings)?,
            })
        })
        .transpose()
        .map_err(FamilyRepositoryError::query)
    }

    async fn create_family(
        &self,
        family: &Family,
        joined_at: DateTime<Utc>,
    ) -> Result<(), FamilyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let family_row = NewFamilyRow {
            id: *family.id.as_uuid(),
            name: family.name.as_ref(),
            invite_code: family.invite_code.as_ref(),
            owner_id: *family.owner_id.as_uuid(),
            settings: settings_to_value(&family.settings)?,
            created_at: family.created_at,
            updated_at: family.updated_at,
        };
        let owner_row = NewFamilyMemberRow {
            family_id: *family.id.as_uuid(),
            user_id: *family.owner_id.as_uuid(),
            role: FamilyRole::Owner.as_str(),
            is_active: true,
            joined_at,
        };

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(families::table)
                    .values(&family_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(family_members::table)
                    .values(&owner_row)
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_write_error(err, Some(family), &family.owner_id))
    }

    async fn find_by_id(
        &self,
        family_id: &FamilyId,
    ) -> Result<Option<Family>, FamilyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<FamilyRow> = families::table
            .find(family_id.as_uuid())
            .select(FamilyRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_family)
            .transpose()
            .map_err(FamilyRepositoryError::query)
    }

    async fn find_by_invite_code(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Family>, FamilyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<FamilyRow> = families::table
            .filter(families::invite_code.eq(code.as_ref()))
            .select(FamilyRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_family)
            .transpose()
            .map_err(FamilyRepositoryError::query)
    }

    async fn add_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        role: FamilyRole,
        joined_at: DateTime<Utc>,
    ) -> Result<(), FamilyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewFamilyMemberRow {
            family_id: *family_id.as_uuid(),
            user_id: *user_id.as_uuid(),
            role: role.as_str(),
            is_active: true,
            joined_at,
        };
        diesel::insert_into(family_members::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_write_error(err, None, user_id))
    }

    async fn deactivate_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        left_at: DateTime<Utc>,
    ) -> Result<bool, FamilyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(family_members::table)
            .filter(family_members::family_id.eq(family_id.as_uuid()))
            .filter(family_members::user_id.eq(user_id.as_uuid()))
            .filter(family_members::is_active.eq(true))
            .set((
                family_members::is_active.eq(false),
                family_members::left_at.eq(Some(left_at)),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn find_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
    ) -> Result<Option<FamilyMember>, FamilyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(FamilyMemberRow, UserRow)> = family_members::table
            .inner_join(users::table)
            .filter(family_members::family_id.eq(family_id.as_uuid()))
            .filter(family_members::user_id.eq(user_id.as_uuid()))
            .filter(family_members::is_active.eq(true))
            .select((FamilyMemberRow::as_select(), UserRow::as_select()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_member)
            .transpose()
            .map_err(FamilyRepositoryError::query)
    }

    async fn list_members(
        &self,
        family_id: &FamilyId,
    ) -> Result<Vec<FamilyMember>, FamilyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(FamilyMemberRow, UserRow)> = family_members::table
            .inner_join(users::table)
            .filter(family_members::family_id.eq(family_id.as_uuid()))
            .filter(family_members::is_active.eq(true))
            .order_by((family_members::joined_at.asc(), family_members::user_id.asc()))
            .select((FamilyMemberRow::as_select(), UserRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(row_to_member), FamilyRepositoryError::query)
    }

    async fn update_settings(
        &self,
        family_id: &FamilyId,
        settings: &FamilySettings,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Family>, FamilyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<FamilyRow> = diesel::update(families::table.find(family_id.as_uuid()))
            .set((
                families::settings.eq(settings_to_value(settings)?),
                families::updated_at.eq(updated_at),
            ))
            .returning(FamilyRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_family)
            .transpose()
            .map_err(FamilyRepositoryError::query)
    }
}
