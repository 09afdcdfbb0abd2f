//! Driving port for the family directory.
//!
//! The directory is the single source of truth for tenancy: every other
//! component calls [`FamilyDirectory::resolve_membership`] with the
//! authenticated caller before touching family data.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    Error, Family, FamilyId, FamilyMember, FamilyName, FamilyRole, FamilySettings,
    FamilySettingsPatch, InviteCode, Membership, PersonName, PhoneNumber, UserId,
};

/// Request to add a member by phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMemberRequest {
    /// Name used when the phone number has no user yet.
    pub name: PersonName,
    /// Phone number identifying the user.
    pub phone: PhoneNumber,
    /// Role to grant; owners cannot be added.
    pub role: FamilyRole,
}

/// A family together with the caller's membership in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMembership {
    /// The family.
    pub family: Family,
    /// The caller's membership.
    pub member: FamilyMember,
}

/// The caller's family, their role and all active members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilyOverview {
    /// The family.
    pub family: Family,
    /// The caller's role.
    pub role: FamilyRole,
    /// Active members ordered by join time.
    pub members: Vec<FamilyMember>,
}

/// Driving port for family membership and settings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FamilyDirectory: Send + Sync {
    /// Create a family owned by `owner`.
    ///
    /// Fails with a conflict when the owner already belongs to a family.
    async fn create_family(
        &self,
        owner: &UserId,
        name: FamilyName,
    ) -> Result<FamilyMembership, Error>;

    /// Join the family identified by `code` as a regular member.
    async fn join_family(
        &self,
        user_id: &UserId,
        code: InviteCode,
    ) -> Result<FamilyMembership, Error>;

    /// Add a member on behalf of an owner or admin of `family_id`.
    async fn add_member(
        &self,
        acting: &UserId,
        family_id: &FamilyId,
        request: AddMemberRequest,
    ) -> Result<FamilyMember, Error>;

    /// Remove a member on behalf of an owner or admin of `family_id`.
    async fn remove_member(
        &self,
        acting: &UserId,
        family_id: &FamilyId,
        target: &UserId,
    ) -> Result<(), Error>;

    /// Leave the caller's family. Owners cannot leave.
    async fn leave_family(&self, user_id: &UserId) -> Result<(), Error>;

    /// Resolve the caller's active membership.
    ///
    /// Fails with [`crate::domain::ErrorCode::NotPartOfFamily`] when there is
    /// none.
    async fn resolve_membership(&self, user_id: &UserId) -> Result<Membership, Error>;

    /// Describe the caller's family.
    async fn family_overview(&self, user_id: &UserId) -> Result<FamilyOverview, Error>;

    /// Update settings of the caller's family. Requires owner or admin.
    async fn update_settings(
        &self,
        acting: &UserId,
        patch: FamilySettingsPatch,
    ) -> Result<Family, Error>;
}

/// Fixture directory for running without a database.
///
/// Creating or joining returns a synthesised family; every other call reports
/// that the caller is not part of a family.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFamilyDirectory;

impl FixtureFamilyDirectory {
    fn synthesise(user_id: &UserId, name: FamilyName, role: FamilyRole) -> Result<FamilyMembership, Error> {
        let now = Utc::now();
        let family = Family {
            id: FamilyId::random(),
            name,
            invite_code: InviteCode::generate(&mut rand::thread_rng()),
            owner_id: *user_id,
            settings: FamilySettings::default(),
            created_at: now,
            updated_at: now,
        };
        let member = FamilyMember {
            user_id: *user_id,
            family_id: family.id,
            role,
            name: PersonName::new("Fixture member")
                .map_err(|err| Error::internal(err.to_string()))?,
            phone: PhoneNumber::new("+15550100000")
                .map_err(|err| Error::internal(err.to_string()))?,
            joined_at: now,
        };
        Ok(FamilyMembership { family, member })
    }
}

#[async_trait]
impl FamilyDirectory for FixtureFamilyDirectory {
    async fn create_family(
        &self,
        owner: &UserId,
        name: FamilyName,
    ) -> Result<FamilyMembership, Error> {
        Self::synthesise(owner, name, FamilyRole::Owner)
    }

    async fn join_family(
        &self,
        user_id: &UserId,
        _code: InviteCode,
    ) -> Result<FamilyMembership, Error> {
        let name = FamilyName::new("Fixture family").map_err(|err| Error::internal(err.to_string()))?;
        Self::synthesise(user_id, name, FamilyRole::Member)
    }

    async fn add_member(
        &self,
        _acting: &UserId,
        _family_id: &FamilyId,
        _request: AddMemberRequest,
    ) -> Result<FamilyMember, Error> {
        Err(Error::not_part_of_family())
    }

    async fn remove_member(
        &self,
        _acting: &UserId,
        _family_id: &FamilyId,
        _target: &UserId,
    ) -> Result<(), Error> {
        Err(Error::not_part_of_family())
    }

    async fn leave_family(&self, _user_id: &UserId) -> Result<(), Error> {
        Err(Error::not_part_of_family())
    }

    async fn resolve_membership(&self, _user_id: &UserId) -> Result<Membership, Error> {
        Err(Error::not_part_of_family())
    }

    async fn family_overview(&self, _user_id: &UserId) -> Result<FamilyOverview, Error> {
        Err(Error::not_part_of_family())
    }

    async fn update_settings(
        &self,
        _acting: &UserId,
        _patch: FamilySettingsPatch,
    ) -> Result<Family, Error> {
        Err(Error::not_part_of_family())
    }
}
