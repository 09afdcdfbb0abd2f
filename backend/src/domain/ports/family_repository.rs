//! Port for family and membership persistence.
//!
//! Adapters must enforce the one-active-membership-per-user rule at the
//! storage layer so that concurrent create/join/add requests for the same
//! user cannot both succeed; the losing request surfaces as
//! [`FamilyRepositoryError::AlreadyMember`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Family, FamilyId, FamilyMember, FamilyRole, FamilySettings, InviteCode, Membership, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by family repository adapters.
    pub enum FamilyRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "family repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "family repository query failed: {message}",
        /// The user already holds an active membership.
        AlreadyMember { user_id: String } =>
            "user {user_id} already belongs to a family",
        /// Another family already uses the invite code.
        InviteCodeTaken { code: String } =>
            "invite code {code} is already in use",
    }
}

/// Port for family, membership and settings storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FamilyRepository: Send + Sync {
    /// Resolve the caller's active membership together with family settings.
    async fn find_membership(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Membership>, FamilyRepositoryError>;

    /// Insert a family and its owner's membership in one transaction.
    async fn create_family(
        &self,
        family: &Family,
        joined_at: DateTime<Utc>,
    ) -> Result<(), FamilyRepositoryError>;

    /// Fetch a family by id.
    async fn find_by_id(&self, family_id: &FamilyId)
    -> Result<Option<Family>, FamilyRepositoryError>;

    /// Fetch a family by invite code.
    async fn find_by_invite_code(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Family>, FamilyRepositoryError>;

    /// Create an active membership.
    async fn add_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        role: FamilyRole,
        joined_at: DateTime<Utc>,
    ) -> Result<(), FamilyRepositoryError>;

    /// Deactivate a membership. Returns `false` when none was active.
    async fn deactivate_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        left_at: DateTime<Utc>,
    ) -> Result<bool, FamilyRepositoryError>;

    /// Fetch one active member.
    async fn find_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
    ) -> Result<Option<FamilyMember>, FamilyRepositoryError>;

    /// List active members ordered by join time.
    async fn list_members(
        &self,
        family_id: &FamilyId,
    ) -> Result<Vec<FamilyMember>, FamilyRepositoryError>;

    /// Replace the family settings and return the updated family.
    async fn update_settings(
        &self,
        family_id: &FamilyId,
        settings: &FamilySettings,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Family>, FamilyRepositoryError>;
}

/// Fixture implementation that knows no families.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFamilyRepository;

#[async_trait]
impl FamilyRepository for FixtureFamilyRepository {
    async fn find_membership(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<Membership>, FamilyRepositoryError> {
        Ok(None)
    }

    async fn create_family(
        &self,
        _family: &Family,
        _joined_at: DateTime<Utc>,
    ) -> Result<(), FamilyRepositoryError> {
        Ok(())
    }

    async fn find_by_id(
        &self,
        _family_id: &FamilyId,
    ) -> Result<Option<Family>, FamilyRepositoryError> {
        Ok(None)
    }

    async fn find_by_invite_code(
        &self,
        _code: &InviteCode,
    ) -> Result<Option<Family>, FamilyRepositoryError> {
        Ok(None)
    }

    async fn add_member(
        &self,
        _family_id: &FamilyId,
        _user_id: &UserId,
        _role: FamilyRole,
        _joined_at: DateTime<Utc>,
    ) -> Result<(), FamilyRepositoryError> {
        Ok(())
    }

    async fn deactivate_member(
        &self,
        _family_id: &FamilyId,
        _user_id: &UserId,
        _left_at: DateTime<Utc>,
    ) -> Result<bool, FamilyRepositoryError> {
        Ok(false)
    }

    async fn find_member(
        &self,
        _family_id: &FamilyId,
        _user_id: &UserId,
    ) -> Result<Option<FamilyMember>, FamilyRepositoryError> {
        Ok(None)
    }

    async fn list_members(
        &self,
        _family_id: &FamilyId,
    ) -> Result<Vec<FamilyMember>, FamilyRepositoryError> {
        Ok(Vec::new())
    }

    async fn update_settings(
        &self,
        _family_id: &FamilyId,
        _settings: &FamilySettings,
        _updated_at: DateTime<Utc>,
    ) -> Result<Option<Family>, FamilyRepositoryError> {
        Ok(None)
    }
}
