//! Family directory service.
//!
//! Owns the membership lifecycle and is the only place that turns a user id
//! into a tenant. The one-family-per-user rule is checked up front for a clear
//! error and enforced again by the repository's unique index for races.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::notification_service::notify_quietly;
use crate::domain::ports::{
    AddMemberRequest, FamilyDirectory, FamilyMembership, FamilyOverview, FamilyRepository,
    FamilyRepositoryError, Notifier, UserRepository, UserRepositoryError,
};
use crate::domain::{
    Capability, Error, Family, FamilyId, FamilyMember, FamilyName, FamilyRole, FamilySettings,
    FamilySettingsPatch, InviteCode, Membership, NotificationType, User, UserId,
};

/// Attempts at drawing an unused invite code before giving up.
const INVITE_CODE_ATTEMPTS: usize = 5;

/// Family directory service implementing [`FamilyDirectory`].
#[derive(Clone)]
pub struct FamilyService<F, U, N> {
    families: Arc<F>,
    users: Arc<U>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<F, U, N> FamilyService<F, U, N> {
    /// Create a new service with the given collaborators.
    pub fn new(families: Arc<F>, users: Arc<U>, notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            families,
            users,
            notifier,
            clock,
        }
    }
}

impl<F, U, N> FamilyService<F, U, N>
where
    F: FamilyRepository,
    U: UserRepository,
    N: Notifier,
{
    fn map_family_error(error: FamilyRepositoryError) -> Error {
        match error {
            FamilyRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("family repository unavailable: {message}"))
            }
            FamilyRepositoryError::Query { message } => {
                Error::internal(format!("family repository error: {message}"))
            }
            FamilyRepositoryError::AlreadyMember { .. } => {
                Error::conflict("user already belongs to a family")
            }
            FamilyRepositoryError::InviteCodeTaken { code } => {
                Error::internal(format!("unexpected invite code collision: {code}"))
            }
        }
    }

    fn map_user_error(error: UserRepositoryError) -> Error {
        match error {
            UserRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserRepositoryError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
        }
    }

    async fn find_membership(&self, user_id: &UserId) -> Result<Option<Membership>, Error> {
        self.families
            .find_membership(user_id)
            .await
            .map_err(Self::map_family_error)
    }

    async fn require_no_membership(&self, user_id: &UserId) -> Result<(), Error> {
        match self.find_membership(user_id).await? {
            Some(_) => Err(Error::conflict("user already belongs to a family")),
            None => Ok(()),
        }
    }

    /// Resolve `acting` and check they may exercise `capability` in
    /// `family_id`. A family other than the caller's is reported as missing.
    async fn require_capability(
        &self,
        acting: &UserId,
        family_id: &FamilyId,
        capability: Capability,
    ) -> Result<Membership, Error> {
        let membership = self.resolve_membership(acting).await?;
        if membership.family_id != *family_id {
            return Err(Error::not_found("family not found"));
        }
        if !membership.can(capability) {
            return Err(Error::forbidden(
                "only the family owner or an admin can do this",
            ));
        }
        Ok(membership)
    }

    async fn load_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
    ) -> Result<FamilyMember, Error> {
        self.families
            .find_member(family_id, user_id)
            .await
            .map_err(Self::map_family_error)?
            .ok_or_else(|| Error::internal("membership missing after it was created"))
    }

    async fn announce_member(&self, settings: FamilySettings, member: &FamilyMember) {
        if !settings.notify_members {
            return;
        }
        notify_quietly(
            self.notifier.as_ref(),
            &member.family_id,
            NotificationType::MemberJoined,
            "New family member",
            format!("{} joined the family", member.name.as_ref()),
            json!({ "userId": member.user_id, "role": member.role }),
        )
        .await;
    }

    fn new_family(&self, owner: &UserId, name: &FamilyName) -> Family {
        let now = self.clock.utc();
        Family {
            id: FamilyId::random(),
            name: name.clone(),
            invite_code: InviteCode::generate(&mut rand::thread_rng()),
            owner_id: *owner,
            settings: FamilySettings::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl<F, U, N> FamilyDirectory for FamilyService<F, U, N>
where
    F: FamilyRepository,
    U: UserRepository,
    N: Notifier,
{
    async fn create_family(
        &self,
        owner: &UserId,
        name: FamilyName,
    ) -> Result<FamilyMembership, Error> {
        self.require_no_membership(owner).await?;

        for attempt in 1..=INVITE_CODE_ATTEMPTS {
            let family = self.new_family(owner, &name);
            match self.families.create_family(&family, family.created_at).await {
                Ok(()) => {
                    let member = self.load_member(&family.id, owner).await?;
                    info!(family_id = %family.id, owner = %owner, "family created");
                    return Ok(FamilyMembership { family, member });
                }
                Err(FamilyRepositoryError::InviteCodeTaken { .. }) => {
                    debug!(attempt, "invite code collision; drawing another");
                }
                Err(error) => return Err(Self::map_family_error(error)),
            }
        }
        Err(Error::service_unavailable(
            "could not allocate a unique invite code",
        ))
    }

    async fn join_family(
        &self,
        user_id: &UserId,
        code: InviteCode,
    ) -> Result<FamilyMembership, Error> {
        self.require_no_membership(user_id).await?;
        let family = self
            .families
            .find_by_invite_code(&code)
            .await
            .map_err(Self::map_family_error)?
            .ok_or_else(|| Error::not_found("invalid invite code"))?;

        self.families
            .add_member(&family.id, user_id, FamilyRole::Member, self.clock.utc())
            .await
            .map_err(Self::map_family_error)?;
        let member = self.load_member(&family.id, user_id).await?;
        info!(family_id = %family.id, user_id = %user_id, "user joined family");
        self.announce_member(family.settings, &member).await;
        Ok(FamilyMembership { family, member })
    }

    async fn add_member(
        &self,
        acting: &UserId,
        family_id: &FamilyId,
        request: AddMemberRequest,
    ) -> Result<FamilyMember, Error> {
        let membership = self
            .require_capability(acting, family_id, Capability::AddMember)
            .await?;
        if request.role == FamilyRole::Owner {
            return Err(
                Error::invalid_request("members cannot be added as owner").with_details(json!({
                    "field": "role",
                    "code": "owner_not_assignable",
                })),
            );
        }

        let candidate = User {
            id: UserId::random(),
            name: request.name,
            phone: request.phone,
        };
        let user = self
            .users
            .upsert_by_phone(&candidate)
            .await
            .map_err(Self::map_user_error)?;

        if let Some(existing) = self.find_membership(&user.id).await? {
            let message = if existing.family_id == *family_id {
                "user is already a member of this family"
            } else {
                "user already belongs to another family"
            };
            return Err(Error::conflict(message));
        }

        self.families
            .add_member(family_id, &user.id, request.role, self.clock.utc())
            .await
            .map_err(Self::map_family_error)?;
        let member = self.load_member(family_id, &user.id).await?;
        info!(%family_id, user_id = %user.id, role = %request.role, "member added");
        self.announce_member(membership.settings, &member).await;
        Ok(member)
    }

    async fn remove_member(
        &self,
        acting: &UserId,
        family_id: &FamilyId,
        target: &UserId,
    ) -> Result<(), Error> {
        let membership = self
            .require_capability(acting, family_id, Capability::RemoveMember)
            .await?;
        if acting == target {
            return Err(Error::invalid_request(
                "use the leave endpoint to leave your own family",
            ));
        }
        let target_member = self
            .families
            .find_member(family_id, target)
            .await
            .map_err(Self::map_family_error)?
            .ok_or_else(|| Error::not_found("member not found"))?;
        if !membership.role.can_remove(target_member.role) {
            return Err(Error::forbidden("you cannot remove this member"));
        }

        let removed = self
            .families
            .deactivate_member(family_id, target, self.clock.utc())
            .await
            .map_err(Self::map_family_error)?;
        if !removed {
            return Err(Error::not_found("member not found"));
        }
        info!(%family_id, user_id = %target, "member removed");
        Ok(())
    }

    async fn leave_family(&self, user_id: &UserId) -> Result<(), Error> {
        let membership = self.resolve_membership(user_id).await?;
        if membership.role == FamilyRole::Owner {
            return Err(Error::forbidden("the family owner cannot leave the family"));
        }
        self.families
            .deactivate_member(&membership.family_id, user_id, self.clock.utc())
            .await
            .map_err(Self::map_family_error)?;
        info!(family_id = %membership.family_id, %user_id, "member left family");
        Ok(())
    }

    async fn resolve_membership(&self, user_id: &UserId) -> Result<Membership, Error> {
        self.find_membership(user_id)
            .await?
            .ok_or_else(Error::not_part_of_family)
    }

    async fn family_overview(&self, user_id: &UserId) -> Result<FamilyOverview, Error> {
        let membership = self.resolve_membership(user_id).await?;
        let family = self
            .families
            .find_by_id(&membership.family_id)
            .await
            .map_err(Self::map_family_error)?
            .ok_or_else(|| Error::internal("family missing for active membership"))?;
        let members = self
            .families
            .list_members(&membership.family_id)
            .await
            .map_err(Self::map_family_error)?;
        Ok(FamilyOverview {
            family,
            role: membership.role,
            members,
        })
    }

    async fn update_settings(
        &self,
        acting: &UserId,
        patch: FamilySettingsPatch,
    ) -> Result<Family, Error> {
        let membership = self.resolve_membership(acting).await?;
        if !membership.can(Capability::UpdateSettings) {
            return Err(Error::forbidden(
                "only the family owner or an admin can change settings",
            ));
        }
        let settings = patch.apply(membership.settings).map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({
                "field": "settings",
                "code": "out_of_range",
            }))
        })?;
        self.families
            .update_settings(&membership.family_id, &settings, self.clock.utc())
            .await
            .map_err(Self::map_family_error)?
            .ok_or_else(|| Error::internal("family missing for active membership"))
    }
}

#[cfg(test)]
#[path = "family_service_tests.rs"]
mod tests;
