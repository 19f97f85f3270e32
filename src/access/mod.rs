//! Patient-data access control.
//!
//! Every route that reads or writes patient-scoped data asks this module
//! first. Patients implicitly own their profile at every level; caregivers
//! need an ACCEPTED permission grant of sufficient level.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::patient::PatientProfile;
use crate::database::models::permission::Permission;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// User role. A closed set: tokens carrying any other role string fail
/// claim deserialization and never reach the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    Patient,
    Caregiver,
}

/// Lifecycle of a caregiver's grant. Only the owning patient moves a grant
/// out of Pending; nothing transitions automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "permission_status", rename_all = "UPPERCASE")]
pub enum PermissionStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Access level with an explicit total order: READ < WRITE < ADMIN.
/// Any granted level also grants everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "access_level", rename_all = "UPPERCASE")]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

impl AccessLevel {
    /// Explicit rank so the ordering never silently depends on variant or
    /// database enum declaration order.
    const fn rank(self) -> u8 {
        match self {
            AccessLevel::Read => 0,
            AccessLevel::Write => 1,
            AccessLevel::Admin => 2,
        }
    }

    /// Does a grant at `self` satisfy a request for `required`?
    pub fn grants(self, required: AccessLevel) -> bool {
        self.rank() >= required.rank()
    }
}

/// Pure decision rule over already-fetched state. `profile_owner` is the
/// user id owning the profile (if the profile exists); `grant` is the
/// caregiver's permission row (if any).
fn evaluate(
    user: &AuthUser,
    profile_owner: Option<Uuid>,
    grant: Option<(PermissionStatus, AccessLevel)>,
    required: AccessLevel,
) -> bool {
    match user.role {
        // A patient has full access to their own profile, none to any other
        Role::Patient => profile_owner.is_some_and(|owner| owner == user.id),
        // A caregiver needs an ACCEPTED grant at or above the required level
        Role::Caregiver => match grant {
            Some((PermissionStatus::Accepted, level)) => level.grants(required),
            Some(_) | None => false,
        },
    }
}

/// Can `user` access the patient profile at `required` level?
///
/// Absence of the profile or permission row folds into `false`; data-store
/// failures propagate as errors, never masked as a denial. Reads current
/// state on every call so permission changes take effect immediately.
pub async fn can_access_patient(
    pool: &PgPool,
    patient_profile_id: Uuid,
    user: &AuthUser,
    required: AccessLevel,
) -> Result<bool, DatabaseError> {
    let allowed = match user.role {
        Role::Patient => {
            let owner = PatientProfile::owner_of(pool, patient_profile_id).await?;
            evaluate(user, owner, None, required)
        }
        Role::Caregiver => {
            let grant = Permission::grant_for(pool, patient_profile_id, user.id).await?;
            evaluate(user, None, grant, required)
        }
    };
    Ok(allowed)
}

/// Check-then-act helper for handlers: 403 NO_ACCESS on a denial
pub async fn require(
    pool: &PgPool,
    patient_profile_id: Uuid,
    user: &AuthUser,
    required: AccessLevel,
) -> Result<(), ApiError> {
    if can_access_patient(pool, patient_profile_id, user, required).await? {
        Ok(())
    } else {
        Err(ApiError::forbidden("NO_ACCESS"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(id: Uuid) -> AuthUser {
        AuthUser { id, role: Role::Patient }
    }

    fn caregiver(id: Uuid) -> AuthUser {
        AuthUser { id, role: Role::Caregiver }
    }

    const ALL_LEVELS: [AccessLevel; 3] =
        [AccessLevel::Read, AccessLevel::Write, AccessLevel::Admin];

    #[test]
    fn patient_owns_their_profile_at_every_level() {
        let id = Uuid::new_v4();
        for level in ALL_LEVELS {
            assert!(evaluate(&patient(id), Some(id), None, level));
        }
    }

    #[test]
    fn patient_never_accesses_another_profile() {
        let me = Uuid::new_v4();
        let someone_else = Uuid::new_v4();
        for level in ALL_LEVELS {
            assert!(!evaluate(&patient(me), Some(someone_else), None, level));
        }
    }

    #[test]
    fn missing_profile_is_a_denial_not_an_error() {
        let me = Uuid::new_v4();
        assert!(!evaluate(&patient(me), None, None, AccessLevel::Read));
    }

    #[test]
    fn accepted_write_grant_covers_read_and_write_but_not_admin() {
        let user = caregiver(Uuid::new_v4());
        let grant = Some((PermissionStatus::Accepted, AccessLevel::Write));
        assert!(evaluate(&user, None, grant, AccessLevel::Read));
        assert!(evaluate(&user, None, grant, AccessLevel::Write));
        assert!(!evaluate(&user, None, grant, AccessLevel::Admin));
    }

    #[test]
    fn pending_and_rejected_grants_confer_nothing() {
        let user = caregiver(Uuid::new_v4());
        for status in [PermissionStatus::Pending, PermissionStatus::Rejected] {
            for level in ALL_LEVELS {
                assert!(!evaluate(&user, None, Some((status, AccessLevel::Admin)), level));
            }
        }
    }

    #[test]
    fn caregiver_without_grant_is_denied() {
        let user = caregiver(Uuid::new_v4());
        for level in ALL_LEVELS {
            assert!(!evaluate(&user, None, None, level));
        }
    }

    #[test]
    fn admin_grant_covers_every_level() {
        let user = caregiver(Uuid::new_v4());
        let grant = Some((PermissionStatus::Accepted, AccessLevel::Admin));
        for level in ALL_LEVELS {
            assert!(evaluate(&user, None, grant, level));
        }
    }

    #[test]
    fn level_ordering_is_total() {
        assert!(AccessLevel::Read.grants(AccessLevel::Read));
        assert!(!AccessLevel::Read.grants(AccessLevel::Write));
        assert!(AccessLevel::Write.grants(AccessLevel::Read));
        assert!(AccessLevel::Admin.grants(AccessLevel::Write));
        assert!(!AccessLevel::Write.grants(AccessLevel::Admin));
    }
}
