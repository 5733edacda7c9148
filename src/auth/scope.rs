use uuid::Uuid;

use crate::error::ApiError;
use crate::types::Role;

/// Row-level visibility for the current caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataScope {
    /// Super-admins see everything
    All,
    /// KAMs see their own district and team
    Team { district_id: Uuid, team_id: Uuid },
}

impl DataScope {
    /// A KAM without both assignments cannot be scoped and is refused outright.
    pub fn resolve(role: Role, district_id: Option<Uuid>, team_id: Option<Uuid>) -> Result<Self, ApiError> {
        match role {
            Role::SuperAdmin => Ok(DataScope::All),
            Role::Kam => match (district_id, team_id) {
                (Some(district_id), Some(team_id)) => Ok(DataScope::Team { district_id, team_id }),
                _ => Err(ApiError::forbidden("KAM account is not assigned to a district and team")),
            },
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, DataScope::All)
    }

    pub fn district_id(&self) -> Option<Uuid> {
        match self {
            DataScope::All => None,
            DataScope::Team { district_id, .. } => Some(*district_id),
        }
    }

    pub fn team_id(&self) -> Option<Uuid> {
        match self {
            DataScope::All => None,
            DataScope::Team { team_id, .. } => Some(*team_id),
        }
    }

    pub fn allows_district(&self, district_id: Option<Uuid>) -> bool {
        match self {
            DataScope::All => true,
            DataScope::Team { district_id: own, .. } => district_id == Some(*own),
        }
    }

    pub fn allows_team(&self, district_id: Option<Uuid>, team_id: Option<Uuid>) -> bool {
        match self {
            DataScope::All => true,
            DataScope::Team { district_id: own_district, team_id: own_team } => {
                district_id == Some(*own_district) && team_id == Some(*own_team)
            }
        }
    }

    pub fn ensure_district(&self, district_id: Option<Uuid>) -> Result<(), ApiError> {
        if self.allows_district(district_id) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Record belongs to another district"))
        }
    }

    pub fn ensure_team(&self, district_id: Option<Uuid>, team_id: Option<Uuid>) -> Result<(), ApiError> {
        if self.allows_team(district_id, team_id) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Record belongs to another team"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_admin_is_unrestricted() {
        let scope = DataScope::resolve(Role::SuperAdmin, None, None).unwrap();
        assert!(scope.is_unrestricted());
        assert!(scope.allows_team(Some(Uuid::new_v4()), None));
    }

    #[test]
    fn kam_without_assignment_is_forbidden() {
        let err = DataScope::resolve(Role::Kam, Some(Uuid::new_v4()), None).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn kam_cannot_reach_another_team() {
        let district = Uuid::new_v4();
        let team_x = Uuid::new_v4();
        let team_y = Uuid::new_v4();
        let scope = DataScope::resolve(Role::Kam, Some(district), Some(team_x)).unwrap();

        assert!(scope.allows_team(Some(district), Some(team_x)));
        assert!(!scope.allows_team(Some(district), Some(team_y)));
        assert!(scope.ensure_team(Some(district), Some(team_y)).is_err());
        assert!(scope.allows_district(Some(district)));
        assert!(!scope.allows_district(None));
    }
}
