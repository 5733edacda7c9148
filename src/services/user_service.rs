use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::team_service::TeamService;
use crate::auth::hash_password;
use crate::config::ApiConfig;
use crate::database::models::{User, UserInput};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, Page};
use crate::types::Role;
use crate::validation::{self, MAX_NAME_LEN};

const SEARCHABLE: &[&str] = &["name", "email"];
const SORTABLE: &[&str] = &["name", "email", "role", "created_at", "updated_at"];

#[derive(Debug, Default, Deserialize)]
pub struct UserFilters {
    pub role: Option<Role>,
    pub district_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Role placement checked together on every save
struct Assignment {
    role: Role,
    district_id: Option<Uuid>,
    team_id: Option<Uuid>,
    is_active: bool,
}

pub struct UserService {
    repo: Repository<User>,
}

/// The active KAM of a district+team, ignoring `exclude`
pub(crate) async fn active_kam(
    pool: &PgPool,
    district_id: Uuid,
    team_id: Uuid,
    exclude: Option<Uuid>,
) -> Result<Option<Uuid>, ApiError> {
    let kam_id: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM users WHERE role = $1 AND is_active AND district_id = $2 AND team_id = $3 \
         AND ($4::uuid IS NULL OR id <> $4) ORDER BY created_at LIMIT 1",
    )
    .bind(Role::Kam)
    .bind(district_id)
    .bind(team_id)
    .bind(exclude)
    .fetch_optional(pool)
    .await?;
    Ok(kam_id)
}

fn hash(password: &str) -> Result<String, ApiError> {
    validation::password(password)?;
    hash_password(password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("Failed to hash password")
    })
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("users", "User", pool),
        }
    }

    pub async fn list(&self, data: FilterData, filters: UserFilters, api: &ApiConfig) -> Result<Page<User>, ApiError> {
        let mut filter = Filter::new("users")?;
        filter.assign(data, SEARCHABLE, SORTABLE, api)?;
        filter
            .where_eq_opt("role", filters.role.map(|r| r.as_str()))?
            .where_eq_opt("district_id", filters.district_id)?
            .where_eq_opt("team_id", filters.team_id)?
            .where_eq_opt("is_active", filters.is_active)?;
        Ok(filter.fetch_page(self.repo.pool()).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, ApiError> {
        Ok(self.repo.select_404(id).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email.trim())
            .fetch_optional(self.repo.pool())
            .await?;
        Ok(user)
    }

    pub async fn create(&self, input: UserInput) -> Result<User, ApiError> {
        let name = validation::required_text(&validation::required(input.name, "name")?, "name", MAX_NAME_LEN)?;
        let email = validation::email(&validation::required(input.email, "email")?, "email")?;
        let password_hash = hash(&validation::required(input.password, "password")?)?;
        let assignment = Assignment {
            role: validation::required(input.role, "role")?,
            district_id: input.district_id.flatten(),
            team_id: input.team_id.flatten(),
            is_active: input.is_active.unwrap_or(true),
        };

        self.ensure_email_free(&email, None).await?;
        let assignment = self.validate_assignment(assignment, None).await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash, role, district_id, team_id, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .bind(assignment.role)
        .bind(assignment.district_id)
        .bind(assignment.team_id)
        .bind(assignment.is_active)
        .fetch_one(self.repo.pool())
        .await?;

        tracing::info!("Created {} user {} ({})", user.role, user.email, user.id);
        self.sync_doctor_kams(&user).await?;
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, input: UserInput) -> Result<User, ApiError> {
        let current = self.repo.select_404(id).await?;

        let name = match input.name {
            Some(name) => validation::required_text(&name, "name", MAX_NAME_LEN)?,
            None => current.name.clone(),
        };
        let email = match input.email {
            Some(email) => {
                let email = validation::email(&email, "email")?;
                self.ensure_email_free(&email, Some(id)).await?;
                email
            }
            None => current.email.clone(),
        };
        let password_hash = match input.password.as_deref() {
            Some(password) => hash(password)?,
            None => current.password_hash.clone(),
        };
        let assignment = Assignment {
            role: input.role.unwrap_or(current.role),
            district_id: input.district_id.unwrap_or(current.district_id),
            team_id: input.team_id.unwrap_or(current.team_id),
            is_active: input.is_active.unwrap_or(current.is_active),
        };
        let assignment = self.validate_assignment(assignment, Some(id)).await?;

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET name = $2, email = $3, password_hash = $4, role = $5, district_id = $6, \
             team_id = $7, is_active = $8, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .bind(assignment.role)
        .bind(assignment.district_id)
        .bind(assignment.team_id)
        .bind(assignment.is_active)
        .fetch_one(self.repo.pool())
        .await?;

        if current.role == Role::Kam || user.role == Role::Kam {
            self.sync_doctor_kams(&user).await?;
        }
        Ok(user)
    }

    pub async fn delete(&self, id: Uuid, acting_user: Uuid) -> Result<User, ApiError> {
        if id == acting_user {
            return Err(ApiError::bad_request("You cannot delete your own account"));
        }
        let user = self.repo.delete_404(id).await?;
        tracing::info!("Deleted user {} ({})", user.email, user.id);
        Ok(user)
    }

    /// KAMs need a district and a team of that district, and only one may be active per pair.
    /// Super-admins are never placed.
    async fn validate_assignment(&self, assignment: Assignment, exclude: Option<Uuid>) -> Result<Assignment, ApiError> {
        if assignment.role == Role::SuperAdmin {
            return Ok(Assignment {
                district_id: None,
                team_id: None,
                ..assignment
            });
        }

        let district_id = assignment
            .district_id
            .ok_or_else(|| ApiError::field("district_id", "district_id is required for KAM users"))?;
        let team_id = assignment
            .team_id
            .ok_or_else(|| ApiError::field("team_id", "team_id is required for KAM users"))?;

        TeamService::new(self.repo.pool().clone())
            .ensure_in_district(team_id, district_id)
            .await?;

        if assignment.is_active && active_kam(self.repo.pool(), district_id, team_id, exclude).await?.is_some() {
            return Err(ApiError::bad_request(
                "An active KAM is already assigned to this district and team",
            ));
        }

        Ok(assignment)
    }

    async fn ensure_email_free(&self, email: &str, exclude: Option<Uuid>) -> Result<(), ApiError> {
        if self.repo.is_taken("email", email, exclude).await? {
            return Err(ApiError::bad_request("User with this email already exists"));
        }
        Ok(())
    }

    /// Point the doctors of the user's district+team at them while they are the active KAM,
    /// and release doctors they no longer cover.
    async fn sync_doctor_kams(&self, user: &User) -> Result<(), ApiError> {
        let placement = match (user.role, user.is_active, user.district_id, user.team_id) {
            (Role::Kam, true, Some(district_id), Some(team_id)) => Some((district_id, team_id)),
            _ => None,
        };

        let mut tx = self.repo.pool().begin().await?;

        let released = sqlx::query(
            "UPDATE doctors SET kam_id = NULL, updated_at = now() \
             WHERE kam_id = $1 AND ($2::uuid IS NULL OR district_id <> $2 OR team_id <> $3)",
        )
        .bind(user.id)
        .bind(placement.map(|(district_id, _)| district_id))
        .bind(placement.map(|(_, team_id)| team_id))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let mut assigned = 0;
        if let Some((district_id, team_id)) = placement {
            assigned = sqlx::query(
                "UPDATE doctors SET kam_id = $1, updated_at = now() \
                 WHERE district_id = $2 AND team_id = $3 AND kam_id IS DISTINCT FROM $1",
            )
            .bind(user.id)
            .bind(district_id)
            .bind(team_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        if released > 0 || assigned > 0 {
            tracing::info!(
                "KAM {} now covers {} more doctors, released {}",
                user.id,
                assigned,
                released
            );
        }
        Ok(())
    }
}
