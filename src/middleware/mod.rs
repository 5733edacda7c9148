pub mod auth;
pub mod extract;
pub mod response;

pub use auth::{jwt_auth_middleware, require_role, AllowedRoles, AuthUser, SUPER_ADMIN_ONLY};
pub use extract::{IdPath, JsonBody, QueryParams};
pub use response::{ApiResponse, ApiResult};
