// handlers/protected/mod.rs - Handlers behind jwt_auth_middleware
//
// Every handler here receives an `AuthUser`. Routes marked super_admin in `routes.rs`
// are additionally wrapped in `require_role`. Row-level visibility for KAMs is applied
// by the services through `DataScope`.

pub mod auth; // GET /api/auth/me
pub mod banners; // /api/banners
pub mod cities; // /api/cities
pub mod dashboard; // GET /api/dashboard/stats
pub mod distributors; // /api/distributors
pub mod districts; // /api/districts
pub mod doctors; // /api/doctors
pub mod orders; // /api/orders
pub mod patients; // /api/patients
pub mod prescriptions; // /api/prescriptions
pub mod products; // /api/products
pub mod teams; // /api/teams
pub mod users; // /api/users
