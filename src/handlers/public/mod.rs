// handlers/public/mod.rs - Endpoints reachable without a token

pub mod auth; // POST /api/auth/login
pub mod root; // GET /, GET /health

pub use auth::login;
pub use root::{health, root};
