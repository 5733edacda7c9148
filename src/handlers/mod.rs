// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth, optional role allow-list per route)
pub mod public; // /, /health, POST /api/auth/login
pub mod protected; // everything else under /api
