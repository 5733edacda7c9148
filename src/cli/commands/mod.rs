pub mod db;
pub mod server;
pub mod sync;
pub mod user;
