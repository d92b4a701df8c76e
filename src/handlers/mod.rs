pub mod auth;
pub mod health;
pub mod resources;
pub mod utils;

pub use health::{health, not_found};
