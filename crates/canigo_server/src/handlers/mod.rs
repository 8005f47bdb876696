pub mod auth;
pub mod health;
pub mod pass;
pub mod place;
pub mod users;
