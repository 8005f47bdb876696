//! Can I Go REST server.
//!
//! All routes live under `/api/v1`. Authentication is a middleware layer on
//! the protected sub-routers; ownership checks run at the top of the
//! handlers that need them.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
