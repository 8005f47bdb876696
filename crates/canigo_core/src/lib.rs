//! Can I Go core: domain types, store ports, tokens and access decisions.
//!
//! Nothing in here touches a database or a socket. `canigo_postgres`
//! implements the store ports and `canigo_server` puts HTTP in front.

pub mod access;
pub mod accounts;
pub mod config;
pub mod error;
pub mod memory;
pub mod password;
pub mod ports;
pub mod proto;
pub mod token;
pub mod types;

pub use error::{CanigoError, ErrorKind};
