//! Subcommand implementations
//!
//! Every command exposes `execute(...)`; remote commands take the
//! [`AppContext`](crate::context::AppContext), `config` takes only the
//! loaded configuration.

pub mod acl;
pub mod config;
pub mod download;
pub mod ls;
pub mod rm;
pub mod stat;
pub mod upload;
