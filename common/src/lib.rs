// Allow some clippy lints shared with the rest of the workspace
#![allow(clippy::module_inception)]

pub mod api;
pub mod config;
pub mod crypto;
pub mod transaction;
