//! CLI Commands

pub mod config;
pub mod destroy;
pub mod run;
pub mod sweep;
pub mod vars;
pub mod verify;
