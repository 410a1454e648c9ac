pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod export;
pub mod interactive;
pub mod list;
pub mod note;
pub mod sync;
pub mod tap;
