pub mod build_info;
pub mod commands;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod progress;
pub mod remote;
pub mod report;
pub mod store;
pub mod verify;
