// ABOUTME: Library exports for partlens CLI modules for testing and external use
// ABOUTME: Makes internal modules available to integration tests

pub mod cli;
pub mod cli_output;
pub mod commands;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod images;
pub mod output;
pub mod session;
pub mod validator;
