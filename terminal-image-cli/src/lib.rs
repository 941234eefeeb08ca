// ABOUTME: Library exports for terminal-image CLI modules for testing and external use
// ABOUTME: Makes internal modules available to integration tests

pub mod cli;
pub mod cli_output;
pub mod config;
pub mod downloader;
pub mod source;
pub mod url_validator;
