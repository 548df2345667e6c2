pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod platform;
pub mod services;
pub mod settings;
pub mod storage;
