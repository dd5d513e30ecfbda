pub mod api;
pub mod auth;
pub mod config;
pub mod mail;
pub mod pages;
pub mod reminder;
pub mod scheduler;
pub mod server;

pub use self::config::Config;
