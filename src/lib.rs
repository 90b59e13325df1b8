pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod health;
pub mod logging;
pub mod messaging;
pub mod middleware;
pub mod services;
