pub mod api;
pub mod auth;
pub mod backend_factory;
pub mod config;
pub mod error;
