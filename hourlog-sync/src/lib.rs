pub mod cache;
pub mod config;
pub mod migration;
pub mod ports;
pub mod repositories;
pub mod session;
pub mod store;
