pub mod api;
pub mod backup;
pub mod config;
pub mod db;
pub mod error;
pub mod server;
pub mod traits;
pub mod types;
