//! Host health collection: CPU, memory, disks, network and running services,
//! assembled into one snapshot per request.

pub mod api;
pub mod collector;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod fs;
pub mod mock;
pub mod model;
pub mod platform;
pub mod rates;
pub mod server;
pub mod services;
pub mod telemetry;

pub use collector::Collector;
pub use model::Snapshot;
