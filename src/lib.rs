pub mod address;
pub mod aggregate;
pub mod config;
pub mod denom;
pub mod duration;
pub mod endpoint;
pub mod error;
pub mod gateway;
pub mod models;
pub mod orchestrator;
pub mod price;
pub mod registry;
pub mod report;
