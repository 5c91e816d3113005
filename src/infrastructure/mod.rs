//! Infrastructure layer - Store adapters, services and observability

pub mod cache;
pub mod logging;
pub mod observability;
pub mod services;
