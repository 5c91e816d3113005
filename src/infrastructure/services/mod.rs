//! Infrastructure services

mod cache_facade;

pub use cache_facade::{CacheFacade, CacheFacadeConfig};
