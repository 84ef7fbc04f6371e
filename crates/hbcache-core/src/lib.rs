pub mod config;
pub mod logging;

pub mod binary_cache;
pub mod error;
pub mod http_cache;
pub mod pool;
pub mod registry;
pub mod transport;
pub mod validation_cache;
