pub mod backend_client;
pub mod metrics;
