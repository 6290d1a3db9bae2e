pub mod connection;
pub mod redis;
pub mod ttl_store;
