//! Namespaced JSON cache on top of Redis.

/// Backend capability and its implementation for the Redis connection manager.
pub mod client;

/// In-memory test double for the backend capability.
pub mod mock;

/// Namespaced repository.
pub mod repository;
