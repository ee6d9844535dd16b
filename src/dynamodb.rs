//! DynamoDB repositories and request-scoped transactions.
//!
//! Repository calls either hit the table immediately or, when asked to be
//! transactional, enqueue their request into the transaction buffer held by
//! the [`LambdaContext`](crate::context::LambdaContext). The
//! [`TransactionManager`](transaction::TransactionManager) later submits the
//! whole buffer in a single atomic call.

/// Backend capability and its implementation for the AWS SDK client.
pub mod client;

/// Condition expressions for conditional writes.
pub mod condition;

/// Primary key descriptors.
pub mod key;

/// In-memory test double for the backend capability.
pub mod mock;

/// Single-table repository.
pub mod repository;

/// Transaction buffers and the manager executing them.
pub mod transaction;

use aws_sdk_dynamodb::types;
use std::collections;

/// A DynamoDB item, as returned by reads and sent by writes.
pub type Item = collections::HashMap<String, types::AttributeValue>;
