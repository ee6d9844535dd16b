#![deny(missing_docs)]
#![deny(warnings)]

//! # Lambda Commons
//!
//! Shared building blocks for AWS Lambda handlers behind API Gateway.
//!
//! ## Overview
//!
//! - [`ApplicationError`](error::ApplicationError): an HTTP status plus a message, the one error
//!   type every operation returns
//! - [`LambdaContext`](context::LambdaContext): request-scoped values and the pending DynamoDB
//!   read or write transaction
//! - DynamoDB repositories that either run immediately or buffer into the pending transaction,
//!   and a [`TransactionManager`](dynamodb::transaction::TransactionManager) that runs it
//! - A Redis repository that stores JSON under a namespace with per-key expiration
//! - RSA JWT signing and validation, and API Gateway custom authorizer policies
//! - JSON request binding and API Gateway proxy response mapping
//!
//! ## Quick Example
//!
//! Two saves into different tables committed atomically:
//!
//! ```no_run
//! use lambda_commons::{
//!     context::LambdaContext,
//!     dynamodb::{key::SimplePrimaryKey, repository::DynamodbRepository, transaction::TransactionManager},
//!     response,
//! };
//! use std::sync::Arc;
//!
//! # async fn example(client: aws_sdk_dynamodb::Client) {
//! let client = Arc::new(client);
//! let users = DynamodbRepository::new(client.clone(), "users");
//! let audit = DynamodbRepository::new(client.clone(), "audit");
//! let transactions = TransactionManager::new(client);
//!
//! let mut ctx = LambdaContext::new();
//! let result = async {
//!     transactions.start_write_transaction(&mut ctx)?;
//!     users
//!         .save_if_not_present_with_simple_primary_key(
//!             &mut ctx,
//!             &SimplePrimaryKey::new("id", "1"),
//!             &serde_json::json!({"name": "Jane"}),
//!             true,
//!         )
//!         .await?;
//!     audit
//!         .save(&mut ctx, &serde_json::json!({"id": "1", "event": "user created"}), true)
//!         .await?;
//!     transactions.execute_write_transaction(&mut ctx).await
//! }
//! .await;
//!
//! let response = match result {
//!     Ok(()) => response::map_response(201, &serde_json::json!({"id": "1"})),
//!     Err(error) => response::map_error(&error),
//! };
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@auth`] - JWT helper and custom authorizer policies
//! - [`mod@cache`] - Namespaced JSON cache on Redis
//! - [`mod@context`] - Request-scoped context
//! - [`mod@dynamodb`] - Repositories and transactions
//! - [`mod@error`] - Application error
//! - [`mod@parser`] - JSON request and response binding
//! - [`mod@response`] - API Gateway proxy responses
//!
//! ## Features
//!
//! - `tracing`: instrument every store call and log transaction failures

/// JWT signing and validation, and API Gateway authorizer policies.
pub mod auth;

/// Namespaced JSON cache on top of Redis.
pub mod cache;

/// Request-scoped context.
pub mod context;

/// DynamoDB repositories with request-scoped transactions.
///
/// This module provides:
/// - Point reads and conditional saves by simple or composite primary key
/// - Read and write transaction buffers carried by the request context
/// - A capability trait over the SDK client, with an in-memory double for tests
pub mod dynamodb;

/// The application error carried by every operation.
pub mod error;

/// JSON request and response binding.
pub mod parser;

/// API Gateway proxy response mapping.
pub mod response;
