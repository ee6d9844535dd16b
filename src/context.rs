use crate::dynamodb::transaction::{ReadTransaction, WriteTransaction};

use serde_json::Value;
use std::collections;

/// Request-scoped state of a single Lambda invocation.
///
/// A context is created when the invocation starts and dropped when it ends.
/// Besides a free-form key/value bag it owns the pending read and write
/// transaction buffers, so several repositories (possibly targeting
/// different tables) can contribute to the same atomic transaction.
///
/// ```rust
/// use lambda_commons::context::LambdaContext;
/// use serde_json::json;
///
/// let mut ctx = LambdaContext::new();
/// ctx.set("user_id", json!("123"));
/// assert!(ctx.exists("user_id"));
/// assert_eq!(ctx.get("user_id"), Some(&json!("123")));
/// ```
#[derive(Debug, Default)]
pub struct LambdaContext {
    values: collections::HashMap<String, Value>,
    read_transaction: Option<ReadTransaction>,
    write_transaction: Option<WriteTransaction>,
}

impl LambdaContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Whether a non-null value is stored under `key`.
    ///
    /// Storing [`Value::Null`] clears a key.
    pub fn exists(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(|value| !value.is_null())
    }

    /// Whether a read transaction has been started and not yet executed.
    pub fn has_read_transaction(&self) -> bool {
        self.read_transaction.is_some()
    }

    /// Whether a write transaction has been started and not yet executed.
    pub fn has_write_transaction(&self) -> bool {
        self.write_transaction.is_some()
    }

    /// The pending read transaction, if any.
    pub fn read_transaction(&self) -> Option<&ReadTransaction> {
        self.read_transaction.as_ref()
    }

    /// The pending write transaction, if any.
    pub fn write_transaction(&self) -> Option<&WriteTransaction> {
        self.write_transaction.as_ref()
    }

    pub(crate) fn read_transaction_mut(&mut self) -> Option<&mut ReadTransaction> {
        self.read_transaction.as_mut()
    }

    pub(crate) fn write_transaction_mut(&mut self) -> Option<&mut WriteTransaction> {
        self.write_transaction.as_mut()
    }

    pub(crate) fn begin_read_transaction(&mut self) {
        self.read_transaction = Some(ReadTransaction::default());
    }

    pub(crate) fn begin_write_transaction(&mut self) {
        self.write_transaction = Some(WriteTransaction::default());
    }

    pub(crate) fn take_read_transaction(&mut self) -> Option<ReadTransaction> {
        self.read_transaction.take()
    }

    pub(crate) fn take_write_transaction(&mut self) -> Option<WriteTransaction> {
        self.write_transaction.take()
    }
}
