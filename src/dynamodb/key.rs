use crate::{dynamodb::Item, error::ApplicationError};

use serde::Serialize;
use serde_dynamo::to_attribute_value;

/// Primary key made of a single partition key attribute.
///
/// ```rust
/// use lambda_commons::dynamodb::key;
///
/// let key = key::SimplePrimaryKey {
///     name: "user_id".to_string(),
///     value: "123".to_string(),
/// };
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimplePrimaryKey<T> {
    /// The attribute name of the key.
    pub name: String,
    /// The value of the key.
    pub value: T,
}

/// Primary key made of a partition key and a sort key.
///
/// ```rust
/// use lambda_commons::dynamodb::key;
///
/// let key = key::ComplexPrimaryKey {
///     partition_key: key::SimplePrimaryKey {
///         name: "user_id".to_string(),
///         value: "123".to_string(),
///     },
///     sort_key: key::SimplePrimaryKey {
///         name: "created_at".to_string(),
///         value: 1_700_000_000,
///     },
/// };
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComplexPrimaryKey<P, S = P> {
    /// The partition key.
    pub partition_key: SimplePrimaryKey<P>,
    /// The sort key.
    pub sort_key: SimplePrimaryKey<S>,
}

impl<T> SimplePrimaryKey<T> {
    /// Create a key from its attribute name and value.
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl<T: Serialize> SimplePrimaryKey<T> {
    pub(crate) fn to_item(&self) -> Result<Item, ApplicationError> {
        let value = to_attribute_value(&self.value).map_err(|_| {
            ApplicationError::internal_server_error("error while marshaling database partition key")
        })?;
        Ok(Item::from([(self.name.clone(), value)]))
    }
}

impl<P: Serialize, S: Serialize> ComplexPrimaryKey<P, S> {
    pub(crate) fn to_item(&self) -> Result<Item, ApplicationError> {
        let mut keys = self.partition_key.to_item()?;
        let sort_key_value = to_attribute_value(&self.sort_key.value).map_err(|_| {
            ApplicationError::internal_server_error("error while marshaling database sort key")
        })?;
        keys.insert(self.sort_key.name.clone(), sort_key_value);
        Ok(keys)
    }
}
