use crate::{
    context::LambdaContext,
    dynamodb::{
        Item,
        client::{DynamoDbApi, StoreError},
        condition::ConditionExpression,
        key::{ComplexPrimaryKey, SimplePrimaryKey},
    },
    error::ApplicationError,
};

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::to_item;
use std::sync::Arc;

/// Reads and writes items of a single table.
///
/// Every operation takes a `transactional` flag. When it is set the request
/// is not executed; it is appended to the matching transaction buffer of the
/// context instead, to be submitted by
/// [`TransactionManager`](crate::dynamodb::transaction::TransactionManager).
#[derive(Clone)]
pub struct DynamodbRepository {
    client: Arc<dyn DynamoDbApi>,
    table_name: String,
}

impl std::fmt::Debug for DynamodbRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamodbRepository")
            .field("table_name", &self.table_name)
            .finish_non_exhaustive()
    }
}

impl DynamodbRepository {
    /// Create a repository for `table_name`.
    pub fn new(client: Arc<dyn DynamoDbApi>, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// The table this repository targets.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Read the item whose partition key is `key`.
    ///
    /// A missing item is returned as an empty map. When `transactional` is
    /// set, the read is buffered and an empty map is returned immediately.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "lambda_commons.find_by_simple_primary_key",
            skip_all,
            fields(table = %self.table_name),
            err
        )
    )]
    pub async fn find_by_simple_primary_key<K: Serialize>(
        &self,
        ctx: &mut LambdaContext,
        key: &SimplePrimaryKey<K>,
        consistent_read: bool,
        transactional: bool,
    ) -> Result<Item, ApplicationError> {
        let keys = key.to_item()?;
        self.find_by_primary_key(ctx, keys, consistent_read, transactional)
            .await
    }

    /// Read the item whose partition and sort keys are `key`.
    ///
    /// Same semantics as [`Self::find_by_simple_primary_key`].
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "lambda_commons.find_by_complex_primary_key",
            skip_all,
            fields(table = %self.table_name),
            err
        )
    )]
    pub async fn find_by_complex_primary_key<P: Serialize, S: Serialize>(
        &self,
        ctx: &mut LambdaContext,
        key: &ComplexPrimaryKey<P, S>,
        consistent_read: bool,
        transactional: bool,
    ) -> Result<Item, ApplicationError> {
        let keys = key.to_item()?;
        self.find_by_primary_key(ctx, keys, consistent_read, transactional)
            .await
    }

    /// Insert `item` under `key`, failing if an item with that key exists.
    ///
    /// The key attribute is merged into the serialized item. An existing item
    /// is reported as a 403.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "lambda_commons.save_if_not_present_with_simple_primary_key",
            skip_all,
            fields(table = %self.table_name),
            err
        )
    )]
    pub async fn save_if_not_present_with_simple_primary_key<K: Serialize, T: Serialize>(
        &self,
        ctx: &mut LambdaContext,
        key: &SimplePrimaryKey<K>,
        item: &T,
        transactional: bool,
    ) -> Result<(), ApplicationError> {
        let keys = key.to_item()?;
        let condition = ConditionExpression::attribute_not_exists(&[key.name.as_str()]);
        let mut item = marshal_item(item)?;
        item.extend(keys);
        self.save_item(ctx, item, condition, transactional).await
    }

    /// Insert `item` under `key`, failing if an item with that key exists.
    ///
    /// Same semantics as [`Self::save_if_not_present_with_simple_primary_key`],
    /// with the condition covering both key attributes.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "lambda_commons.save_if_not_present_with_complex_primary_key",
            skip_all,
            fields(table = %self.table_name),
            err
        )
    )]
    pub async fn save_if_not_present_with_complex_primary_key<
        P: Serialize,
        S: Serialize,
        T: Serialize,
    >(
        &self,
        ctx: &mut LambdaContext,
        key: &ComplexPrimaryKey<P, S>,
        item: &T,
        transactional: bool,
    ) -> Result<(), ApplicationError> {
        let keys = key.to_item()?;
        let condition = ConditionExpression::attribute_not_exists(&[
            key.partition_key.name.as_str(),
            key.sort_key.name.as_str(),
        ]);
        let mut item = marshal_item(item)?;
        item.extend(keys);
        self.save_item(ctx, item, condition, transactional).await
    }

    /// Insert or replace `item` unconditionally.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "lambda_commons.save",
            skip_all,
            fields(table = %self.table_name),
            err
        )
    )]
    pub async fn save<T: Serialize>(
        &self,
        ctx: &mut LambdaContext,
        item: &T,
        transactional: bool,
    ) -> Result<(), ApplicationError> {
        let item = marshal_item(item)?;
        self.save_item(ctx, item, ConditionExpression::default(), transactional)
            .await
    }

    async fn find_by_primary_key(
        &self,
        ctx: &mut LambdaContext,
        keys: Item,
        consistent_read: bool,
        transactional: bool,
    ) -> Result<Item, ApplicationError> {
        if transactional {
            let transaction = ctx.read_transaction_mut().ok_or_else(|| {
                ApplicationError::internal_server_error("there is no read transaction in progress")
            })?;
            let get = types::Get::builder()
                .table_name(&self.table_name)
                .set_key(Some(keys))
                .build()
                .map_err(|_| {
                    ApplicationError::internal_server_error("error while building read request")
                })?;
            transaction.push(types::TransactGetItem::builder().get(get).build());
            return Ok(Item::new());
        }
        let item = self
            .client
            .get_item(&self.table_name, keys, consistent_read)
            .await
            .map_err(|_| {
                ApplicationError::internal_server_error("error while reading from database")
            })?;
        Ok(item.unwrap_or_default())
    }

    async fn save_item(
        &self,
        ctx: &mut LambdaContext,
        item: Item,
        condition: ConditionExpression,
        transactional: bool,
    ) -> Result<(), ApplicationError> {
        let (condition_expression, expression_attribute_names, expression_attribute_values) =
            condition.into_parts();
        let put = types::Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(expression_attribute_names)
            .set_expression_attribute_values(expression_attribute_values)
            .build()
            .map_err(|_| {
                ApplicationError::internal_server_error("error while building save expression")
            })?;
        if transactional {
            let transaction = ctx.write_transaction_mut().ok_or_else(|| {
                ApplicationError::internal_server_error(
                    "there is no write transaction in progress",
                )
            })?;
            transaction.push(types::TransactWriteItem::builder().put(put).build());
            return Ok(());
        }
        self.client.put_item(put).await.map_err(|error| match error {
            StoreError::ConditionalCheckFailed(_) => {
                ApplicationError::forbidden("item already exists")
            }
            _ => ApplicationError::internal_server_error("error while writing into database"),
        })
    }
}

fn marshal_item<T: Serialize>(item: &T) -> Result<Item, ApplicationError> {
    to_item(item).map_err(|_| ApplicationError::internal_server_error("error while marshaling item"))
}
