use crate::dynamodb::Item;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    Client,
    error::{DisplayErrorContext, SdkError},
    operation, types,
};

/// Failure reported by a DynamoDB backend.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A conditional write found its condition false.
    #[error("conditional check failed: {0}")]
    ConditionalCheckFailed(String),
    /// A transaction was cancelled; one reason per submitted item.
    #[error("transaction cancelled: {0:?}")]
    TransactionCanceled(Vec<types::CancellationReason>),
    /// Any other service or transport failure.
    #[error("{0}")]
    Service(String),
}

impl StoreError {
    fn service<E, R>(error: &SdkError<E, R>) -> Self
    where
        E: std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        Self::Service(DisplayErrorContext(error).to_string())
    }
}

/// The subset of DynamoDB used by the repositories.
///
/// Kept as close as possible to `aws_sdk_dynamodb::Client`, so that a test
/// double can stand in for the real client.
#[async_trait]
pub trait DynamoDbApi: Send + Sync {
    /// Point read. Returns `None` when no item has the given key.
    async fn get_item(
        &self,
        table_name: &str,
        key: Item,
        consistent_read: bool,
    ) -> Result<Option<Item>, StoreError>;

    /// Point write, honouring the condition expression carried by `put`.
    async fn put_item(&self, put: types::Put) -> Result<(), StoreError>;

    /// Atomic batched read. Responses are in request order.
    async fn transact_get_items(
        &self,
        items: Vec<types::TransactGetItem>,
    ) -> Result<Vec<types::ItemResponse>, StoreError>;

    /// Atomic batched write.
    async fn transact_write_items(
        &self,
        items: Vec<types::TransactWriteItem>,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl DynamoDbApi for Client {
    async fn get_item(
        &self,
        table_name: &str,
        key: Item,
        consistent_read: bool,
    ) -> Result<Option<Item>, StoreError> {
        let output = self
            .get_item()
            .table_name(table_name)
            .set_key(Some(key))
            .consistent_read(consistent_read)
            .send()
            .await
            .map_err(|error| StoreError::service(&error))?;
        Ok(output.item)
    }

    async fn put_item(&self, put: types::Put) -> Result<(), StoreError> {
        let result = self
            .put_item()
            .table_name(put.table_name)
            .set_item(Some(put.item))
            .set_condition_expression(put.condition_expression)
            .set_expression_attribute_names(put.expression_attribute_names)
            .set_expression_attribute_values(put.expression_attribute_values)
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(error) => match error.as_service_error() {
                Some(operation::put_item::PutItemError::ConditionalCheckFailedException(
                    exception,
                )) => Err(StoreError::ConditionalCheckFailed(
                    exception.message().unwrap_or_default().to_string(),
                )),
                _ => Err(StoreError::service(&error)),
            },
        }
    }

    async fn transact_get_items(
        &self,
        items: Vec<types::TransactGetItem>,
    ) -> Result<Vec<types::ItemResponse>, StoreError> {
        let result = self
            .transact_get_items()
            .set_transact_items(Some(items))
            .send()
            .await;
        match result {
            Ok(output) => Ok(output.responses.unwrap_or_default()),
            Err(error) => match error.as_service_error() {
                Some(
                    operation::transact_get_items::TransactGetItemsError::TransactionCanceledException(
                        exception,
                    ),
                ) => Err(StoreError::TransactionCanceled(
                    exception.cancellation_reasons().to_vec(),
                )),
                _ => Err(StoreError::service(&error)),
            },
        }
    }

    async fn transact_write_items(
        &self,
        items: Vec<types::TransactWriteItem>,
    ) -> Result<(), StoreError> {
        let result = self
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(error) => match error.as_service_error() {
                Some(
                    operation::transact_write_items::TransactWriteItemsError::TransactionCanceledException(
                        exception,
                    ),
                ) => Err(StoreError::TransactionCanceled(
                    exception.cancellation_reasons().to_vec(),
                )),
                _ => Err(StoreError::service(&error)),
            },
        }
    }
}
