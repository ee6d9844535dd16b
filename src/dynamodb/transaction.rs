use crate::{
    context::LambdaContext,
    dynamodb::{
        Item,
        client::{DynamoDbApi, StoreError},
    },
    error::ApplicationError,
};

use aws_sdk_dynamodb::types;
use std::sync::Arc;

/// Cancellation reason code reported for a failed condition.
const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailed";

/// Pending reads of a read transaction, in submission order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadTransaction {
    items: Vec<types::TransactGetItem>,
}

impl ReadTransaction {
    pub(crate) fn push(&mut self, item: types::TransactGetItem) {
        self.items.push(item);
    }

    /// The buffered requests.
    pub fn items(&self) -> &[types::TransactGetItem] {
        &self.items
    }

    /// Number of buffered requests.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing has been buffered yet.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn table_names(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| {
                item.get()
                    .map(|get| get.table_name().to_string())
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// Pending writes of a write transaction, in submission order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteTransaction {
    items: Vec<types::TransactWriteItem>,
}

impl WriteTransaction {
    pub(crate) fn push(&mut self, item: types::TransactWriteItem) {
        self.items.push(item);
    }

    /// The buffered requests.
    pub fn items(&self) -> &[types::TransactWriteItem] {
        &self.items
    }

    /// Number of buffered requests.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing has been buffered yet.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Starts and executes the transactions buffered in a [`LambdaContext`].
///
/// Read and write transactions are independent: each can be idle or active,
/// and a context holds at most one of each kind.
///
/// ```rust,no_run
/// use lambda_commons::context::LambdaContext;
/// use lambda_commons::dynamodb::{key, repository, transaction};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # async fn example(client: aws_sdk_dynamodb::Client) -> Result<(), lambda_commons::error::ApplicationError> {
/// let client = Arc::new(client);
/// let users = repository::DynamodbRepository::new(client.clone(), "users");
/// let emails = repository::DynamodbRepository::new(client.clone(), "emails");
/// let manager = transaction::TransactionManager::new(client);
///
/// let mut ctx = LambdaContext::new();
/// manager.start_write_transaction(&mut ctx)?;
/// users
///     .save_if_not_present_with_simple_primary_key(
///         &mut ctx,
///         &key::SimplePrimaryKey::new("user_id", "123"),
///         &json!({"email": "a@b.com"}),
///         true,
///     )
///     .await?;
/// emails
///     .save_if_not_present_with_simple_primary_key(
///         &mut ctx,
///         &key::SimplePrimaryKey::new("email", "a@b.com"),
///         &json!({"user_id": "123"}),
///         true,
///     )
///     .await?;
/// manager.execute_write_transaction(&mut ctx).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TransactionManager {
    client: Arc<dyn DynamoDbApi>,
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager").finish_non_exhaustive()
    }
}

impl TransactionManager {
    /// Create a manager submitting transactions through `client`.
    pub fn new(client: Arc<dyn DynamoDbApi>) -> Self {
        Self { client }
    }

    /// Open an empty read transaction in `ctx`.
    pub fn start_read_transaction(&self, ctx: &mut LambdaContext) -> Result<(), ApplicationError> {
        if ctx.has_read_transaction() {
            return Err(ApplicationError::internal_server_error(
                "there is already a read transaction in progress in this scope",
            ));
        }
        ctx.begin_read_transaction();
        Ok(())
    }

    /// Submit the read transaction buffered in `ctx`.
    ///
    /// The result merges every returned item into a single map keyed by
    /// `"{table}#{attribute}"`. The context slot is cleared whatever the
    /// outcome.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "lambda_commons.execute_read_transaction", skip_all, err)
    )]
    pub async fn execute_read_transaction(
        &self,
        ctx: &mut LambdaContext,
    ) -> Result<Item, ApplicationError> {
        let transaction = ctx.take_read_transaction().ok_or_else(|| {
            ApplicationError::internal_server_error("there is no read transaction in progress")
        })?;
        let table_names = transaction.table_names();
        let responses = self
            .client
            .transact_get_items(transaction.items)
            .await
            .map_err(transaction_error)?;
        merge_item_responses(&table_names, responses)
    }

    /// Open an empty write transaction in `ctx`.
    pub fn start_write_transaction(&self, ctx: &mut LambdaContext) -> Result<(), ApplicationError> {
        if ctx.has_write_transaction() {
            return Err(ApplicationError::internal_server_error(
                "there is already a write transaction in progress in this scope",
            ));
        }
        ctx.begin_write_transaction();
        Ok(())
    }

    /// Submit the write transaction buffered in `ctx` in a single call.
    ///
    /// The context slot is cleared whatever the outcome.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "lambda_commons.execute_write_transaction", skip_all, err)
    )]
    pub async fn execute_write_transaction(
        &self,
        ctx: &mut LambdaContext,
    ) -> Result<(), ApplicationError> {
        let transaction = ctx.take_write_transaction().ok_or_else(|| {
            ApplicationError::internal_server_error("there is no write transaction in progress")
        })?;
        self.client
            .transact_write_items(transaction.items)
            .await
            .map_err(transaction_error)
    }
}

/// Translate a failed transaction into the error reported to the caller.
///
/// A cancellation caused by a failed condition is a 403 carrying the
/// reason's message; anything else is a generic 500.
pub fn transaction_error(error: StoreError) -> ApplicationError {
    if let StoreError::TransactionCanceled(reasons) = &error {
        let conditional_check_failed = reasons
            .iter()
            .find(|reason| reason.code() == Some(CONDITIONAL_CHECK_FAILED));
        if let Some(reason) = conditional_check_failed {
            return ApplicationError::forbidden(format!(
                "conditional check failed: {}",
                reason.message().unwrap_or_default()
            ));
        }
    }
    #[cfg(feature = "tracing")]
    tracing::warn!(%error, "transaction failed");
    ApplicationError::internal_server_error("generic error performing transaction")
}

/// Flatten transactional read responses into one map.
///
/// `table_names[i]` is the table `responses[i]` was read from. Attributes are
/// keyed `"{table}#{attribute}"`; equal keys overwrite each other.
pub fn merge_item_responses(
    table_names: &[String],
    responses: Vec<types::ItemResponse>,
) -> Result<Item, ApplicationError> {
    if table_names.len() != responses.len() {
        return Err(ApplicationError::internal_server_error(
            "mismatched transaction responses",
        ));
    }
    let mut merged = Item::new();
    for (table_name, response) in table_names.iter().zip(responses) {
        for (attribute, value) in response.item.unwrap_or_default() {
            merged.insert(format!("{table_name}#{attribute}"), value);
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dynamodb::mock::MockDynamoDb;
    use rstest::rstest;

    fn item_response(attributes: &[(&str, &str)]) -> types::ItemResponse {
        let item = attributes
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    types::AttributeValue::S(value.to_string()),
                )
            })
            .collect();
        types::ItemResponse::builder().set_item(Some(item)).build()
    }

    fn cancellation_reason(code: &str, message: &str) -> types::CancellationReason {
        types::CancellationReason::builder()
            .code(code)
            .message(message)
            .build()
    }

    fn transact_get_item(table_name: &str) -> types::TransactGetItem {
        let get = types::Get::builder()
            .table_name(table_name)
            .set_key(Some(Item::from([(
                "id".to_string(),
                types::AttributeValue::S("1".to_string()),
            )])))
            .build()
            .unwrap();
        types::TransactGetItem::builder().get(get).build()
    }

    #[test]
    fn test_merge_item_responses() {
        let table_names = vec!["tableA".to_string(), "tableB".to_string()];
        let responses = vec![
            item_response(&[("key1", "v1")]),
            item_response(&[("key1", "v2")]),
        ];
        let expected = Item::from([
            (
                "tableA#key1".to_string(),
                types::AttributeValue::S("v1".to_string()),
            ),
            (
                "tableB#key1".to_string(),
                types::AttributeValue::S("v2".to_string()),
            ),
        ]);
        assert_eq!(
            merge_item_responses(&table_names, responses).unwrap(),
            expected
        );
    }

    #[test]
    fn test_merge_item_responses_missing_item() {
        let table_names = vec!["tableA".to_string()];
        let responses = vec![types::ItemResponse::builder().build()];
        assert_eq!(
            merge_item_responses(&table_names, responses).unwrap(),
            Item::new()
        );
    }

    #[test]
    fn test_merge_item_responses_length_mismatch() {
        let table_names = vec!["tableA".to_string(), "tableB".to_string()];
        let responses = vec![item_response(&[("key1", "v1")])];
        assert_eq!(
            merge_item_responses(&table_names, responses).unwrap_err(),
            ApplicationError::internal_server_error("mismatched transaction responses")
        );
    }

    #[rstest]
    #[case::conditional_check_failed(
        StoreError::TransactionCanceled(vec![
            cancellation_reason("None", ""),
            cancellation_reason("ConditionalCheckFailed", "The conditional request failed"),
        ]),
        ApplicationError::forbidden("conditional check failed: The conditional request failed")
    )]
    #[case::other_cancellation(
        StoreError::TransactionCanceled(vec![
            cancellation_reason("TransactionConflict", "conflict"),
        ]),
        ApplicationError::internal_server_error("generic error performing transaction")
    )]
    #[case::no_reasons(
        StoreError::TransactionCanceled(vec![]),
        ApplicationError::internal_server_error("generic error performing transaction")
    )]
    #[case::service(
        StoreError::Service("throttled".to_string()),
        ApplicationError::internal_server_error("generic error performing transaction")
    )]
    fn test_transaction_error(#[case] error: StoreError, #[case] expected: ApplicationError) {
        assert_eq!(transaction_error(error), expected);
    }

    #[test]
    fn test_start_read_transaction_twice() {
        let manager = TransactionManager::new(Arc::new(MockDynamoDb::default()));
        let mut ctx = LambdaContext::new();
        manager.start_read_transaction(&mut ctx).unwrap();
        assert_eq!(
            manager.start_read_transaction(&mut ctx).unwrap_err(),
            ApplicationError::internal_server_error(
                "there is already a read transaction in progress in this scope"
            )
        );
        assert!(ctx.has_read_transaction());
    }

    #[test]
    fn test_start_write_transaction_twice() {
        let manager = TransactionManager::new(Arc::new(MockDynamoDb::default()));
        let mut ctx = LambdaContext::new();
        manager.start_write_transaction(&mut ctx).unwrap();
        assert_eq!(
            manager.start_write_transaction(&mut ctx).unwrap_err(),
            ApplicationError::internal_server_error(
                "there is already a write transaction in progress in this scope"
            )
        );
    }

    #[test]
    fn test_read_and_write_transactions_are_independent() {
        let manager = TransactionManager::new(Arc::new(MockDynamoDb::default()));
        let mut ctx = LambdaContext::new();
        manager.start_read_transaction(&mut ctx).unwrap();
        manager.start_write_transaction(&mut ctx).unwrap();
        assert!(ctx.has_read_transaction());
        assert!(ctx.has_write_transaction());
    }

    #[tokio::test]
    async fn test_execute_read_transaction_without_start() {
        let client = Arc::new(MockDynamoDb::default());
        let manager = TransactionManager::new(client.clone());
        let mut ctx = LambdaContext::new();
        assert_eq!(
            manager.execute_read_transaction(&mut ctx).await.unwrap_err(),
            ApplicationError::internal_server_error("there is no read transaction in progress")
        );
        assert!(client.transact_get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_execute_write_transaction_without_start() {
        let manager = TransactionManager::new(Arc::new(MockDynamoDb::default()));
        let mut ctx = LambdaContext::new();
        assert_eq!(
            manager.execute_write_transaction(&mut ctx).await.unwrap_err(),
            ApplicationError::internal_server_error("there is no write transaction in progress")
        );
    }

    #[tokio::test]
    async fn test_execute_read_transaction() {
        let client = Arc::new(MockDynamoDb::default());
        client.push_transact_get_result(Ok(vec![
            item_response(&[("key1", "v1")]),
            item_response(&[("key1", "v2")]),
        ]));
        let manager = TransactionManager::new(client.clone());
        let mut ctx = LambdaContext::new();
        manager.start_read_transaction(&mut ctx).unwrap();
        if let Some(transaction) = ctx.read_transaction_mut() {
            transaction.push(transact_get_item("tableA"));
            transaction.push(transact_get_item("tableB"));
        }

        let actual = manager.execute_read_transaction(&mut ctx).await.unwrap();

        assert_eq!(actual.len(), 2);
        assert_eq!(
            actual.get("tableB#key1"),
            Some(&types::AttributeValue::S("v2".to_string()))
        );
        assert_eq!(client.transact_get_calls().len(), 1);
        assert_eq!(client.transact_get_calls()[0].len(), 2);
        assert!(!ctx.has_read_transaction());
    }

    #[tokio::test]
    async fn test_execute_read_transaction_failure_clears_slot() {
        let client = Arc::new(MockDynamoDb::default());
        client.push_transact_get_result(Err(StoreError::Service("boom".to_string())));
        let manager = TransactionManager::new(client);
        let mut ctx = LambdaContext::new();
        manager.start_read_transaction(&mut ctx).unwrap();

        assert_eq!(
            manager.execute_read_transaction(&mut ctx).await.unwrap_err(),
            ApplicationError::internal_server_error("generic error performing transaction")
        );
        assert!(!ctx.has_read_transaction());
        manager.start_read_transaction(&mut ctx).unwrap();
    }

    #[tokio::test]
    async fn test_execute_write_transaction_conditional_check_failed() {
        let client = Arc::new(MockDynamoDb::default());
        client.push_transact_write_result(Err(StoreError::TransactionCanceled(vec![
            cancellation_reason("ConditionalCheckFailed", "item exists"),
        ])));
        let manager = TransactionManager::new(client);
        let mut ctx = LambdaContext::new();
        manager.start_write_transaction(&mut ctx).unwrap();

        assert_eq!(
            manager.execute_write_transaction(&mut ctx).await.unwrap_err(),
            ApplicationError::forbidden("conditional check failed: item exists")
        );
        assert!(!ctx.has_write_transaction());
    }
}
