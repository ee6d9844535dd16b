use crate::dynamodb::{
    Item,
    client::{DynamoDbApi, StoreError},
};

use async_trait::async_trait;
use aws_sdk_dynamodb::types;
use std::{collections, sync};

/// A recorded point read.
#[derive(Clone, Debug, PartialEq)]
pub struct GetItemCall {
    /// The table read from.
    pub table_name: String,
    /// The key requested.
    pub key: Item,
    /// Whether a strongly consistent read was requested.
    pub consistent_read: bool,
}

#[derive(Debug, Default)]
struct State {
    get_item_calls: Vec<GetItemCall>,
    put_item_calls: Vec<types::Put>,
    transact_get_calls: Vec<Vec<types::TransactGetItem>>,
    transact_write_calls: Vec<Vec<types::TransactWriteItem>>,
    get_item_results: collections::VecDeque<Result<Option<Item>, StoreError>>,
    put_item_results: collections::VecDeque<Result<(), StoreError>>,
    transact_get_results: collections::VecDeque<Result<Vec<types::ItemResponse>, StoreError>>,
    transact_write_results: collections::VecDeque<Result<(), StoreError>>,
}

/// Test double for [`DynamoDbApi`].
///
/// Every call is recorded. Results pushed with the `push_*` methods are
/// replayed in order; once a queue is empty the call succeeds with an empty
/// answer (no item, or one empty response per transactional read).
#[derive(Debug, Default)]
pub struct MockDynamoDb {
    state: sync::Mutex<State>,
}

impl MockDynamoDb {
    fn state(&self) -> sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(sync::PoisonError::into_inner)
    }

    /// Queue the result of the next `get_item` call.
    pub fn push_get_item_result(&self, result: Result<Option<Item>, StoreError>) {
        self.state().get_item_results.push_back(result);
    }

    /// Queue the result of the next `put_item` call.
    pub fn push_put_item_result(&self, result: Result<(), StoreError>) {
        self.state().put_item_results.push_back(result);
    }

    /// Queue the result of the next `transact_get_items` call.
    pub fn push_transact_get_result(&self, result: Result<Vec<types::ItemResponse>, StoreError>) {
        self.state().transact_get_results.push_back(result);
    }

    /// Queue the result of the next `transact_write_items` call.
    pub fn push_transact_write_result(&self, result: Result<(), StoreError>) {
        self.state().transact_write_results.push_back(result);
    }

    /// Recorded `get_item` calls.
    pub fn get_item_calls(&self) -> Vec<GetItemCall> {
        self.state().get_item_calls.clone()
    }

    /// Recorded `put_item` calls.
    pub fn put_item_calls(&self) -> Vec<types::Put> {
        self.state().put_item_calls.clone()
    }

    /// Recorded `transact_get_items` calls.
    pub fn transact_get_calls(&self) -> Vec<Vec<types::TransactGetItem>> {
        self.state().transact_get_calls.clone()
    }

    /// Recorded `transact_write_items` calls.
    pub fn transact_write_calls(&self) -> Vec<Vec<types::TransactWriteItem>> {
        self.state().transact_write_calls.clone()
    }
}

#[async_trait]
impl DynamoDbApi for MockDynamoDb {
    async fn get_item(
        &self,
        table_name: &str,
        key: Item,
        consistent_read: bool,
    ) -> Result<Option<Item>, StoreError> {
        let mut state = self.state();
        state.get_item_calls.push(GetItemCall {
            table_name: table_name.to_string(),
            key,
            consistent_read,
        });
        state.get_item_results.pop_front().unwrap_or(Ok(None))
    }

    async fn put_item(&self, put: types::Put) -> Result<(), StoreError> {
        let mut state = self.state();
        state.put_item_calls.push(put);
        state.put_item_results.pop_front().unwrap_or(Ok(()))
    }

    async fn transact_get_items(
        &self,
        items: Vec<types::TransactGetItem>,
    ) -> Result<Vec<types::ItemResponse>, StoreError> {
        let mut state = self.state();
        let count = items.len();
        state.transact_get_calls.push(items);
        state.transact_get_results.pop_front().unwrap_or_else(|| {
            Ok((0..count)
                .map(|_| types::ItemResponse::builder().build())
                .collect())
        })
    }

    async fn transact_write_items(
        &self,
        items: Vec<types::TransactWriteItem>,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        state.transact_write_calls.push(items);
        state.transact_write_results.pop_front().unwrap_or(Ok(()))
    }
}
