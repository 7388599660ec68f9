//! Consistency store
//!
//! The downstream key/value store the candidate writes to. The hook needs
//! three operations on it: a put (used by the workload), a strongly
//! consistent get, and a delete for cleanup.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::{HookError, Result};

#[async_trait]
pub trait ConsistencyStore: Send + Sync {
    async fn put(&self, table: &str, key: &str, item: Value) -> Result<()>;

    /// Strongly consistent read; `None` when the key is absent
    async fn get_consistent(&self, table: &str, key: &str) -> Result<Option<Value>>;

    /// Removes the item; deleting an absent key succeeds
    async fn delete(&self, table: &str, key: &str) -> Result<()>;
}

/// Store kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: Mutex<HashMap<(String, String), Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, table: &str, key: &str) -> bool {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(table.to_string(), key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConsistencyStore for InMemoryStore {
    async fn put(&self, table: &str, key: &str, item: Value) -> Result<()> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((table.to_string(), key.to_string()), item);
        Ok(())
    }

    async fn get_consistent(&self, table: &str, key: &str) -> Result<Option<Value>> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(table.to_string(), key.to_string()))
            .cloned())
    }

    async fn delete(&self, table: &str, key: &str) -> Result<()> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(table.to_string(), key.to_string()));
        Ok(())
    }
}

/// Store reached over HTTP
///
/// Items live at `{base}/tables/{table}/items/{key}`:
/// - `PUT` with a JSON body stores an item
/// - `GET ?consistent=true` returns it, or 404
/// - `DELETE` removes it (404 counts as removed)
#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: Url,
    client: Client,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| HookError::Config(format!("invalid store URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(HookError::Config(format!(
                "store URL '{}' cannot be used as a base",
                base_url
            )));
        }
        Ok(Self { base_url, client })
    }

    /// Builds the item URL, percent-encoding table and key
    fn item_url(&self, table: &str, key: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| HookError::Config("store URL cannot be used as a base".to_string()))?
            .pop_if_empty()
            .extend(["tables", table, "items", key]);
        Ok(url)
    }
}

#[async_trait]
impl ConsistencyStore for HttpStore {
    async fn put(&self, table: &str, key: &str, item: Value) -> Result<()> {
        let response = self
            .client
            .put(self.item_url(table, key)?)
            .json(&item)
            .send()
            .await
            .map_err(|e| HookError::store("put", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HookError::store("put", format!("{}: {}", status, body)));
        }
        Ok(())
    }

    async fn get_consistent(&self, table: &str, key: &str) -> Result<Option<Value>> {
        let response = self
            .client
            .get(self.item_url(table, key)?)
            .query(&[("consistent", "true")])
            .send()
            .await
            .map_err(|e| HookError::store("read", e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HookError::store("read", format!("{}: {}", status, body)));
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| HookError::store("read", format!("invalid item body: {}", e)))
    }

    async fn delete(&self, table: &str, key: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.item_url(table, key)?)
            .send()
            .await
            .map_err(|e| HookError::store("delete", e.to_string()))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(HookError::store("delete", format!("{}: {}", status, body)))
    }
}
