//! The "put book" workload
//!
//! This is what the candidate version runs in production: it takes a batch
//! of queue records, parses the first body as a book and stores it keyed by
//! isbn. The in-process invoker uses it to stand in for a deployed function.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{HookError, Result};
use crate::store::ConsistencyStore;

/// Book as submitted by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub year: String,
    pub author: String,
    pub review: i64,
}

impl Book {
    /// The synthetic book used by the canary hook, stored under `key`
    pub fn sentinel(key: impl Into<String>) -> Self {
        Self {
            isbn: key.into(),
            title: "Test".to_string(),
            year: "111".to_string(),
            author: "Test".to_string(),
            review: 1,
        }
    }
}

/// Book as persisted in the books table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBook {
    pub isbn: String,
    pub title: String,
    pub year: String,
    pub author: String,
    pub reviews: i64,
}

impl From<Book> for StoredBook {
    fn from(book: Book) -> Self {
        Self {
            isbn: book.isbn,
            title: book.title,
            year: book.year,
            author: book.author,
            reviews: book.review,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub body: String,
}

/// Queue event delivered to the workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBatch {
    #[serde(rename = "Records")]
    pub records: Vec<Record>,
}

impl RecordBatch {
    /// A batch carrying one book
    pub fn single(book: &Book) -> Result<Self> {
        Ok(Self {
            records: vec![Record {
                body: serde_json::to_string(book)?,
            }],
        })
    }
}

/// Stores the first book of the batch
///
/// # Errors
/// Fails on an empty batch, a malformed body, or a store failure.
pub async fn put_book(
    store: &dyn ConsistencyStore,
    table: &str,
    batch: &RecordBatch,
) -> Result<StoredBook> {
    let record = batch
        .records
        .first()
        .ok_or_else(|| HookError::InvalidEvent("batch contains no records".to_string()))?;

    let book: Book = serde_json::from_str(&record.body).map_err(|e| {
        error!("Malformed book record: {}", e);
        HookError::InvalidEvent(format!("malformed book record: {}", e))
    })?;

    let stored = StoredBook::from(book);
    let item = serde_json::to_value(&stored)?;

    store.put(table, &stored.isbn, item).await.inspect_err(|e| {
        error!("Failed to store book {}: {}", stored.isbn, e);
    })?;

    debug!("Stored book {} in {}", stored.isbn, table);
    Ok(stored)
}
