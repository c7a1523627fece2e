//! Per-call options for the item and read actions.

use ddbwire_model::{AttributeMap, ReturnValue};

use crate::expression::{Condition, Projection};

/// Options for [`Client::get_item`](crate::Client::get_item).
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Attributes to return; all when `None`.
    pub projection: Option<Projection>,
    /// Use a strongly consistent read.
    pub consistent_read: bool,
}

/// Options for the single-item writes: put, update and delete.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// The write only happens if this holds.
    pub condition: Option<Condition>,
    /// Which attributes to return.
    pub return_values: ReturnValue,
}

impl WriteOptions {
    /// Write only if `condition` holds.
    #[must_use]
    pub fn condition(condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            ..Self::default()
        }
    }

    /// Return the given attributes.
    #[must_use]
    pub fn returning(mut self, return_values: ReturnValue) -> Self {
        self.return_values = return_values;
        self
    }
}

/// Options for [`Client::query`](crate::Client::query) and friends.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Query a secondary index instead of the table.
    pub index: Option<String>,
    /// Drop items that do not match after the key condition.
    pub filter: Option<Condition>,
    /// Attributes to return; all when `None`.
    pub projection: Option<Projection>,
    /// Ascending sort-key order.
    pub scan_forward: bool,
    /// Use a strongly consistent read.
    pub consistent_read: bool,
    /// Stop after this many items; for a single page, the page size.
    pub limit: Option<u64>,
    /// Resume after this key.
    pub start_key: Option<AttributeMap>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            index: None,
            filter: None,
            projection: None,
            scan_forward: true,
            consistent_read: false,
            limit: None,
            start_key: None,
        }
    }
}

/// Options for [`Client::scan`](crate::Client::scan) and friends.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Scan a secondary index instead of the table.
    pub index: Option<String>,
    /// Drop items that do not match.
    pub filter: Option<Condition>,
    /// Attributes to return; all when `None`.
    pub projection: Option<Projection>,
    /// Use a strongly consistent read.
    pub consistent_read: bool,
    /// Stop after this many items; for a single page, the page size.
    pub limit: Option<u64>,
    /// Resume after this key.
    pub start_key: Option<AttributeMap>,
    /// Parallel scan segment as `(segment, total_segments)`.
    pub segment: Option<(u32, u32)>,
}

/// One page of a query or scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in this page.
    pub items: Vec<T>,
    /// Cursor to pass as `start_key` for the next page, `None` on the last page.
    pub last_evaluated_key: Option<AttributeMap>,
}

impl<T> Page<T> {
    /// A page with no items that resumes from `cursor`.
    #[must_use]
    pub fn empty(cursor: Option<AttributeMap>) -> Self {
        Self {
            items: Vec::new(),
            last_evaluated_key: cursor,
        }
    }
}
