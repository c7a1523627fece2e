//! Response shapes for the item actions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attribute_value::AttributeMap;

/// Output for the `PutItem` action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemOutput {
    /// Attributes returned per `ReturnValues`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: AttributeMap,
}

/// Output for the `GetItem` action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemOutput {
    /// The item, absent when no item has the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<AttributeMap>,
}

/// Output for the `UpdateItem` action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemOutput {
    /// Attributes returned per `ReturnValues`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: AttributeMap,
}

/// Output for the `DeleteItem` action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemOutput {
    /// Attributes returned per `ReturnValues`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: AttributeMap,
}

/// Output for the `Query` and `Scan` actions; both return the same page shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageOutput {
    /// Items in this page. Absent when `Select=COUNT`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<AttributeMap>,

    /// Number of items in this page.
    #[serde(default)]
    pub count: u64,

    /// Number of items evaluated before the filter was applied.
    #[serde(default)]
    pub scanned_count: u64,

    /// Cursor for the next page, empty on the last page.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub last_evaluated_key: AttributeMap,
}
