//! Collections, documents and the query shapes the store understands.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::error::{ErrorContext, StoreError, StoreResult};
use crate::models::StoreTimestamp;

/// Named collections held by the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Reports,
    Categories,
    Users,
    Resources,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Reports => "reports",
            Collection::Categories => "categories",
            Collection::Users => "users",
            Collection::Resources => "resources",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reports" => Ok(Self::Reports),
            "categories" => Ok(Self::Categories),
            "users" => Ok(Self::Users),
            "resources" => Ok(Self::Resources),
            _ => Err(format!("Unknown collection: {}", s)),
        }
    }
}

/// A stored document: its identifier plus its field mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a document from a JSON object. Non-object values yield no fields.
    pub fn from_value(id: impl Into<String>, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(id, fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Decode into a record type with the document id merged in as `id`.
    ///
    /// The store-assigned identifier wins over any `id` stored in the fields.
    pub fn into_record<T: DeserializeOwned>(self, collection: Collection) -> StoreResult<T> {
        let Document { id, mut fields } = self;
        fields.insert("id".to_string(), Value::String(id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            StoreError::decode_with_context(
                e.to_string(),
                ErrorContext::new("decode_document")
                    .with_collection(collection)
                    .with_document_id(id),
            )
        })
    }
}

/// Equality filter on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn matches(&self, document: &Document) -> bool {
        document.get(&self.field) == Some(&self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordering on a time-valued field.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Sort documents client-side the way the store would.
    ///
    /// Values are compared as timestamps (native or ISO-8601). Documents whose
    /// field is missing or unparseable sort last in either direction; the sort
    /// is stable so their relative order is kept.
    pub fn sort(&self, documents: &mut [Document]) {
        documents.sort_by(|a, b| {
            let ka = time_key(a.get(&self.field));
            let kb = time_key(b.get(&self.field));
            match (ka, kb) {
                (Some(x), Some(y)) => match self.direction {
                    SortDirection::Ascending => x.cmp(&y),
                    SortDirection::Descending => y.cmp(&x),
                },
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }
}

fn time_key(value: Option<&Value>) -> Option<chrono::DateTime<chrono::Utc>> {
    let value = value?;
    serde_json::from_value::<StoreTimestamp>(value.clone())
        .ok()
        .and_then(|ts| ts.to_datetime())
}

/// Equality filters plus an optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// Every document in the collection, store order.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy::descending(field));
        self
    }

    /// Same filters, no store-side ordering.
    pub fn without_ordering(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            order_by: None,
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(document))
    }

    /// Apply filters and ordering to an in-memory document set.
    pub fn apply(&self, documents: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut selected: Vec<Document> =
            documents.into_iter().filter(|d| self.matches(d)).collect();
        if let Some(order) = &self.order_by {
            order.sort(&mut selected);
        }
        selected
    }
}
