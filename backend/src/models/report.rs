//! Activity report records as submitted from the field.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::time::StoreTimestamp;

/// Read a JSON value as a non-negative whole count.
///
/// Integer-valued floats such as `12.0` are accepted; negatives, fractions
/// and non-numbers are not.
pub fn count_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        _ => None,
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_of(&Value::deserialize(deserializer)?))
}

fn lenient_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_count(deserializer)?.unwrap_or(0))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool())
}

/// Anything but a sequence reads as absent; entries that are not objects
/// become empty contacts.
fn lenient_contacts<'de, D>(deserializer: D) -> Result<Option<Vec<Contact>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .map(|item| Contact::deserialize(item).unwrap_or_default())
                .collect(),
        )),
        _ => Ok(None),
    }
}

/// Books distributed, broken down by size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSizes {
    #[serde(default, deserialize_with = "lenient_size")]
    pub big: u64,
    #[serde(default, deserialize_with = "lenient_size")]
    pub medium: u64,
    #[serde(default, deserialize_with = "lenient_size")]
    pub small: u64,
}

impl BookSizes {
    pub fn total(&self) -> u64 {
        self.big.saturating_add(self.medium).saturating_add(self.small)
    }
}

/// The two shapes a `booksDistributed` field can take.
///
/// Older reports store a single count, newer ones the size breakdown.
/// Integer-valued floats count as a single count; anything else counts as
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookCount {
    Count(u64),
    BySize(BookSizes),
    Unrecognized(serde_json::Value),
}

impl BookCount {
    /// Canonical number of books.
    pub fn total(&self) -> u64 {
        match self {
            BookCount::Count(count) => *count,
            BookCount::BySize(sizes) => sizes.total(),
            BookCount::Unrecognized(value) => count_of(value).unwrap_or(0),
        }
    }
}

impl From<u64> for BookCount {
    fn from(count: u64) -> Self {
        BookCount::Count(count)
    }
}

impl From<BookSizes> for BookCount {
    fn from(sizes: BookSizes) -> Self {
        BookCount::BySize(sizes)
    }
}

/// A person met during a preaching activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub is_new_contact: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<String>,
}

impl Contact {
    /// True when any of the three new-contact markers is set.
    pub fn is_marked_new(&self) -> bool {
        self.is_new_contact == Some(true)
            || self.is_new == Some(true)
            || self.contact_type.as_deref() == Some("new")
    }
}

/// One submitted field-activity record.
///
/// Every field except `id` is optional: reports from different client
/// versions populate different subsets. A field of an unexpected shape reads
/// as absent instead of rejecting the whole report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<StoreTimestamp>,
    /// Activity date chosen by the reporter.
    #[serde(default)]
    pub date: Option<StoreTimestamp>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category_id: Option<String>,
    /// Direct category name override written by some clients.
    #[serde(default, deserialize_with = "lenient_text")]
    pub category_name: Option<String>,
    #[serde(default)]
    pub books_distributed: Option<BookCount>,
    #[serde(default, deserialize_with = "lenient_contacts")]
    pub contacts: Option<Vec<Contact>>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub new_contacts: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub prasadam_served: Option<u64>,
}

impl ActivityReport {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}
