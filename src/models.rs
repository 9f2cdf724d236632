use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    #[serde(rename = "BOOK")]
    Book,
    #[serde(rename = "DRAFT")]
    Draft,
    #[serde(rename = "NOTE")]
    Note,
    #[serde(rename = "PRM")]
    People,
}

impl CollectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Book => "BOOK",
            Self::Draft => "DRAFT",
            Self::Note => "NOTE",
            Self::People => "PRM",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDescriptor {
    pub collection_id: String,
    pub collection_view_id: String,
}

/// One entry of a record map table. The store omits `value` for records the
/// caller cannot read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Snapshot returned by the store. Tables keep the order the store sent them
/// in, which is the order query results are reported in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordMap {
    #[serde(default)]
    pub block: Map<String, Value>,
    #[serde(default)]
    pub collection: Map<String, Value>,
    #[serde(default)]
    pub collection_view: Map<String, Value>,
}

impl RecordMap {
    pub fn first_collection_id(&self) -> Option<&str> {
        self.collection.keys().next().map(String::as_str)
    }

    pub fn first_collection_view_id(&self) -> Option<&str> {
        self.collection_view.keys().next().map(String::as_str)
    }

    pub fn blocks(&self) -> Vec<BlockValue> {
        decode_table(&self.block, "block")
    }

    pub fn collections(&self) -> Vec<CollectionValue> {
        decode_table(&self.collection, "collection")
    }
}

fn decode_table<T: serde::de::DeserializeOwned>(table: &Map<String, Value>, table_name: &str) -> Vec<T> {
    table
        .iter()
        .filter_map(|(id, raw)| {
            let entry: RecordEntry = match serde_json::from_value(raw.clone()) {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(table = table_name, id = %id, error = %error, "skipping malformed record entry");
                    return None;
                }
            };
            let value = entry.value?;
            match serde_json::from_value(value) {
                Ok(decoded) => Some(decoded),
                Err(error) => {
                    tracing::warn!(table = table_name, id = %id, error = %error, "skipping malformed record value");
                    None
                }
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockValue {
    pub id: String,
    #[serde(rename = "type", default)]
    pub block_type: String,
    #[serde(default)]
    pub alive: bool,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_table: Option<String>,
}

impl BlockValue {
    pub fn is_page(&self) -> bool {
        self.block_type == "page" && self.properties.is_some()
    }

    /// Text of the first run of the title property; `""` when there is none.
    pub fn title_text(&self) -> &str {
        self.properties
            .as_ref()
            .and_then(|properties| properties.get("title"))
            .and_then(|title| title.get(0))
            .and_then(|run| run.get(0))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn property(&self, code: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|properties| properties.get(code))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaProperty {
    pub name: String,
    #[serde(rename = "type", default)]
    pub property_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionValue {
    pub id: String,
    #[serde(default)]
    pub schema: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    #[serde(rename = "set")]
    Set,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "listAfter")]
    ListAfter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub table: String,
    pub path: Vec<String>,
    pub command: Command,
    pub args: Value,
}

impl Operation {
    pub fn on_block(id: &str, path: &[&str], command: Command, args: Value) -> Self {
        Self {
            id: id.to_string(),
            table: "block".to_string(),
            path: path.iter().map(ToString::to_string).collect(),
            command,
            args,
        }
    }

    pub fn creates_record(&self) -> bool {
        self.command == Command::Set && self.path.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryHit {
    pub id: String,
    pub title: String,
    /// JSON text of the stamp property, or `"undefined"` when absent.
    pub stamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPage {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum StampOutcome {
    NoMatch,
    Ambiguous { titles: Vec<String> },
    Stamped { hit: QueryHit },
}
