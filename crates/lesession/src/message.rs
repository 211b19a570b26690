// Message Normalization
//
// *Le Message* (The Message) - Raw chat records into canonical indexable records

use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// Fallback sender when neither sender nor role is present
pub const UNKNOWN_SENDER: &str = "unknown";

/// Fallback message type
pub const DEFAULT_MESSAGE_TYPE: &str = "message";

/// File attached to a raw message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// File name
    #[serde(default)]
    pub name: Option<String>,

    /// MIME type or extension
    #[serde(default, rename = "type")]
    pub file_type: Option<String>,
}

/// Raw chat message as delivered by the caller
///
/// Shapes vary between producers: ids may be strings or numbers, timestamps
/// may be RFC 3339 strings or epoch milliseconds, and the author may be
/// carried in either `sender` or `role`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Opaque identifier
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Message body
    #[serde(default)]
    pub content: Option<String>,

    /// Author name
    #[serde(default)]
    pub sender: Option<String>,

    /// Author role, used when `sender` is absent
    #[serde(default)]
    pub role: Option<String>,

    /// Message time
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Creation time, used when `timestamp` is absent
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,

    /// Message kind ("message", "system", "file", ...)
    #[serde(default, rename = "type")]
    pub message_type: Option<String>,

    /// Attached file
    #[serde(default)]
    pub file: Option<FileAttachment>,

    /// Alternative attachment slot
    #[serde(default)]
    pub attachment: Option<FileAttachment>,

    /// Slash command name
    #[serde(default)]
    pub command: Option<String>,

    /// Tool name
    #[serde(default)]
    pub tool: Option<String>,

    /// Project name
    #[serde(default)]
    pub project: Option<String>,
}

impl RawMessage {
    /// Create a plain text message
    pub fn new(id: impl Into<String>, content: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: Some(content.into()),
            sender: Some(sender.into()),
            ..Default::default()
        }
    }

    /// Set the message time
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the message type
    #[must_use]
    pub fn with_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = Some(message_type.into());
        self
    }

    /// Attach a file
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, file_type: impl Into<String>) -> Self {
        self.file = Some(FileAttachment {
            name: Some(name.into()),
            file_type: Some(file_type.into()),
        });
        self
    }
}

/// Optional facts extracted from a raw message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Attached file name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Attached file type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,

    /// Slash command name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Tool name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    /// Project name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Message is a system message
    pub is_system_message: bool,

    /// Message carries or describes a file
    pub is_file_operation: bool,
}

impl MessageMetadata {
    /// Non-empty textual metadata values, in a fixed order
    pub fn text_values(&self) -> impl Iterator<Item = &str> {
        [
            &self.file_name,
            &self.file_type,
            &self.command,
            &self.tool,
            &self.project,
        ]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .filter(|v| !v.is_empty())
    }

    /// Whether a non-empty file name is present
    pub fn has_attachment(&self) -> bool {
        self.file_name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Canonical, immutable record stored in a session index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedMessage {
    /// Identifier of the source message
    pub id: String,

    /// Message body
    pub content: String,

    /// Author
    pub sender: String,

    /// Message time
    pub timestamp: Option<DateTime<Utc>>,

    /// Message kind
    #[serde(rename = "type")]
    pub message_type: String,

    /// Extracted metadata
    pub metadata: MessageMetadata,

    /// Lowercased content and metadata, matched alongside `content` and `sender`
    #[serde(skip)]
    pub searchable_content: String,
}

/// Convert a raw message into its indexable form
pub fn normalize_message(raw: &RawMessage) -> Result<IndexedMessage> {
    if raw.id.trim().is_empty() {
        return Err(Error::validation("Message ID is required"));
    }

    let content = raw.content.clone().unwrap_or_default();

    let sender = non_empty(&raw.sender)
        .or_else(|| non_empty(&raw.role))
        .unwrap_or(UNKNOWN_SENDER)
        .to_string();

    let message_type = non_empty(&raw.message_type)
        .unwrap_or(DEFAULT_MESSAGE_TYPE)
        .to_string();

    let attached = raw.file.as_ref().or(raw.attachment.as_ref());

    let metadata = MessageMetadata {
        file_name: attached.and_then(|f| f.name.clone()),
        file_type: attached.and_then(|f| f.file_type.clone()),
        command: raw.command.clone(),
        tool: raw.tool.clone(),
        project: raw.project.clone(),
        is_system_message: message_type == "system",
        is_file_operation: message_type == "file" || attached.is_some(),
    };

    let searchable_content = build_searchable_content(&content, &metadata);

    Ok(IndexedMessage {
        id: raw.id.clone(),
        content,
        sender,
        timestamp: raw.timestamp.or(raw.created_at),
        message_type,
        metadata,
        searchable_content,
    })
}

/// Normalize a batch, failing on the first invalid message
pub fn normalize_messages(raw: &[RawMessage]) -> Result<Vec<IndexedMessage>> {
    raw.iter().map(normalize_message).collect()
}

fn build_searchable_content(content: &str, metadata: &MessageMetadata) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(6);
    if !content.is_empty() {
        parts.push(content);
    }
    parts.extend(metadata.text_values());

    parts.join(" ").nfkc().collect::<String>().to_lowercase()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "message id must be a string or number, got {}",
            other
        ))),
    }
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
        Some(Value::Number(n)) => {
            let millis = n
                .as_i64()
                .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "unsupported timestamp: {}",
            other
        ))),
    }
}
