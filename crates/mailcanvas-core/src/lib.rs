use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("thread has no messages")]
    EmptyThread,
    #[error("previous draft file is empty: {}", path.display())]
    EmptyDraft { path: PathBuf },
    #[error("previous draft file not found: {}", path.display())]
    DraftNotFound { path: PathBuf },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A mailbox as `{email, name}`. `name` is empty rather than absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub email: String,
    pub name: String,
}

impl Participant {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }

    /// Short label for list rows: the name, else the email, else `Unknown`.
    pub fn label(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.email.is_empty() {
            &self.email
        } else {
            "Unknown"
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() && self.name != self.email {
            write!(f, "{} <{}>", self.name, self.email)
        } else {
            f.write_str(&self.email)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    pub from: Vec<Participant>,
    pub to: Vec<Participant>,
    pub cc: Vec<Participant>,
    pub date: i64,
    pub subject: String,
    pub body_text: String,
}

impl Message {
    pub fn sender(&self) -> Option<&Participant> {
        self.from.first()
    }
}

/// A conversation with at least one message, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thread {
    pub id: String,
    pub subject: String,
    messages: Vec<Message>,
}

impl Thread {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        mut messages: Vec<Message>,
    ) -> Result<Self, CanvasError> {
        if messages.is_empty() {
            return Err(CanvasError::EmptyThread);
        }
        messages.sort_by_key(|msg| msg.date);
        Ok(Self {
            id: id.into(),
            subject: subject.into(),
            messages,
        })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn latest(&self) -> &Message {
        &self.messages[self.messages.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "recipients_field")]
    pub from: Vec<Participant>,
    #[serde(deserialize_with = "recipients_field")]
    pub to: Vec<Participant>,
    #[serde(deserialize_with = "recipients_field")]
    pub cc: Vec<Participant>,
    #[serde(deserialize_with = "timestamp_field")]
    pub date: Option<i64>,
    #[serde(deserialize_with = "text_or_none")]
    pub subject: Option<String>,
    /// Plain text produced by the provider's clean endpoint.
    #[serde(deserialize_with = "text_or_none")]
    pub conversation: Option<String>,
    /// Raw HTML body.
    #[serde(deserialize_with = "text_or_none")]
    pub body: Option<String>,
    #[serde(deserialize_with = "text_or_none")]
    pub snippet: Option<String>,
    #[serde(deserialize_with = "id_list")]
    pub labels: Vec<String>,
    #[serde(deserialize_with = "id_list")]
    pub folders: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThreadRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "text_or_none")]
    pub subject: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub message_ids: Vec<String>,
    #[serde(deserialize_with = "record_or_none")]
    pub latest_draft_or_message: Option<MessageRecord>,
}

impl ThreadRecord {
    pub fn message_count(&self) -> usize {
        self.message_ids.len()
    }
}

/// A thread record together with its resolved messages.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThreadBundle {
    pub thread: ThreadRecord,
    #[serde(deserialize_with = "null_as_default")]
    pub messages: Vec<MessageRecord>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unix seconds from an integer, an integral float or a numeric string.
/// Other shapes read as missing.
fn timestamp_field<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let integral = |f: f64| (f.is_finite() && f.fract() == 0.0).then_some(f as i64);
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Number(num) => num.as_i64().or_else(|| num.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    })
}

fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

fn record_or_none<'de, D>(deserializer: D) -> Result<Option<MessageRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => MessageRecord::deserialize(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn recipients_field<'de, D>(deserializer: D) -> Result<Vec<Participant>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(recipient_list(Some(&value)))
}

fn id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };
    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::String(id) => Some(id.clone()),
            Value::Object(map) => map.get("id").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect())
}

const DRAFT_FIELDS: [&str; 6] = ["to", "cc", "bcc", "from", "subject", "body"];

/// Canonical reply draft. `from` holds at most one participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Draft {
    pub to: Vec<Participant>,
    pub cc: Vec<Participant>,
    pub bcc: Vec<Participant>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<Participant>,
    pub subject: String,
    pub body: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Draft {
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn sender(&self) -> Option<&Participant> {
        self.from.first()
    }

    pub fn to_json_pretty(&self) -> Result<String, CanvasError> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Body of a draft-creation request replying to `reply_to_message_id`.
    pub fn reply_payload(&self, reply_to_message_id: &str) -> Value {
        json!({
            "to": self.to,
            "cc": self.cc,
            "subject": self.subject,
            "body": self.body,
            "reply_to_message_id": reply_to_message_id,
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(num) => num.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn normalize_recipient(value: &Value) -> Participant {
    match value {
        Value::String(email) => Participant::new(email.as_str(), ""),
        Value::Object(map) => {
            let email = map.get("email").and_then(Value::as_str).unwrap_or("");
            let name = map.get("name").and_then(Value::as_str).unwrap_or("");
            Participant::new(email, name)
        }
        _ => Participant::default(),
    }
}

/// Any recipient shape (absent, falsy, scalar, list) as a list.
pub fn recipient_list(value: Option<&Value>) -> Vec<Participant> {
    match value {
        Some(Value::Array(items)) => items.iter().map(normalize_recipient).collect(),
        Some(value) if is_truthy(value) => vec![normalize_recipient(value)],
        _ => Vec::new(),
    }
}

fn sender_list(value: Option<&Value>) -> Vec<Participant> {
    match value {
        Some(Value::Array(items)) => items.first().map(normalize_recipient).into_iter().collect(),
        Some(value) if is_truthy(value) => vec![normalize_recipient(value)],
        _ => Vec::new(),
    }
}

/// `null` and absent read as empty; other non-strings keep their JSON text.
fn text_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn normalize_draft(input: &Map<String, Value>) -> Draft {
    let extra = input
        .iter()
        .filter(|(key, _)| !DRAFT_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Draft {
        to: recipient_list(input.get("to")),
        cc: recipient_list(input.get("cc")),
        bcc: recipient_list(input.get("bcc")),
        from: sender_list(input.get("from")),
        subject: text_field(input.get("subject")),
        body: text_field(input.get("body")),
        extra,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return text;
    };
    match inner.find('\n') {
        Some(pos) => inner[pos + 1..].trim(),
        None => inner.trim(),
    }
}

/// Reads a generated draft. Anything that is not a JSON object becomes the body.
pub fn parse_draft_response(text: &str) -> Draft {
    let candidate = strip_code_fence(text.trim());
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => {
            debug!("parsed draft response with {} fields", map.len());
            normalize_draft(&map)
        }
        Ok(_) => {
            warn!("draft response is JSON but not an object; keeping raw text as body");
            Draft::from_body(text)
        }
        Err(err) => {
            warn!("draft response is not JSON ({}); keeping raw text as body", err);
            Draft::from_body(text)
        }
    }
}

pub fn format_participant(participant: &Participant) -> String {
    participant.to_string()
}

pub fn format_participants(list: &[Participant]) -> String {
    list.iter()
        .map(format_participant)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_timestamp(ts: i64, pattern: &str) -> String {
    if ts == 0 {
        return "Unknown".to_string();
    }
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format(pattern).to_string(),
        None => "Unknown".to_string(),
    }
}

/// `Jan 08, 10:30 AM` in local time.
pub fn format_date(ts: i64) -> String {
    format_timestamp(ts, "%b %d, %I:%M %p")
}

pub fn format_prompt_date(ts: i64) -> String {
    format_timestamp(ts, "%Y-%m-%d %H:%M")
}

pub const UNSETTABLE_FOLDERS: [&str; 7] = [
    "INBOX",
    "SENT",
    "DRAFTS",
    "TRASH",
    "SPAM",
    "STARRED",
    "IMPORTANT",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelUpdate {
    pub labels: Vec<String>,
    pub folders: Vec<String>,
}

pub fn plan_label_update(
    current_labels: &[String],
    current_folders: &[String],
    add: &[String],
    remove: &[String],
) -> LabelUpdate {
    let mut labels: Vec<String> = Vec::new();
    for label in current_labels.iter().chain(add) {
        if remove.contains(label) && !add.contains(label) {
            continue;
        }
        if !labels.contains(label) {
            labels.push(label.clone());
        }
    }
    let folders = current_folders
        .iter()
        .filter(|folder| {
            !UNSETTABLE_FOLDERS
                .iter()
                .any(|fixed| folder.eq_ignore_ascii_case(fixed))
        })
        .cloned()
        .collect();
    LabelUpdate { labels, folders }
}

/// Replaces `path` with `content` via a sibling temp file and a rename.
pub fn atomic_write(path: &Path, content: &str) -> Result<(), CanvasError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".mailcanvas-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    debug!("wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

pub fn save_draft(path: &Path, draft: &Draft) -> Result<(), CanvasError> {
    atomic_write(path, &draft.to_json_pretty()?)
}

pub fn load_previous_draft(path: &Path) -> Result<Draft, CanvasError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(CanvasError::DraftNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(err.into()),
    };
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CanvasError::EmptyDraft {
            path: path.to_path_buf(),
        });
    }
    Ok(parse_draft_response(trimmed))
}
