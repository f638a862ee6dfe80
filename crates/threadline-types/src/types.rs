//! Core message and request types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The role tag carried in a message's `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// A message written by the end user.
    Human,
    /// A message produced by the language model.
    Ai,
    /// A system prompt.
    System,
    /// The result of a tool invocation.
    Tool,
    /// Any other tag.
    Other(String),
}

impl MessageType {
    /// The wire tag of this role.
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Human => "human",
            MessageType::Ai => "ai",
            MessageType::System => "system",
            MessageType::Tool => "tool",
            MessageType::Other(tag) => tag,
        }
    }
}

impl From<&str> for MessageType {
    fn from(tag: &str) -> Self {
        match tag {
            "human" => MessageType::Human,
            "ai" => MessageType::Ai,
            "system" => MessageType::System,
            "tool" => MessageType::Tool,
            _ => MessageType::Other(tag.to_string()),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{id, name, args}` view of a tool call shown to stream clients.
///
/// Each field is copied from the workflow's tool call as-is and left out
/// when the call has no such field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

impl ToolCall {
    /// Create a new tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: Some(Value::String(id.into())),
            name: Some(Value::String(name.into())),
            args: Some(args),
        }
    }

    /// Project a raw tool call onto its `{id, name, args}` fields.
    pub fn summarize(raw: &Value) -> Self {
        Self {
            id: raw.get("id").cloned(),
            name: raw.get("name").cloned(),
            args: raw.get("args").cloned(),
        }
    }

    /// The tool name, when it is a string.
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str)
    }

    /// The call id, when it is a string.
    pub fn id_str(&self) -> Option<&str> {
        self.id.as_ref().and_then(Value::as_str)
    }
}

/// A conversation message as exchanged with the workflow.
///
/// The message is kept as the JSON object the client sent. Nothing is
/// validated or normalized, so explicit nulls, unusual id shapes and
/// role-style messages without a `type` tag all reach the workflow exactly
/// as received. The accessors read the fields the server cares about.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Map<String, Value>);

impl Message {
    fn with_type(message_type: MessageType, content: impl Into<String>) -> Self {
        Self::default()
            .with_field("type", message_type.as_str())
            .with_field("content", content.into())
    }

    /// Create a new human message.
    pub fn human(content: impl Into<String>) -> Self {
        Self::with_type(MessageType::Human, content)
    }

    /// Create a new AI message.
    pub fn ai(content: impl Into<String>) -> Self {
        Self::with_type(MessageType::Ai, content)
    }

    /// Create a new AI message carrying tool calls.
    pub fn ai_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let calls = tool_calls
            .into_iter()
            .map(|call| serde_json::to_value(call).unwrap_or(Value::Null))
            .collect::<Vec<_>>();
        Self::ai(content).with_field("tool_calls", calls)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_type(MessageType::System, content)
    }

    /// Create a new tool result message.
    pub fn tool(
        content: impl Into<String>,
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::with_type(MessageType::Tool, content)
            .with_field("tool_call_id", tool_call_id.into())
            .with_field("name", name.into())
    }

    /// Set a field, replacing any previous value.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw access to any field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// All fields, as received.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The role from the `type` tag; `None` when the tag is missing or not a string.
    pub fn message_type(&self) -> Option<MessageType> {
        self.get("type").and_then(Value::as_str).map(MessageType::from)
    }

    /// Message body: plain text or structured content parts.
    pub fn content(&self) -> Option<&Value> {
        self.get("content")
    }

    /// The content as text, when it is a plain string.
    pub fn text(&self) -> Option<&str> {
        self.content().and_then(Value::as_str)
    }

    /// Tool calls requested by an AI message, when present as an array.
    pub fn tool_calls(&self) -> Option<&Vec<Value>> {
        self.get("tool_calls").and_then(Value::as_array)
    }

    /// For tool messages, the call this message answers.
    pub fn tool_call_id(&self) -> Option<&Value> {
        self.get("tool_call_id")
    }

    /// For tool messages, the tool name.
    pub fn name(&self) -> Option<&Value> {
        self.get("name")
    }
}

impl From<Map<String, Value>> for Message {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// The `input` object of a run-stream request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInput {
    /// Conversation so far, oldest first.
    pub messages: Vec<Message>,
}

/// Body of `POST /api/threads/{thread_id}/runs/stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStreamRequest {
    pub input: RunInput,
    /// Opaque run configuration, handed to the workflow as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl RunStreamRequest {
    /// Create a new request without a run configuration.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            input: RunInput { messages },
            config: None,
        }
    }

    /// Attach a run configuration.
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }
}

/// Response of `POST /api/threads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadCreated {
    pub thread_id: String,
}
