//! Event records written to a run stream.

use crate::error::{TypesError, TypesResult};
use crate::ids;
use crate::types::{Message, MessageType, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event tag for a batch of (re)shaped messages.
pub const MESSAGES_PARTIAL: &str = "messages/partial";
/// Event tag signalling the run produced all of its messages.
pub const MESSAGES_COMPLETE: &str = "messages/complete";
/// Event tag for a failed run.
pub const ERROR: &str = "error";

/// A message as shown to stream clients.
///
/// Values are copied from the source message unchanged. A field the source
/// message lacks is left out of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventMessage {
    Human {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Value>,
    },
    Ai {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },
    System {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Value>,
    },
    Tool {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<Value>,
    },
}

impl EventMessage {
    /// Echo an input message back to the client.
    ///
    /// Every echoed message gets a fresh id. Roles other than human and ai,
    /// and messages without a `type` tag, are reported as system.
    pub fn from_input(message: &Message) -> Self {
        let id = ids::message_id();
        let content = message.content().cloned();
        match message.message_type() {
            Some(MessageType::Human) => EventMessage::Human { id, content },
            Some(MessageType::Ai) => EventMessage::Ai {
                id,
                content,
                tool_calls: None,
            },
            _ => EventMessage::System { id, content },
        }
    }

    /// Reshape a message produced by the workflow.
    ///
    /// Only AI and tool messages are surfaced; anything else yields `None`.
    pub fn from_output(message: &Message) -> Option<Self> {
        match message.message_type()? {
            MessageType::Ai => Some(EventMessage::Ai {
                id: ids::completion_id(),
                content: message.content().cloned(),
                tool_calls: message
                    .tool_calls()
                    .map(|calls| calls.iter().map(ToolCall::summarize).collect()),
            }),
            MessageType::Tool => Some(EventMessage::Tool {
                id: ids::message_id(),
                content: message.content().cloned(),
                tool_call_id: message.tool_call_id().cloned(),
                name: message.name().cloned(),
            }),
            _ => None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EventMessage::Human { id, .. }
            | EventMessage::Ai { id, .. }
            | EventMessage::System { id, .. }
            | EventMessage::Tool { id, .. } => id,
        }
    }

    pub fn content(&self) -> Option<&Value> {
        match self {
            EventMessage::Human { content, .. }
            | EventMessage::Ai { content, .. }
            | EventMessage::System { content, .. }
            | EventMessage::Tool { content, .. } => content.as_ref(),
        }
    }
}

/// Body of an `error` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
}

impl ErrorEnvelope {
    /// A `server_error` envelope with the given message.
    pub fn server_error(message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                error_type: "server_error".to_string(),
            },
        }
    }
}

/// One record of a run stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A batch of messages, in order.
    MessagesPartial(Vec<EventMessage>),
    /// The run finished; carries an empty data array.
    MessagesComplete,
    /// The run failed. Nothing follows this record.
    Error(ErrorEnvelope),
    /// Comment-only keep-alive written just before the stream closes.
    Heartbeat,
}

impl StreamEvent {
    /// Shorthand for a `server_error` record.
    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error(ErrorEnvelope::server_error(message))
    }

    /// The SSE `event:` tag, or `None` for the heartbeat comment.
    pub fn event_type(&self) -> Option<&'static str> {
        match self {
            StreamEvent::MessagesPartial(_) => Some(MESSAGES_PARTIAL),
            StreamEvent::MessagesComplete => Some(MESSAGES_COMPLETE),
            StreamEvent::Error(_) => Some(ERROR),
            StreamEvent::Heartbeat => None,
        }
    }

    /// Compact JSON for the SSE `data:` field.
    pub fn data(&self) -> TypesResult<String> {
        let data = match self {
            StreamEvent::MessagesPartial(messages) => serde_json::to_string(messages)?,
            StreamEvent::MessagesComplete => "[]".to_string(),
            StreamEvent::Error(envelope) => serde_json::to_string(envelope)?,
            StreamEvent::Heartbeat => String::new(),
        };
        Ok(data)
    }

    /// Parse a record read back from an SSE stream.
    pub fn from_sse(event_name: &str, data: &str) -> TypesResult<Self> {
        match event_name {
            MESSAGES_PARTIAL => serde_json::from_str::<Vec<EventMessage>>(data)
                .map(StreamEvent::MessagesPartial)
                .map_err(|e| {
                    TypesError::serialization(format!("Failed to parse message batch: {}", e))
                }),
            MESSAGES_COMPLETE => Ok(StreamEvent::MessagesComplete),
            ERROR => serde_json::from_str::<ErrorEnvelope>(data)
                .map(StreamEvent::Error)
                .map_err(|e| {
                    TypesError::serialization(format!("Failed to parse error record: {}", e))
                }),
            other => Err(TypesError::InvalidEventType {
                event_type: other.to_string(),
            }),
        }
    }
}
