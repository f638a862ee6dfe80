//! The stream-run pipeline: parse, echo, invoke, reshape.

use async_stream::stream;
use futures_util::Stream;
use std::pin::Pin;
use threadline_types::{EventMessage, RunStreamRequest, StreamEvent};

use crate::error::{Result, ServerError};
use crate::workflow::{SharedWorkflow, WorkflowInput};

/// Type alias for run event streams.
pub type RunStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Decode a stream-run request body.
pub fn parse_request(body: &[u8]) -> Result<RunStreamRequest> {
    serde_json::from_slice(body).map_err(|e| ServerError::invalid_request(e.to_string()))
}

/// Reshape the workflow's final messages into `messages/partial` records,
/// one record per surfaced message.
pub fn output_events(messages: &[threadline_types::Message]) -> Vec<StreamEvent> {
    messages
        .iter()
        .filter_map(EventMessage::from_output)
        .map(|message| StreamEvent::MessagesPartial(vec![message]))
        .collect()
}

/// Build the record stream for one run.
///
/// The echoed input goes out before the workflow is called. Any failure ends
/// the stream with a single `error` record and no heartbeat.
pub fn run_events(workflow: SharedWorkflow, thread_id: String, body: bytes::Bytes) -> RunStream {
    Box::pin(stream! {
        let request = match parse_request(&body) {
            Ok(request) => request,
            Err(e) => {
                log::error!("Rejecting run for thread {}: {}", thread_id, e);
                yield StreamEvent::error(e.client_message());
                return;
            }
        };

        let RunStreamRequest { input, config } = request;
        log::info!(
            "Run requested for thread {} with {} input messages",
            thread_id,
            input.messages.len()
        );

        let echoed = input.messages.iter().map(EventMessage::from_input).collect();
        yield StreamEvent::MessagesPartial(echoed);

        log::info!("Calling workflow '{}'...", workflow.name());
        let workflow_input = WorkflowInput::new(thread_id.clone(), input.messages).with_config(config);
        let output = match workflow.invoke(workflow_input).await {
            Ok(output) => output,
            Err(e) => {
                let e = ServerError::from(e);
                log::error!("Workflow failed for thread {}: {}", thread_id, e);
                yield StreamEvent::error(e.client_message());
                return;
            }
        };
        log::info!(
            "Workflow completed for thread {} with {} messages",
            thread_id,
            output.messages.len()
        );

        for event in output_events(&output.messages) {
            yield event;
        }

        yield StreamEvent::MessagesComplete;
        yield StreamEvent::Heartbeat;
        log::debug!("Run stream for thread {} finished", thread_id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Workflow, WorkflowError, WorkflowOutput};
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use threadline_types::{Message, ToolCall};

    #[derive(Default)]
    struct RecordingWorkflow {
        seen: Mutex<Vec<WorkflowInput>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl Workflow for RecordingWorkflow {
        async fn invoke(&self, input: WorkflowInput) -> std::result::Result<WorkflowOutput, WorkflowError> {
            self.seen.lock().unwrap().push(input.clone());
            if let Some(msg) = &self.fail_with {
                return Err(WorkflowError::execution(msg.clone()));
            }
            let mut messages = input.messages;
            messages.push(Message::ai_with_tool_calls(
                "",
                vec![ToolCall::new("call_1", "lookup", json!({"city": "Oslo"}))],
            ));
            messages.push(Message::tool("rain", "call_1", "lookup"));
            messages.push(Message::ai("It rains in Oslo."));
            Ok(WorkflowOutput::new(messages))
        }
    }

    fn body(value: serde_json::Value) -> bytes::Bytes {
        bytes::Bytes::from(serde_json::to_vec(&value).unwrap())
    }

    #[tokio::test]
    async fn test_successful_run_event_order() {
        let workflow = Arc::new(RecordingWorkflow::default());
        let request = body(json!({
            "input": {"messages": [
                {"type": "system", "content": "be brief"},
                {"type": "human", "content": "weather in Oslo?"}
            ]},
            "config": {"configurable": {"user": "u1"}}
        }));

        let events: Vec<_> = run_events(workflow.clone(), "thread_x".to_string(), request)
            .collect()
            .await;

        // echo, ai(tool call), tool, ai, complete, heartbeat
        assert_eq!(events.len(), 6);
        match &events[0] {
            StreamEvent::MessagesPartial(messages) => {
                assert_eq!(messages.len(), 2);
                assert!(matches!(messages[0], EventMessage::System { .. }));
                assert!(matches!(messages[1], EventMessage::Human { .. }));
            }
            other => panic!("Expected echoed input, got {:?}", other),
        }
        match &events[1] {
            StreamEvent::MessagesPartial(messages) => match &messages[..] {
                [EventMessage::Ai { tool_calls: Some(calls), .. }] => {
                    assert_eq!(calls[0].name_str(), Some("lookup"))
                }
                other => panic!("Expected one AI message, got {:?}", other),
            },
            other => panic!("Expected AI record, got {:?}", other),
        }
        assert!(matches!(
            &events[2],
            StreamEvent::MessagesPartial(m) if matches!(m[..], [EventMessage::Tool { .. }])
        ));
        assert_eq!(events[4], StreamEvent::MessagesComplete);
        assert_eq!(events[5], StreamEvent::Heartbeat);

        let seen = workflow.seen.lock().unwrap();
        assert_eq!(seen[0].thread_id, "thread_x");
        assert_eq!(seen[0].messages.len(), 2);
        assert_eq!(seen[0].config, Some(json!({"configurable": {"user": "u1"}})));
    }

    #[tokio::test]
    async fn test_workflow_failure_ends_with_error() {
        let workflow = Arc::new(RecordingWorkflow {
            fail_with: Some("model unavailable".to_string()),
            ..Default::default()
        });
        let request = body(json!({"input": {"messages": [{"type": "human", "content": "hi"}]}}));

        let events: Vec<_> = run_events(workflow, "t".to_string(), request).collect().await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StreamEvent::MessagesPartial(_)));
        assert_eq!(events[1], StreamEvent::error("model unavailable"));
    }

    #[tokio::test]
    async fn test_malformed_body_yields_single_error() {
        let workflow = Arc::new(RecordingWorkflow::default());
        let events: Vec<_> = run_events(
            workflow.clone(),
            "t".to_string(),
            bytes::Bytes::from_static(b"{\"config\":{}}"),
        )
        .collect()
        .await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::Error(envelope) => {
                assert_eq!(envelope.error.error_type, "server_error");
                assert!(envelope.error.message.contains("input"));
            }
            other => panic!("Expected error record, got {:?}", other),
        }
        assert!(workflow.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_output_events_skip_non_ai_messages() {
        let events = output_events(&[
            Message::human("q"),
            Message::system("rules"),
            Message::ai("a"),
        ]);
        assert_eq!(events.len(), 1);
    }
}
