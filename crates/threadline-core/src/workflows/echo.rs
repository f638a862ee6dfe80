use async_trait::async_trait;
use threadline_sse::{Workflow, WorkflowError, WorkflowInput, WorkflowOutput};
use threadline_types::{Message, MessageType};

/// A stand-in workflow that answers with the last human message.
#[derive(Debug, Clone)]
pub struct EchoWorkflow {
    prefix: String,
}

impl EchoWorkflow {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for EchoWorkflow {
    fn default() -> Self {
        Self::new("Echo: ")
    }
}

#[async_trait]
impl Workflow for EchoWorkflow {
    async fn invoke(&self, input: WorkflowInput) -> Result<WorkflowOutput, WorkflowError> {
        let last_human = input
            .messages
            .iter()
            .rev()
            .find(|msg| msg.message_type() == Some(MessageType::Human))
            .ok_or_else(|| WorkflowError::execution("No human message found"))?;

        let text = match last_human.content() {
            Some(serde_json::Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let mut messages = input.messages.clone();
        messages.push(Message::ai(format!("{}{}", self.prefix, text)));
        Ok(WorkflowOutput::new(messages))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echoes_last_human_message() {
        let workflow = EchoWorkflow::default();
        let input = WorkflowInput::new(
            "thread_1",
            vec![
                Message::human("first"),
                Message::ai("ok"),
                Message::human("second"),
            ],
        );

        let output = workflow.invoke(input).await.unwrap();
        assert_eq!(output.messages.len(), 4);
        assert_eq!(output.messages[3].text(), Some("Echo: second"));
    }

    #[tokio::test]
    async fn test_requires_a_human_message() {
        let workflow = EchoWorkflow::new("> ");
        let err = workflow
            .invoke(WorkflowInput::new("t", vec![Message::system("rules")]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No human message found");
    }
}
