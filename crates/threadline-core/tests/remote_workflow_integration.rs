use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use threadline_core::config::RemoteWorkflowConfig;
use threadline_core::RemoteWorkflow;
use threadline_sse::{Message, MessageType, Workflow, WorkflowError, WorkflowInput};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
}

async fn invoke_handler(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorded.auth.lock().unwrap().push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    recorded.bodies.lock().unwrap().push(body.clone());

    let mut messages = body["input"]["messages"].as_array().cloned().unwrap_or_default();
    messages.push(json!({
        "type": "ai",
        "content": "",
        "tool_calls": [{"id": "call_1", "name": "search", "args": {"q": "rust"}, "type": "tool_call"}]
    }));
    messages.push(json!({"type": "tool", "content": "found", "tool_call_id": "call_1", "name": "search"}));
    messages.push(json!({"type": "ai", "content": "Rust is a language."}));

    Json(json!({"messages": messages, "step": 3}))
}

async fn start_mock(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_remote_workflow_round_trip() {
    let recorded = Recorded::default();
    let addr = start_mock(
        Router::new()
            .route("/invoke", post(invoke_handler))
            .with_state(recorded.clone()),
    )
    .await;

    let mut config = RemoteWorkflowConfig::new(format!("http://{}/invoke", addr));
    config.api_key = Some("sk-local".to_string());
    let workflow = RemoteWorkflow::from_config(&config).unwrap();

    let input = WorkflowInput::new("thread_42", vec![Message::human("what is rust?")])
        .with_config(Some(json!({"configurable": {"model": "small"}})));
    let output = workflow.invoke(input).await.unwrap();

    assert_eq!(output.messages.len(), 4);
    assert_eq!(output.messages[1].message_type(), Some(MessageType::Ai));
    assert_eq!(output.messages[1].tool_calls().unwrap()[0]["name"], "search");
    assert_eq!(output.messages[2].tool_call_id(), Some(&json!("call_1")));
    assert_eq!(output.messages[3].text(), Some("Rust is a language."));

    let bodies = recorded.bodies.lock().unwrap();
    assert_eq!(bodies[0]["thread_id"], "thread_42");
    assert_eq!(bodies[0]["config"]["configurable"]["model"], "small");
    assert_eq!(bodies[0]["input"]["messages"][0]["content"], "what is rust?");
    assert_eq!(
        recorded.auth.lock().unwrap()[0].as_deref(),
        Some("Bearer sk-local")
    );
}

#[tokio::test]
async fn test_remote_workflow_status_error() {
    let addr = start_mock(Router::new().route(
        "/invoke",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "graph blew up") }),
    ))
    .await;

    let workflow = RemoteWorkflow::new(format!("http://{}/invoke", addr));
    let err = workflow
        .invoke(WorkflowInput::new("t", vec![Message::human("hi")]))
        .await
        .unwrap_err();

    match err {
        WorkflowError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "graph blew up");
        }
        other => panic!("Expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_remote_workflow_invalid_response() {
    let addr = start_mock(Router::new().route(
        "/invoke",
        post(|| async { Json(json!({"result": "no messages here"})) }),
    ))
    .await;

    let workflow = RemoteWorkflow::new(format!("http://{}/invoke", addr));
    let err = workflow
        .invoke(WorkflowInput::new("t", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_remote_workflow_timeout() {
    let addr = start_mock(Router::new().route(
        "/invoke",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"messages": []}))
        }),
    ))
    .await;

    let workflow = RemoteWorkflow::new(format!("http://{}/invoke", addr))
        .with_timeout(Duration::from_millis(100));
    assert_eq!(workflow.url(), format!("http://{}/invoke", addr));

    let err = workflow
        .invoke(WorkflowInput::new("t", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Transport(_)));
}

#[tokio::test]
async fn test_unreachable_workflow() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let workflow = RemoteWorkflow::new(format!("http://{}/invoke", addr));
    let err = workflow
        .invoke(WorkflowInput::new("t", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Transport(_)));
}
