//! Server-Sent Events (SSE) framing for run streams.

use axum::http::header;
use axum::response::sse::{Event as AxumEvent, KeepAlive};
use axum::response::{IntoResponse, Response, Sse};
use futures_util::Stream;
use pin_project_lite::pin_project;
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use threadline_types::StreamEvent;

use crate::error::Result;

/// Comment text of the heartbeat written before a stream closes.
pub const HEARTBEAT: &str = "heartbeat";

/// Comment text sent while a run is idle. Distinct from [`HEARTBEAT`], which
/// only ever marks the end of a successful run.
pub const KEEP_ALIVE: &str = "keep-alive";

/// Cache policy sent with every run stream.
pub const STREAM_CACHE_CONTROL: &str = "public, max-age=0, must-revalidate";

/// Methods advertised on run streams.
pub const STREAM_ALLOW_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";

/// An SSE event that can be sent to clients.
#[derive(Debug, Clone)]
pub struct SseEvent {
    /// Event type (optional)
    pub event_type: Option<String>,
    /// Event data (optional; comment-only events carry none)
    pub data: Option<String>,
    /// Comment line (optional)
    pub comment: Option<String>,
}

impl SseEvent {
    /// Create a new SSE event with event type and data.
    pub fn with_type(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            data: Some(data.into()),
            comment: None,
        }
    }

    /// Create a comment-only event.
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            event_type: None,
            data: None,
            comment: Some(text.into()),
        }
    }

    /// Create an SSE event from a run-stream record.
    pub fn from_stream_event(event: &StreamEvent) -> Result<Self> {
        match event.event_type() {
            Some(event_type) => Ok(Self::with_type(event_type, event.data()?)),
            None => Ok(Self::comment(HEARTBEAT)),
        }
    }
}

impl From<SseEvent> for AxumEvent {
    fn from(event: SseEvent) -> Self {
        let mut axum_event = AxumEvent::default();

        if let Some(comment) = event.comment {
            axum_event = axum_event.comment(comment);
        }

        if let Some(event_type) = event.event_type {
            axum_event = axum_event.event(event_type);
        }

        if let Some(data) = event.data {
            axum_event = axum_event.data(data);
        }

        axum_event
    }
}

/// Records that can be framed as SSE events.
pub trait ToSseEvent {
    fn to_sse_event(&self) -> Result<SseEvent>;
}

impl ToSseEvent for StreamEvent {
    fn to_sse_event(&self) -> Result<SseEvent> {
        SseEvent::from_stream_event(self)
    }
}

pin_project! {
    /// A stream wrapper that converts run-stream records to SSE events.
    ///
    /// A record that fails to serialize is replaced by an `error` record and
    /// ends the stream.
    pub struct SseStream<S> {
        #[pin]
        inner: S,
        finished: bool,
    }
}

impl<S> SseStream<S> {
    /// Create a new SSE stream wrapper.
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            finished: false,
        }
    }
}

impl<S> Stream for SseStream<S>
where
    S: Stream,
    S::Item: ToSseEvent,
{
    type Item = std::result::Result<AxumEvent, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(event)) => match event.to_sse_event() {
                Ok(sse_event) => Poll::Ready(Some(Ok(sse_event.into()))),
                Err(e) => {
                    log::error!("Failed to convert stream record to SSE: {}", e);
                    *this.finished = true;
                    let fallback = StreamEvent::error(format!("Failed to serialize event: {}", e));
                    let error_event = SseEvent::with_type(
                        threadline_types::ERROR,
                        fallback.data().unwrap_or_default(),
                    );
                    Poll::Ready(Some(Ok(error_event.into())))
                }
            },
            Poll::Ready(None) => {
                *this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Create an SSE response from a stream of run-stream records.
///
/// When `keepalive_interval` is set, idle periods (typically a long workflow
/// call) are filled with `: keep-alive` comments.
pub fn create_sse_response<S>(stream: S, keepalive_interval: Option<Duration>) -> Response
where
    S: Stream<Item = StreamEvent> + Send + 'static,
{
    let sse_stream = SseStream::new(stream);

    let sse = match keepalive_interval {
        Some(interval) => Sse::new(sse_stream)
            .keep_alive(KeepAlive::new().interval(interval).text(KEEP_ALIVE))
            .into_response(),
        None => Sse::new(sse_stream).into_response(),
    };

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, STREAM_CACHE_CONTROL),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, STREAM_ALLOW_METHODS),
        ],
        sse,
    )
        .into_response()
}
