//! Build stream decoding.
//!
//! The engine reports build progress as a newline-framed sequence of JSON
//! messages. Each message optionally carries a human-readable progress line
//! and optionally a structured error. Decoding is strictly sequential and
//! single-pass: the terminal artifact id is whatever the last
//! `Successfully built <id>` line said before the stream ended, and the
//! first embedded error is fatal to the whole build.

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use bakery_core::error::{BakeryError, Result};

/// One decoded message from the build stream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildMessage {
    /// Human-readable progress line.
    #[serde(default)]
    pub stream: Option<String>,

    /// Flat error string.
    #[serde(default)]
    pub error: Option<String>,

    /// Structured error detail.
    #[serde(default, rename = "errorDetail")]
    pub error_detail: Option<ErrorDetail>,
}

/// Structured error embedded in a build message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Ordered sequence of decoded build messages.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<BuildMessage>> + Send>>;

const BUILT_PREFIX: &str = "Successfully built ";

/// Extract the artifact id from a terminal success line.
///
/// The pattern is exact: `Successfully built <hex-id>` followed by a single
/// newline. Anything else, including a missing newline, is not a match, so
/// ambiguity surfaces as "no artifact" instead of an invalid reference.
pub fn parse_built_line(line: &str) -> Option<&str> {
    let id = line.strip_prefix(BUILT_PREFIX)?.strip_suffix('\n')?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)) {
        return None;
    }
    Some(id)
}

/// Consume a message stream to completion and return the terminal artifact
/// id.
///
/// The last success line wins: the classic builder emits one per stage and
/// only the final stage's image id names the build result. A structured
/// error aborts decoding immediately and discards any captured candidate.
pub async fn decode(reference: &str, mut messages: MessageStream) -> Result<String> {
    let mut artifact: Option<String> = None;

    while let Some(message) = messages.next().await {
        let message = message?;

        if let Some(line) = message.stream.as_deref() {
            if let Some(id) = parse_built_line(line) {
                artifact = Some(id.to_string());
            }
        }

        if message.error.is_some() || message.error_detail.is_some() {
            let detail = message.error_detail.unwrap_or_default();
            return Err(BakeryError::BuildStreamError {
                code: detail.code,
                message: detail
                    .message
                    .or(message.error)
                    .unwrap_or_else(|| "build failed".to_string()),
            });
        }
    }

    artifact.ok_or_else(|| BakeryError::NoArtifactProduced {
        reference: reference.to_string(),
    })
}

/// Frame a raw engine response body into build messages.
///
/// Messages are newline-separated JSON objects; newlines inside message
/// payloads are escaped, so a raw `\n` byte is always a frame boundary.
/// Frames may be split across transport chunks. Blank frames are skipped and
/// trailing `\r` is tolerated.
pub fn json_messages<S, E>(bytes: S) -> MessageStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    struct Framing<S> {
        inner: Pin<Box<S>>,
        buf: Vec<u8>,
        done: bool,
    }

    let state = Framing {
        inner: Box::pin(bytes),
        buf: Vec::new(),
        done: false,
    };

    Box::pin(futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(pos) = st.buf.iter().position(|&b| b == b'\n') {
                let frame: Vec<u8> = st.buf.drain(..=pos).collect();
                match parse_frame(&frame) {
                    Some(item) => return Some((item, st)),
                    None => continue,
                }
            }

            if st.done {
                if st.buf.is_empty() {
                    return None;
                }
                let frame = std::mem::take(&mut st.buf);
                return parse_frame(&frame).map(|item| (item, st));
            }

            match st.inner.next().await {
                Some(Ok(chunk)) => st.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    st.done = true;
                    st.buf.clear();
                    return Some((
                        Err(BakeryError::EngineUnavailable {
                            operation: "build stream".to_string(),
                            message: e.to_string(),
                        }),
                        st,
                    ));
                }
                None => st.done = true,
            }
        }
    }))
}

fn parse_frame(raw: &[u8]) -> Option<Result<BuildMessage>> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => {
            return Some(Err(BakeryError::EngineUnavailable {
                operation: "build stream decode".to_string(),
                message: format!("non-UTF-8 frame: {e}"),
            }))
        }
    };

    let trimmed = text.trim_matches(['\r', '\n', ' ']);
    if trimmed.is_empty() {
        return None;
    }

    Some(
        serde_json::from_str::<BuildMessage>(trimmed).map_err(|e| BakeryError::EngineUnavailable {
            operation: "build stream decode".to_string(),
            message: format!("malformed message '{trimmed}': {e}"),
        }),
    )
}
