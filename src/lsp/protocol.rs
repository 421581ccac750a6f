/*
 * Copyright (C) 2026 Mark Wells Dev
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! JSON-RPC notification framing.

use anyhow::{Context, Result};
use bytes::{Buf, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

fn default_null() -> serde_json::Value {
    serde_json::Value::Null
}

/// A JSON-RPC notification (no `id`, no response expected).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NotificationMessage {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// LSP method name, e.g. `textDocument/didOpen`.
    pub method: String,
    /// Method parameters.
    #[serde(default = "default_null")]
    pub params: serde_json::Value,
}

impl NotificationMessage {
    /// Builds a notification from typed params.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` cannot be serialized.
    pub fn new<P: Serialize>(method: &str, params: P) -> Result<Self> {
        Ok(Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params: serde_json::to_value(params)
                .with_context(|| format!("Failed to serialize params for {method}"))?,
        })
    }

    /// Decodes the params back into a typed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the params do not match `P`.
    pub fn params<P: serde::de::DeserializeOwned>(&self) -> Result<P> {
        serde_json::from_value(self.params.clone())
            .with_context(|| format!("Unexpected params for {}", self.method))
    }
}

/// Serializes a message and prepends the `Content-Length` header.
///
/// # Errors
///
/// Returns an error if the message cannot be serialized.
pub fn encode_message<T: Serialize>(message: &T) -> Result<Bytes> {
    let body = serde_json::to_string(message)?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());

    let mut frame = BytesMut::with_capacity(header.len() + body.len());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(body.as_bytes());
    Ok(frame.freeze())
}

/// Helper to parse the Content-Length header and body from a buffer
///
/// # Errors
///
/// Returns an error if the header block or body is not valid UTF-8, or the
/// length is not a number.
pub fn try_parse_message(buffer: &mut BytesMut) -> Result<Option<String>> {
    let mut headers_end = None;
    let mut content_length = None;

    // Scan for \r\n\r\n
    for i in 0..buffer.len().saturating_sub(3) {
        if &buffer[i..i + 4] == b"\r\n\r\n" {
            headers_end = Some(i + 4);

            let headers_str =
                std::str::from_utf8(&buffer[0..i]).context("Failed to parse headers as UTF-8")?;

            for line in headers_str.lines() {
                if let Some((name, value)) = line.split_once(':')
                    && name.trim().eq_ignore_ascii_case("content-length")
                {
                    content_length = Some(value.trim().parse::<usize>()?);
                }
            }
            break;
        }
    }

    if let (Some(header_len), Some(content_len)) = (headers_end, content_length) {
        let total_len = header_len + content_len;

        if buffer.len() >= total_len {
            buffer.advance(header_len);
            let message_bytes = buffer.split_to(content_len);
            let message = String::from_utf8(message_bytes.to_vec())?;
            return Ok(Some(message));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::{DidCloseTextDocumentParams, TextDocumentIdentifier};

    fn close_params() -> DidCloseTextDocumentParams {
        DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier {
                uri: "file:///a.ts".parse().unwrap(),
            },
        }
    }

    #[test]
    fn test_encode_then_parse_frame() {
        let msg = NotificationMessage::new("textDocument/didClose", close_params()).unwrap();
        let frame = encode_message(&msg).unwrap();

        let text = std::str::from_utf8(&frame).unwrap();
        assert!(text.starts_with("Content-Length: "));

        let mut buffer = BytesMut::from(&frame[..]);
        let body = try_parse_message(&mut buffer).unwrap().unwrap();
        let decoded: NotificationMessage = serde_json::from_str(&body).unwrap();
        assert_eq!(decoded, msg);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_content_length_counts_bytes() {
        let msg = NotificationMessage::new("x", serde_json::json!({"text": "é"})).unwrap();
        let frame = encode_message(&msg).unwrap();
        let body = serde_json::to_string(&msg).unwrap();
        let expected = format!("Content-Length: {}\r\n\r\n", body.len());
        assert!(frame.starts_with(expected.as_bytes()));
        assert_eq!(frame.len(), expected.len() + body.len());
    }

    #[test]
    fn test_parse_incomplete_header() {
        let mut buffer = BytesMut::from("Content-Length: 10\r\n");
        let result = try_parse_message(&mut buffer).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_parse_incomplete_body() {
        let mut buffer = BytesMut::from("Content-Length: 100\r\n\r\n{\"partial\":");
        let result = try_parse_message(&mut buffer).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_parse_case_insensitive_header() {
        let body = r#"{"test":true}"#;
        let raw = format!("content-length: {}\r\n\r\n{}", body.len(), body);
        let mut buffer = BytesMut::from(raw.as_str());

        let result = try_parse_message(&mut buffer).unwrap();
        assert_eq!(result, Some(body.to_string()));
    }

    #[test]
    fn test_typed_params_roundtrip() {
        let msg = NotificationMessage::new("textDocument/didClose", close_params()).unwrap();
        let params: DidCloseTextDocumentParams = msg.params().unwrap();
        assert_eq!(params.text_document.uri.as_str(), "file:///a.ts");
    }

    #[test]
    fn test_notification_without_params() {
        let json = r#"{"jsonrpc":"2.0","method":"exit"}"#;
        let msg: NotificationMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.params, serde_json::Value::Null);
    }
}
