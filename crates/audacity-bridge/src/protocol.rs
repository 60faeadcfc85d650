//! Wire framing for mod-script-pipe
//!
//! Outbound: `<command><EOL>` where EOL is `\n` or `\r\n\0`.
//! Inbound: payload lines, a status line, then a blank line.

use crate::transport::AsyncReader;
use audacity_core::{LineEnding, RawResponse, Result, ScriptError};
use tracing::debug;

/// Bytes written for one command
pub fn encode_command(command: &str, line_ending: LineEnding) -> Vec<u8> {
    let mut buf = Vec::with_capacity(command.len() + 3);
    buf.extend_from_slice(command.as_bytes());
    buf.extend_from_slice(line_ending.as_str().as_bytes());
    buf
}

/// Read lines until the terminating blank line.
///
/// The blank line is consumed but not included. One blank line arriving
/// before any content is dropped; some hosts emit it ahead of the reply.
pub async fn read_response(reader: &mut dyn AsyncReader) -> Result<RawResponse> {
    let mut result = String::new();
    let mut skipped_leading_blank = false;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            return Err(ScriptError::ConnectionClosed);
        }

        // Text-mode reads: CRLF becomes LF
        if line.ends_with("\r\n") {
            line.truncate(line.len() - 2);
            line.push('\n');
        }

        if line == "\n" {
            if result.is_empty() && !skipped_leading_blank {
                debug!("Dropping leading blank line");
                skipped_leading_blank = true;
                continue;
            }
            break;
        }

        result.push_str(&line);
    }

    Ok(RawResponse::new(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LineReadWrapper;

    async fn read_all(data: &'static [u8]) -> Result<RawResponse> {
        let mut reader = LineReadWrapper::new(data);
        read_response(&mut reader).await
    }

    #[test]
    fn test_encode_command() {
        assert_eq!(encode_command("SelectAll:", LineEnding::Lf), b"SelectAll:\n");
        assert_eq!(
            encode_command("SelectAll:", LineEnding::CrLfNul),
            b"SelectAll:\r\n\0"
        );
    }

    #[tokio::test]
    async fn test_stops_at_blank_line() {
        let response = read_all(b"[ 1,\n  2 ]\nBatchCommand finished: OK\n\nleftover\n")
            .await
            .unwrap();
        assert_eq!(response, "[ 1,\n  2 ]\nBatchCommand finished: OK\n");
    }

    #[tokio::test]
    async fn test_drops_one_leading_blank_line() {
        let response = read_all(b"\nBatchCommand finished: OK\n\n").await.unwrap();
        assert_eq!(response, "BatchCommand finished: OK\n");
    }

    #[tokio::test]
    async fn test_second_leading_blank_ends_response() {
        let response = read_all(b"\n\nBatchCommand finished: OK\n\n").await.unwrap();
        assert_eq!(response, "");
    }

    #[tokio::test]
    async fn test_crlf_normalized() {
        let response = read_all(b"BatchCommand finished: OK\r\n\r\n").await.unwrap();
        assert_eq!(response, "BatchCommand finished: OK\n");
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_eof_before_terminator() {
        let result = read_all(b"BatchCommand finished: OK\n").await;
        assert!(matches!(result, Err(ScriptError::ConnectionClosed)));
    }
}
