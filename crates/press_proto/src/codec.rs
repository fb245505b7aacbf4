use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::message::{Command, Update};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// Result of decoding one orchestrator→executor line.
#[derive(Debug)]
pub enum Decoded {
    Command(Command),
    /// An object carrying a `type` this codec does not understand. Callers
    /// log and ignore these; they are never fatal.
    Unknown(String),
}

/// Read exactly one newline-terminated frame. Returns `None` at EOF.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<String>, CodecError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = reader.read_line(&mut line).await?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Serialize one message, append the line terminator, and flush so partial
/// frames are never left interleaved in the stream.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut payload =
        serde_json::to_string(message).map_err(|err| CodecError::Malformed(err.to_string()))?;
    payload.push('\n');
    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Decode a command line. Known `type` tags with a bad shape are malformed;
/// unknown tags decode to [`Decoded::Unknown`].
pub fn decode_command(line: &str) -> Result<Decoded, CodecError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|err| CodecError::Malformed(err.to_string()))?;
    let kind = value
        .get("type")
        .and_then(|tag| tag.as_str())
        .unwrap_or_default()
        .to_string();
    match serde_json::from_value::<Command>(value) {
        Ok(command) => Ok(Decoded::Command(command)),
        Err(err) if matches!(kind.as_str(), "job" | "delete") => {
            Err(CodecError::Malformed(err.to_string()))
        }
        Err(_) => Ok(Decoded::Unknown(kind)),
    }
}

/// Decode an executor→orchestrator progress update line.
pub fn decode_update(line: &str) -> Result<Update, CodecError> {
    serde_json::from_str(line).map_err(|err| CodecError::Malformed(err.to_string()))
}
