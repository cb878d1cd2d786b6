// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire framing: 4-byte length prefix (big-endian) + JSON payload.
//!
//! Used by both the coordinator's TCP listener loop and worker clients.
//! A real HTTP/WebSocket gateway in front of this framing is out of scope.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest message this framing will attempt to read. Guards against a
/// corrupt or malicious length prefix forcing an unbounded allocation.
pub const MAX_MESSAGE_BYTES: u32 = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message of {0} bytes exceeds the {1}-byte frame limit")]
    MessageTooLarge(u32, u32),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode a value as a length-prefixed JSON frame.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    let payload = serde_json::to_vec(value)?;
    let len: u32 =
        payload.len().try_into().map_err(|_| ProtocolError::MessageTooLarge(u32::MAX, MAX_MESSAGE_BYTES))?;
    if len > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::MessageTooLarge(len, MAX_MESSAGE_BYTES));
    }
    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode a length-prefixed JSON frame already read into memory.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Write a single length-prefixed message to an async writer.
pub async fn write_message<W, T>(writer: &mut W, value: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode(value)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a single length-prefixed message from an async reader.
///
/// Returns `Ok(None)` on a clean EOF before any bytes of the next frame
/// arrive (the connection was closed between messages).
pub async fn read_message<R, T>(reader: &mut R) -> Result<Option<T>, ProtocolError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::MessageTooLarge(len, MAX_MESSAGE_BYTES));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(Some(decode(&payload)?))
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
