// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP listener loop for the `CoordinatorApi` surface.
//!
//! Grounded on the teacher's `UnixListener`+`TcpListener` dual-accept
//! listener (`daemon/src/listener/mod.rs`), narrowed to TCP only — the
//! coordinator's clients are remote worker agents and submitting clients,
//! never a local CLI sharing the host. Each accepted connection is read in
//! a request/response loop of [`forge_wire::ApiEnvelope`] frames; the
//! handler future races against read-side disconnect detection so a client
//! that vanishes mid-request doesn't leave an orphaned task running.

use std::sync::Arc;

use forge_wire::{ApiEnvelope, ApiOutcome, ApiRequest, ApiResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::CoordinatorApi;

/// Bind and serve `api` on `addr` until `shutdown` is cancelled.
pub async fn serve(
    addr: &str,
    api: Arc<dyn CoordinatorApi>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr, "coordinator listener bound");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        let api = Arc::clone(&api);
                        let conn_shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, api, conn_shutdown).await {
                                warn!(error = %e, %peer, "connection ended with an error");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "accept failed"),
                }
            }
            _ = shutdown.cancelled() => {
                info!("coordinator listener shutting down");
                return Ok(());
            }
        }
    }
}

/// Serve one connection: read a request, dispatch it, write the response,
/// repeat until the client closes the socket or the process is shutting
/// down.
async fn handle_connection(
    stream: TcpStream,
    api: Arc<dyn CoordinatorApi>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let (mut reader, mut writer) = stream.into_split();

    loop {
        let envelope: ApiEnvelope<ApiRequest> = tokio::select! {
            read = forge_wire::read_message(&mut reader) => {
                match read {
                    Ok(Some(envelope)) => envelope,
                    Ok(None) => return Ok(()), // client closed cleanly
                    Err(e) => {
                        warn!(error = %e, "malformed request frame, closing connection");
                        return Ok(());
                    }
                }
            }
            _ = shutdown.cancelled() => return Ok(()),
        };

        let request_id = envelope.request_id;
        let result: ApiResult = tokio::select! {
            result = api.dispatch(envelope.body) => result,
            _ = detect_disconnect(&mut reader) => {
                debug!(request_id, "client disconnected mid-request");
                return Ok(());
            }
        };

        write_response(&mut writer, request_id, result).await?;
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    request_id: u64,
    result: ApiResult,
) -> std::io::Result<()> {
    let envelope = ApiEnvelope::<ApiOutcome> { request_id, body: result.into() };
    forge_wire::write_message(writer, &envelope).await.map_err(|e| match e {
        forge_wire::ProtocolError::Io(io) => io,
        other => std::io::Error::other(other.to_string()),
    })
}

/// Detect a client hanging up while its request is still being handled, by
/// watching for EOF on the read half.
async fn detect_disconnect<R: AsyncRead + AsyncReadExt + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
