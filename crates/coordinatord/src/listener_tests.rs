use std::sync::Arc;

use forge_core::{FakeClock, Metrics};
use forge_state::{InMemoryStateStore, MaterializedState, StateHandle};
use forge_wire::{
    ApiEnvelope, ApiOutcome, ApiRequest, ApiResponse, ApiResult, GetJobStatusRequest, SubmitJobRequest,
};
use tempfile::tempdir;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::api::{CoordinatorService, JobDefaults};
use crate::persist;

async fn spawn_test_server() -> (String, CancellationToken) {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("test.wal");
    std::mem::forget(dir); // keep the tempdir alive for the server's lifetime
    let store: Arc<dyn forge_state::StateStore> = Arc::new(InMemoryStateStore::new());
    let (persist_handle, _join) = persist::spawn(wal_path, store);

    let service = CoordinatorService::new(
        StateHandle::new(MaterializedState::new()),
        persist_handle,
        Arc::new(tokio::sync::Notify::new()),
        FakeClock::new(),
        Metrics::new(),
        JobDefaults { cpu: 1, ram_mb: 256, timeout_ms: 300_000, max_retries: 3 },
        30_000,
    );
    let api: Arc<dyn CoordinatorApi> = Arc::new(service);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let shutdown = CancellationToken::new();
    let serve_shutdown = shutdown.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let Ok((stream, _)) = accepted else { continue };
                    let api = Arc::clone(&api);
                    let conn_shutdown = serve_shutdown.clone();
                    tokio::spawn(handle_connection(stream, api, conn_shutdown));
                }
                _ = serve_shutdown.cancelled() => break,
            }
        }
    });

    (addr, shutdown)
}

#[tokio::test]
async fn round_trips_a_submit_job_request_over_tcp() {
    let (addr, shutdown) = spawn_test_server().await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    let req = ApiEnvelope {
        request_id: 1,
        body: ApiRequest::SubmitJob(SubmitJobRequest {
            command: "echo hi".into(),
            archive_ref: "https://x/a.zip".into(),
            filename: "a.zip".into(),
            required_cpu: None,
            required_ram_mb: None,
            timeout_ms: None,
            max_retries: None,
        }),
    };
    forge_wire::write_message(&mut stream, &req).await.unwrap();

    let resp: ApiEnvelope<ApiOutcome> = forge_wire::read_message(&mut stream).await.unwrap().unwrap();
    assert_eq!(resp.request_id, 1);
    let job_id = match ApiResult::from(resp.body).unwrap() {
        ApiResponse::SubmitJob(r) => r.job_id,
        other => panic!("unexpected response: {other:?}"),
    };

    let status_req =
        ApiEnvelope { request_id: 2, body: ApiRequest::GetJobStatus(GetJobStatusRequest { job_id }) };
    forge_wire::write_message(&mut stream, &status_req).await.unwrap();
    let status_resp: ApiEnvelope<ApiOutcome> = forge_wire::read_message(&mut stream).await.unwrap().unwrap();
    assert!(matches!(ApiResult::from(status_resp.body).unwrap(), ApiResponse::GetJobStatus(_)));

    shutdown.cancel();
}

#[tokio::test]
async fn closing_the_socket_ends_the_connection_cleanly() {
    let (addr, shutdown) = spawn_test_server().await;
    {
        let _stream = TcpStream::connect(&addr).await.unwrap();
        // drop immediately; the server task should observe EOF and return
        // without panicking or blocking other connections.
    }
    let mut stream2 = TcpStream::connect(&addr).await.unwrap();
    let req = ApiEnvelope {
        request_id: 7,
        body: ApiRequest::GetJobStatus(GetJobStatusRequest { job_id: "nope".into() }),
    };
    forge_wire::write_message(&mut stream2, &req).await.unwrap();
    let resp: ApiEnvelope<ApiOutcome> = forge_wire::read_message(&mut stream2).await.unwrap().unwrap();
    assert!(matches!(resp.body, ApiOutcome::Err { .. }));

    shutdown.cancel();
}
