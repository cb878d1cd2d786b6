use forge_core::Job;

use super::*;

#[tokio::test]
async fn fake_channel_returns_queued_claims_in_order() {
    let channel = FakeWorkerChannel::new();
    let job = Job::builder().command("echo hi").build();
    channel.push_claim(Some(job.clone())).await;
    channel.push_claim(None).await;

    let first = channel.claim_next(ClaimNextRequest { worker_id: "wkr-1".to_string() }).await.unwrap();
    assert_eq!(first.job.map(|j| j.id), Some(job.id));

    let second = channel.claim_next(ClaimNextRequest { worker_id: "wkr-1".to_string() }).await.unwrap();
    assert!(second.job.is_none());
}

#[tokio::test]
async fn fake_channel_check_cancel_defaults_to_false_when_nothing_queued() {
    let channel = FakeWorkerChannel::new();
    let resp = channel.check_cancel(CheckCancelRequest { job_id: "job-1".to_string() }).await.unwrap();
    assert!(!resp.cancel_requested);
}

#[tokio::test]
async fn fake_channel_records_every_call_in_order() {
    let channel = FakeWorkerChannel::new();
    channel
        .register_worker(RegisterWorkerRequest {
            worker_id: "wkr-1".to_string(),
            hostname: "h".to_string(),
            os: "linux".to_string(),
            cpu_count: 1,
            cpu_usage: 0.0,
            ram_total_mb: 1,
            ram_free_mb: 1,
            version: "1".to_string(),
        })
        .await
        .unwrap();
    channel
        .heartbeat(HeartbeatRequest {
            worker_id: "wkr-1".to_string(),
            cpu_usage: 0.0,
            ram_free_mb: 1,
            ram_total_mb: 1,
            status: "idle".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(channel.calls().await, vec!["register_worker".to_string(), "heartbeat".to_string()]);
}

#[tokio::test]
async fn tcp_channel_surfaces_a_connect_error_for_an_unreachable_address() {
    let channel = TcpWorkerChannel::new("127.0.0.1:1");
    let err = channel.register_worker(RegisterWorkerRequest {
        worker_id: "wkr-1".to_string(),
        hostname: "h".to_string(),
        os: "linux".to_string(),
        cpu_count: 1,
        cpu_usage: 0.0,
        ram_total_mb: 1,
        ram_free_mb: 1,
        version: "1".to_string(),
    })
    .await;
    assert!(err.is_err());
}
