use std::sync::Arc;
use std::time::Duration;

use forge_core::Job;
use forge_state::InMemoryStateStore;
use tempfile::tempdir;

use super::*;

#[tokio::test]
async fn submitted_job_is_appended_to_wal_and_written_through() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("test.wal");
    let store: Arc<InMemoryStateStore> = Arc::new(InMemoryStateStore::new());

    let (handle, _join) = spawn(wal_path.clone(), Arc::clone(&store) as Arc<dyn StateStore>);

    let job = Job::builder().command("echo hi").build();
    handle.submit(PersistTask {
        event: Event::JobSubmitted { job: job.clone() },
        job: Some(job.clone()),
        worker: None,
    });

    // Give the background task a turn to drain the channel.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let docs = store.get_all(JOBS_COLLECTION).await.unwrap();
    assert_eq!(docs.len(), 1);

    let replayed = Wal::replay(&wal_path).unwrap();
    assert_eq!(replayed, vec![Event::JobSubmitted { job }]);
}
