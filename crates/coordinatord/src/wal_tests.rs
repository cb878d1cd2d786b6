use forge_core::{Job, Worker};
use tempfile::tempdir;

use super::*;

#[test]
fn replay_of_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let events = Wal::replay(dir.path().join("nope.wal")).unwrap();
    assert!(events.is_empty());
}

#[test]
fn appended_events_replay_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");

    let job = Job::builder().command("echo hi").build();
    let worker = Worker::test_fixture("wkr-1");

    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&Event::WorkerRegistered { worker: worker.clone() }).unwrap();
        wal.append(&Event::JobSubmitted { job: job.clone() }).unwrap();
    }

    let replayed = Wal::replay(&path).unwrap();
    assert_eq!(replayed.len(), 2);
    assert_eq!(replayed[0], Event::WorkerRegistered { worker });
    assert_eq!(replayed[1], Event::JobSubmitted { job });
}

#[test]
fn reopening_the_log_appends_rather_than_truncates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let job = Job::builder().command("echo hi").build();

    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&Event::JobSubmitted { job: job.clone() }).unwrap();
    }
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&Event::JobCancelRequested { job_id: job.id.0.clone() }).unwrap();
    }

    let replayed = Wal::replay(&path).unwrap();
    assert_eq!(replayed.len(), 2);
}

mod wal_properties {
    use proptest::prelude::*;

    use super::*;

    fn arb_simple_event() -> impl Strategy<Value = Event> {
        prop_oneof![
            ".*".prop_map(|job_id| Event::JobRequeued { job_id, now_ms: 0 }),
            ".*".prop_map(|job_id| Event::JobCancelRequested { job_id }),
            ".*".prop_map(|worker_id| Event::WorkerMarkedOffline { worker_id }),
            ".*".prop_map(|worker_id| Event::WorkerCooldownCleared { worker_id }),
            (".*", any::<u64>(), ".*").prop_map(|(worker_id, cooldown_until_ms, reason)| {
                Event::WorkerMarkedUnhealthy { worker_id, cooldown_until_ms, reason }
            }),
        ]
    }

    proptest! {
        /// Any sequence of events appended to the log replays back in the
        /// exact order and content they were written, across however many
        /// times the log is closed and reopened (spec.md §5: "persistence
        /// writes are... ordered per key").
        #[test]
        fn appended_events_always_replay_in_order(events in proptest::collection::vec(arb_simple_event(), 0..20)) {
            let dir = tempdir().expect("tempdir");
            let path = dir.path().join("test.wal");

            for event in &events {
                let mut wal = Wal::open(&path).expect("open");
                wal.append(event).expect("append");
            }

            let replayed = Wal::replay(&path).expect("replay");
            prop_assert_eq!(&replayed, &events);
        }
    }
}
