use forge_core::Job;

use super::*;

#[test]
fn requeues_while_attempts_within_budget() {
    let job = Job::builder().command("echo hi").max_retries(1).attempts(0).build();
    assert_eq!(retry_decision(&job), RetryDecision::Requeue);
}

#[test]
fn fails_once_attempts_exhausts_max_retries() {
    let job = Job::builder().command("echo hi").max_retries(1).attempts(1).build();
    assert_eq!(retry_decision(&job), RetryDecision::Fail);
}

#[test]
fn zero_max_retries_fails_on_first_reclamation() {
    let job = Job::builder().command("echo hi").max_retries(0).attempts(0).build();
    assert_eq!(retry_decision(&job), RetryDecision::Fail);
}
