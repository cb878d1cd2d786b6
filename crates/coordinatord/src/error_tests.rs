use forge_wire::error::ErrorKind;

use super::*;

#[test]
fn not_found_maps_to_not_found() {
    let wire = ApiError::JobNotFound("job-1".to_string()).into_wire();
    assert_eq!(wire.kind, ErrorKind::NotFound);
}

#[test]
fn not_owner_maps_to_conflicting_state() {
    let wire = ApiError::NotOwner { job_id: "job-1".to_string(), worker_id: "wkr-1".to_string() }.into_wire();
    assert_eq!(wire.kind, ErrorKind::ConflictingState);
}

#[test]
fn invalid_argument_maps_to_invalid_argument() {
    let wire = ApiError::InvalidArgument("bad shape".to_string()).into_wire();
    assert_eq!(wire.kind, ErrorKind::InvalidArgument);
}
