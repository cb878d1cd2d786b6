use forge_wire::{ApiErrorBody, ErrorKind};

use super::*;

#[test]
fn api_error_is_wrapped_with_its_display_preserved() {
    let body = ApiErrorBody::new(ErrorKind::NotFound, "job job-1 not found");
    let err: AgentError = body.into();
    assert_eq!(err.to_string(), "coordinator rejected the request: not_found: job job-1 not found");
}

#[test]
fn connect_error_names_the_address() {
    let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
    let err = AgentError::Connect { addr: "127.0.0.1:7420".to_string(), source: io_err };
    assert!(err.to_string().contains("127.0.0.1:7420"));
}
