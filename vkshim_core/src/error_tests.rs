//! Unit tests for error.rs

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("glCreateFramebuffers is not loaded".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("glCreateFramebuffers"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of device memory");
}

#[test]
fn test_invalid_state_display() {
    let err = Error::InvalidState("command buffer is not recording".to_string());
    assert_eq!(format!("{}", err), "Invalid state: command buffer is not recording");
}

#[test]
fn test_incompatible_attachment_display() {
    let err = Error::IncompatibleAttachment("attachment 1: R8G8B8A8_UNORM vs D32_SFLOAT".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Incompatible attachment"));
    assert!(display.contains("attachment 1"));
}

#[test]
fn test_unsupported_display() {
    let err = Error::Unsupported("sparse binding".to_string());
    assert_eq!(format!("{}", err), "Unsupported: sparse binding");
}

// ============================================================================
// TRAIT TESTS
// ============================================================================

#[test]
fn test_error_clone_and_eq() {
    let err = Error::InvalidResource("zero extent".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::OutOfMemory);
}

#[test]
fn test_error_is_std_error() {
    fn takes_std_error(_: &dyn std::error::Error) {}
    takes_std_error(&Error::OutOfMemory);
}

#[test]
fn test_result_question_mark() {
    fn inner() -> Result<u32> {
        Err(Error::InitializationFailed("no context".to_string()))
    }
    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }
    assert!(matches!(outer(), Err(Error::InitializationFailed(_))));
}
