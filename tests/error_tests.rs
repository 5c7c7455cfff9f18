// Tests for the replay error taxonomy

use pylae::capture::CaptureError;
use pylae::{Command, Mode, ReplayError};

#[test]
fn test_acquire_errors_map_to_start_failures() {
    assert!(matches!(
        ReplayError::from_acquire(CaptureError::PermissionDenied("no".to_string())),
        ReplayError::PermissionDenied(_)
    ));
    assert!(matches!(
        ReplayError::from_acquire(CaptureError::Unavailable("gone".to_string())),
        ReplayError::CaptureUnavailable(_)
    ));
    assert!(matches!(
        ReplayError::from_acquire(CaptureError::Released),
        ReplayError::CaptureUnavailable(_)
    ));
}

#[test]
fn test_unexpected_reply_is_an_error_not_a_panic() {
    let err = ReplayError::UnexpectedReply(Command::ToggleLoop);

    assert_eq!(err.code(), "UNEXPECTED_REPLY");
    assert_eq!(
        err.to_string(),
        "Replay service gave an unexpected reply to toggle loop"
    );
}

#[test]
fn test_invalid_command_message() {
    let err = ReplayError::InvalidCommand {
        command: Command::Save,
        mode: Mode::CountingDown,
    };

    assert_eq!(err.code(), "INVALID_COMMAND");
    assert_eq!(err.to_string(), "Cannot save while counting down");
}
