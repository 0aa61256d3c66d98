use thiserror::Error;

/// Reasons a room command is refused.
///
/// The `Display` text is what the offending client sees in its `error` event,
/// so not-found and full deliberately share one message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("room already exists")]
    DuplicateRoom,
    #[error("room not found or full")]
    RoomNotFound,
    #[error("room not found or full")]
    RoomFull,
    #[error("already in this room")]
    AlreadyMember,
    #[error("guess must be a 3-digit number")]
    InvalidGuess,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_failures_share_a_message() {
        assert_eq!(SessionError::RoomNotFound.to_string(), SessionError::RoomFull.to_string());
        assert_eq!(SessionError::DuplicateRoom.to_string(), "room already exists");
    }
}
