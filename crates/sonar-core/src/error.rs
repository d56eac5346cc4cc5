use std::time::Duration;

use thiserror::Error;

/// Why a read produced no usable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultReason {
    #[error("short read: requested {requested} bytes, got {received}")]
    Short { requested: usize, received: usize },

    #[error("{0}")]
    Os(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("null pointer")]
    NullPointer,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Read fault at address {address:#x}: {reason}")]
    ReadFault { address: u64, reason: FaultReason },

    #[error("Actor at {address:#x} is no longer valid: {source}")]
    EntityInvalid {
        address: u64,
        #[source]
        source: Box<Error>,
    },

    #[error("World unavailable: {0}")]
    WorldUnavailable(#[source] Box<Error>),

    #[error("Target process {pid} exited")]
    ProcessExited { pid: u32 },

    #[error(
        "World stayed unreadable for {attempts} attempts ({:.1}s); offsets are likely wrong or the target is stalled",
        .elapsed.as_secs_f64()
    )]
    TargetStalled { attempts: u32, elapsed: Duration },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Signature not found: {0}")]
    SignatureNotFound(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn short_read(address: u64, requested: usize, received: usize) -> Self {
        Error::ReadFault {
            address,
            reason: FaultReason::Short {
                requested,
                received,
            },
        }
    }

    pub fn decode(address: u64, message: impl Into<String>) -> Self {
        Error::ReadFault {
            address,
            reason: FaultReason::Decode(message.into()),
        }
    }

    /// Wrap a fault raised while refreshing one actor.
    pub fn entity_invalid(address: u64, source: Error) -> Self {
        Error::EntityInvalid {
            address,
            source: Box::new(source),
        }
    }

    /// Wrap a fault raised while resolving the world or viewpoint.
    pub fn world_unavailable(source: Error) -> Self {
        match source {
            already @ Error::WorldUnavailable(_) => already,
            other => Error::WorldUnavailable(Box::new(other)),
        }
    }

    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    pub fn is_read_fault(&self) -> bool {
        matches!(self, Error::ReadFault { .. })
    }

    pub fn is_world_unavailable(&self) -> bool {
        matches!(self, Error::WorldUnavailable(_))
    }

    /// Errors that end the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ProcessNotFound(_)
                | Error::ProcessOpenFailed(_)
                | Error::ProcessExited { .. }
                | Error::TargetStalled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_world_unavailable_does_not_nest() {
        let err = Error::world_unavailable(Error::short_read(0x10, 8, 0));
        let err = Error::world_unavailable(err);
        match err {
            Error::WorldUnavailable(inner) => assert!(inner.is_read_fault()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fatal_messages_are_distinct() {
        let exited = Error::ProcessExited { pid: 42 }.to_string();
        let stalled = Error::TargetStalled {
            attempts: 300,
            elapsed: Duration::from_secs(30),
        }
        .to_string();

        assert!(exited.contains("exited"));
        assert!(stalled.contains("offsets are likely wrong"));
        assert!(stalled.contains("30.0s"));
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::ProcessExited { pid: 1 }.is_fatal());
        assert!(!Error::short_read(0, 4, 0).is_fatal());
        assert!(!Error::world_unavailable(Error::short_read(0, 4, 0)).is_fatal());
    }
}
