use std::io;

use thiserror::Error;

/// Errors raised while opening, reading or closing a capture socket.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Insufficient permissions to open a packet socket (requires root or CAP_NET_RAW)")]
    InsufficientPermissions(#[source] io::Error),

    #[error("Packet capture address family not supported by this kernel")]
    AddressFamilyUnsupported(#[source] io::Error),

    #[error("Out of descriptors or socket memory: {0}")]
    ResourceExhausted(#[source] io::Error),

    #[error("Network interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("Invalid file descriptor")]
    InvalidDescriptor,

    #[error("Read timed out")]
    Timeout,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CaptureError {
    /// Classify an OS error returned by `socket(2)`.
    ///
    /// Must be called with the error captured right after the failing call,
    /// before anything else can overwrite `errno`.
    pub fn from_os_error(err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::EPERM) | Some(libc::EACCES) => CaptureError::InsufficientPermissions(err),
            Some(libc::EAFNOSUPPORT) | Some(libc::EPROTONOSUPPORT) => {
                CaptureError::AddressFamilyUnsupported(err)
            }
            Some(libc::EMFILE) | Some(libc::ENFILE) | Some(libc::ENOBUFS) | Some(libc::ENOMEM) => {
                CaptureError::ResourceExhausted(err)
            }
            _ => CaptureError::Io(err),
        }
    }

    /// The underlying `errno`, if this error came from the OS.
    pub fn os_error(&self) -> Option<i32> {
        match self {
            CaptureError::InsufficientPermissions(e)
            | CaptureError::AddressFamilyUnsupported(e)
            | CaptureError::ResourceExhausted(e)
            | CaptureError::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(errno: i32) -> CaptureError {
        CaptureError::from_os_error(io::Error::from_raw_os_error(errno))
    }

    #[test]
    fn test_permission_errors() {
        assert!(matches!(classify(libc::EPERM), CaptureError::InsufficientPermissions(_)));
        assert!(matches!(classify(libc::EACCES), CaptureError::InsufficientPermissions(_)));
    }

    #[test]
    fn test_family_errors() {
        assert!(matches!(classify(libc::EAFNOSUPPORT), CaptureError::AddressFamilyUnsupported(_)));
        assert!(matches!(classify(libc::EPROTONOSUPPORT), CaptureError::AddressFamilyUnsupported(_)));
    }

    #[test]
    fn test_exhaustion_errors() {
        for errno in [libc::EMFILE, libc::ENFILE, libc::ENOBUFS, libc::ENOMEM] {
            assert!(matches!(classify(errno), CaptureError::ResourceExhausted(_)));
        }
    }

    #[test]
    fn test_other_errors_fall_through() {
        assert!(matches!(classify(libc::EINVAL), CaptureError::Io(_)));
    }

    #[test]
    fn test_os_error_preserved() {
        assert_eq!(classify(libc::EMFILE).os_error(), Some(libc::EMFILE));
        assert_eq!(classify(libc::EINVAL).os_error(), Some(libc::EINVAL));
        assert_eq!(CaptureError::InvalidDescriptor.os_error(), None);
        assert_eq!(CaptureError::Timeout.os_error(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CaptureError::InterfaceNotFound("eth9".to_string()).to_string(),
            "Network interface not found: eth9"
        );
        assert_eq!(CaptureError::InvalidDescriptor.to_string(), "Invalid file descriptor");
    }
}
