//! Raw link-layer capture sockets.
//!
//! This module defines the `CaptureSocketFactory` trait (DIP), the owned
//! `CaptureDescriptor` handle, and an `AF_PACKET` implementation of the
//! factory. The inspector depends only on the trait, so tests can hand it
//! any datagram socket.

mod interface;
mod raw_socket;

pub use interface::{find_interface, list_interfaces, InterfaceSummary};
pub use raw_socket::{create_capture_fd, RawCaptureSocketFactory};

use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, RawFd};
use std::time::Duration;

use socket2::Socket;

use crate::error::CaptureError;

/// `ETH_P_ALL`: every Ethernet protocol, in host byte order.
pub const ETH_P_ALL: u16 = libc::ETH_P_ALL as u16;

/// The "all protocols" value as the socket layer expects it.
///
/// The returned integer's in-memory representation is big-endian on every
/// host, so it can be handed straight to `socket(2)` or `sockaddr_ll`.
pub const fn all_protocols() -> u16 {
    ETH_P_ALL.to_be()
}

/// Trait for capture socket factories (Dependency Inversion Principle).
///
/// Each call to `create` yields a fresh, independent descriptor. Ownership
/// moves to the caller.
pub trait CaptureSocketFactory: Send + Sync {
    /// Create one capture descriptor.
    fn create(&self) -> Result<CaptureDescriptor, CaptureError>;

    /// Name of the interface descriptors are bound to, `None` for all.
    fn interface_name(&self) -> Option<&str>;
}

/// An open capture socket.
///
/// The socket is closed when the descriptor is dropped. Use `close` to
/// observe close errors, or `into_raw_fd` to give up ownership.
#[derive(Debug)]
pub struct CaptureDescriptor {
    socket: Socket,
}

impl CaptureDescriptor {
    pub(crate) fn from_socket(socket: Socket) -> Self {
        Self { socket }
    }

    /// Borrow the underlying socket, e.g. to set further options.
    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    /// Set `SO_RCVTIMEO`. `None` blocks indefinitely.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), CaptureError> {
        self.socket.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Receive one frame into `buf`, returning its length.
    ///
    /// Frames longer than `buf` are truncated.
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        loop {
            match (&self.socket).read(buf) {
                Ok(len) => return Ok(len),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(CaptureError::Timeout)
                }
                Err(e) => return Err(CaptureError::Io(e)),
            }
        }
    }

    /// Close the socket, reporting any error from `close(2)`.
    pub fn close(self) -> Result<(), CaptureError> {
        let fd = self.socket.into_raw_fd();
        // SAFETY: `fd` was just released by the socket and is owned here.
        if unsafe { libc::close(fd) } == -1 {
            return Err(io::Error::last_os_error().into());
        }
        Ok(())
    }
}

impl AsRawFd for CaptureDescriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

impl AsFd for CaptureDescriptor {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

impl IntoRawFd for CaptureDescriptor {
    fn into_raw_fd(self) -> RawFd {
        self.socket.into_raw_fd()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serial_test::serial;
    use socket2::{Domain, Type};

    /// A connected datagram pair standing in for a packet socket.
    pub(crate) fn descriptor_pair() -> (CaptureDescriptor, Socket) {
        let (a, b) = Socket::pair(Domain::UNIX, Type::DGRAM, None).unwrap();
        (CaptureDescriptor::from_socket(a), b)
    }

    pub(crate) fn fd_is_open(fd: RawFd) -> bool {
        unsafe { libc::fcntl(fd, libc::F_GETFD) != -1 }
    }

    #[test]
    fn test_all_protocols_is_network_order() {
        assert_eq!(all_protocols().to_ne_bytes(), [0x00, 0x03]);
        assert_eq!(u16::from_be(all_protocols()), 0x0003);
    }

    #[test]
    #[serial]
    fn test_recv_returns_frame() {
        let (desc, peer) = descriptor_pair();
        peer.send(&[0xde, 0xad, 0xbe, 0xef]).unwrap();

        let mut buf = [0u8; 64];
        let len = desc.recv(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    #[serial]
    fn test_recv_truncates_to_buffer() {
        let (desc, peer) = descriptor_pair();
        peer.send(&[1, 2, 3, 4, 5, 6]).unwrap();

        let mut buf = [0u8; 4];
        let len = desc.recv(&mut buf).unwrap();
        assert_eq!(len, 4);
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    #[serial]
    fn test_recv_timeout() {
        let (desc, _peer) = descriptor_pair();
        desc.set_read_timeout(Some(Duration::from_millis(10))).unwrap();

        let mut buf = [0u8; 16];
        assert!(matches!(desc.recv(&mut buf), Err(CaptureError::Timeout)));
    }

    #[test]
    #[serial]
    fn test_close_releases_fd() {
        let (desc, _peer) = descriptor_pair();
        let fd = desc.as_raw_fd();
        assert!(fd_is_open(fd));

        desc.close().unwrap();
        assert!(!fd_is_open(fd));
    }

    #[test]
    #[serial]
    fn test_drop_releases_fd() {
        let (desc, _peer) = descriptor_pair();
        let fd = desc.as_raw_fd();
        drop(desc);
        assert!(!fd_is_open(fd));
    }

    #[test]
    #[serial]
    fn test_into_raw_fd_keeps_fd_open() {
        let (desc, _peer) = descriptor_pair();
        let fd = desc.into_raw_fd();
        assert!(fd_is_open(fd));
        unsafe { libc::close(fd) };
    }
}
