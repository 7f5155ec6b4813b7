//! `AF_PACKET` capture socket factory.

use std::io;
use std::mem;
use std::os::fd::AsRawFd;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::debug;

use super::{all_protocols, find_interface, CaptureDescriptor, CaptureSocketFactory};
use crate::error::CaptureError;

/// Open a raw `AF_PACKET` socket receiving every Ethernet protocol.
///
/// Returns the descriptor, or a negative value with the cause left in
/// `errno`. The caller owns the descriptor and must close it. Prefer
/// `RawCaptureSocketFactory`, which returns an owned handle and a typed
/// error.
pub fn create_capture_fd() -> libc::c_int {
    // SAFETY: socket(2) with constant arguments touches no user memory.
    unsafe {
        libc::socket(
            libc::AF_PACKET,
            libc::SOCK_RAW,
            libc::c_int::from(all_protocols()),
        )
    }
}

#[derive(Debug, Clone)]
struct BoundInterface {
    name: String,
    index: u32,
}

/// Creates raw link-layer capture sockets.
///
/// By default sockets are left unbound and see frames from every interface.
/// `for_interface` restricts each new socket to a single interface.
#[derive(Debug, Clone, Default)]
pub struct RawCaptureSocketFactory {
    interface: Option<BoundInterface>,
}

impl RawCaptureSocketFactory {
    /// Factory for sockets capturing on all interfaces.
    pub fn new() -> Self {
        Self { interface: None }
    }

    /// Factory for sockets bound to the named interface.
    pub fn for_interface(name: &str) -> Result<Self, CaptureError> {
        let iface = find_interface(name)?;
        Ok(Self {
            interface: Some(BoundInterface {
                name: iface.name,
                index: iface.index,
            }),
        })
    }
}

impl CaptureSocketFactory for RawCaptureSocketFactory {
    fn create(&self) -> Result<CaptureDescriptor, CaptureError> {
        let socket = Socket::new(
            Domain::PACKET,
            Type::RAW,
            Some(Protocol::from(libc::c_int::from(all_protocols()))),
        )
        .map_err(CaptureError::from_os_error)?;

        // On bind failure `socket` is dropped, closing it.
        if let Some(iface) = &self.interface {
            bind_to_interface(&socket, iface.index)?;
        }

        debug!(
            "Opened capture socket fd={} on {}",
            socket.as_raw_fd(),
            self.interface_name().unwrap_or("all interfaces")
        );

        Ok(CaptureDescriptor::from_socket(socket))
    }

    fn interface_name(&self) -> Option<&str> {
        self.interface.as_ref().map(|iface| iface.name.as_str())
    }
}

/// Restrict a packet socket to one interface (man 7 packet).
fn bind_to_interface(socket: &Socket, index: u32) -> Result<(), CaptureError> {
    let ifindex = libc::c_int::try_from(index)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "interface index out of range"))?;

    // SAFETY: sockaddr_ll is plain old data; all-zero is a valid value.
    let mut sa: libc::sockaddr_ll = unsafe { mem::zeroed() };
    sa.sll_family = libc::AF_PACKET as libc::c_ushort;
    sa.sll_protocol = all_protocols();
    sa.sll_ifindex = ifindex;

    // SAFETY: `sa` outlives the call and the length matches its type.
    let ret = unsafe {
        libc::bind(
            socket.as_raw_fd(),
            &sa as *const libc::sockaddr_ll as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
        )
    };
    if ret == -1 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(())
}
