//! Packet Inspector - raw link-layer packet capture.
//!
//! Opens `AF_PACKET`/`SOCK_RAW` sockets with protocol `ETH_P_ALL`, which
//! deliver every Ethernet frame seen by the selected interfaces. Frames are
//! handed out as raw bytes; decoding them is left to the caller.
//!
//! # Architecture
//!
//! - `capture`: the `CaptureSocketFactory` trait, the owned
//!   `CaptureDescriptor` handle and the `AF_PACKET` factory
//! - `inspector`: buffered frame reader over a factory
//! - `config`: file and environment configuration
//! - `error`: error types

#[cfg(not(target_os = "linux"))]
compile_error!("packet-inspector requires Linux AF_PACKET sockets");

pub mod capture;
pub mod config;
pub mod error;
pub mod inspector;

pub use capture::{
    all_protocols, create_capture_fd, CaptureDescriptor, CaptureSocketFactory,
    RawCaptureSocketFactory, ETH_P_ALL,
};
pub use config::CaptureConfig;
pub use error::CaptureError;
pub use inspector::Inspector;
