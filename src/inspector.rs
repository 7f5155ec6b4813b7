//! Frame reader built on a capture socket factory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::capture::{CaptureDescriptor, CaptureSocketFactory, RawCaptureSocketFactory};
use crate::config::CaptureConfig;
use crate::error::CaptureError;

/// Reads raw frames from a capture descriptor into a reusable buffer.
pub struct Inspector<F: CaptureSocketFactory = RawCaptureSocketFactory> {
    factory: F,
    descriptor: Option<CaptureDescriptor>,
    buffer: Vec<u8>,
    read_timeout: Option<Duration>,
}

impl Inspector<RawCaptureSocketFactory> {
    /// Build an inspector from configuration. Nothing is opened yet.
    pub fn from_config(config: &CaptureConfig) -> Result<Self, CaptureError> {
        config.validate()?;

        let factory = match &config.interface {
            Some(name) => RawCaptureSocketFactory::for_interface(name)?,
            None => RawCaptureSocketFactory::new(),
        };

        Ok(Self::new(factory, config.buffer_size).with_read_timeout(config.read_timeout))
    }
}

impl<F: CaptureSocketFactory> Inspector<F> {
    /// Create an inspector with a `buffer_size` byte read buffer.
    pub fn new(factory: F, buffer_size: usize) -> Self {
        Self {
            factory,
            descriptor: None,
            buffer: vec![0; buffer_size],
            read_timeout: None,
        }
    }

    /// Set the read timeout applied when the descriptor is opened.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Whether a capture descriptor is currently open.
    pub fn is_open(&self) -> bool {
        self.descriptor.is_some()
    }

    /// Interface the factory binds to, `None` for all interfaces.
    pub fn interface_name(&self) -> Option<&str> {
        self.factory.interface_name()
    }

    /// Size of the read buffer, and so the longest frame returned.
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Open the capture descriptor. Does nothing if already open.
    pub fn open(&mut self) -> Result<(), CaptureError> {
        if self.descriptor.is_some() {
            return Ok(());
        }

        let descriptor = self.factory.create()?;
        descriptor.set_read_timeout(self.read_timeout)?;

        info!(
            "Capturing on {}",
            self.factory.interface_name().unwrap_or("all interfaces")
        );
        self.descriptor = Some(descriptor);
        Ok(())
    }

    /// Read one frame, borrowing it from the internal buffer.
    pub fn read_frame(&mut self) -> Result<&[u8], CaptureError> {
        let descriptor = self
            .descriptor
            .as_ref()
            .ok_or(CaptureError::InvalidDescriptor)?;
        let len = descriptor.recv(&mut self.buffer)?;
        Ok(&self.buffer[..len])
    }

    /// Read one frame and return an owned copy of it.
    pub fn read(&mut self) -> Result<Vec<u8>, CaptureError> {
        self.read_frame().map(<[u8]>::to_vec)
    }

    /// Close the capture descriptor.
    pub fn close(&mut self) -> Result<(), CaptureError> {
        let descriptor = self
            .descriptor
            .take()
            .ok_or(CaptureError::InvalidDescriptor)?;
        descriptor.close()?;
        debug!("Capture descriptor closed");
        Ok(())
    }

    /// Iterate over incoming frames until `running` is cleared.
    ///
    /// Read timeouts are skipped; they only give the iterator a chance to
    /// check the flag. Without a configured timeout, reads poll every
    /// `FRAME_POLL_INTERVAL` while iterating so clearing the flag is noticed.
    pub fn frames(&mut self, running: Arc<AtomicBool>) -> Frames<'_, F> {
        Frames {
            inspector: self,
            running,
            polling: false,
        }
    }
}

/// Read timeout used by `Frames` when the inspector blocks indefinitely.
pub const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Iterator over frames read by an `Inspector`.
pub struct Frames<'a, F: CaptureSocketFactory> {
    inspector: &'a mut Inspector<F>,
    running: Arc<AtomicBool>,
    /// Set once the poll timeout replaced a blocking read.
    polling: bool,
}

impl<F: CaptureSocketFactory> Frames<'_, F> {
    fn start_polling(&mut self) -> Result<(), CaptureError> {
        if self.polling || self.inspector.read_timeout.is_some() {
            return Ok(());
        }
        if let Some(descriptor) = &self.inspector.descriptor {
            descriptor.set_read_timeout(Some(FRAME_POLL_INTERVAL))?;
            self.polling = true;
        }
        Ok(())
    }
}

impl<F: CaptureSocketFactory> Iterator for Frames<'_, F> {
    type Item = Result<Vec<u8>, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(e) = self.start_polling() {
            return Some(Err(e));
        }
        while self.running.load(Ordering::SeqCst) {
            match self.inspector.read() {
                Ok(frame) => return Some(Ok(frame)),
                Err(CaptureError::Timeout) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

impl<F: CaptureSocketFactory> Drop for Frames<'_, F> {
    fn drop(&mut self) {
        if !self.polling {
            return;
        }
        if let Some(descriptor) = &self.inspector.descriptor {
            if let Err(e) = descriptor.set_read_timeout(self.inspector.read_timeout) {
                debug!("Failed to restore read timeout: {}", e);
            }
        }
    }
}
