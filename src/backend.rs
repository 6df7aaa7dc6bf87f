//! Types that can exchange (read/write) bytes with a connected controller.
//!
//! The [`Backend`] trait represents all such types. [`Serial`] talks to real
//! hardware and [`Offline`] stands in for it when no hardware is attached.

use std::io::{self, Read as _, Write as _};
use std::time::Duration;

use serialport as sp;

#[cfg(windows)]
use sp::COMPort as ExternSerial;
use sp::SerialPort;
#[cfg(unix)]
use sp::TTYPort as ExternSerial;

/// The placeholder name for a backend that doesn't have a name.
pub(crate) const UNKNOWN_BACKEND_NAME: &str = "<unknown backend>";

/// Types that allow reading and writing bytes with a connected controller.
pub trait Backend: io::Read + io::Write + private::Sealed {
    /// Set the read timeout.
    ///
    /// If timeout is `None`, reads will block indefinitely.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error>;

    /// Get the read timeout.
    ///
    /// If timeout is `None`, reads will block indefinitely.
    fn read_timeout(&self) -> Result<Option<Duration>, io::Error>;

    /// Get the "name" of the backend.
    ///
    /// This can be in any format, but should uniquely identify the backend
    /// instance.
    fn name(&self) -> Option<String>;
}

impl<C: Backend + ?Sized> Backend for Box<C> {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
        (**self).set_read_timeout(timeout)
    }
    fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
        (**self).read_timeout()
    }
    fn name(&self) -> Option<String> {
        (**self).name()
    }
}

impl<C: Backend + ?Sized> Backend for &mut C {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
        (**self).set_read_timeout(timeout)
    }
    fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
        (**self).read_timeout()
    }
    fn name(&self) -> Option<String> {
        (**self).name()
    }
}

/// A platform agnostic serial port backend.
//
// `serialport` exposes `COMPort` and `TTYPort` for windows and unix,
// respectively. Wrapping whichever one the platform uses keeps the port
// types free of a platform specific type parameter.
#[derive(Debug)]
pub struct Serial(pub(crate) ExternSerial);

impl io::Read for Serial {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl io::Write for Serial {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl Backend for Serial {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
        // The serialport API does not support infinite timeouts, so simply set
        // the timeout to the largest possible duration if `timeout` is `None`,
        // which is practically infinite.
        Ok(self.0.set_timeout(timeout.unwrap_or(Duration::MAX))?)
    }
    fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
        Ok(Some(self.0.timeout()))
    }
    fn name(&self) -> Option<String> {
        self.0.name()
    }
}

/// A backend for running without hardware attached.
///
/// Everything written to it is discarded and every line read from it is
/// [`Offline::REPLY`], so each query decodes to its documented fallback.
#[derive(Debug)]
pub struct Offline {
    /// The placeholder reply followed by the protocol's terminator.
    line: Box<[u8]>,
    /// The position of the next byte to read in `line`.
    position: usize,
    /// The read timeout, which is ignored.
    ignored_read_timeout: Option<Duration>,
}

impl Offline {
    /// The text of every reply read from an offline backend.
    pub const REPLY: &'static str = "offline";

    /// Create an offline backend whose replies end with `terminator`.
    pub(crate) fn new(terminator: &str) -> Self {
        Offline {
            line: format!("{}{terminator}", Offline::REPLY)
                .into_bytes()
                .into_boxed_slice(),
            position: 0,
            ignored_read_timeout: None,
        }
    }
}

impl io::Read for Offline {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = &self.line[self.position..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.position = (self.position + n) % self.line.len();
        Ok(n)
    }
}

impl io::Write for Offline {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Backend for Offline {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
        self.ignored_read_timeout = timeout;
        Ok(())
    }
    fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
        Ok(self.ignored_read_timeout)
    }
    fn name(&self) -> Option<String> {
        Some("<offline>".to_string())
    }
}

/// A mock backend for use in testing.
///
/// It has the following features:
///   * It records all data written to it.
///   * It can be filled with data for reading.
///   * Once its data is exhausted it either simulates a timeout or, after
///     [`close`](Mock::close), reports the end of the stream.
///   * Specific errors can be inserted for calls to `read`, `write`, and
///     `set_read_timeout`.
#[cfg(any(test, feature = "mock"))]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "mock")))]
#[derive(Debug)]
pub struct Mock {
    /// The buffer data is read from
    buffer: io::Cursor<Vec<u8>>,
    /// Everything written so far
    written: Vec<u8>,
    /// Whether reads past the end of `buffer` report the end of the stream
    /// rather than a timeout.
    closed: bool,
    /// The error to surface on the next read, if any. It is only surfaced once.
    read_error: Option<io::Error>,
    /// The error to surface on the next write, if any. It is only surfaced once.
    write_error: Option<io::Error>,
    /// The error to surface on the next set_read_timeout, if any. It is only surfaced once.
    set_read_timeout_error: Option<io::Error>,
    /// The read timeout, which is ignored.
    ignored_read_timeout: Option<Duration>,
}

#[cfg(any(test, feature = "mock"))]
impl Mock {
    /// Create a new Mock backend.
    pub fn new() -> Self {
        Mock {
            buffer: io::Cursor::new(Vec::new()),
            written: Vec::new(),
            closed: false,
            read_error: None,
            write_error: None,
            set_read_timeout_error: None,
            ignored_read_timeout: Some(Duration::ZERO),
        }
    }
    /// Append data to the read buffer.
    ///
    /// The data is not validated in any way.
    pub fn append_data<T: AsRef<[u8]>>(&mut self, bytes: T) {
        self.buffer.get_mut().extend_from_slice(bytes.as_ref());
    }
    /// Clear the read buffer.
    pub fn clear_buffer(&mut self) {
        self.buffer.get_mut().clear();
        self.buffer.set_position(0);
    }
    /// Whether the mock has any data available or not
    pub fn is_empty(&self) -> bool {
        self.buffer.position() as usize >= self.buffer.get_ref().len()
    }
    /// Report the end of the stream, instead of a timeout, once the read
    /// buffer is exhausted.
    pub fn close(&mut self) {
        self.closed = true;
    }
    /// All bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }
    /// All bytes written so far as text.
    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }
    /// Forget all bytes written so far.
    pub fn clear_written(&mut self) {
        self.written.clear();
    }
    /// Set the error for the next `read`, if any.
    pub fn read_error(&mut self, err: Option<io::Error>) {
        self.read_error = err;
    }
    /// Set the error for the next `write`, if any.
    pub fn write_error(&mut self, err: Option<io::Error>) {
        self.write_error = err;
    }
    /// Set the error for the next `set_read_timeout`, if any.
    pub fn set_read_timeout_error(&mut self, err: Option<io::Error>) {
        self.set_read_timeout_error = err;
    }
}

#[cfg(any(test, feature = "mock"))]
impl Default for Mock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "mock"))]
impl Backend for Mock {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
        if let Some(err) = self.set_read_timeout_error.take() {
            Err(err)
        } else {
            self.ignored_read_timeout = timeout;
            Ok(())
        }
    }

    fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
        Ok(self.ignored_read_timeout)
    }

    fn name(&self) -> Option<String> {
        Some(format!("<mock 0x{:x}>", self as *const Mock as usize))
    }
}

#[cfg(any(test, feature = "mock"))]
impl io::Read for Mock {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(err) = self.read_error.take() {
            Err(err)
        } else if self.is_empty() && !self.closed {
            // A real controller with nothing to say would eventually time
            // out, so simulate that immediately.
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "Simulated timeout error",
            ))
        } else {
            self.buffer.read(buf)
        }
    }
}

#[cfg(any(test, feature = "mock"))]
impl io::Write for Mock {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(err) = self.write_error.take() {
            Err(err)
        } else {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

mod private {
    pub trait Sealed {}

    impl Sealed for super::Serial {}
    impl Sealed for super::Offline {}
    #[cfg(any(test, feature = "mock"))]
    impl Sealed for super::Mock {}
    impl<C: super::Backend + ?Sized> Sealed for Box<C> {}
    impl<C: super::Backend + ?Sized> Sealed for &mut C {}
}
