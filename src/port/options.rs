//! Types defining the different options when opening a port.

use super::Port;
use crate::{
    backend::{Backend, Serial},
    error::Error,
    protocol::Protocol,
};
use serialport as sp;
use std::{marker::PhantomData, time::Duration};

/// Options for configuring and opening a serial port framed for the protocol `P`.
///
/// The port is always opened with 8 data bits, no parity, 1 stop bit and no
/// flow control.
///
/// ## Example
///
/// ```rust
/// # use skproto::hsc103::OpenSerialOptions;
/// # use std::time::Duration;
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let mut port = OpenSerialOptions::new()
///     .baud_rate(9_600)
///     .timeout(Some(Duration::from_millis(500)))
///     .open("/dev/ttyUSB0")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OpenSerialOptions<P> {
    /// The custom baud rate
    baud_rate: u32,
    /// The custom timeout
    timeout: Option<Duration>,
    protocol: PhantomData<P>,
}

impl<P: Protocol> OpenSerialOptions<P> {
    /// The read timeout used unless configured otherwise: 3 seconds.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

    /// Create a blank set of options ready for configuration.
    ///
    /// The default baud rate is the protocol's
    /// [`DEFAULT_BAUD_RATE`](Protocol::DEFAULT_BAUD_RATE) and the default read
    /// timeout is 3 seconds.
    ///
    /// Equivalent to [`default`](OpenSerialOptions::default).
    pub fn new() -> Self {
        OpenSerialOptions {
            baud_rate: P::DEFAULT_BAUD_RATE,
            timeout: Some(Self::DEFAULT_TIMEOUT),
            protocol: PhantomData,
        }
    }

    /// Set a custom baud rate.
    pub fn baud_rate(&mut self, baud_rate: u32) -> &mut Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set a custom read timeout.
    ///
    /// If duration is `None`, reads will block indefinitely. The default is 3 seconds.
    pub fn timeout(&mut self, duration: Option<Duration>) -> &mut Self {
        self.timeout = duration;
        self
    }

    /// Open a [`Serial`] port at the specified path.
    fn open_serial_port(&self, path: &str) -> Result<Serial, Error> {
        log::info!(
            "opening {} port {path} at {} baud",
            P::NAME,
            self.baud_rate
        );
        // The baud rate passed to `new` may be ignored on some platforms, so
        // it is set again explicitly below.
        sp::new(path, P::DEFAULT_BAUD_RATE)
            .data_bits(sp::DataBits::Eight)
            .parity(sp::Parity::None)
            .flow_control(sp::FlowControl::None)
            .stop_bits(sp::StopBits::One)
            // The serialport API does not support infinite timeouts, so simply
            // set the timeout to the largest possible duration if `timeout` is
            // `None`, which is practically infinite.
            .timeout(self.timeout.unwrap_or(Duration::MAX))
            .baud_rate(self.baud_rate)
            .open_native()
            .map(Serial)
            .map_err(Into::into)
    }

    /// Open the port at the specified path with the custom options.
    pub fn open(&self, path: &str) -> Result<Port<Serial, P>, Error> {
        Ok(Port::from_backend(self.open_serial_port(path)?))
    }

    /// Open the port at the specified path with the custom options.
    ///
    /// The type of the underlying backend is erased via dynamic dispatch,
    /// which does have runtime overhead. [`OpenSerialOptions::open`] should
    /// generally be used instead, except when the type of the underlying
    /// backend may not be known at compile time.
    pub fn open_dyn(&self, path: &str) -> Result<Port<Box<dyn Backend>, P>, Error> {
        Ok(Port::from_backend(Box::new(self.open_serial_port(path)?)))
    }
}

impl<P: Protocol> Default for OpenSerialOptions<P> {
    fn default() -> Self {
        Self::new()
    }
}
