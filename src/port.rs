//! Types for opening and using a port framed for a stage controller protocol.

mod options;

#[cfg(any(test, feature = "mock"))]
use crate::backend::Mock;
use crate::{
    backend::{Backend, Offline, Serial, UNKNOWN_BACKEND_NAME},
    error::{Error, MalformedReplyError},
    protocol::Protocol,
    reply,
    timeout_guard::TimeoutGuard,
};
pub use options::*;
use std::{io, marker::PhantomData, time::Duration};

/// A port framed for the protocol `P`.
///
/// A port owns its [`Backend`] for its whole lifetime and exchanges one
/// terminated line of text at a time with it. Every command written has
/// exactly [`P::TERMINATOR`](Protocol::TERMINATOR) appended and every reply is
/// read up to, and stripped of, that terminator.
///
/// A port performs no validation or decoding of the text itself; that is
/// left to the protocol's controller.
///
/// Only one request/reply exchange may be in flight at a time. To share a
/// port between threads, wrap it (or the controller owning it) in a single
/// [`Mutex`](std::sync::Mutex) held for the whole exchange.
pub struct Port<B, P> {
    /// The underlying backend
    backend: B,
    /// If populated, the error that has "poisoned" the port. This error MUST be
    /// reported before the port is used for communication again.
    ///
    /// A port becomes poisoned when a [`TimeoutGuard`] cannot restore the
    /// original timeout in its Drop implementation.
    poison: Option<io::Error>,
    /// The protocol framing the port's lines.
    protocol: PhantomData<P>,
}

impl<B: Backend, P: Protocol> std::fmt::Debug for Port<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.backend.name())
            .field("protocol", &P::NAME)
            .finish_non_exhaustive()
    }
}

impl<P: Protocol> Port<Serial, P> {
    /// Open the serial port at the specified path using the default options.
    ///
    /// Alternatively, use [`Port::open_serial_options`] to customize how the port is opened.
    ///
    /// ## Example
    ///
    /// ```rust
    /// # use skproto::ds102::Port;
    /// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut port = Port::open_serial("/dev/ttyUSB0")?;
    /// // Or equivalently
    /// let mut port = Port::open_serial_options().open("/dev/ttyUSB0")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open_serial(path: &str) -> Result<Self, Error> {
        OpenSerialOptions::new().open(path)
    }

    /// Get an [`OpenSerialOptions`] to customize how a serial port is opened.
    pub fn open_serial_options() -> OpenSerialOptions<P> {
        OpenSerialOptions::default()
    }
}

impl<P: Protocol> Port<Offline, P> {
    /// Open a port with no hardware attached.
    ///
    /// Commands sent on it go nowhere and every reply is [`Offline::REPLY`].
    pub fn open_offline() -> Self {
        Port::from_backend(Offline::new(P::TERMINATOR))
    }
}

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "mock")))]
impl<P: Protocol> Port<Mock, P> {
    /// Open a mock port.
    pub fn open_mock() -> Self {
        Port::from_backend(Mock::new())
    }
}

impl<B: Backend, P: Protocol> Port<B, P> {
    /// Create a `Port` from a [`Backend`] type.
    pub(crate) fn from_backend(backend: B) -> Self {
        Port {
            backend,
            poison: None,
            protocol: PhantomData,
        }
    }

    /// Check if the port is poisoned and report the error if it exists.
    fn check_poisoned(&mut self) -> Result<(), io::Error> {
        if let Some(poison) = self.poison.take() {
            Err(poison)
        } else {
            Ok(())
        }
    }

    /// The backend's name for logging.
    fn backend_name(&self) -> String {
        self.backend
            .name()
            .unwrap_or_else(|| UNKNOWN_BACKEND_NAME.to_string())
    }

    /// Send a command. A reply is not read.
    ///
    /// The terminator is appended and the whole line is written at once.
    ///
    /// ## Example
    ///
    /// ```rust
    /// # use skproto::hsc103::Port;
    /// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut port = Port::open_offline();
    /// // Writes `L:E\r\n`
    /// port.send("L:E")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn send(&mut self, command: &str) -> Result<(), Error> {
        self.check_poisoned()?;

        let mut buffer = Vec::with_capacity(command.len() + P::TERMINATOR.len());
        buffer.extend_from_slice(command.as_bytes());
        buffer.extend_from_slice(P::TERMINATOR.as_bytes());
        log::debug!("{} TX:   {}", self.backend_name(), command);
        self.backend.write_all(&buffer)?;
        Ok(())
    }

    /// Receive one reply.
    ///
    /// Bytes are read one at a time until the terminator is seen, which is
    /// then stripped. If the backend reports the end of the stream or times
    /// out first, whatever was read so far is returned, possibly nothing.
    /// Any other read error is returned as is.
    ///
    /// Bytes that are not valid UTF-8 are replaced with
    /// [`U+FFFD`](char::REPLACEMENT_CHARACTER).
    pub fn receive(&mut self) -> Result<String, Error> {
        self.check_poisoned()?;

        let terminator = P::TERMINATOR.as_bytes();
        let mut buf = Vec::with_capacity(32);
        let mut terminated = false;
        for byte in io::Read::bytes(&mut self.backend) {
            match byte {
                Ok(byte) => {
                    buf.push(byte);
                    if buf.ends_with(terminator) {
                        terminated = true;
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }
        if terminated {
            buf.truncate(buf.len() - terminator.len());
        }
        let reply = String::from_utf8_lossy(&buf).into_owned();
        if terminated {
            log::debug!("{} RECV: {}", self.backend_name(), reply);
        } else {
            log::debug!("{} RECV (unterminated): {}", self.backend_name(), reply);
        }
        Ok(reply)
    }

    /// Send a command and receive one reply.
    ///
    /// ## Example
    ///
    /// ```rust
    /// # use skproto::ds102::Port;
    /// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut port = Port::open_offline();
    /// let reply = port.command_reply("AXIs1:POSition?")?;
    /// assert_eq!(reply, "offline");
    /// # Ok(())
    /// # }
    /// ```
    pub fn command_reply(&mut self, command: &str) -> Result<String, Error> {
        self.send(command)?;
        self.receive()
    }

    /// Send a query and decode its reply, substituting `fallback` if the
    /// reply cannot be received or decoded.
    ///
    /// Errors writing the query are returned. Errors reading or decoding the
    /// reply are logged as warnings and replaced by `fallback`, so the caller
    /// always gets a value to continue with.
    ///
    /// ## Example
    ///
    /// ```rust
    /// # use skproto::hsc103::Port;
    /// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
    /// use skproto::reply;
    ///
    /// let mut port = Port::open_offline();
    /// let busy = port.query_or("Q:", vec![-1; 3], reply::integer_list)?;
    /// assert_eq!(busy, vec![-1, -1, -1]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn query_or<T, F>(&mut self, command: &str, fallback: T, decode: F) -> Result<T, Error>
    where
        T: std::fmt::Debug,
        F: FnOnce(&str) -> Result<T, MalformedReplyError>,
    {
        self.send(command)?;
        match self.receive() {
            Ok(text) => Ok(reply::or_fallback(decode(&text), fallback)),
            Err(err) => {
                log::warn!("no reply to `{command}`: {err}; using {fallback:?} instead");
                Ok(fallback)
            }
        }
    }

    /// Set the port timeout and return a "scope guard" that will reset the timeout when it goes out of scope.
    ///
    /// If no timeout is specified, reads can block indefinitely.
    ///
    /// While the guard is in scope, the port can only be accessed through the guard.
    /// However, because the guard implements [`Deref`](std::ops::Deref) and [`DerefMut`](std::ops::DerefMut) callers can treat the guard as the port.
    ///
    /// ## Example
    /// ```rust
    /// # use skproto::{error::Error, hsc103::Port};
    /// # use std::time::Duration;
    /// # fn helper() -> Result<String, Error> {
    /// # let mut port = Port::open_offline();
    /// {
    ///     let mut guard = port.timeout_guard(Some(Duration::from_secs(10)))?;
    ///     // All replies within this scope are waited for up to 10 seconds
    ///     guard.command_reply("?:N")?;
    ///
    /// }  // The guard is dropped and the timeout is reset.
    ///
    /// // This command-reply uses the original timeout
    /// # Ok(
    /// port.command_reply("Q:")?
    /// # )
    /// # }
    /// ```
    pub fn timeout_guard(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<TimeoutGuard<'_, B, P>, io::Error> {
        self.check_poisoned()?;

        TimeoutGuard::new(self, timeout)
    }

    /// Set the read timeout and return the old timeout.
    ///
    /// If timeout is `None`, reads will block indefinitely.
    pub fn set_read_timeout(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<Duration>, io::Error> {
        let old = self.backend.read_timeout()?;
        self.backend.set_read_timeout(timeout)?;
        Ok(old)
    }

    /// Get the read timeout.
    ///
    /// If it is `None`, reads will block indefinitely.
    pub fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
        self.backend.read_timeout()
    }

    /// Get the "name" of the port's backend.
    ///
    /// This is often the path passed to [`Port::open_serial`].
    pub fn name(&self) -> Option<String> {
        self.backend.name()
    }

    /// Get a reference to the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get a mutable reference to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Consume the port and return the underlying backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Poison the port with an error that is reported on its next use.
    pub(crate) fn poison(&mut self, e: io::Error) {
        self.poison = Some(e);
    }
}

#[cfg(all(test, feature = "ds102", feature = "hsc103"))]
mod test {
    use super::*;
    use crate::{ds102::Ds102, hsc103::Hsc103};

    #[test]
    fn send_appends_the_terminator() {
        let mut port = Port::<_, Ds102>::open_mock();
        port.send("AXIs1:GO 5").unwrap();
        assert_eq!(port.backend().written(), b"AXIs1:GO 5\r");

        let mut port = Port::<_, Hsc103>::open_mock();
        port.send("L:E").unwrap();
        assert_eq!(port.backend().written(), b"L:E\r\n");
    }

    #[test]
    fn receive_strips_the_terminator() {
        let mut port = Port::<_, Hsc103>::open_mock();
        port.backend_mut().append_data(b"1,0,-1\r\n0,0,0\r\n");
        assert_eq!(port.receive().unwrap(), "1,0,-1");
        assert_eq!(port.receive().unwrap(), "0,0,0");
    }

    #[test]
    fn receive_stops_at_the_first_terminator_only() {
        // A lone `\r` is not the HSC-103 terminator.
        let mut port = Port::<_, Hsc103>::open_mock();
        port.backend_mut().append_data(b"a\rb\r\nc");
        assert_eq!(port.receive().unwrap(), "a\rb");
        assert_eq!(port.receive().unwrap(), "c");
    }

    #[test]
    fn receive_returns_partial_reply_when_the_stream_closes() {
        let mut port = Port::<_, Ds102>::open_mock();
        port.backend_mut().append_data(b"12.3");
        port.backend_mut().close();
        assert_eq!(port.receive().unwrap(), "12.3");
        // Once closed and empty, replies are empty rather than blocking.
        assert_eq!(port.receive().unwrap(), "");
    }

    #[test]
    fn receive_returns_partial_reply_on_timeout() {
        let mut port = Port::<_, Ds102>::open_mock();
        port.backend_mut().append_data(b"READ");
        assert_eq!(port.receive().unwrap(), "READ");
        assert_eq!(port.receive().unwrap(), "");
    }

    #[test]
    fn receive_reports_other_io_errors() {
        let mut port = Port::<_, Ds102>::open_mock();
        port.backend_mut()
            .read_error(Some(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")));
        let err = port.receive().unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn receive_replaces_invalid_utf8() {
        let mut port = Port::<_, Ds102>::open_mock();
        port.backend_mut().append_data(b"1\xff\r");
        assert_eq!(port.receive().unwrap(), "1\u{FFFD}");
    }

    #[test]
    fn query_or_falls_back() {
        let mut port = Port::<_, Hsc103>::open_mock();
        port.backend_mut().append_data(b"bad\r\n");
        assert_eq!(
            port.query_or("Q:", vec![0; 3], reply::integer_list).unwrap(),
            vec![0, 0, 0]
        );

        // Nothing to read at all
        assert_eq!(
            port.query_or("Q:", vec![-1; 3], reply::integer_list).unwrap(),
            vec![-1, -1, -1]
        );
        assert_eq!(port.backend().written_str(), "Q:\r\nQ:\r\n");
    }

    #[test]
    fn query_or_reports_write_errors() {
        let mut port = Port::<_, Hsc103>::open_mock();
        port.backend_mut()
            .write_error(Some(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")));
        assert!(port.query_or("Q:", vec![0; 3], reply::integer_list).is_err());
    }

    #[test]
    fn borrowed_backend_round_trip() {
        let mut mock = Mock::new();
        mock.append_data(b"1,2,3\r\n");
        {
            let mut port = Port::<_, Hsc103>::from_backend(&mut mock);
            assert_eq!(port.command_reply("Q:").unwrap(), "1,2,3");
            assert!(port.name().unwrap().starts_with("<mock"));
            port.set_read_timeout(None).unwrap();
        }
        assert_eq!(mock.written_str(), "Q:\r\n");
        assert_eq!(mock.read_timeout().unwrap(), None);
    }

    #[test]
    fn boxed_backend_round_trip() {
        let mut mock = Mock::new();
        mock.append_data(b"2\r");
        let mut port = Port::<Box<dyn Backend>, Ds102>::from_backend(Box::new(mock));
        port.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        assert_eq!(port.read_timeout().unwrap(), Some(Duration::from_secs(2)));
        assert_eq!(port.command_reply("AXIs1:LIMIT?").unwrap(), "2");
        // The boxed mock still simulates a timeout once exhausted.
        assert_eq!(port.receive().unwrap(), "");
        assert!(port.name().unwrap().starts_with("<mock"));
    }

    #[test]
    fn offline_round_trip() {
        let mut port = Port::<_, Hsc103>::open_offline();
        assert_eq!(port.command_reply("?:N").unwrap(), Offline::REPLY);
        assert_eq!(port.command_reply("Q:").unwrap(), Offline::REPLY);
    }

    #[test]
    fn timeout_guard_restores_timeout() {
        let mut port = Port::<_, Ds102>::open_mock();
        port.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
        {
            let guard = port.timeout_guard(None).unwrap();
            assert_eq!(guard.read_timeout().unwrap(), None);
        }
        assert_eq!(port.read_timeout().unwrap(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn timeout_guard_poisons_port_when_restore_fails() {
        let mut port = Port::<_, Ds102>::open_mock();
        {
            let mut guard = port.timeout_guard(Some(Duration::from_secs(5))).unwrap();
            guard
                .backend_mut()
                .set_read_timeout_error(Some(io::Error::new(io::ErrorKind::Other, "stuck")));
        }
        assert!(port.send("STOP Emergency").is_err());
        // The poison is only reported once.
        port.send("STOP Emergency").unwrap();
        assert_eq!(port.backend().written_str(), "STOP Emergency\r");
    }
}
