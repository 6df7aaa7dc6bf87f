//! A "scope guard" that will reset a port's timeout when it is goes out of scope.

use crate::{backend::Backend, port::Port, protocol::Protocol};
use std::{io, time::Duration};

/// A "scope guard" that will update the port's timeout and then reset it when
/// it goes out of scope.
///
/// To create a guard, use the port's [`timeout_guard`](crate::port::Port::timeout_guard) method.
///
/// While the guard is in scope, the port can only be accessed through the guard.
/// However, because the guard implements [`Deref`](std::ops::Deref) and
/// [`DerefMut`](std::ops::DerefMut) callers can treat the guard as the port.
///
/// If the original timeout cannot be restored, the port is poisoned and the
/// failure is reported by the next operation on it.
#[derive(Debug)]
pub struct TimeoutGuard<'a, B: Backend, P: Protocol> {
    /// The underlying port.
    port: &'a mut Port<B, P>,
    /// The original timeout that will be restored when the guard is dropped.
    original_timeout: Option<Duration>,
}

impl<'a, B: Backend, P: Protocol> TimeoutGuard<'a, B, P> {
    /// Update the port's timeout and return a [`TimeoutGuard`] wrapping the port.
    pub(crate) fn new(port: &'a mut Port<B, P>, timeout: Option<Duration>) -> Result<Self, io::Error> {
        let original_timeout = port.set_read_timeout(timeout)?;
        Ok(TimeoutGuard {
            port,
            original_timeout,
        })
    }
}

impl<'a, B: Backend, P: Protocol> std::ops::Deref for TimeoutGuard<'a, B, P> {
    type Target = Port<B, P>;
    /// Get a shared reference to the underlying port.
    fn deref(&self) -> &Self::Target {
        self.port
    }
}

impl<'a, B: Backend, P: Protocol> std::ops::DerefMut for TimeoutGuard<'a, B, P> {
    /// Get an exclusive reference to the underlying port.
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.port
    }
}

impl<'a, B: Backend, P: Protocol> std::ops::Drop for TimeoutGuard<'a, B, P> {
    fn drop(&mut self) {
        if let Err(err) = self
            .port
            .backend_mut()
            .set_read_timeout(self.original_timeout)
        {
            let message = if let Some(timeout) = self.original_timeout {
                format!(
                    "failed to reset timeout to {} seconds: {err}",
                    timeout.as_secs_f64(),
                )
            } else {
                format!("failed to reset to an infinite timeout: {err}")
            };
            log::error!("{message}");
            self.port.poison(io::Error::new(io::ErrorKind::Other, message));
        }
    }
}
