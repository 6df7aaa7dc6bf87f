//! Error types.
//!
//! Each error is represented by a unique type that implements [`std::error::Error`].
//! Most APIs return more than one kind of error and so return the crate-wide
//! [`Error`] enum instead. Every concrete error converts into an [`Error`],
//! allowing them to be used with `?`, and can be recovered from one with
//! [`TryFrom`]:
//!
//! ```
//! use skproto::error::{Error, VelocityOutOfRangeError};
//!
//! fn inspect(error: Error) {
//!     match VelocityOutOfRangeError::try_from(error) {
//!         Ok(rejected) => println!("velocity {} was refused", rejected.velocity()),
//!         Err(other) => println!("something else went wrong: {other}"),
//!     }
//! }
//! ```
//!
//! The errors fall into three groups:
//!
//! * **Rejections** ([`Error::is_rejected`]): an argument was outside the
//!   device's limits. Nothing was transmitted and the controller can be used
//!   again immediately.
//! * **Malformed replies** ([`MalformedReplyError`]): a reply could not be
//!   decoded. Controllers never return these; they substitute a documented
//!   fallback value instead. Only the public decode functions return them.
//! * **Caller bugs and I/O**: [`InvalidAxisError`] for an axis the protocol
//!   does not have, and [`std::io::Error`] for a failing byte stream.

/// Implement Error and Display traits for the specified type.
///
/// After the type define the format string and any arguments it should
/// reference after `self =>` (to abide by macro hygiene rules).
macro_rules! impl_error_display {
    (
        $name:path,
        $self:ident =>
        $display:literal
        $(,
            $($arg:expr),+
        )?
    ) => {
        impl std::error::Error for $name {}

        impl std::fmt::Display for $name {
            fn fmt(&$self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    $display
                    $(,
                        $($arg),+
                    )?
                )
            }
        }
    };
}

/// Convert a `serialport::Error` into the variants of the specified error enum.
macro_rules! impl_from_serialport_error {
    ($name:ident) => {
        impl From<serialport::Error> for $name {
            fn from(other: serialport::Error) -> Self {
                use std::io;

                match other.kind() {
                    serialport::ErrorKind::NoDevice => $name::SerialDeviceInUseOrDisconnected(
                        SerialDeviceInUseOrDisconnectedError(other.description.into_boxed_str()),
                    ),
                    serialport::ErrorKind::InvalidInput => $name::Io(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        other.description,
                    )),
                    serialport::ErrorKind::Unknown => {
                        $name::Io(io::Error::new(io::ErrorKind::Other, other.description))
                    }
                    serialport::ErrorKind::Io(kind) => {
                        $name::Io(io::Error::new(kind, other.description))
                    }
                }
            }
        }
    };
}

/// Define error enums that contain concrete error types (not other error enums).
///
/// From and TryFrom traits will be implemented for the enum and it's underlying
/// errors. The enum's Display implementation will defer to the underlying errors'
/// Display implementations.
macro_rules! error_enum {
    (
        $(#[$attr:meta])*
        pub enum $name:ident {
            $(
                $variant:ident($inner:path)
            ),+
            $(,)?
        }
    ) => {
        $(
            #[$attr]
        )*
        #[allow(missing_docs)]
        pub enum $name {
            $(
                $variant($inner)
            ),+
        }

        impl std::error::Error for $name {}

        // Defer the display to the inner error type
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        $name::$variant(e) => e.fmt(f)
                    ),+
                }
            }
        }

        $(
            impl From<$inner> for $name {
                fn from(other: $inner) -> Self {
                    $name::$variant(other)
                }
            }

            impl TryFrom<$name> for $inner {
                type Error = $name;
                fn try_from(other: $name) -> Result<Self, Self::Error> {
                    match other {
                        $name::$variant(value) => Ok(value),
                        value => Err(value)
                    }
                }
            }
        )+
    };
}

/// The specified device is either disconnected or already in use by another process.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SerialDeviceInUseOrDisconnectedError(Box<str>);

impl_error_display! {
    SerialDeviceInUseOrDisconnectedError,
    self =>
    "the specified device is either disconnected or already in use by another process: {}", self.0
}

/// An axis token does not name an axis of the protocol in use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvalidAxisError {
    /// The offending token, as written by the caller.
    token: Box<str>,
    /// The axes that would have been accepted.
    expected: &'static str,
}

impl InvalidAxisError {
    pub(crate) fn new<T: std::fmt::Display>(token: T, expected: &'static str) -> Self {
        InvalidAxisError {
            token: token.to_string().into_boxed_str(),
            expected,
        }
    }

    /// The token that was not recognised as an axis.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl_error_display! {
    InvalidAxisError,
    self => "invalid axis `{}`: axis must be {}", self.token, self.expected
}

/// A DS102 velocity outside of `1..=25000`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VelocityOutOfRangeError(i32);

impl VelocityOutOfRangeError {
    pub(crate) const fn new(velocity: i32) -> Self {
        VelocityOutOfRangeError(velocity)
    }

    /// The refused velocity.
    pub fn velocity(&self) -> i32 {
        self.0
    }
}

impl_error_display! {
    VelocityOutOfRangeError,
    self => "invalid velocity: {}. It must be 1~25000", self.0
}

/// A DS102 speed table selector outside of `0..=9`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SpeedTableOutOfRangeError(u8);

impl SpeedTableOutOfRangeError {
    pub(crate) const fn new(table: u8) -> Self {
        SpeedTableOutOfRangeError(table)
    }

    /// The refused speed table.
    pub fn table(&self) -> u8 {
        self.0
    }
}

impl_error_display! {
    SpeedTableOutOfRangeError,
    self => "invalid speed table: {}. It must be 0~9", self.0
}

/// An HSC-103 axis number outside of `1..=3`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AxisIndexOutOfRangeError(u8);

impl AxisIndexOutOfRangeError {
    pub(crate) const fn new(index: u8) -> Self {
        AxisIndexOutOfRangeError(index)
    }

    /// The refused axis number.
    pub fn index(&self) -> u8 {
        self.0
    }
}

impl_error_display! {
    AxisIndexOutOfRangeError,
    self => "axis number must be 1 ~ 3, got {}", self.0
}

/// An HSC-103 speed profile violating `1 <= start <= top <= max` or `1 <= rate <= 1000`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SpeedOutOfRangeError {
    start: u32,
    top: u32,
    rate: u32,
    max: u32,
}

impl SpeedOutOfRangeError {
    pub(crate) const fn new(start: u32, top: u32, rate: u32, max: u32) -> Self {
        SpeedOutOfRangeError {
            start,
            top,
            rate,
            max,
        }
    }

    /// The refused start speed, in pulses per second.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// The refused top speed, in pulses per second.
    pub fn top(&self) -> u32 {
        self.top
    }

    /// The refused acceleration time, in milliseconds.
    pub fn rate(&self) -> u32 {
        self.rate
    }
}

impl_error_display! {
    SpeedOutOfRangeError,
    self => "speed value out of range (start {}, top {}, rate {}): 1<=start<=top<={}, 1<=rate<=1000",
    self.start, self.top, self.rate, self.max
}

/// A jog direction other than `-1`, `0` or `1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct JogDirectionError(i32);

impl JogDirectionError {
    pub(crate) const fn new(value: i32) -> Self {
        JogDirectionError(value)
    }

    /// The refused direction value.
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl_error_display! {
    JogDirectionError,
    self => "jog value must be -1 ~ 1, got {}", self.0
}

/// A distance that is NaN or infinite.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NonFiniteDistanceError(f64);

impl NonFiniteDistanceError {
    pub(crate) const fn new(distance: f64) -> Self {
        NonFiniteDistanceError(distance)
    }

    /// The refused distance.
    pub fn distance(&self) -> f64 {
        self.0
    }
}

impl_error_display! {
    NonFiniteDistanceError,
    self => "invalid distance: {}. It must be finite", self.0
}

/// Reject any distance in `distances` that is not finite.
pub(crate) fn check_finite(distances: &[f64]) -> Result<(), Error> {
    match distances.iter().find(|distance| !distance.is_finite()) {
        Some(&distance) => reject(NonFiniteDistanceError::new(distance)),
        None => Ok(()),
    }
}

/// A reply could not be decoded into the expected kind of value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MalformedReplyError {
    /// The reply text, terminator stripped.
    reply: Box<str>,
    /// A description of what the reply should have contained.
    expected: &'static str,
}

impl MalformedReplyError {
    pub(crate) fn new(reply: &str, expected: &'static str) -> Self {
        MalformedReplyError {
            reply: Box::from(reply),
            expected,
        }
    }

    /// The reply that could not be decoded.
    pub fn reply(&self) -> &str {
        &self.reply
    }
}

impl_error_display! {
    MalformedReplyError,
    self => "malformed reply {:?}: expected {}", self.reply, self.expected
}

error_enum! {
    /// Any error returned by this crate.
    #[derive(Debug)]
    #[non_exhaustive]
    pub enum Error {
        SerialDeviceInUseOrDisconnected(SerialDeviceInUseOrDisconnectedError),
        Io(std::io::Error),
        InvalidAxis(InvalidAxisError),
        VelocityOutOfRange(VelocityOutOfRangeError),
        SpeedTableOutOfRange(SpeedTableOutOfRangeError),
        AxisIndexOutOfRange(AxisIndexOutOfRangeError),
        SpeedOutOfRange(SpeedOutOfRangeError),
        JogDirection(JogDirectionError),
        NonFiniteDistance(NonFiniteDistanceError),
        MalformedReply(MalformedReplyError),
    }
}
impl_from_serialport_error! { Error }

impl Error {
    /// A convenience function for determining if the error is due to the
    /// port timing out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::TimedOut)
    }

    /// Whether the error is an argument rejected before anything was
    /// transmitted.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            Error::VelocityOutOfRange(_)
                | Error::SpeedTableOutOfRange(_)
                | Error::AxisIndexOutOfRange(_)
                | Error::SpeedOutOfRange(_)
                | Error::JogDirection(_)
                | Error::NonFiniteDistance(_)
        )
    }
}

/// Log the diagnostic for a rejected argument and return it as an error.
pub(crate) fn reject<T, E>(rejection: E) -> Result<T, Error>
where
    E: Into<Error> + std::fmt::Display,
{
    log::warn!("{rejection}");
    Err(rejection.into())
}
