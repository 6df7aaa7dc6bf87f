//! The per device family framing parameters.

use crate::axis::Axis;

/// A stage controller protocol.
///
/// This trait is sealed and implemented by the marker types of each device
/// family, such as [`Ds102`](crate::ds102::Ds102) and
/// [`Hsc103`](crate::hsc103::Hsc103). It parameterizes a
/// [`Port`](crate::port::Port) with the framing for that family.
pub trait Protocol: private::Sealed + std::fmt::Debug {
    /// A human readable name of the device family.
    const NAME: &'static str;
    /// The line terminator appended to every command and ending every reply.
    const TERMINATOR: &'static str;
    /// The axes the controller drives, in index order.
    const AXES: &'static [Axis];
    /// The baud rate a port is opened with unless configured otherwise.
    const DEFAULT_BAUD_RATE: u32;
}

mod private {
    pub trait Sealed {}

    #[cfg(feature = "ds102")]
    impl Sealed for crate::ds102::Ds102 {}
    #[cfg(feature = "hsc103")]
    impl Sealed for crate::hsc103::Hsc103 {}
}
