//! Types for communicating with Sigma Koki HSC-103 controllers.
//!
//! The HSC-103 drives three axes and every command or reply is a line of
//! ASCII terminated by `\r\n`. Commands start with a verb such as `A:` and
//! carry comma separated values. Distances are given to the controller in
//! motor pulses of 0.01 um each; the [`Controller`] takes micrometers and
//! converts them.
//!
//! ## Communicating with a Controller
//!
//! ```rust
//! # use skproto::{error::Error, hsc103::{Controller, Jog, Port, SpeedProfile}};
//! # fn wrapper() -> Result<(), Error> {
//! let port = Port::open_serial("/dev/ttyUSB0")?;
//! // Logs a dump of the controller's status
//! let mut controller = Controller::initialize(port)?;
//!
//! controller.set_speed_all(SpeedProfile { start: 1_000, top: 100_000, rate: 100 })?;
//! controller.move_abs([100.0, 0.0, -25.5])?;
//! while controller.is_busy()?.contains(&1) {}
//! controller.jog([Jog::Positive, Jog::Hold, Jog::Hold])?;
//! controller.stop_emergency()?;
//! # Ok(())
//! # }
//! ```
//!
//! Replies that cannot be decoded are replaced by documented fallbacks, so
//! with no hardware attached the same code runs as a dry run:
//!
//! ```rust
//! # use skproto::{error::Error, hsc103::{Controller, Port}};
//! # fn wrapper() -> Result<(), Error> {
//! let mut controller = Controller::new(Port::open_offline());
//! assert_eq!(controller.is_busy()?, [-1, -1, -1]);
//! assert_eq!(controller.position()?, [0, 0, 0]);
//! # Ok(())
//! # }
//! # wrapper().unwrap();
//! ```

pub mod command;
mod controller;

use crate::{axis::Axis, backend::Serial, protocol::Protocol};
pub use command::{Jog, SpeedProfile};
pub use controller::*;

/// The HSC-103 protocol.
///
/// This type only exists to parameterize a [`Port`](crate::port::Port).
#[derive(Debug)]
pub enum Hsc103 {}

impl Protocol for Hsc103 {
    const NAME: &'static str = "HSC-103";
    const TERMINATOR: &'static str = "\r\n";
    const AXES: &'static [Axis] = &[Axis::X, Axis::Y, Axis::Z];
    const DEFAULT_BAUD_RATE: u32 = 38_400;
}

/// A port framed for the HSC-103 protocol.
pub type Port<B = Serial> = crate::port::Port<B, Hsc103>;

/// Options for opening a serial port framed for the HSC-103 protocol.
pub type OpenSerialOptions = crate::port::OpenSerialOptions<Hsc103>;
