//! Types for communicating with Sigma Koki DS102 controllers.
//!
//! The DS102 drives two axes, [`X`](Axis::X) and [`Y`](Axis::Y), and every
//! command or reply is a line of ASCII terminated by `\r`. Per axis commands
//! are prefixed with `AXIs1:` or `AXIs2:`.
//!
//! ## Communicating with a Controller
//!
//! Open a [`Port`] and hand it to [`Controller::initialize`], which selects
//! speed table 0 on both axes before returning:
//!
//! ```rust
//! # use skproto::{axis::Axis, ds102::{Controller, Port}, error::Error};
//! # fn wrapper() -> Result<(), Error> {
//! let port = Port::open_serial("/dev/ttyUSB0")?;
//! let mut controller = Controller::initialize(port)?;
//!
//! controller.set_velocity(Axis::X, 5_000)?;
//! controller.move_abs(Axis::X, 12.5)?;
//! let [x, y] = controller.position()?;
//! println!("x = {x} um, y = {y} um");
//! # Ok(())
//! # }
//! ```
//!
//! Without hardware, an offline port lets the same code run as a dry run:
//!
//! ```rust
//! # use skproto::{axis::Axis, ds102::{Controller, Port}, error::Error};
//! # fn wrapper() -> Result<(), Error> {
//! let mut controller = Controller::initialize(Port::open_offline())?;
//! assert_eq!(controller.position()?, [0, 0]);
//! # Ok(())
//! # }
//! # wrapper().unwrap();
//! ```
//!
//! ## Rejected Arguments
//!
//! Arguments outside of the device's limits (such as a velocity above
//! [`MAX_VELOCITY`]) are refused before anything is transmitted. The refusal
//! is logged as a warning and returned as an error for which
//! [`Error::is_rejected`](crate::error::Error::is_rejected) is `true`; the
//! controller can be used again immediately.

pub mod command;
mod controller;

use crate::{axis::Axis, backend::Serial, protocol::Protocol};
pub use controller::*;

/// The DS102 protocol.
///
/// This type only exists to parameterize a [`Port`](crate::port::Port).
#[derive(Debug)]
pub enum Ds102 {}

impl Protocol for Ds102 {
    const NAME: &'static str = "DS102";
    const TERMINATOR: &'static str = "\r";
    const AXES: &'static [Axis] = &[Axis::X, Axis::Y];
    const DEFAULT_BAUD_RATE: u32 = 38_400;
}

/// A port framed for the DS102 protocol.
pub type Port<B = Serial> = crate::port::Port<B, Ds102>;

/// Options for opening a serial port framed for the DS102 protocol.
pub type OpenSerialOptions = crate::port::OpenSerialOptions<Ds102>;
