//! A library for communicating with Sigma Koki stage controllers over a
//! serial line.
//!
//! Two device families are supported, each in its own module:
//!
//! * [`ds102`]: the two axis DS102, whose commands are terminated by `\r`.
//! * [`hsc103`]: the three axis HSC-103, whose commands are terminated by
//!   `\r\n` and whose distances are given in 0.01 um pulses.
//!
//! Each family has a [`Port`](port::Port), which frames lines of text on a
//! [`Backend`](backend::Backend), and a `Controller`, which validates
//! arguments, builds commands and decodes replies. The [`stage`] module
//! offers a view common to both.
//!
//! ```rust
//! # use skproto::{axis::Axis, error::Error, ds102};
//! # fn wrapper() -> Result<(), Error> {
//! let port = ds102::Port::open_serial("/dev/ttyUSB0")?;
//! let mut controller = ds102::Controller::initialize(port)?;
//! controller.move_velocity(Axis::X, -1_000)?;
//! controller.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! Every call is synchronous and performs at most one command and one reply.
//! Replies that are malformed or missing are replaced by documented fallback
//! values instead of failing, and arguments outside the devices' limits are
//! refused before anything is sent (see [`error`]).
//!
//! Nothing is printed; diagnostics are emitted through the [`log`] crate.

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(all(doc, feature = "doc_cfg"), feature(doc_cfg))]

pub mod axis;
pub mod backend;
#[cfg(feature = "ds102")]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "ds102")))]
pub mod ds102;
pub mod error;
#[cfg(feature = "hsc103")]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "hsc103")))]
pub mod hsc103;
pub mod port;
pub mod protocol;
pub mod reply;
pub mod stage;
pub mod timeout_guard;
pub mod units;

#[cfg(not(any(feature = "ds102", feature = "hsc103")))]
compile_error!("At least one of the `ds102` or `hsc103` features must be specified");
