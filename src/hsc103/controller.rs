//! The HSC-103 controller: argument validation, unit conversion and the
//! status dump.

use super::{
    command::{self, Jog, SpeedProfile},
    Hsc103, Port,
};
use crate::{
    backend::{Backend, Serial},
    error::{self, AxisIndexOutOfRangeError, Error, SpeedOutOfRangeError},
    protocol::Protocol as _,
    units::PulseScale,
};

/// The distance one motor pulse moves an axis.
pub const UM_PER_PULSE: f64 = 0.01;

/// The fastest speed the HSC-103 accepts, in pulses per second.
pub const MAX_PULSE_SPEED: u32 = 4_000_000;

/// The longest acceleration time the HSC-103 accepts, in milliseconds.
pub const MAX_RATE: u32 = 1000;

/// The replies to the status queries sent by [`Controller::check_status`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    entries: Vec<(String, String)>,
}

impl StatusReport {
    /// Every `(query, reply)` pair, in the order they were sent.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// The reply to `query`, if it was sent.
    pub fn reply(&self, query: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(sent, _)| sent == query)
            .map(|(_, reply)| reply.as_str())
    }
}

/// An HSC-103 controller.
pub struct Controller<B = Serial> {
    port: Port<B>,
    scale: PulseScale,
    max_pulse_speed: u32,
}

impl<B: Backend> std::fmt::Debug for Controller<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("port", &self.port)
            .field("scale", &self.scale)
            .field("max_pulse_speed", &self.max_pulse_speed)
            .finish()
    }
}

impl<B: Backend> Controller<B> {
    /// Take ownership of `port` without communicating with the controller.
    pub fn new(port: Port<B>) -> Self {
        Controller {
            port,
            scale: PulseScale::new(UM_PER_PULSE),
            max_pulse_speed: MAX_PULSE_SPEED,
        }
    }

    /// Take ownership of `port` and log the controller's status.
    ///
    /// See [`check_status`](Controller::check_status).
    pub fn initialize(port: Port<B>) -> Result<Self, Error> {
        let mut controller = Controller::new(port);
        controller.check_status()?;
        Ok(controller)
    }

    /// Send the handshake and a series of status queries, logging each reply.
    ///
    /// The controller's name, version and parameters are queried, and then
    /// the `D` and `B` status of each axis. Nothing about the controller is
    /// changed. A reply that cannot be read is recorded as empty.
    pub fn check_status(&mut self) -> Result<StatusReport, Error> {
        let mut queries = vec![command::HANDSHAKE.to_string()];
        queries.extend(['N', 'V', 'P'].map(command::status_query));
        for &axis in Hsc103::AXES {
            queries.extend(['D', 'B'].map(|letter| command::axis_status_query(letter, axis)));
        }

        let mut report = StatusReport::default();
        for query in queries {
            let reply = self
                .port
                .query_or(&query, String::new(), |text| Ok(text.to_string()))?;
            log::info!("HSC-103 {query} {reply}");
            report.entries.push((query, reply));
        }
        Ok(report)
    }

    /// The busy state of each axis.
    ///
    /// A missing or malformed reply reads as `[-1, -1, -1]`.
    pub fn is_busy(&mut self) -> Result<[i64; 3], Error> {
        self.port
            .query_or(command::QUERY, [-1; 3], command::decode_query)
    }

    /// The position of each axis, in pulses.
    ///
    /// A missing or malformed reply reads as `[0, 0, 0]`.
    pub fn position(&mut self) -> Result<[i64; 3], Error> {
        self.port
            .query_or(command::QUERY, [0; 3], command::decode_query)
    }

    /// Move every axis to the positions `um`, in micrometers.
    ///
    /// A distance that is not finite is rejected.
    pub fn move_abs(&mut self, um: [f64; 3]) -> Result<(), Error> {
        error::check_finite(&um)?;
        self.port.send(&command::move_abs(self.scale, um))
    }

    /// Move every axis linearly by the distances `um`, in micrometers.
    ///
    /// A distance that is not finite is rejected.
    pub fn move_linear(&mut self, um: [f64; 3]) -> Result<(), Error> {
        error::check_finite(&um)?;
        self.port.send(&command::move_linear(self.scale, um))
    }

    /// Jog every axis in the given directions.
    pub fn jog(&mut self, directions: [Jog; 3]) -> Result<(), Error> {
        self.port.send(&command::jog(directions))
    }

    /// Jog every axis in the directions given as `-1`, `0` or `1`.
    ///
    /// Any other value is rejected and nothing is sent.
    pub fn jog_signs(&mut self, signs: [i32; 3]) -> Result<(), Error> {
        let mut directions = [Jog::Hold; 3];
        for (direction, sign) in directions.iter_mut().zip(signs) {
            match Jog::try_from(sign) {
                Ok(jog) => *direction = jog,
                Err(e) => return error::reject(e),
            }
        }
        self.jog(directions)
    }

    /// Stop every axis immediately.
    pub fn stop_emergency(&mut self) -> Result<(), Error> {
        self.port.send(command::EMERGENCY_STOP)
    }

    /// Set the speed profile of axis `axis_index` (`1..=3`).
    ///
    /// The profile must satisfy `1 <= start <= top <=`
    /// [`max_pulse_speed`](Controller::max_pulse_speed) and
    /// `1 <= rate <=` [`MAX_RATE`], otherwise it is rejected and nothing is
    /// sent.
    pub fn set_speed(&mut self, axis_index: u8, profile: SpeedProfile) -> Result<(), Error> {
        if !(1..=3).contains(&axis_index) {
            return error::reject(AxisIndexOutOfRangeError::new(axis_index));
        }
        let SpeedProfile { start, top, rate } = profile;
        let speeds = 1..=self.max_pulse_speed;
        if !speeds.contains(&start)
            || !speeds.contains(&top)
            || top < start
            || !(1..=MAX_RATE).contains(&rate)
        {
            return error::reject(SpeedOutOfRangeError::new(
                start,
                top,
                rate,
                self.max_pulse_speed,
            ));
        }
        self.port.send(&command::set_speed(axis_index, profile))
    }

    /// Set the same speed profile on every axis, in order.
    pub fn set_speed_all(&mut self, profile: SpeedProfile) -> Result<(), Error> {
        for &axis in Hsc103::AXES {
            self.set_speed(axis.index(), profile)?;
        }
        Ok(())
    }

    /// Set every axis to its fastest speed profile.
    ///
    /// The start speed is a tenth of the top speed and the acceleration time
    /// is the shortest possible.
    pub fn set_speed_max(&mut self) -> Result<(), Error> {
        self.set_speed_all(SpeedProfile {
            start: self.max_pulse_speed / 10,
            top: self.max_pulse_speed,
            rate: 1,
        })
    }

    /// The fastest speed, in micrometers per second.
    pub fn max_speed(&self) -> f64 {
        self.scale.to_micrometers(i64::from(self.max_pulse_speed))
    }

    /// The fastest speed, in pulses per second.
    pub fn max_pulse_speed(&self) -> u32 {
        self.max_pulse_speed
    }

    /// The distance one pulse moves an axis.
    pub fn scale(&self) -> PulseScale {
        self.scale
    }

    /// Get a reference to the port.
    pub fn port(&self) -> &Port<B> {
        &self.port
    }

    /// Get a mutable reference to the port.
    pub fn port_mut(&mut self) -> &mut Port<B> {
        &mut self.port
    }

    /// Consume the controller and return its port.
    pub fn into_port(self) -> Port<B> {
        self.port
    }
}
