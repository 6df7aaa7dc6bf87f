//! The DS102 controller: argument validation, startup normalization and
//! the per axis request/reply sequences.

use super::{
    command::{self, Direction, StopMode},
    Ds102, Port,
};
use crate::{
    axis::Axis,
    backend::{Backend, Serial},
    error::{self, Error, SpeedTableOutOfRangeError, VelocityOutOfRangeError},
    protocol::Protocol as _,
};

/// The fastest velocity the DS102 accepts.
pub const MAX_VELOCITY: i32 = 25_000;

/// The highest speed table selector.
pub const MAX_SPEED_TABLE: u8 = 9;

/// The speed table selected on every axis by [`Controller::initialize`].
pub const STARTUP_SPEED_TABLE: u8 = 0;

/// What [`Controller::initialize`] observed and changed on one axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AxisStartup {
    /// The axis.
    pub axis: Axis,
    /// Whether the axis reported it was ready.
    pub ready: bool,
    /// Whether a speed table other than [`STARTUP_SPEED_TABLE`] was selected
    /// and had to be changed.
    pub speed_table_corrected: bool,
}

/// The outcome of the one-time startup normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Startup {
    axes: [AxisStartup; 2],
}

impl Startup {
    /// The startup outcome of each axis, in index order.
    pub fn axes(&self) -> &[AxisStartup] {
        &self.axes
    }

    /// The startup outcome of `axis`, if the DS102 has it.
    pub fn axis(&self, axis: Axis) -> Option<&AxisStartup> {
        self.axes.iter().find(|startup| startup.axis == axis)
    }

    /// Whether every axis reported it was ready.
    pub fn all_ready(&self) -> bool {
        self.axes.iter().all(|startup| startup.ready)
    }
}

/// A DS102 controller.
///
/// The only way to get one is [`Controller::initialize`], so the startup
/// normalization has always run before any other method is used.
pub struct Controller<B = Serial> {
    port: Port<B>,
    startup: Startup,
}

impl<B: Backend> std::fmt::Debug for Controller<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("port", &self.port)
            .field("startup", &self.startup)
            .finish()
    }
}

impl<B: Backend> Controller<B> {
    /// Take ownership of `port` and normalize the controller.
    ///
    /// For each axis in turn, readiness is queried and logged, then speed
    /// table [`STARTUP_SPEED_TABLE`] is selected unless it already is. What
    /// was found is available afterwards from [`startup`](Controller::startup).
    pub fn initialize(port: Port<B>) -> Result<Self, Error> {
        let mut controller = Controller {
            port,
            startup: Startup {
                axes: [Axis::X, Axis::Y].map(|axis| AxisStartup {
                    axis,
                    ready: false,
                    speed_table_corrected: false,
                }),
            },
        };
        let x = controller.normalize_axis(Axis::X)?;
        let y = controller.normalize_axis(Axis::Y)?;
        controller.startup = Startup { axes: [x, y] };
        Ok(controller)
    }

    /// Log the readiness of `axis` and select the startup speed table on it.
    fn normalize_axis(&mut self, axis: Axis) -> Result<AxisStartup, Error> {
        let ready = self.is_ready(axis)?;
        log::info!("DS102 axis {axis} ready: {ready}");
        let speed_table_corrected = if self.speed_table_is(axis, STARTUP_SPEED_TABLE)? {
            false
        } else {
            log::info!("DS102 axis {axis}: selecting speed table {STARTUP_SPEED_TABLE}");
            self.select_speed_table(axis, STARTUP_SPEED_TABLE)?;
            true
        };
        Ok(AxisStartup {
            axis,
            ready,
            speed_table_corrected,
        })
    }

    /// What the startup normalization observed.
    pub fn startup(&self) -> &Startup {
        &self.startup
    }

    /// Whether `axis` reports it is ready.
    ///
    /// A missing or unexpected reply is reported as not ready.
    pub fn is_ready(&mut self, axis: Axis) -> Result<bool, Error> {
        let query = command::ready_query(axis)?;
        self.port
            .query_or(&query, false, |text| Ok(command::decode_ready(text)))
    }

    /// Set the velocity of `axis`.
    ///
    /// `vel` must be in `1..=`[`MAX_VELOCITY`], otherwise it is rejected and
    /// nothing is sent.
    pub fn set_velocity(&mut self, axis: Axis, vel: i32) -> Result<(), Error> {
        if !(1..=MAX_VELOCITY).contains(&vel) {
            return error::reject(VelocityOutOfRangeError::new(vel));
        }
        self.port.send(&command::set_velocity(axis, vel)?)
    }

    /// Set the velocity of every axis, X first.
    pub fn set_velocity_all(&mut self, vel: i32) -> Result<(), Error> {
        for &axis in Ds102::AXES {
            self.set_velocity(axis, vel)?;
        }
        Ok(())
    }

    /// Set every axis to [`MAX_VELOCITY`].
    pub fn set_velocity_max_all(&mut self) -> Result<(), Error> {
        self.set_velocity_all(MAX_VELOCITY)
    }

    /// Select the speed table used by `axis`.
    ///
    /// `table` must be in `0..=`[`MAX_SPEED_TABLE`], otherwise it is rejected.
    pub fn select_speed_table(&mut self, axis: Axis, table: u8) -> Result<(), Error> {
        if table > MAX_SPEED_TABLE {
            return error::reject(SpeedTableOutOfRangeError::new(table));
        }
        self.port.send(&command::select_speed(axis, table)?)
    }

    /// Whether `axis` has speed table `table` selected.
    ///
    /// When it does not, the selection it reported is logged.
    pub fn speed_table_is(&mut self, axis: Axis, table: u8) -> Result<bool, Error> {
        if table > MAX_SPEED_TABLE {
            return error::reject(SpeedTableOutOfRangeError::new(table));
        }
        let query = command::selected_speed_query(axis)?;
        let selected = self
            .port
            .query_or(&query, String::new(), |text| Ok(text.trim().to_string()))?;
        let matched = command::speed_table_matches(&selected, table);
        if !matched {
            log::info!("DS102 axis {axis}: speed table {selected:?} is selected, not {table}");
        }
        Ok(matched)
    }

    /// Start a continuous move of `axis`.
    ///
    /// The velocity is set to the magnitude of `vel` and the sign selects the
    /// direction: only positive values move in the positive direction. The move
    /// is started even when the magnitude is rejected (for example, when `vel`
    /// is zero), in which case the axis keeps its previous velocity.
    pub fn move_velocity(&mut self, axis: Axis, vel: i32) -> Result<(), Error> {
        match self.set_velocity(axis, vel.saturating_abs()) {
            Err(e) if e.is_rejected() => {}
            other => other?,
        }
        self.port
            .send(&command::go(axis, Direction::from_velocity(vel))?)
    }

    /// Move `axis` to `mm` millimeters.
    ///
    /// A distance that is not finite is rejected.
    pub fn move_abs(&mut self, axis: Axis, mm: f64) -> Result<(), Error> {
        error::check_finite(&[mm])?;
        self.port.send(&command::go_abs(axis, mm)?)
    }

    /// Move both axes in a straight line to (`x_mm`, `y_mm`) millimeters.
    pub fn move_line(&mut self, x_mm: f64, y_mm: f64) -> Result<(), Error> {
        error::check_finite(&[x_mm, y_mm])?;
        self.port.send(&command::go_line(x_mm, y_mm))
    }

    /// Stop `axis` immediately.
    pub fn stop_axis(&mut self, axis: Axis) -> Result<(), Error> {
        self.stop_axis_with(axis, StopMode::Emergency)
    }

    /// Stop `axis` using `mode`.
    pub fn stop_axis_with(&mut self, axis: Axis, mode: StopMode) -> Result<(), Error> {
        self.port.send(&command::stop_axis(axis, mode)?)
    }

    /// Stop every axis immediately.
    pub fn stop(&mut self) -> Result<(), Error> {
        self.stop_with(StopMode::Emergency)
    }

    /// Stop every axis using `mode`.
    pub fn stop_with(&mut self, mode: StopMode) -> Result<(), Error> {
        self.port.send(&command::stop(mode))
    }

    /// The position of each axis, in micrometers.
    ///
    /// An axis whose reply is missing or malformed reads as `0`. The other
    /// axis is unaffected.
    pub fn position(&mut self) -> Result<[i64; 2], Error> {
        let mut positions = [0; 2];
        for (position, &axis) in positions.iter_mut().zip(Ds102::AXES) {
            let query = command::position_query(axis)?;
            *position = self.port.query_or(&query, 0, command::decode_position)?;
        }
        Ok(positions)
    }

    /// Redefine the current position of `axis` as `mm` millimeters.
    pub fn set_position(&mut self, axis: Axis, mm: f64) -> Result<(), Error> {
        error::check_finite(&[mm])?;
        self.port.send(&command::set_position(axis, mm)?)
    }

    /// Whether `axis` has reached a limit.
    ///
    /// A missing or malformed reply reads as no limit.
    pub fn check_limit(&mut self, axis: Axis) -> Result<bool, Error> {
        let query = command::limit_query(axis)?;
        self.port.query_or(&query, false, command::decode_limit)
    }

    /// Whether each axis has reached a limit.
    ///
    /// Every axis is queried, regardless of the earlier ones' state.
    pub fn check_limit_all(&mut self) -> Result<[bool; 2], Error> {
        let mut limits = [false; 2];
        for (limit, &axis) in limits.iter_mut().zip(Ds102::AXES) {
            *limit = self.check_limit(axis)?;
        }
        Ok(limits)
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::backend::Mock;

    /// A controller whose startup found both axes ready on table 0.
    fn controller() -> Controller<Mock> {
        let mut port = Port::<Mock>::open_mock();
        port.backend_mut().append_data(b"1\r0\r1\r0\r");
        let mut controller = Controller::initialize(port).unwrap();
        controller.port_mut().backend_mut().clear_written();
        controller
    }

    fn written(controller: &Controller<Mock>) -> String {
        controller.port().backend().written_str()
    }

    #[test]
    fn initialize_keeps_selected_table() {
        let controller = controller();
        let startup = controller.startup();
        assert!(startup.all_ready());
        assert!(startup.axes().iter().all(|a| !a.speed_table_corrected));
        assert_eq!(written(&controller), "");
    }

    #[test]
    fn initialize_corrects_table() {
        let mut port = Port::<Mock>::open_mock();
        port.backend_mut().append_data(b"1\r3\r0\r0\r");
        let controller = Controller::initialize(port).unwrap();
        assert_eq!(
            written(&controller),
            "AXIs1:READY?\rAXIs1:SELectSPeed?\rAXIs1:SELectSPeed 0\r\
             AXIs2:READY?\rAXIs2:SELectSPeed?\r"
        );
        let startup = controller.startup();
        assert_eq!(
            startup.axis(Axis::X),
            Some(&AxisStartup {
                axis: Axis::X,
                ready: true,
                speed_table_corrected: true
            })
        );
        assert_eq!(
            startup.axis(Axis::Y),
            Some(&AxisStartup {
                axis: Axis::Y,
                ready: false,
                speed_table_corrected: false
            })
        );
        assert_eq!(startup.axis(Axis::Z), None);
        assert!(!startup.all_ready());
    }

    #[test]
    fn initialize_without_replies_still_normalizes() {
        let controller = Controller::initialize(Port::<Mock>::open_mock()).unwrap();
        assert!(!controller.startup().all_ready());
        assert!(written(&controller).contains("AXIs1:SELectSPeed 0\r"));
        assert!(written(&controller).contains("AXIs2:SELectSPeed 0\r"));
    }

    #[test]
    fn initialize_offline() {
        let controller = Controller::initialize(Port::open_offline()).unwrap();
        assert!(controller
            .startup()
            .axes()
            .iter()
            .all(|a| !a.ready && a.speed_table_corrected));
    }

    #[test]
    fn set_velocity_rejects_out_of_range() {
        let mut controller = controller();
        for vel in [i32::MIN, -1, 0, MAX_VELOCITY + 1, i32::MAX] {
            let err = controller.set_velocity(Axis::X, vel).unwrap_err();
            assert!(err.is_rejected(), "{vel}");
            assert_eq!(
                VelocityOutOfRangeError::try_from(err).unwrap().velocity(),
                vel
            );
        }
        assert_eq!(written(&controller), "");
    }

    #[test]
    fn set_velocity_sends_one_command() {
        let mut controller = controller();
        controller.set_velocity(Axis::X, 1).unwrap();
        assert_eq!(written(&controller), "AXIs1:Fspeed0 1\r");
        controller.port_mut().backend_mut().clear_written();
        controller.set_velocity(Axis::Y, MAX_VELOCITY).unwrap();
        assert_eq!(written(&controller), "AXIs2:Fspeed0 25000\r");
    }

    #[test]
    fn set_velocity_on_missing_axis_is_a_hard_error() {
        let mut controller = controller();
        let err = controller.set_velocity(Axis::Z, 100).unwrap_err();
        assert!(matches!(err, Error::InvalidAxis(_)));
        assert!(!err.is_rejected());
        // Out of range velocities are rejected before the axis is looked at.
        assert!(controller.set_velocity(Axis::Z, 0).unwrap_err().is_rejected());
        assert_eq!(written(&controller), "");
    }

    #[test]
    fn set_velocity_all_and_max() {
        let mut controller = controller();
        controller.set_velocity_max_all().unwrap();
        assert_eq!(
            written(&controller),
            "AXIs1:Fspeed0 25000\rAXIs2:Fspeed0 25000\r"
        );
        controller.port_mut().backend_mut().clear_written();
        assert!(controller.set_velocity_all(0).unwrap_err().is_rejected());
        assert_eq!(written(&controller), "");
    }

    #[test]
    fn move_velocity_direction_follows_sign() {
        let mut controller = controller();
        controller.move_velocity(Axis::X, 5).unwrap();
        controller.move_velocity(Axis::X, -5).unwrap();
        assert_eq!(
            written(&controller),
            "AXIs1:Fspeed0 5\rAXIs1:GO 5\rAXIs1:Fspeed0 5\rAXIs1:GO 6\r"
        );
    }

    #[test]
    fn move_velocity_zero_moves_negative() {
        let mut controller = controller();
        controller.move_velocity(Axis::Y, 0).unwrap();
        assert_eq!(written(&controller), "AXIs2:GO 6\r");
    }

    #[test]
    fn move_velocity_on_missing_axis() {
        let mut controller = controller();
        assert!(matches!(
            controller.move_velocity(Axis::Z, 5),
            Err(Error::InvalidAxis(_))
        ));
        assert_eq!(written(&controller), "");
    }

    #[test]
    fn moves_and_stops() {
        let mut controller = controller();
        controller.move_abs(Axis::X, 2.0).unwrap();
        controller.move_line(1.5, -2.25).unwrap();
        controller.set_position(Axis::Y, 0.0).unwrap();
        controller.stop_axis(Axis::Y).unwrap();
        controller.stop_axis_with(Axis::X, StopMode::Reduction).unwrap();
        controller.stop().unwrap();
        controller.stop_with(StopMode::Reduction).unwrap();
        assert_eq!(
            written(&controller),
            "AXIs1:GOABS 2\rGOLineA X1.5 Y-2.25\rAXIs2:POS 0\r\
             AXIs2:STOP Emergency\rAXIs1:STOP Reduction\r\
             STOP Emergency\rSTOP Reduction\r"
        );
    }

    #[test]
    fn non_finite_distances_are_not_sent() {
        let mut controller = controller();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(controller.move_abs(Axis::X, bad).unwrap_err().is_rejected());
            assert!(controller.move_line(0.0, bad).unwrap_err().is_rejected());
            assert!(controller.move_line(bad, 0.0).unwrap_err().is_rejected());
            assert!(controller.set_position(Axis::Y, bad).unwrap_err().is_rejected());
        }
        assert_eq!(written(&controller), "");
    }

    #[test]
    fn position_falls_back_per_axis() {
        let mut controller = controller();
        controller
            .port_mut()
            .backend_mut()
            .append_data(b"bad\r12.345\r");
        assert_eq!(controller.position().unwrap(), [0, 12345]);
        assert_eq!(written(&controller), "AXIs1:POSition?\rAXIs2:POSition?\r");

        // No reply at all
        assert_eq!(controller.position().unwrap(), [0, 0]);
    }

    #[test]
    fn position_keeps_every_reported_micrometer() {
        let mut controller = controller();
        controller
            .port_mut()
            .backend_mut()
            .append_data(b"65.526\r-65.526\r");
        assert_eq!(controller.position().unwrap(), [65526, -65526]);
    }

    #[test]
    fn check_limit_all_queries_every_axis() {
        let mut controller = controller();
        controller.port_mut().backend_mut().append_data(b"2\r0\r");
        assert_eq!(controller.check_limit_all().unwrap(), [true, false]);
        controller.port_mut().backend_mut().append_data(b"bad\r1\r");
        assert_eq!(controller.check_limit_all().unwrap(), [false, true]);
        assert_eq!(
            written(&controller),
            "AXIs1:LIMIT?\rAXIs2:LIMIT?\rAXIs1:LIMIT?\rAXIs2:LIMIT?\r"
        );
    }

    #[test]
    fn speed_table() {
        let mut controller = controller();
        assert!(controller
            .select_speed_table(Axis::X, MAX_SPEED_TABLE + 1)
            .unwrap_err()
            .is_rejected());
        assert!(controller.speed_table_is(Axis::X, 10).unwrap_err().is_rejected());
        assert_eq!(written(&controller), "");

        controller.select_speed_table(Axis::Y, 9).unwrap();
        controller.port_mut().backend_mut().append_data(b"9\r4\r");
        assert!(controller.speed_table_is(Axis::Y, 9).unwrap());
        assert!(!controller.speed_table_is(Axis::X, 9).unwrap());
        assert_eq!(
            written(&controller),
            "AXIs2:SELectSPeed 9\rAXIs2:SELectSPeed?\rAXIs1:SELectSPeed?\r"
        );
    }

    #[test]
    fn is_ready() {
        let mut controller = controller();
        controller.port_mut().backend_mut().append_data(b"1\r0\r");
        assert!(controller.is_ready(Axis::X).unwrap());
        assert!(!controller.is_ready(Axis::Y).unwrap());
        assert!(!controller.is_ready(Axis::X).unwrap());
    }
}
