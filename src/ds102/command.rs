//! Builders for DS102 command text and decoders for its replies.
//!
//! Builders return the command without its terminator; the
//! [`Port`](super::Port) appends it when sending.

use crate::{
    axis::Axis,
    error::{InvalidAxisError, MalformedReplyError},
    reply,
};

/// The prefix selecting the axis a command applies to.
///
/// Fails with an [`InvalidAxisError`] for [`Axis::Z`], which the DS102 does
/// not have.
pub fn axis_prefix(axis: Axis) -> Result<&'static str, InvalidAxisError> {
    match axis {
        Axis::X => Ok("AXIs1:"),
        Axis::Y => Ok("AXIs2:"),
        Axis::Z => Err(InvalidAxisError::new(axis, "x or y")),
    }
}

/// The direction of a continuous move.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward positive positions.
    Positive = 5,
    /// Toward negative positions.
    Negative = 6,
}

impl Direction {
    /// The direction of a signed velocity.
    ///
    /// Only strictly positive velocities are [`Positive`](Direction::Positive),
    /// so a velocity of zero moves in the [`Negative`](Direction::Negative)
    /// direction.
    pub const fn from_velocity(vel: i32) -> Self {
        if vel > 0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// The code used on the wire.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// How a stop command halts motion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum StopMode {
    /// Stop immediately.
    #[default]
    Emergency,
    /// Decelerate, then stop.
    Reduction,
}

impl std::fmt::Display for StopMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StopMode::Emergency => "Emergency",
            StopMode::Reduction => "Reduction",
        })
    }
}

/// `AXIs{n}:Fspeed0 {vel}`
pub fn set_velocity(axis: Axis, vel: i32) -> Result<String, InvalidAxisError> {
    Ok(format!("{}Fspeed0 {vel}", axis_prefix(axis)?))
}

/// `AXIs{n}:SELectSPeed {table}`
pub fn select_speed(axis: Axis, table: u8) -> Result<String, InvalidAxisError> {
    Ok(format!("{}SELectSPeed {table}", axis_prefix(axis)?))
}

/// `AXIs{n}:GO {5|6}`
pub fn go(axis: Axis, direction: Direction) -> Result<String, InvalidAxisError> {
    Ok(format!("{}GO {}", axis_prefix(axis)?, direction.code()))
}

/// `AXIs{n}:GOABS {mm}`
pub fn go_abs(axis: Axis, mm: f64) -> Result<String, InvalidAxisError> {
    Ok(format!("{}GOABS {mm}", axis_prefix(axis)?))
}

/// `GOLineA X{x} Y{y}`
pub fn go_line(x_mm: f64, y_mm: f64) -> String {
    format!("GOLineA X{x_mm} Y{y_mm}")
}

/// `AXIs{n}:STOP {mode}`
pub fn stop_axis(axis: Axis, mode: StopMode) -> Result<String, InvalidAxisError> {
    Ok(format!("{}STOP {mode}", axis_prefix(axis)?))
}

/// `STOP {mode}`, halting every axis.
pub fn stop(mode: StopMode) -> String {
    format!("STOP {mode}")
}

/// `AXIs{n}:POSition?`
pub fn position_query(axis: Axis) -> Result<String, InvalidAxisError> {
    Ok(format!("{}POSition?", axis_prefix(axis)?))
}

/// `AXIs{n}:POS {mm}`
pub fn set_position(axis: Axis, mm: f64) -> Result<String, InvalidAxisError> {
    Ok(format!("{}POS {mm}", axis_prefix(axis)?))
}

/// `AXIs{n}:LIMIT?`
pub fn limit_query(axis: Axis) -> Result<String, InvalidAxisError> {
    Ok(format!("{}LIMIT?", axis_prefix(axis)?))
}

/// `AXIs{n}:SELectSPeed?`
pub fn selected_speed_query(axis: Axis) -> Result<String, InvalidAxisError> {
    Ok(format!("{}SELectSPeed?", axis_prefix(axis)?))
}

/// `AXIs{n}:READY?`
pub fn ready_query(axis: Axis) -> Result<String, InvalidAxisError> {
    Ok(format!("{}READY?", axis_prefix(axis)?))
}

/// Decode a position reply, in millimeters, to micrometers.
pub fn decode_position(text: &str) -> Result<i64, MalformedReplyError> {
    reply::millimeters(text)
}

/// Decode a limit reply.
///
/// The DS102 reports `0` when no limit is reached and `1`, `2` or `3` for the
/// different limit sensors; any of them is reported as `true`.
pub fn decode_limit(text: &str) -> Result<bool, MalformedReplyError> {
    match reply::integer(text) {
        Ok(value) if value >= 0 => Ok(value > 0),
        _ => Err(MalformedReplyError::new(text, "a limit state of 0 ~ 3")),
    }
}

/// Decode a readiness reply, which is `1` when the axis is ready.
pub fn decode_ready(text: &str) -> bool {
    reply::matches(text, "1")
}

/// Whether a `SELectSPeed?` reply names `table`.
pub fn speed_table_matches(text: &str, table: u8) -> bool {
    reply::matches(text, &table.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn axis_prefix_is_fixed_per_axis() {
        assert_eq!(axis_prefix(Axis::X).unwrap(), "AXIs1:");
        assert_eq!(axis_prefix(Axis::Y).unwrap(), "AXIs2:");
        let err = axis_prefix(Axis::Z).unwrap_err();
        assert_eq!(err.token(), "z");

        for token in ["x", "X", "1", "y", "Y", "2"] {
            let axis: Axis = token.parse().unwrap();
            assert!(axis_prefix(axis).is_ok(), "{token}");
        }
        for token in ["z", "3"] {
            let axis: Axis = token.parse().unwrap();
            assert!(axis_prefix(axis).is_err(), "{token}");
        }
    }

    #[test]
    fn builders() {
        assert_eq!(set_velocity(Axis::X, 300).unwrap(), "AXIs1:Fspeed0 300");
        assert_eq!(select_speed(Axis::Y, 0).unwrap(), "AXIs2:SELectSPeed 0");
        assert_eq!(go(Axis::X, Direction::Positive).unwrap(), "AXIs1:GO 5");
        assert_eq!(go(Axis::Y, Direction::Negative).unwrap(), "AXIs2:GO 6");
        assert_eq!(go_abs(Axis::X, 2.0).unwrap(), "AXIs1:GOABS 2");
        assert_eq!(go_abs(Axis::Y, -1.25).unwrap(), "AXIs2:GOABS -1.25");
        assert_eq!(go_line(1.5, -3.0), "GOLineA X1.5 Y-3");
        assert_eq!(
            stop_axis(Axis::X, StopMode::Emergency).unwrap(),
            "AXIs1:STOP Emergency"
        );
        assert_eq!(stop(StopMode::Emergency), "STOP Emergency");
        assert_eq!(stop(StopMode::Reduction), "STOP Reduction");
        assert_eq!(position_query(Axis::Y).unwrap(), "AXIs2:POSition?");
        assert_eq!(set_position(Axis::X, 0.5).unwrap(), "AXIs1:POS 0.5");
        assert_eq!(limit_query(Axis::X).unwrap(), "AXIs1:LIMIT?");
        assert_eq!(selected_speed_query(Axis::X).unwrap(), "AXIs1:SELectSPeed?");
        assert_eq!(ready_query(Axis::Y).unwrap(), "AXIs2:READY?");
        assert!(ready_query(Axis::Z).is_err());
    }

    #[test]
    fn direction_follows_sign() {
        assert_eq!(Direction::from_velocity(5), Direction::Positive);
        assert_eq!(Direction::from_velocity(-5), Direction::Negative);
        assert_eq!(Direction::from_velocity(0), Direction::Negative);
    }

    #[test]
    fn decoders() {
        assert_eq!(decode_position("12.345").unwrap(), 12345);
        assert!(decode_position("bad").is_err());
        assert!(!decode_limit("0").unwrap());
        for text in ["1", "2", "3"] {
            assert!(decode_limit(text).unwrap());
        }
        assert!(decode_limit("-1").is_err());
        assert!(decode_limit("").is_err());
        assert!(decode_ready("1"));
        assert!(!decode_ready("0"));
        assert!(speed_table_matches("0", 0));
        assert!(!speed_table_matches("3", 0));
    }
}
