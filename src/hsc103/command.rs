//! Builders for HSC-103 command text and decoders for its replies.
//!
//! Builders return the command without its terminator; the
//! [`Port`](super::Port) appends it when sending.

use crate::{
    axis::Axis,
    error::{JogDirectionError, MalformedReplyError},
    reply,
    units::PulseScale,
};

/// `!:`, the handshake.
pub const HANDSHAKE: &str = "!:";

/// `Q:`, asking for the state of every axis.
///
/// The same query is used for the busy state and for the positions; how the
/// reply is read depends on the caller.
pub const QUERY: &str = "Q:";

/// `L:E`, stopping every axis immediately.
pub const EMERGENCY_STOP: &str = "L:E";

/// `?:{letter}`, a controller status query.
pub fn status_query(letter: char) -> String {
    format!("?:{letter}")
}

/// `?:{letter}{axis}`, a per axis status query.
pub fn axis_status_query(letter: char, axis: Axis) -> String {
    format!("?:{letter}{}", axis.index())
}

/// Convert each distance to pulses and join them with commas.
fn pulses(scale: PulseScale, um: [f64; 3]) -> String {
    um.map(|value| scale.to_pulses(value).to_string()).join(",")
}

/// `A:{p1},{p2},{p3}`, an absolute move to the positions in micrometers.
pub fn move_abs(scale: PulseScale, um: [f64; 3]) -> String {
    format!("A:{}", pulses(scale, um))
}

/// `K:1,2,3,{d1},{d2},{d3}`, a linear move by the distances in micrometers.
pub fn move_linear(scale: PulseScale, um: [f64; 3]) -> String {
    format!("K:1,2,3,{}", pulses(scale, um))
}

/// The direction of a jog on one axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Jog {
    /// Toward negative positions.
    Negative,
    /// Do not move.
    #[default]
    Hold,
    /// Toward positive positions.
    Positive,
}

impl Jog {
    /// The token used on the wire.
    pub const fn token(self) -> &'static str {
        match self {
            Jog::Negative => "-",
            Jog::Hold => "",
            Jog::Positive => "+",
        }
    }
}

impl TryFrom<i32> for Jog {
    type Error = JogDirectionError;

    /// Only `-1`, `0` and `1` are directions.
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Jog::Negative),
            0 => Ok(Jog::Hold),
            1 => Ok(Jog::Positive),
            _ => Err(JogDirectionError::new(value)),
        }
    }
}

/// `J:{t1},{t2},{t3}`, a jog of every axis.
pub fn jog(directions: [Jog; 3]) -> String {
    format!("J:{}", directions.map(Jog::token).join(","))
}

/// The speed profile of one axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SpeedProfile {
    /// The initial speed, in pulses per second.
    pub start: u32,
    /// The top speed, in pulses per second.
    pub top: u32,
    /// The time to accelerate from `start` to `top`, in milliseconds.
    pub rate: u32,
}

/// `D:{axis},{start},{top},{rate}`
pub fn set_speed(axis_index: u8, profile: SpeedProfile) -> String {
    format!(
        "D:{axis_index},{},{},{}",
        profile.start, profile.top, profile.rate
    )
}

/// Decode the reply to [`QUERY`], one integer per axis.
pub fn decode_query(text: &str) -> Result<[i64; 3], MalformedReplyError> {
    reply::integer_list(text)?
        .try_into()
        .map_err(|_| MalformedReplyError::new(text, "three comma separated integers"))
}

#[cfg(test)]
mod test {
    use super::*;

    const SCALE: PulseScale = PulseScale::new(0.01);

    #[test]
    fn status_queries() {
        assert_eq!(status_query('N'), "?:N");
        assert_eq!(axis_status_query('D', Axis::X), "?:D1");
        assert_eq!(axis_status_query('B', Axis::Z), "?:B3");
    }

    #[test]
    fn moves_are_converted_to_pulses() {
        assert_eq!(move_abs(SCALE, [1.0, -0.5, 2.5]), "A:100,-50,250");
        assert_eq!(move_abs(SCALE, [0.0; 3]), "A:0,0,0");
        assert_eq!(move_linear(SCALE, [1.0, 0.0, -1.0]), "K:1,2,3,100,0,-100");
        // Fractions of a pulse are dropped
        assert_eq!(move_abs(SCALE, [0.019, -0.019, 0.001]), "A:1,-1,0");
    }

    #[test]
    fn jog_tokens() {
        assert_eq!(jog([Jog::Positive, Jog::Hold, Jog::Negative]), "J:+,,-");
        assert_eq!(jog([Jog::Hold; 3]), "J:,,");
        assert_eq!(jog([Jog::Negative; 3]), "J:-,-,-");
    }

    #[test]
    fn jog_from_integer() {
        assert_eq!(Jog::try_from(-1).unwrap(), Jog::Negative);
        assert_eq!(Jog::try_from(0).unwrap(), Jog::Hold);
        assert_eq!(Jog::try_from(1).unwrap(), Jog::Positive);
        for value in [-2, 2, i32::MAX] {
            assert_eq!(Jog::try_from(value).unwrap_err().value(), value);
        }
    }

    #[test]
    fn speed_profile() {
        let profile = SpeedProfile {
            start: 100,
            top: 1000,
            rate: 10,
        };
        assert_eq!(set_speed(2, profile), "D:2,100,1000,10");
    }

    #[test]
    fn query_reply() {
        assert_eq!(decode_query("1,0,-1").unwrap(), [1, 0, -1]);
        assert_eq!(decode_query("120, -3 ,0").unwrap(), [120, -3, 0]);
        for text in ["bad", "", "1,0", "1,0,0,0", "1,,0"] {
            assert!(decode_query(text).is_err(), "{text:?}");
        }
    }
}
