//! Axis identities shared by both protocols.

use crate::error::InvalidAxisError;
use std::str::FromStr;

/// The axes accepted when parsing a token.
const ANY_AXIS: &str = "one of x, y, z (or 1 ~ 3)";

/// One linear degree of freedom of a stage.
///
/// The DS102 protocol only has [`X`](Axis::X) and [`Y`](Axis::Y); commands
/// naming [`Z`](Axis::Z) on it fail with an [`InvalidAxisError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// The first axis.
    X,
    /// The second axis.
    Y,
    /// The third axis.
    Z,
}

impl Axis {
    /// Every axis, in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// The 1-based number the controllers use for the axis.
    pub const fn index(self) -> u8 {
        match self {
            Axis::X => 1,
            Axis::Y => 2,
            Axis::Z => 3,
        }
    }

    /// The lowercase letter naming the axis.
    pub const fn letter(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl TryFrom<u8> for Axis {
    type Error = InvalidAxisError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            1 => Ok(Axis::X),
            2 => Ok(Axis::Y),
            3 => Ok(Axis::Z),
            _ => Err(InvalidAxisError::new(index, ANY_AXIS)),
        }
    }
}

impl TryFrom<char> for Axis {
    type Error = InvalidAxisError;

    fn try_from(letter: char) -> Result<Self, Self::Error> {
        match letter.to_ascii_lowercase() {
            'x' | '1' => Ok(Axis::X),
            'y' | '2' => Ok(Axis::Y),
            'z' | '3' => Ok(Axis::Z),
            _ => Err(InvalidAxisError::new(letter, ANY_AXIS)),
        }
    }
}

impl FromStr for Axis {
    type Err = InvalidAxisError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut chars = token.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Axis::try_from(c).map_err(|_| InvalidAxisError::new(token, ANY_AXIS)),
            _ => Err(InvalidAxisError::new(token, ANY_AXIS)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_tokens() {
        assert_eq!("x".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!("Y".parse::<Axis>().unwrap(), Axis::Y);
        assert_eq!(" z ".parse::<Axis>().unwrap(), Axis::Z);
        assert_eq!("2".parse::<Axis>().unwrap(), Axis::Y);
        for token in ["", "w", "xy", "4", "axis1"] {
            let err = token.parse::<Axis>().unwrap_err();
            assert_eq!(err.token(), token);
        }
    }

    #[test]
    fn index_round_trips() {
        for axis in Axis::ALL {
            assert_eq!(Axis::try_from(axis.index()).unwrap(), axis);
            assert_eq!(Axis::try_from(axis.letter()).unwrap(), axis);
        }
        assert!(Axis::try_from(0u8).is_err());
        assert!(Axis::try_from(4u8).is_err());
    }
}
