use crate::math::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Everything the outside world feeds into a substep. Only written between frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalForces {
    /// Direction of gravity. The solver scales it by `MpmParameters::gravitational_constant`.
    pub gravity: TV,
}

impl ExternalForces {
    pub fn from_direction(direction: Direction) -> Self {
        let gravity = match direction {
            Direction::None => TV::zeros(),
            Direction::Left => TV::new(-1., 0., 0.),
            Direction::Right => TV::new(1., 0., 0.),
            Direction::Up => TV::new(0., 1., 0.),
            Direction::Down => TV::new(0., -1., 0.),
        };
        ExternalForces { gravity }
    }
}

impl Default for ExternalForces {
    fn default() -> Self {
        Self::from_direction(Direction::None)
    }
}

/// Directional input, as given by arrow keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    None,
    Left,
    Right,
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Direction::None),
            "left" | "a" => Ok(Direction::Left),
            "right" | "d" => Ok(Direction::Right),
            "up" | "w" => Ok(Direction::Up),
            "down" | "s" => Ok(Direction::Down),
            other => Err(eyre::eyre!(
                "Unknown gravity direction {:?}, expected one of none, left, right, up, down",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_directions() {
        assert_eq!("Down".parse::<Direction>().unwrap(), Direction::Down);
        assert_eq!("a".parse::<Direction>().unwrap(), Direction::Left);
        assert!("sideways".parse::<Direction>().is_err());

        let forces = ExternalForces::from_direction(Direction::Down);
        assert_eq!(forces.gravity, TV::new(0., -1., 0.));
        assert_eq!(ExternalForces::default().gravity, TV::zeros());
    }
}
