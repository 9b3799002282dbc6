use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::TokenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Left,
    Right,
    Backward,
    Stop,
}

impl Direction {
    pub const fn code(self) -> char {
        match self {
            Self::Forward => 'F',
            Self::Left => 'L',
            Self::Right => 'R',
            Self::Backward => 'B',
            Self::Stop => 'S',
        }
    }

    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'F' => Some(Self::Forward),
            'L' => Some(Self::Left),
            'R' => Some(Self::Right),
            'B' => Some(Self::Backward),
            'S' => Some(Self::Stop),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedModifier {
    Faster,
    Slower,
}

impl SpeedModifier {
    pub const fn suffix(self) -> char {
        match self {
            Self::Faster => 'F',
            Self::Slower => 'S',
        }
    }

    pub const fn from_suffix(suffix: char) -> Option<Self> {
        match suffix {
            'F' => Some(Self::Faster),
            'S' => Some(Self::Slower),
            _ => None,
        }
    }
}

/// A motion command as it travels to the robot: a direction code followed by
/// an optional speed suffix (`"F"`, `"FF"`, `"BS"`, `"S"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MotionCommand {
    direction: Direction,
    speed: Option<SpeedModifier>,
}

impl MotionCommand {
    pub const STOP: Self = Self {
        direction: Direction::Stop,
        speed: None,
    };

    pub const fn new(direction: Direction) -> Self {
        Self {
            direction,
            speed: None,
        }
    }

    /// Stop never carries a speed suffix; the modifier is dropped for it.
    pub const fn with_speed(direction: Direction, speed: SpeedModifier) -> Self {
        match direction {
            Direction::Stop => Self::STOP,
            _ => Self {
                direction,
                speed: Some(speed),
            },
        }
    }

    pub const fn direction(self) -> Direction {
        self.direction
    }

    pub const fn is_stop(self) -> bool {
        matches!(self.direction, Direction::Stop)
    }

    pub fn token(self) -> String {
        self.to_string()
    }
}

impl Default for MotionCommand {
    fn default() -> Self {
        Self::STOP
    }
}

impl From<Direction> for MotionCommand {
    fn from(direction: Direction) -> Self {
        Self::new(direction)
    }
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.direction.code())?;
        if let Some(speed) = self.speed {
            write!(f, "{}", speed.suffix())?;
        }
        Ok(())
    }
}

impl FromStr for MotionCommand {
    type Err = TokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut chars = raw.chars();
        let code = chars.next().ok_or(TokenError::Empty)?;
        let direction = Direction::from_code(code).ok_or(TokenError::UnknownDirection(code))?;

        let Some(suffix) = chars.next() else {
            return Ok(Self::new(direction));
        };
        if chars.next().is_some() {
            return Err(TokenError::TooLong(raw.to_string()));
        }
        let speed = SpeedModifier::from_suffix(suffix).ok_or(TokenError::UnknownSpeed(suffix))?;
        if direction == Direction::Stop {
            return Err(TokenError::SpeedOnStop);
        }

        Ok(Self::with_speed(direction, speed))
    }
}

impl TryFrom<String> for MotionCommand {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MotionCommand> for String {
    fn from(value: MotionCommand) -> Self {
        value.token()
    }
}

/// Keys the controller understands, independent of the physical key that
/// produced them. `W` and `Up` both drive forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalKey {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    Faster,
    Slower,
}

impl LogicalKey {
    pub const ALL: [Self; 10] = [
        Self::W,
        Self::A,
        Self::S,
        Self::D,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Faster,
        Self::Slower,
    ];

    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::W | Self::Up => Some(Direction::Forward),
            Self::A | Self::Left => Some(Direction::Left),
            Self::D | Self::Right => Some(Direction::Right),
            Self::S | Self::Down => Some(Direction::Backward),
            Self::Faster | Self::Slower => None,
        }
    }

    pub const fn speed_modifier(self) -> Option<SpeedModifier> {
        match self {
            Self::Faster => Some(SpeedModifier::Faster),
            Self::Slower => Some(SpeedModifier::Slower),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::W => "W",
            Self::A => "A",
            Self::S => "S",
            Self::D => "D",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Faster => "FASTER",
            Self::Slower => "SLOWER",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
