use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use shared::domain::{Direction, LogicalKey, MotionCommand, SpeedModifier};
use thiserror::Error;

/// Single-key precedence: backward, then right, then left, then forward.
const PRIORITY: [Direction; 4] = [
    Direction::Backward,
    Direction::Right,
    Direction::Left,
    Direction::Forward,
];

/// `(active direction, other held direction) -> command` for two held keys.
const TURN_TABLE: [(Direction, Direction, Direction); 8] = [
    (Direction::Backward, Direction::Right, Direction::Right),
    (Direction::Backward, Direction::Left, Direction::Left),
    (Direction::Right, Direction::Forward, Direction::Forward),
    (Direction::Right, Direction::Backward, Direction::Backward),
    (Direction::Left, Direction::Forward, Direction::Forward),
    (Direction::Left, Direction::Backward, Direction::Backward),
    (Direction::Forward, Direction::Right, Direction::Right),
    (Direction::Forward, Direction::Left, Direction::Left),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolverMode {
    Priority,
    #[default]
    TurnContinuation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resolver mode '{0}' (expected 'priority' or 'turn-continuation')")]
pub struct UnknownResolverMode(pub String);

impl FromStr for ResolverMode {
    type Err = UnknownResolverMode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "priority" => Ok(Self::Priority),
            "turn-continuation" | "turn" => Ok(Self::TurnContinuation),
            _ => Err(UnknownResolverMode(raw.to_string())),
        }
    }
}

impl fmt::Display for ResolverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Priority => "priority",
            Self::TurnContinuation => "turn-continuation",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldKeys {
    keys: BTreeSet<LogicalKey>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the key was already held (auto-repeat).
    pub fn press(&mut self, key: LogicalKey) -> bool {
        self.keys.insert(key)
    }

    /// Returns `false` when the key was not held.
    pub fn release(&mut self, key: LogicalKey) -> bool {
        self.keys.remove(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Distinct directions held; aliases such as `W` and `Up` collapse.
    pub fn directions(&self) -> BTreeSet<Direction> {
        self.keys.iter().filter_map(|key| key.direction()).collect()
    }

    pub fn holds_direction(&self, direction: Direction) -> bool {
        self.keys.iter().any(|key| key.direction() == Some(direction))
    }

    pub fn holds_modifier(&self, modifier: SpeedModifier) -> bool {
        self.keys
            .iter()
            .any(|key| key.speed_modifier() == Some(modifier))
    }
}

impl FromIterator<LogicalKey> for HeldKeys {
    fn from_iter<I: IntoIterator<Item = LogicalKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for HeldKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.keys.iter().map(|key| key.name()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

pub fn resolve_priority(held: &HeldKeys) -> Direction {
    PRIORITY
        .into_iter()
        .find(|direction| held.holds_direction(*direction))
        .unwrap_or(Direction::Stop)
}

pub fn resolve_direction(
    held: &HeldKeys,
    last_sent: Option<MotionCommand>,
    mode: ResolverMode,
) -> Direction {
    match mode {
        ResolverMode::Priority => resolve_priority(held),
        ResolverMode::TurnContinuation => resolve_turn(held, last_sent),
    }
}

fn resolve_turn(held: &HeldKeys, last_sent: Option<MotionCommand>) -> Direction {
    let directions: Vec<Direction> = held.directions().into_iter().collect();

    match (directions.as_slice(), last_sent) {
        ([], _) => Direction::Stop,
        ([only], _) => *only,
        (_, None) => resolve_priority(held),
        ([first, second], Some(last)) => {
            turn_continuation(last.direction(), *first, *second).unwrap_or(Direction::Stop)
        }
        _ => Direction::Stop,
    }
}

/// Looks up the turn table for a pair of held directions. The active
/// direction must be one of the pair.
pub fn turn_continuation(
    active: Direction,
    first: Direction,
    second: Direction,
) -> Option<Direction> {
    let other = if first == active {
        second
    } else if second == active {
        first
    } else {
        return None;
    };

    TURN_TABLE
        .iter()
        .find(|(row_active, row_other, _)| *row_active == active && *row_other == other)
        .map(|(_, _, command)| *command)
}

/// Faster wins when both modifiers are held.
pub fn apply_speed_modifier(direction: Direction, held: &HeldKeys) -> MotionCommand {
    if direction == Direction::Stop {
        return MotionCommand::STOP;
    }

    if held.holds_modifier(SpeedModifier::Faster) {
        MotionCommand::with_speed(direction, SpeedModifier::Faster)
    } else if held.holds_modifier(SpeedModifier::Slower) {
        MotionCommand::with_speed(direction, SpeedModifier::Slower)
    } else {
        MotionCommand::new(direction)
    }
}

/// Stop is re-sent on every evaluation so a dropped stop datagram cannot
/// leave the robot moving.
pub fn should_transmit(command: MotionCommand, last_sent: Option<MotionCommand>) -> bool {
    command.is_stop() || Some(command) != last_sent
}

pub fn resolve_command(
    held: &HeldKeys,
    last_sent: Option<MotionCommand>,
    mode: ResolverMode,
) -> MotionCommand {
    apply_speed_modifier(resolve_direction(held, last_sent, mode), held)
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
