use super::*;

fn held(keys: &[LogicalKey]) -> HeldKeys {
    keys.iter().copied().collect()
}

fn cmd(token: &str) -> MotionCommand {
    token.parse().expect("token")
}

const DIRECTION_KEYS: [LogicalKey; 8] = [
    LogicalKey::W,
    LogicalKey::A,
    LogicalKey::S,
    LogicalKey::D,
    LogicalKey::Up,
    LogicalKey::Down,
    LogicalKey::Left,
    LogicalKey::Right,
];

#[test]
fn single_key_maps_directly_regardless_of_history() {
    let histories = [None, Some(cmd("F")), Some(cmd("BS")), Some(cmd("R")), Some(cmd("S"))];
    for key in DIRECTION_KEYS {
        let expected = key.direction().expect("direction key");
        for last in histories {
            for mode in [ResolverMode::Priority, ResolverMode::TurnContinuation] {
                assert_eq!(
                    resolve_direction(&held(&[key]), last, mode),
                    expected,
                    "key {key} after {last:?} in {mode}"
                );
            }
        }
    }
}

#[test]
fn nothing_held_resolves_to_stop() {
    for mode in [ResolverMode::Priority, ResolverMode::TurnContinuation] {
        assert_eq!(resolve_direction(&HeldKeys::new(), Some(cmd("F")), mode), Direction::Stop);
        assert_eq!(resolve_direction(&HeldKeys::new(), None, mode), Direction::Stop);
    }
    let only_modifiers = held(&[LogicalKey::Faster, LogicalKey::Slower]);
    assert_eq!(
        resolve_command(&only_modifiers, Some(cmd("F")), ResolverMode::TurnContinuation),
        MotionCommand::STOP
    );
}

#[test]
fn priority_mode_orders_backward_right_left_forward() {
    let mode = ResolverMode::Priority;
    let all = held(&[LogicalKey::W, LogicalKey::A, LogicalKey::S, LogicalKey::D]);
    assert_eq!(resolve_direction(&all, None, mode), Direction::Backward);
    let no_back = held(&[LogicalKey::W, LogicalKey::A, LogicalKey::Right]);
    assert_eq!(resolve_direction(&no_back, Some(cmd("F")), mode), Direction::Right);
    let left_forward = held(&[LogicalKey::Up, LogicalKey::Left]);
    assert_eq!(resolve_direction(&left_forward, Some(cmd("F")), mode), Direction::Left);
}

#[test]
fn aliased_keys_count_as_one_direction() {
    let both_forward = held(&[LogicalKey::W, LogicalKey::Up]);
    assert_eq!(
        resolve_direction(&both_forward, Some(cmd("L")), ResolverMode::TurnContinuation),
        Direction::Forward
    );
}

#[test]
fn reversing_with_right_held_turns_right() {
    let keys = held(&[LogicalKey::S, LogicalKey::D]);
    assert_eq!(
        resolve_direction(&keys, Some(cmd("B")), ResolverMode::TurnContinuation),
        Direction::Right
    );
    let keys = held(&[LogicalKey::Down, LogicalKey::Left]);
    assert_eq!(
        resolve_direction(&keys, Some(cmd("BF")), ResolverMode::TurnContinuation),
        Direction::Left
    );
}

#[test]
fn turn_table_covers_every_perpendicular_pair() {
    let cases = [
        ("B", LogicalKey::S, LogicalKey::D, Direction::Right),
        ("B", LogicalKey::S, LogicalKey::A, Direction::Left),
        ("R", LogicalKey::D, LogicalKey::W, Direction::Forward),
        ("R", LogicalKey::D, LogicalKey::S, Direction::Backward),
        ("L", LogicalKey::A, LogicalKey::W, Direction::Forward),
        ("L", LogicalKey::A, LogicalKey::S, Direction::Backward),
        ("F", LogicalKey::W, LogicalKey::D, Direction::Right),
        ("F", LogicalKey::W, LogicalKey::A, Direction::Left),
    ];
    for (last, active_key, new_key, expected) in cases {
        assert_eq!(
            resolve_direction(
                &held(&[active_key, new_key]),
                Some(cmd(last)),
                ResolverMode::TurnContinuation
            ),
            expected,
            "active {last} plus {new_key}"
        );
    }
}

#[test]
fn unmatched_combinations_stop() {
    let mode = ResolverMode::TurnContinuation;
    let opposing = held(&[LogicalKey::W, LogicalKey::S]);
    assert_eq!(resolve_direction(&opposing, Some(cmd("F")), mode), Direction::Stop);

    let three = held(&[LogicalKey::W, LogicalKey::D, LogicalKey::A]);
    assert_eq!(resolve_direction(&three, Some(cmd("R")), mode), Direction::Stop);

    let active_not_held = held(&[LogicalKey::D, LogicalKey::S]);
    assert_eq!(resolve_direction(&active_not_held, Some(cmd("F")), mode), Direction::Stop);

    let from_stop = held(&[LogicalKey::W, LogicalKey::D]);
    assert_eq!(resolve_direction(&from_stop, Some(cmd("S")), mode), Direction::Stop);
}

#[test]
fn no_history_falls_back_to_priority() {
    let keys = held(&[LogicalKey::W, LogicalKey::D]);
    assert_eq!(
        resolve_direction(&keys, None, ResolverMode::TurnContinuation),
        Direction::Right
    );
}

#[test]
fn turn_continuation_requires_active_direction_in_pair() {
    assert_eq!(
        turn_continuation(Direction::Forward, Direction::Left, Direction::Right),
        None
    );
    assert_eq!(
        turn_continuation(Direction::Stop, Direction::Stop, Direction::Forward),
        None
    );
    assert_eq!(
        turn_continuation(Direction::Left, Direction::Forward, Direction::Left),
        Some(Direction::Forward)
    );
}

#[test]
fn resolution_is_idempotent() {
    let keys = held(&[LogicalKey::W, LogicalKey::D, LogicalKey::Faster]);
    let last = Some(cmd("F"));
    let first = resolve_command(&keys, last, ResolverMode::TurnContinuation);
    let second = resolve_command(&keys, last, ResolverMode::TurnContinuation);
    assert_eq!(first, second);
    assert_eq!(first, cmd("RF"));
}

#[test]
fn stop_is_never_speed_modified() {
    for keys in [
        held(&[]),
        held(&[LogicalKey::Faster]),
        held(&[LogicalKey::Slower]),
        held(&[LogicalKey::Faster, LogicalKey::Slower]),
    ] {
        assert_eq!(apply_speed_modifier(Direction::Stop, &keys), MotionCommand::STOP);
    }
}

#[test]
fn speed_modifiers_append_suffix_with_faster_winning() {
    assert_eq!(
        apply_speed_modifier(Direction::Forward, &held(&[LogicalKey::Faster])).token(),
        "FF"
    );
    assert_eq!(
        apply_speed_modifier(Direction::Backward, &held(&[LogicalKey::Slower])).token(),
        "BS"
    );
    assert_eq!(
        apply_speed_modifier(
            Direction::Left,
            &held(&[LogicalKey::Slower, LogicalKey::Faster])
        )
        .token(),
        "LF"
    );
    assert_eq!(apply_speed_modifier(Direction::Right, &held(&[])).token(), "R");
}

#[test]
fn stop_is_always_transmitted() {
    assert!(should_transmit(MotionCommand::STOP, Some(MotionCommand::STOP)));
    assert!(should_transmit(MotionCommand::STOP, None));
    assert!(should_transmit(MotionCommand::STOP, Some(cmd("F"))));
}

#[test]
fn unchanged_motion_is_suppressed() {
    assert!(!should_transmit(cmd("F"), Some(cmd("F"))));
    assert!(should_transmit(cmd("FF"), Some(cmd("F"))));
    assert!(should_transmit(cmd("F"), None));
}

#[test]
fn resolver_mode_parses_config_spellings() {
    assert_eq!("priority".parse::<ResolverMode>(), Ok(ResolverMode::Priority));
    assert_eq!("TURN_CONTINUATION".parse::<ResolverMode>(), Ok(ResolverMode::TurnContinuation));
    assert!("zigzag".parse::<ResolverMode>().is_err());
}

#[test]
fn held_keys_ignore_repeated_presses() {
    let mut keys = HeldKeys::new();
    assert!(keys.press(LogicalKey::W));
    assert!(!keys.press(LogicalKey::W));
    assert!(keys.release(LogicalKey::W));
    assert!(!keys.release(LogicalKey::W));
    assert!(keys.is_empty());
}
