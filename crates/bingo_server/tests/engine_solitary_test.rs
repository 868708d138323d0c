//! Solitary-mode session scenarios.

mod common;

use bingo_board::{BoardError, Coord, RegionRequest, Rule};
use bingo_server::{
    CreateSession, EngineError, FLAG_ALLOWANCE, Ignored, Mode, Outcome, Rejection, Role,
    ServerEvent, Status, WinNotice,
};
use common::{create, engine, join, last_state, request, snapshot};

#[test]
fn test_second_row_wins_with_row_label() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 5));
    let guest = join(&engine, &host, "Guest", None);

    for col in 0..4 {
        assert_eq!(
            engine.mark(&guest.session_id, &guest.player_id, 1, col).unwrap(),
            Outcome::Applied
        );
        assert_eq!(engine.broadcaster().names(), vec!["state"]);
    }
    engine.mark(&guest.session_id, &guest.player_id, 1, 4).unwrap();

    let events = engine.broadcaster().take();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        ServerEvent::Win(WinNotice {
            player_name: "Guest".into(),
            rule: "Row".into(),
        })
    );
    let state = last_state(&events).unwrap();
    assert_eq!(state.status, Status::Ended);
    let winner = state.winner.as_ref().unwrap();
    assert_eq!(winner.player_id, guest.player_id);
    assert_eq!(winner.rule, Rule::OneRow);
}

#[test]
fn test_marks_after_win_are_ignored_silently() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 3));
    for col in 0..3 {
        engine.mark(&host.session_id, &host.player_id, 0, col).unwrap();
    }
    engine.broadcaster().clear();

    let outcome = engine.mark(&host.session_id, &host.player_id, 2, 2).unwrap();
    assert_eq!(outcome, Outcome::Ignored(Ignored::Ended));
    assert!(engine.broadcaster().take().is_empty());
}

#[test]
fn test_mark_toggles() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["full"], 5));
    engine.mark(&host.session_id, &host.player_id, 2, 2).unwrap();
    assert_eq!(snapshot(&engine, &host).players[0].marked, 1);
    engine.mark(&host.session_id, &host.player_id, 2, 2).unwrap();
    assert_eq!(snapshot(&engine, &host).players[0].marked, 0);
}

#[test]
fn test_off_board_and_stranger_marks_are_ignored() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 3));
    assert_eq!(
        engine.mark(&host.session_id, &host.player_id, 3, 0).unwrap(),
        Outcome::Ignored(Ignored::OffBoard)
    );
    assert_eq!(
        engine.mark(&host.session_id, "nobody", 0, 0).unwrap(),
        Outcome::Ignored(Ignored::NotMember)
    );
    assert!(engine.broadcaster().take().is_empty());
}

#[test]
fn test_each_player_gets_a_distinct_card() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 3));
    for name in ["A", "B", "C", "D"] {
        join(&engine, &host, name, None);
    }
    let state = snapshot(&engine, &host);
    let cards: Vec<_> = state.players.iter().map(|p| p.card.clone().unwrap()).collect();
    assert_eq!(cards.len(), 5);
    for (i, a) in cards.iter().enumerate() {
        for b in &cards[i + 1..] {
            assert!(!a.same_prompts(b));
        }
    }
}

#[test]
fn test_join_assigns_member_role_and_flags() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 5));
    engine.join(&host.code.to_lowercase(), "Guest", Some("BLUE")).unwrap();
    assert_eq!(engine.broadcaster().names(), vec!["state"]);

    let state = snapshot(&engine, &host);
    assert_eq!(state.players[0].role, Role::Host);
    assert_eq!(state.players[1].role, Role::Member);
    assert_eq!(state.players[1].flags_left, FLAG_ALLOWANCE);
    assert_eq!(state.players[1].color, None);
}

#[test]
fn test_join_rejections() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 5));

    let taken = engine.join(&host.code, "Host", None).unwrap_err();
    assert!(matches!(taken, EngineError::Rejected(Rejection::NameTaken)));
    let blank = engine.join(&host.code, "   ", None).unwrap_err();
    assert!(matches!(blank, EngineError::Rejected(Rejection::NameRequired)));
    let unknown = engine.join("ZZZZZZ", "Guest", None).unwrap_err();
    assert!(matches!(unknown, EngineError::UnknownSession));

    for i in 1..10 {
        join(&engine, &host, &format!("P{i}"), None);
    }
    let full = engine.join(&host.code, "Eleventh", None).unwrap_err();
    assert!(matches!(
        full,
        EngineError::Rejected(Rejection::SessionFull { capacity: 10 })
    ));
    assert!(engine.broadcaster().take().is_empty());
}

#[test]
fn test_host_reroll_replaces_only_target_card() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 5));
    let guest = join(&engine, &host, "Guest", None);
    engine.mark(&guest.session_id, &guest.player_id, 1, 2).unwrap();
    let before = snapshot(&engine, &host);
    engine.broadcaster().clear();

    let tile = RegionRequest::new("tile", Some("2,3"));
    let outcome = engine
        .reroll(&host.session_id, &host.player_id, Some(&guest.player_id), &tile)
        .unwrap();
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(engine.broadcaster().names(), vec!["state"]);

    let after = snapshot(&engine, &host);
    let coord = Coord::new(1, 2);
    let old = before.players[1].card.as_ref().unwrap();
    let new = after.players[1].card.as_ref().unwrap();
    assert_ne!(old.cell(coord).unwrap().prompt(), new.cell(coord).unwrap().prompt());
    assert!(!new.is_marked(coord));
    assert!(!old.prompts().any(|p| p == new.cell(coord).unwrap().prompt()));
    assert_eq!(before.players[0].card, after.players[0].card);
}

#[test]
fn test_reroll_no_ops() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 5));
    let guest = join(&engine, &host, "Guest", None);
    let row = RegionRequest::new("row", Some("1"));

    let by_member = engine
        .reroll(&guest.session_id, &guest.player_id, Some(&guest.player_id), &row)
        .unwrap();
    assert_eq!(by_member, Outcome::Ignored(Ignored::NotHost));

    let untargeted = engine.reroll(&host.session_id, &host.player_id, None, &row).unwrap();
    assert_eq!(untargeted, Outcome::Ignored(Ignored::UnknownTarget));

    let out_of_range = RegionRequest::new("row", Some("6"));
    let bad = engine
        .reroll(&host.session_id, &host.player_id, Some(&guest.player_id), &out_of_range)
        .unwrap();
    assert_eq!(bad, Outcome::Ignored(Ignored::BadRegion));
    assert!(engine.broadcaster().take().is_empty());
}

#[test]
fn test_rerolls_can_be_disabled() {
    let (engine, _) = engine();
    let host = create(
        &engine,
        CreateSession {
            rerolls_enabled: Some(false),
            ..request(Mode::Solitary, &["row"], 5)
        },
    );
    let outcome = engine
        .reroll(
            &host.session_id,
            &host.player_id,
            Some(&host.player_id),
            &RegionRequest::new("card", None),
        )
        .unwrap();
    assert_eq!(outcome, Outcome::Ignored(Ignored::RerollsDisabled));
}

#[test]
fn test_new_round_after_win() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["column"], 3));
    let guest = join(&engine, &host, "Guest", None);

    assert_eq!(
        engine.new_round(&host.session_id, &host.player_id).unwrap(),
        Outcome::Ignored(Ignored::NotEnded)
    );
    for row in 0..3 {
        engine.mark(&guest.session_id, &guest.player_id, row, 0).unwrap();
    }
    assert_eq!(
        engine.new_round(&guest.session_id, &guest.player_id).unwrap(),
        Outcome::Ignored(Ignored::NotHost)
    );
    engine.broadcaster().clear();

    assert_eq!(
        engine.new_round(&host.session_id, &host.player_id).unwrap(),
        Outcome::Applied
    );
    assert_eq!(engine.broadcaster().names(), vec!["state"]);
    let state = snapshot(&engine, &host);
    assert_eq!(state.status, Status::Active);
    assert!(state.winner.is_none());
    assert!(state.players.iter().all(|p| p.marked == 0));
    let cards: Vec<_> = state.players.iter().map(|p| p.card.clone().unwrap()).collect();
    assert!(!cards[0].same_prompts(&cards[1]));
}

#[test]
fn test_storage_failure_aborts_without_broadcast() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 5));

    engine.store().fail_saves(true);
    let err = engine.mark(&host.session_id, &host.player_id, 0, 0).unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));
    assert!(engine.broadcaster().take().is_empty());

    engine.store().fail_saves(false);
    assert_eq!(snapshot(&engine, &host).players[0].marked, 0);
    engine.mark(&host.session_id, &host.player_id, 0, 0).unwrap();
    assert_eq!(snapshot(&engine, &host).players[0].marked, 1);
}

#[test]
fn test_custom_pool_too_small_is_rejected() {
    let (engine, _) = engine();
    let err = engine
        .create_session(CreateSession {
            custom_prompts: Some((0..10).map(|i| format!("Prompt {i}")).collect()),
            ..request(Mode::Solitary, &["row"], 5)
        })
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Rejected(Rejection::Deal(BoardError::PoolTooSmall {
            needed: 25,
            available: 10,
        }))
    ));
}

#[test]
fn test_custom_pool_is_dealt_from() {
    let (engine, _) = engine();
    let prompts: Vec<String> = (0..9).map(|i| format!("Custom {i}")).collect();
    let host = create(
        &engine,
        CreateSession {
            custom_prompts: Some(prompts.clone()),
            ..request(Mode::Solitary, &["row"], 3)
        },
    );
    let state = snapshot(&engine, &host);
    let card = state.players[0].card.as_ref().unwrap();
    assert!(card.prompts().all(|p| prompts.iter().any(|c| c == p)));
}

#[test]
fn test_create_defaults() {
    let (engine, _) = engine();
    let host = create(
        &engine,
        CreateSession {
            rules: vec!["row".into(), "nonsense".into()],
            board_size: Some(42),
            ..request(Mode::Solitary, &[], 5)
        },
    );
    assert_eq!(host.code.len(), 6);
    assert!(host.code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    let state = snapshot(&engine, &host);
    assert_eq!(state.board_size.get(), 5);
    assert_eq!(state.rules.iter().collect::<Vec<_>>(), vec![Rule::OneRow]);
    assert!(state.settings.flags_enabled);
    assert!(!state.timer.enabled);
}

#[test]
fn test_blank_host_rejected() {
    let (engine, _) = engine();
    let err = engine
        .create_session(CreateSession {
            host_name: " ".into(),
            ..request(Mode::Solitary, &["row"], 5)
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::Rejected(Rejection::NameRequired)));
}

#[test]
fn test_attach_and_remove() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 5));
    assert!(matches!(
        engine.attach(&host.session_id, "stranger").unwrap_err(),
        EngineError::UnknownPlayer
    ));
    assert_eq!(snapshot(&engine, &host).code, host.code);
    assert!(engine.broadcaster().take().is_empty());

    engine.remove_session(&host.session_id).unwrap();
    assert!(matches!(
        engine.attach(&host.session_id, &host.player_id).unwrap_err(),
        EngineError::UnknownSession
    ));
    assert!(matches!(engine.game_info(&host.code).unwrap_err(), EngineError::UnknownSession));
}

#[test]
fn test_game_info_for_solitary() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 5));
    join(&engine, &host, "Guest", None);
    let info = engine.game_info(&host.code).unwrap();
    assert_eq!(info.mode, Mode::Solitary);
    assert_eq!(info.player_count, 2);
    assert_eq!(info.max_players, 10);
    assert!(info.taken_colors.is_empty());
    assert_eq!(info.host_color, None);
}

#[test]
fn test_unknown_session_ids_leave_no_lock_behind() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Solitary, &["row"], 5));
    assert_eq!(engine.gated_sessions(), 1);

    for n in 0..20 {
        let ghost = format!("ghost-{n}");
        let p = &host.player_id;
        assert!(matches!(
            engine.attach(&ghost, p).unwrap_err(),
            EngineError::UnknownSession
        ));
        assert!(engine.mark(&ghost, p, 0, 0).is_err());
        assert!(engine.timer_sync(&ghost, p).is_err());
        assert!(engine.start_timer(&ghost, p).is_err());
        assert!(engine.new_round(&ghost, p).is_err());
        assert!(engine.snapshot(&ghost).is_err());
        assert!(engine.throw_flag(&ghost, p, p, 0, 0).is_err());
        assert!(engine.cast_vote(&ghost, p, bingo_server::Vote::Yes).is_err());
    }
    assert_eq!(engine.gated_sessions(), 1);
    assert!(engine.broadcaster().take().is_empty());
}

#[test]
fn test_failed_create_leaves_no_lock_behind() {
    let (engine, _) = engine();
    engine.store().fail_saves(true);
    let err = engine
        .create_session(request(Mode::Solitary, &["row"], 5))
        .unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));
    assert_eq!(engine.gated_sessions(), 0);
    assert!(engine.running_timers().is_empty());
}
