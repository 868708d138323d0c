//! Shared-card session scenarios.

mod common;

use bingo_board::{Coord, RegionRequest, Rule};
use bingo_server::{
    Color, CreateSession, EngineError, Ignored, Mode, Outcome, Rejection, ServerEvent, Status,
};
use common::{create, engine, join, last_state, request, snapshot};

#[test]
fn test_shared_mode_requires_valid_color() {
    let (engine, _) = engine();
    let missing = engine
        .create_session(CreateSession {
            color: None,
            ..request(Mode::Shared, &["row"], 5)
        })
        .unwrap_err();
    assert!(matches!(missing, EngineError::Rejected(Rejection::ColorRequired)));

    let invalid = engine
        .create_session(CreateSession {
            color: Some("MAUVE".into()),
            ..request(Mode::Shared, &["row"], 5)
        })
        .unwrap_err();
    assert!(matches!(invalid, EngineError::Rejected(Rejection::InvalidColor)));
}

#[test]
fn test_shared_join_rules() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Shared, &["row"], 5));

    let taken = engine.join(&host.code, "Blue", Some("red")).unwrap_err();
    assert!(matches!(taken, EngineError::Rejected(Rejection::ColorTaken)));
    let none = engine.join(&host.code, "Blue", None).unwrap_err();
    assert!(matches!(none, EngineError::Rejected(Rejection::ColorRequired)));

    join(&engine, &host, "Blue", Some("BLUE"));
    join(&engine, &host, "Green", Some("green"));
    join(&engine, &host, "Pink", Some("PINK"));
    let full = engine.join(&host.code, "Cyan", Some("CYAN")).unwrap_err();
    assert!(matches!(
        full,
        EngineError::Rejected(Rejection::SessionFull { capacity: 4 })
    ));

    let info = engine.game_info(&host.code).unwrap();
    assert_eq!(info.mode, Mode::Shared);
    assert_eq!(info.max_players, 4);
    assert_eq!(info.host_color, Some(Color::Red));
    assert_eq!(
        info.taken_colors,
        vec![Color::Red, Color::Blue, Color::Green, Color::Pink]
    );
}

#[test]
fn test_held_cell_is_exclusive() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Shared, &["row"], 5));
    let guest = join(&engine, &host, "Guest", Some("BLUE"));

    engine.mark(&host.session_id, &host.player_id, 0, 0).unwrap();
    engine.broadcaster().clear();
    let blocked = engine.mark(&guest.session_id, &guest.player_id, 0, 0).unwrap();
    assert_eq!(blocked, Outcome::Ignored(Ignored::Blocked));
    assert!(engine.broadcaster().take().is_empty());

    engine.mark(&host.session_id, &host.player_id, 0, 0).unwrap();
    engine.mark(&guest.session_id, &guest.player_id, 0, 0).unwrap();
    let state = snapshot(&engine, &host);
    assert!(state.players[0].marks.as_ref().unwrap().is_empty());
    assert!(state.players[1].marks.as_ref().unwrap().contains(Coord::new(0, 0)));
    assert!(state.shared_card.is_some());
    assert!(state.players.iter().all(|p| p.card.is_none()));
}

#[test]
fn test_line_win_on_own_marks() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Shared, &["diagonals"], 3));
    let guest = join(&engine, &host, "Guest", Some("BLUE"));

    engine.mark(&guest.session_id, &guest.player_id, 0, 2).unwrap();
    engine.mark(&host.session_id, &host.player_id, 1, 1).unwrap();
    engine.mark(&guest.session_id, &guest.player_id, 2, 0).unwrap();
    assert_eq!(snapshot(&engine, &host).status, Status::Active);

    engine.mark(&host.session_id, &host.player_id, 0, 0).unwrap();
    engine.broadcaster().clear();
    engine.mark(&host.session_id, &host.player_id, 2, 2).unwrap();
    let events = engine.broadcaster().take();
    assert_eq!(events[0].name(), "win");
    let state = last_state(&events).unwrap();
    assert_eq!(state.status, Status::Ended);
    assert_eq!(state.winner.as_ref().unwrap().rule, Rule::Diagonal);
}

/// Fills a 3x3 shared card, host taking the first `host_cells` in row-major
/// order and the guest the rest.
fn fill_card(host_cells: usize) -> (Vec<ServerEvent>, Status) {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Shared, &["most_squares"], 3));
    let guest = join(&engine, &host, "Guest", Some("BLUE"));
    for i in 0..9 {
        let who = if i < host_cells { &host } else { &guest };
        engine.mark(&who.session_id, &who.player_id, i / 3, i % 3).unwrap();
    }
    let events = engine.broadcaster().take();
    let status = snapshot(&engine, &host).status;
    (events, status)
}

#[test]
fn test_full_card_goes_to_strict_majority() {
    let (events, status) = fill_card(5);
    assert_eq!(status, Status::Ended);
    let win = events
        .iter()
        .find_map(|e| match e {
            ServerEvent::Win(notice) => Some(notice),
            _ => None,
        })
        .unwrap();
    assert_eq!(win.player_name, "Host");
    assert_eq!(win.rule, "Most Squares");
    assert_eq!(events.last().unwrap().name(), "state");
}

#[test]
fn test_full_card_without_majority_keeps_playing() {
    // 8 cells each on a 4x4 card.
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Shared, &["most_squares"], 4));
    let guest = join(&engine, &host, "Guest", Some("BLUE"));
    for i in 0..16 {
        let who = if i % 2 == 0 { &host } else { &guest };
        engine.mark(&who.session_id, &who.player_id, i / 4, i % 4).unwrap();
    }
    let events = engine.broadcaster().take();
    assert!(events.iter().all(|e| e.name() == "state"));
    assert_eq!(snapshot(&engine, &host).status, Status::Active);
}

#[test]
fn test_shared_reroll_purges_marks_on_replaced_cells() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Shared, &["full"], 5));
    let guest = join(&engine, &host, "Guest", Some("BLUE"));
    engine.mark(&host.session_id, &host.player_id, 0, 0).unwrap();
    engine.mark(&guest.session_id, &guest.player_id, 0, 4).unwrap();
    engine.mark(&guest.session_id, &guest.player_id, 1, 0).unwrap();
    let before = snapshot(&engine, &host);
    engine.broadcaster().clear();

    let outcome = engine
        .reroll(
            &host.session_id,
            &host.player_id,
            None,
            &RegionRequest::new("row", Some("1")),
        )
        .unwrap();
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(engine.broadcaster().names(), vec!["state"]);

    let after = snapshot(&engine, &host);
    assert!(after.players[0].marks.as_ref().unwrap().is_empty());
    let guest_marks = after.players[1].marks.as_ref().unwrap();
    assert_eq!(guest_marks.len(), 1);
    assert!(guest_marks.contains(Coord::new(1, 0)));

    let old = before.shared_card.unwrap();
    let new = after.shared_card.unwrap();
    for col in 0..5 {
        let coord = Coord::new(0, col);
        assert_ne!(old.cell(coord).unwrap().prompt(), new.cell(coord).unwrap().prompt());
    }
    assert_eq!(old.rows()[1..], new.rows()[1..]);
}

#[test]
fn test_shared_new_round_keeps_roster() {
    let (engine, _) = engine();
    let host = create(&engine, request(Mode::Shared, &["row"], 3));
    let guest = join(&engine, &host, "Guest", Some("BLUE"));
    for col in 0..3 {
        engine.mark(&guest.session_id, &guest.player_id, 2, col).unwrap();
    }
    engine.new_round(&host.session_id, &host.player_id).unwrap();

    let state = snapshot(&engine, &host);
    assert_eq!(state.status, Status::Active);
    assert_eq!(state.players.len(), 2);
    assert!(state.players.iter().all(|p| p.marks.as_ref().unwrap().is_empty()));
    assert_eq!(state.players[1].color, Some(Color::Blue));
}
