use chessmen::{
    server::LocalPeer, ClickOutcome, Color, Coord, MatchServer, Move, Orientation, Session,
    Status, SyncConfig,
};
use std::cell::RefCell;
use std::rc::Rc;

type LocalSession = Session<LocalPeer>;

fn start_duel(seed: u64) -> (LocalSession, LocalSession) {
    let server = Rc::new(RefCell::new(MatchServer::with_seed(seed)));
    let config = SyncConfig::default();
    let mut a = Session::new(LocalPeer::new(server.clone()), &config);
    let mut b = Session::new(LocalPeer::new(server.clone()), &config);
    a.connect().unwrap();
    b.connect().unwrap();
    assert_eq!(server.borrow().match_count(), 1);

    a.tick().unwrap();
    b.tick().unwrap();
    assert!(a.is_started() && b.is_started());
    if a.role() == Some(Color::White) {
        (a, b)
    } else {
        (b, a)
    }
}

fn play(s: &mut LocalSession, mv: &str) {
    let mv = Move::parse(mv, s.orientation()).unwrap();
    assert_eq!(s.click(Some(mv.src)), Ok(ClickOutcome::Selected(mv.src)));
    assert_eq!(s.click(Some(mv.dst)), Ok(ClickOutcome::Moved(mv)));
}

#[test]
fn test_roles() {
    for seed in 0..8 {
        let (white, black) = start_duel(seed);
        assert_eq!(white.role(), Some(Color::White));
        assert_eq!(black.role(), Some(Color::Black));
        assert_eq!(white.orientation(), Orientation::Normal);
        assert_eq!(black.orientation(), Orientation::Flipped);
        assert_ne!(white.user_id(), black.user_id());
        // both players see their own pieces at the bottom
        assert_eq!(white.board().color_of(Coord::new(7, 4)), Some(Color::White));
        assert_eq!(black.board().color_of(Coord::new(7, 4)), Some(Color::Black));
    }
}

#[test]
fn test_exchange() {
    let (mut white, mut black) = start_duel(42);
    assert!(white.is_my_turn());
    assert!(!black.is_my_turn());

    // black cannot move out of turn
    let knight = Move::parse("g8f6", black.orientation()).unwrap();
    black.click(Some(knight.src)).unwrap();
    assert_eq!(black.click(Some(knight.dst)), Ok(ClickOutcome::Deselected));

    play(&mut white, "e2e4");
    assert_eq!(white.tick(), Ok(Status::OpponentTurn));
    assert_eq!(black.tick(), Ok(Status::YourTurn));
    assert_eq!(
        black.board().encode_oriented(black.orientation()),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR"
    );

    play(&mut black, "d7d5");
    assert_eq!(white.tick(), Ok(Status::YourTurn));
    play(&mut white, "e4d5");
    assert_eq!(black.tick(), Ok(Status::YourTurn));
    play(&mut black, "d8d5");
    assert_eq!(white.tick(), Ok(Status::YourTurn));

    let expected = "rnb1kbnr/ppp1pppp/8/3q4/8/8/PPPP1PPP/RNBQKBNR";
    assert_eq!(white.board().encode(), expected);
    assert_eq!(black.board().encode_oriented(Orientation::Flipped), expected);
    assert!(white.selection().is_idle());
}

#[test]
fn test_capture_highlight() {
    let (mut white, mut black) = start_duel(1);
    play(&mut white, "e2e4");
    black.tick().unwrap();
    play(&mut black, "d7d5");
    white.tick().unwrap();

    let pawn = white.orientation().parse_label("e4").unwrap();
    white.click(Some(pawn)).unwrap();
    let target = white.orientation().parse_label("d5").unwrap();
    assert!(white.selection().capture().has(target));
    assert_eq!(white.selection().capture().len(), 1);
    assert_eq!(white.selection().quiet().len(), 1);
}
