//! In-memory match authority
//!
//! The server pairs queued users into matches, keeps the authoritative position of every
//! match and decides whose turn it is. It holds no sockets itself: requests are fed
//! through [`MatchServer::handle()`], [`LocalPeer`] or [`serve_tcp()`].

use crate::board::{Board, MalformedNotation};
use crate::peer::{Peer, PeerError};
use crate::protocol::{self, Assignment, Envelope, ProtocolError, Reply, Request, Status};
use crate::types::Color;

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

const GUEST_ID_LEN: usize = 20;
const MAX_NAME_LEN: usize = 20;
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Reason for refusing a request
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ServerError {
    #[error("request carries no user id")]
    MissingUser,
    #[error("unknown user {0:?}")]
    UnknownUser(String),
    #[error("user is already in queue")]
    AlreadyQueued,
    #[error("user is already in match")]
    AlreadyInMatch,
    #[error("user not in match")]
    NotInMatch,
    #[error("not user turn yet")]
    NotYourTurn,
    #[error("bad position: {0}")]
    BadPosition(#[from] MalformedNotation),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum UserState {
    Online,
    Queued,
    InMatch(u64),
}

#[derive(Debug, Copy, Clone)]
struct User {
    state: UserState,
    last_seen: Instant,
}

#[derive(Debug, Clone)]
struct Match {
    white: String,
    black: String,
    board: Board,
    turn: Color,
}

impl Match {
    fn role_of(&self, user: &str) -> Option<Color> {
        if user == self.white {
            Some(Color::White)
        } else if user == self.black {
            Some(Color::Black)
        } else {
            None
        }
    }

    fn opponent_of(&self, user: &str) -> &str {
        if user == self.white {
            &self.black
        } else {
            &self.white
        }
    }
}

/// Removes the characters reserved by the wire format and caps the length
fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|&c| c != ':' && c != '|')
        .map(|c| if c == ' ' { '_' } else { c })
        .take(MAX_NAME_LEN)
        .collect()
}

/// Authoritative state of all users and matches
///
/// Users that send no requests for the idle timeout (30 seconds by default) are dropped
/// together with their matches. The opponent of a dropped user stays online and may
/// enter the queue again.
pub struct MatchServer {
    users: HashMap<String, User>,
    queue: VecDeque<String>,
    matches: HashMap<u64, Match>,
    next_match: u64,
    idle_timeout: Duration,
    rng: StdRng,
}

impl MatchServer {
    pub fn new() -> MatchServer {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a server with a fixed seed for color assignment and guest ids
    pub fn with_seed(seed: u64) -> MatchServer {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> MatchServer {
        MatchServer {
            users: HashMap::new(),
            queue: VecDeque::new(),
            matches: HashMap::new(),
            next_match: 0,
            idle_timeout: IDLE_TIMEOUT,
            rng,
        }
    }

    /// Sets the time after which a silent user is dropped
    pub fn with_idle_timeout(mut self, timeout: Duration) -> MatchServer {
        self.idle_timeout = timeout;
        self
    }

    /// Returns the number of running matches
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Returns the number of known users
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Handles a request and returns the reply text
    ///
    /// Refused requests are answered with an `<err :: ...>` acknowledgement and leave the
    /// state unchanged.
    pub fn handle(&mut self, user: Option<&str>, request: &Request) -> String {
        self.handle_at(Instant::now(), user, request)
    }

    /// Same as [`MatchServer::handle()`], but with the current time given explicitly
    pub fn handle_at(&mut self, now: Instant, user: Option<&str>, request: &Request) -> String {
        debug!("{:?}: {}", user, request);
        self.drop_idle(now);
        if let Some(u) = user.and_then(|u| self.users.get_mut(u)) {
            u.last_seen = now;
        }
        match self.try_handle(now, user, request) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("refused {:?} from {:?}: {}", request.to_string(), user, e);
                protocol::refusal(e)
            }
        }
    }

    /// Handles a JSON envelope and returns the JSON reply
    pub fn handle_json(&mut self, line: &str) -> Result<String, ProtocolError> {
        let parsed = Envelope::from_json(line).and_then(|env| Ok((env.request()?, env.user)));
        let response = match parsed {
            Ok((request, user)) => self.handle(user.as_deref(), &request),
            Err(e) => {
                warn!("bad request {:?}: {}", line, e);
                protocol::refusal(e)
            }
        };
        Reply { response }.to_json()
    }

    fn drop_idle(&mut self, now: Instant) {
        let idle: Vec<String> = self
            .users
            .iter()
            .filter(|(_, u)| now.saturating_duration_since(u.last_seen) >= self.idle_timeout)
            .map(|(id, _)| id.clone())
            .collect();
        for id in idle {
            self.drop_user(&id);
        }
    }

    fn drop_user(&mut self, id: &str) {
        let user = match self.users.remove(id) {
            Some(user) => user,
            None => return,
        };
        info!("dropping idle user {}", id);
        match user.state {
            UserState::Online => {}
            UserState::Queued => self.queue.retain(|q| q != id),
            UserState::InMatch(idx) => {
                let m = match self.matches.remove(&idx) {
                    Some(m) => m,
                    None => return,
                };
                let opponent = m.opponent_of(id);
                info!("match {} closed, {} is back online", idx, opponent);
                if let Some(u) = self.users.get_mut(opponent) {
                    u.state = UserState::Online;
                }
            }
        }
    }

    fn try_handle(
        &mut self,
        now: Instant,
        user: Option<&str>,
        request: &Request,
    ) -> Result<String, ServerError> {
        match request {
            Request::GetUserId(name) => Ok(self.new_user(now, name.as_deref())),
            Request::Status => Ok(self.status(user).as_str().to_string()),
            Request::Allocate => self.allocate(user.ok_or(ServerError::MissingUser)?),
            Request::GetFen => self.getfen(user.ok_or(ServerError::MissingUser)?),
            Request::SetFen(notation) => {
                self.setfen(user.ok_or(ServerError::MissingUser)?, notation)
            }
        }
    }

    fn new_user(&mut self, now: Instant, name: Option<&str>) -> String {
        let base = match name.map(sanitize_name) {
            Some(name) if !name.is_empty() => format!("player_{}", name),
            _ => loop {
                let id: String = (0..GUEST_ID_LEN)
                    .map(|_| {
                        char::from_digit(self.rng.gen_range(0..16), 16).unwrap_or('0')
                    })
                    .collect();
                let id = format!("guest_{}", id);
                if !self.users.contains_key(&id) {
                    break id;
                }
            },
        };
        let mut id = base.clone();
        let mut suffix = 2;
        while self.users.contains_key(&id) {
            id = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        info!("new user {}", id);
        self.users.insert(
            id.clone(),
            User {
                state: UserState::Online,
                last_seen: now,
            },
        );
        id
    }

    fn status(&self, user: Option<&str>) -> Status {
        let found = user.and_then(|u| self.current_match(u).ok().map(|m| (u, m)));
        match found {
            Some((u, m)) if m.role_of(u) == Some(m.turn) => Status::YourTurn,
            Some(_) => Status::OpponentTurn,
            None => Status::WaitingForGame,
        }
    }

    fn allocate(&mut self, user: &str) -> Result<String, ServerError> {
        let entry = self
            .users
            .get_mut(user)
            .ok_or_else(|| ServerError::UnknownUser(user.to_string()))?;
        match entry.state {
            UserState::Queued => return Err(ServerError::AlreadyQueued),
            UserState::InMatch(_) => return Err(ServerError::AlreadyInMatch),
            UserState::Online => {}
        }
        entry.state = UserState::Queued;
        self.queue.push_back(user.to_string());
        self.pair_queued();
        Ok("<ack :: user added to match queue>".to_string())
    }

    fn pair_queued(&mut self) {
        while self.queue.len() >= 2 {
            let (first, second) = match (self.queue.pop_front(), self.queue.pop_front()) {
                (Some(a), Some(b)) => (a, b),
                _ => return,
            };
            let (white, black) = if self.rng.gen_bool(0.5) {
                (first, second)
            } else {
                (second, first)
            };
            let idx = self.next_match;
            self.next_match += 1;
            info!("match {}: {} (white) vs {} (black)", idx, white, black);
            for id in [&white, &black] {
                if let Some(u) = self.users.get_mut(id.as_str()) {
                    u.state = UserState::InMatch(idx);
                }
            }
            self.matches.insert(
                idx,
                Match {
                    white,
                    black,
                    board: Board::initial(),
                    turn: Color::White,
                },
            );
        }
    }

    fn match_index(&self, user: &str) -> Result<u64, ServerError> {
        match self.users.get(user).map(|u| u.state) {
            Some(UserState::InMatch(idx)) if self.matches.contains_key(&idx) => Ok(idx),
            Some(_) => Err(ServerError::NotInMatch),
            None => Err(ServerError::UnknownUser(user.to_string())),
        }
    }

    fn current_match(&self, user: &str) -> Result<&Match, ServerError> {
        let idx = self.match_index(user)?;
        self.matches.get(&idx).ok_or(ServerError::NotInMatch)
    }

    fn getfen(&self, user: &str) -> Result<String, ServerError> {
        let m = self.current_match(user)?;
        Ok(Assignment {
            role: m.role_of(user).ok_or(ServerError::NotInMatch)?,
            notation: m.board.encode(),
        }
        .to_string())
    }

    fn setfen(&mut self, user: &str, notation: &str) -> Result<String, ServerError> {
        let idx = self.match_index(user)?;
        let m = self.matches.get_mut(&idx).ok_or(ServerError::NotInMatch)?;
        if m.role_of(user) != Some(m.turn) {
            return Err(ServerError::NotYourTurn);
        }
        m.board = Board::decode(notation)?;
        m.turn = m.turn.inv();
        debug!("match {}: {} to move", idx, m.turn);
        Ok("<ack :: fen has been updated>".to_string())
    }
}

impl Default for MatchServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Peer bound to one user of a server living in the same thread
#[derive(Clone)]
pub struct LocalPeer {
    server: Rc<RefCell<MatchServer>>,
    user: Option<String>,
}

impl LocalPeer {
    pub fn new(server: Rc<RefCell<MatchServer>>) -> LocalPeer {
        LocalPeer { server, user: None }
    }
}

impl Peer for LocalPeer {
    fn call(&mut self, request: &Request) -> Result<String, PeerError> {
        Ok(self.server.borrow_mut().handle(self.user.as_deref(), request))
    }

    fn set_user(&mut self, user: &str) {
        self.user = Some(user.to_string());
    }
}

fn serve_conn(server: &mut MatchServer, stream: TcpStream, timeout: Duration) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    let mut line = String::new();
    BufReader::new(&stream).read_line(&mut line)?;
    let mut reply = server
        .handle_json(line.trim_end())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    reply.push('\n');
    (&stream).write_all(reply.as_bytes())?;
    (&stream).flush()
}

/// Answers newline-delimited JSON requests on `listener` until `stop` is set
///
/// Each connection carries a single request. Failures of a single connection are logged
/// and do not stop the server.
pub fn serve_tcp(
    server: &mut MatchServer,
    listener: &TcpListener,
    timeout: Duration,
    stop: &AtomicBool,
) -> io::Result<()> {
    listener.set_nonblocking(true)?;
    info!("serving on {}", listener.local_addr()?);
    while !stop.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                if let Err(e) = serve_conn(server, stream, timeout) {
                    warn!("connection from {} failed: {}", addr, e);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(5));
            }
            Err(e) => return Err(e),
        }
    }
    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::INITIAL_NOTATION;
    use crate::peer::TcpPeer;
    use std::sync::Arc;

    fn paired() -> (MatchServer, String, String) {
        let mut s = MatchServer::with_seed(7);
        let a = s.handle(None, &Request::GetUserId(None));
        let b = s.handle(None, &Request::GetUserId(None));
        s.handle(Some(&a), &Request::Allocate);
        s.handle(Some(&b), &Request::Allocate);
        let a_role = Assignment::parse(&s.handle(Some(&a), &Request::GetFen))
            .unwrap()
            .role;
        if a_role == Color::White {
            (s, a, b)
        } else {
            (s, b, a)
        }
    }

    #[test]
    fn test_user_ids() {
        let mut s = MatchServer::with_seed(1);
        let guest = s.handle(None, &Request::GetUserId(None));
        assert!(guest.starts_with("guest_"));
        assert_eq!(guest.len(), "guest_".len() + 20);
        assert!(guest["guest_".len()..].chars().all(|c| c.is_ascii_hexdigit()));

        let named = s.handle(None, &Request::GetUserId(Some("a:b|c d".into())));
        assert_eq!(named, "player_abc_d");
        let again = s.handle(None, &Request::GetUserId(Some("a:b|c d".into())));
        assert_eq!(again, "player_abc_d_2");

        let long = s.handle(
            None,
            &Request::GetUserId(Some("abcdefghijklmnopqrstuvwxyz".into())),
        );
        assert_eq!(long, "player_abcdefghijklmnopqrst");
    }

    #[test]
    fn test_pairing() {
        let mut s = MatchServer::with_seed(3);
        let a = s.handle(None, &Request::GetUserId(None));
        let b = s.handle(None, &Request::GetUserId(None));
        assert_eq!(s.handle(Some(&a), &Request::Status), "<waiting for game>");
        assert_eq!(s.handle(None, &Request::Status), "<waiting for game>");

        assert!(s.handle(Some(&a), &Request::Allocate).starts_with("<ack"));
        assert_eq!(
            s.handle(Some(&a), &Request::Allocate),
            "<err :: user is already in queue>"
        );
        assert_eq!(s.handle(Some(&a), &Request::Status), "<waiting for game>");
        assert_eq!(s.match_count(), 0);

        s.handle(Some(&b), &Request::Allocate);
        assert_eq!(s.match_count(), 1);
        assert_eq!(
            s.handle(Some(&b), &Request::Allocate),
            "<err :: user is already in match>"
        );

        let ra = Assignment::parse(&s.handle(Some(&a), &Request::GetFen)).unwrap();
        let rb = Assignment::parse(&s.handle(Some(&b), &Request::GetFen)).unwrap();
        assert_eq!(ra.role, rb.role.inv());
        assert_eq!(ra.notation, INITIAL_NOTATION);
        assert_eq!(rb.notation, INITIAL_NOTATION);
    }

    #[test]
    fn test_turns() {
        let (mut s, white, black) = paired();
        assert_eq!(s.handle(Some(&white), &Request::Status), "<your turn>");
        assert_eq!(s.handle(Some(&black), &Request::Status), "<opponent turn>");

        let after = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR";
        assert_eq!(
            s.handle(Some(&black), &Request::SetFen(after.into())),
            "<err :: not user turn yet>"
        );
        assert!(s
            .handle(Some(&white), &Request::SetFen("9/8".into()))
            .starts_with("<err :: bad position"));
        assert_eq!(s.handle(Some(&white), &Request::Status), "<your turn>");

        assert!(s
            .handle(Some(&white), &Request::SetFen(after.into()))
            .starts_with("<ack"));
        assert_eq!(s.handle(Some(&white), &Request::Status), "<opponent turn>");
        assert_eq!(s.handle(Some(&black), &Request::Status), "<your turn>");
        assert_eq!(
            s.handle(Some(&black), &Request::GetFen),
            format!("<black :: {}>", after)
        );
    }

    #[test]
    fn test_refusals() {
        let mut s = MatchServer::with_seed(5);
        assert_eq!(
            s.handle(None, &Request::Allocate),
            "<err :: request carries no user id>"
        );
        assert_eq!(
            s.handle(Some("ghost"), &Request::GetFen),
            "<err :: unknown user \"ghost\">"
        );
        assert_eq!(
            s.handle(Some("ghost"), &Request::Allocate),
            "<err :: unknown user \"ghost\">"
        );
        assert_eq!(s.user_count(), 0);
        let a = s.handle(None, &Request::GetUserId(None));
        assert_eq!(
            s.handle(Some(&a), &Request::GetFen),
            "<err :: user not in match>"
        );
    }

    #[test]
    fn test_black_role() {
        let (mut s, white, black) = paired();
        let fen = Assignment::parse(&s.handle(Some(&black), &Request::GetFen)).unwrap();
        assert_eq!(fen.role, Color::Black);
        let fen = Assignment::parse(&s.handle(Some(&white), &Request::GetFen)).unwrap();
        assert_eq!(fen.role, Color::White);

        // A user outside any match has no role
        let c = s.handle(None, &Request::GetUserId(None));
        assert_eq!(s.handle(Some(&c), &Request::Status), "<waiting for game>");
        assert_eq!(
            s.handle(Some(&c), &Request::SetFen(INITIAL_NOTATION.into())),
            "<err :: user not in match>"
        );
    }

    #[test]
    fn test_idle_users() {
        let t0 = Instant::now();
        let secs = |n| t0 + Duration::from_secs(n);
        let mut s = MatchServer::with_seed(11);
        let a = s.handle_at(t0, None, &Request::GetUserId(None));
        let b = s.handle_at(t0, None, &Request::GetUserId(None));
        s.handle_at(t0, Some(&a), &Request::Allocate);
        s.handle_at(t0, Some(&b), &Request::Allocate);
        assert_eq!(s.match_count(), 1);

        let status = s.handle_at(secs(20), Some(&a), &Request::Status);
        assert_ne!(status, "<waiting for game>");
        assert_eq!(s.user_count(), 2);

        // `b` has been silent for 40 seconds, `a` for 20
        assert_eq!(
            s.handle_at(secs(40), Some(&a), &Request::Status),
            "<waiting for game>"
        );
        assert_eq!(s.match_count(), 0);
        assert_eq!(s.user_count(), 1);
        assert_eq!(
            s.handle_at(secs(40), Some(&b), &Request::GetFen),
            format!("<err :: unknown user {:?}>", b)
        );
        assert!(s
            .handle_at(secs(40), Some(&a), &Request::Allocate)
            .starts_with("<ack"));

        // A queued user is dropped from the queue as well
        let d = s.handle_at(secs(75), None, &Request::GetUserId(None));
        assert_eq!(s.user_count(), 1);
        s.handle_at(secs(75), Some(&d), &Request::Allocate);
        assert_eq!(s.match_count(), 0);
        assert_eq!(
            s.handle_at(secs(75), Some(&d), &Request::Status),
            "<waiting for game>"
        );
    }

    #[test]
    fn test_idle_timeout() {
        let t0 = Instant::now();
        let mut s = MatchServer::with_seed(2).with_idle_timeout(Duration::from_secs(5));
        let a = s.handle_at(t0, None, &Request::GetUserId(None));
        s.handle_at(t0 + Duration::from_secs(4), Some(&a), &Request::Status);
        s.handle_at(t0 + Duration::from_secs(8), None, &Request::Status);
        assert_eq!(s.user_count(), 1);
        s.handle_at(t0 + Duration::from_secs(9), None, &Request::Status);
        assert_eq!(s.user_count(), 0);
    }

    #[test]
    fn test_json() {
        let mut s = MatchServer::with_seed(9);
        let reply = s.handle_json(r#"{"request":"get_user_id : ann"}"#).unwrap();
        assert_eq!(reply, r#"{"response":"player_ann"}"#);
        let reply = s
            .handle_json(r#"{"request":"status","user":"player_ann"}"#)
            .unwrap();
        assert_eq!(reply, r#"{"response":"<waiting for game>"}"#);
        let reply = Reply::from_json(&s.handle_json("not json").unwrap()).unwrap();
        assert!(reply.response.starts_with("<err :: bad envelope"));
    }

    #[test]
    fn test_local_peer() {
        let server = Rc::new(RefCell::new(MatchServer::with_seed(11)));
        let mut peer = LocalPeer::new(server.clone());
        let id = peer.call(&Request::GetUserId(Some("zed".into()))).unwrap();
        peer.set_user(&id);
        assert!(peer.call(&Request::Allocate).unwrap().starts_with("<ack"));
        assert_eq!(peer.call(&Request::Status).unwrap(), "<waiting for game>");
        assert_eq!(server.borrow().match_count(), 0);
    }

    #[test]
    fn test_serve_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = stop.clone();
            thread::spawn(move || {
                let mut server = MatchServer::with_seed(13);
                serve_tcp(&mut server, &listener, Duration::from_secs(2), &stop).unwrap();
                server.match_count()
            })
        };

        let timeout = Duration::from_secs(2);
        let mut a = TcpPeer::new(addr.to_string(), timeout);
        let mut b = TcpPeer::new(addr.to_string(), timeout);
        for peer in [&mut a, &mut b] {
            let id = peer.call(&Request::GetUserId(None)).unwrap();
            peer.set_user(&id);
            assert!(peer.call(&Request::Allocate).unwrap().starts_with("<ack"));
        }
        let sa = Status::parse(&a.call(&Request::Status).unwrap()).unwrap();
        let sb = Status::parse(&b.call(&Request::Status).unwrap()).unwrap();
        assert!(!sa.is_waiting());
        assert_ne!(sa, sb);

        stop.store(true, Ordering::Relaxed);
        assert_eq!(handle.join().unwrap(), 1);
    }
}
