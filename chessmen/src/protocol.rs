//! Wire protocol between a player and the match authority
//!
//! Every exchange is a single request answered by a single reply. Requests are plain
//! strings like `status` or `setfen : <notation>`, carried in a JSON envelope together
//! with the user id once it is known.

use crate::types::{Color, ColorParseError};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error interpreting a request or a reply
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ProtocolError {
    #[error("unknown request {0:?}")]
    UnknownRequest(String),
    #[error("unknown status {0:?}")]
    UnknownStatus(String),
    #[error("malformed position reply {0:?}")]
    MalformedPosition(String),
    #[error("unknown role: {0}")]
    UnknownRole(#[from] ColorParseError),
    #[error("bad envelope: {0}")]
    BadEnvelope(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        ProtocolError::BadEnvelope(e.to_string())
    }
}

const SEP: &str = " :: ";

/// Request sent to the match authority
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Request {
    /// Asks for a fresh user id, optionally derived from a player name
    GetUserId(Option<String>),
    /// Enters the queue of users waiting for a match
    Allocate,
    /// Asks whether the game started and whose turn it is
    Status,
    /// Asks for the caller's role and the current position
    GetFen,
    /// Pushes the position after a local move
    SetFen(String),
}

impl Request {
    /// Parses a request from its wire form
    pub fn parse(s: &str) -> Result<Request, ProtocolError> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix("setfen") {
            if let Some(notation) = rest.trim_start().strip_prefix(':') {
                return Ok(Request::SetFen(notation.trim().to_string()));
            }
        }
        if let Some(rest) = s.strip_prefix("get_user_id") {
            let rest = rest.trim_start();
            if rest.is_empty() {
                return Ok(Request::GetUserId(None));
            }
            if let Some(name) = rest.strip_prefix(':') {
                return Ok(Request::GetUserId(Some(name.trim().to_string())));
            }
        }
        match s {
            "allocate" => Ok(Request::Allocate),
            "status" => Ok(Request::Status),
            "getfen" => Ok(Request::GetFen),
            _ => Err(ProtocolError::UnknownRequest(s.to_string())),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Request::GetUserId(None) => write!(f, "get_user_id"),
            Request::GetUserId(Some(name)) => write!(f, "get_user_id : {}", name),
            Request::Allocate => write!(f, "allocate"),
            Request::Status => write!(f, "status"),
            Request::GetFen => write!(f, "getfen"),
            Request::SetFen(notation) => write!(f, "setfen : {}", notation),
        }
    }
}

/// Game status as reported by the match authority
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    WaitingForGame,
    OpponentTurn,
    YourTurn,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::WaitingForGame => "<waiting for game>",
            Status::OpponentTurn => "<opponent turn>",
            Status::YourTurn => "<your turn>",
        }
    }

    pub fn parse(s: &str) -> Result<Status, ProtocolError> {
        match s.trim() {
            "<waiting for game>" => Ok(Status::WaitingForGame),
            "<opponent turn>" => Ok(Status::OpponentTurn),
            "<your turn>" => Ok(Status::YourTurn),
            other => Err(ProtocolError::UnknownStatus(other.to_string())),
        }
    }

    #[inline]
    pub fn is_waiting(&self) -> bool {
        matches!(self, Status::WaitingForGame)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(self.as_str())
    }
}

/// Reply to [`Request::GetFen`]: the caller's role and the authoritative notation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Assignment {
    pub role: Color,
    pub notation: String,
}

impl Assignment {
    /// Parses a reply like `<white :: rnbqkbnr/...>`
    ///
    /// Exactly one character is stripped from each end before splitting.
    pub fn parse(s: &str) -> Result<Assignment, ProtocolError> {
        let malformed = || ProtocolError::MalformedPosition(s.to_string());
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if chars.next().is_none() || chars.next_back().is_none() {
            return Err(malformed());
        }
        let (role, notation) = chars.as_str().split_once(SEP).ok_or_else(malformed)?;
        Ok(Assignment {
            role: role.trim().parse()?,
            notation: notation.trim().to_string(),
        })
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "<{}{}{}>", self.role, SEP, self.notation)
    }
}

/// Formats a refusal acknowledgement like `<err :: not your turn>`
pub fn refusal(msg: impl fmt::Display) -> String {
    format!("<err{}{}>", SEP, msg)
}

/// JSON envelope around a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub request: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Envelope {
    pub fn new(request: &Request, user: Option<&str>) -> Envelope {
        Envelope {
            request: request.to_string(),
            user: user.map(str::to_string),
        }
    }

    pub fn request(&self) -> Result<Request, ProtocolError> {
        Request::parse(&self.request)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Envelope, ProtocolError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// JSON envelope around a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub response: String,
}

impl Reply {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Reply, ProtocolError> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests() {
        for (s, req) in [
            ("get_user_id", Request::GetUserId(None)),
            ("get_user_id : bob", Request::GetUserId(Some("bob".into()))),
            ("allocate", Request::Allocate),
            ("status", Request::Status),
            ("getfen", Request::GetFen),
            ("setfen : 8/8/8/8/8/8/8/R7", Request::SetFen("8/8/8/8/8/8/8/R7".into())),
        ] {
            assert_eq!(Request::parse(s), Ok(req.clone()));
            assert_eq!(req.to_string(), s);
        }
        assert_eq!(Request::parse("setfen:8/8"), Ok(Request::SetFen("8/8".into())));
        assert_eq!(
            Request::parse("resign"),
            Err(ProtocolError::UnknownRequest("resign".into()))
        );
        assert!(Request::parse("setfen").is_err());
        assert!(Request::parse("getfenx").is_err());
    }

    #[test]
    fn test_status() {
        assert_eq!(Status::parse("<waiting for game>"), Ok(Status::WaitingForGame));
        assert_eq!(Status::parse("<opponent turn>\n"), Ok(Status::OpponentTurn));
        assert_eq!(Status::parse("<your turn>"), Ok(Status::YourTurn));
        assert_eq!(
            Status::parse("your turn"),
            Err(ProtocolError::UnknownStatus("your turn".into()))
        );
        assert_eq!(Status::YourTurn.to_string(), "<your turn>");
    }

    #[test]
    fn test_assignment() {
        let a = Assignment::parse("<black :: rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR>").unwrap();
        assert_eq!(a.role, Color::Black);
        assert_eq!(a.notation, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
        assert_eq!(
            a.to_string(),
            "<black :: rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR>"
        );

        assert_eq!(
            Assignment::parse("<white 8/8>"),
            Err(ProtocolError::MalformedPosition("<white 8/8>".into()))
        );
        assert!(Assignment::parse("").is_err());
        assert!(Assignment::parse("<").is_err());
        assert!(matches!(
            Assignment::parse("<red :: 8/8/8/8/8/8/8/8>"),
            Err(ProtocolError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_envelopes() {
        let env = Envelope::new(&Request::Status, Some("guest_0123"));
        let json = env.to_json().unwrap();
        assert_eq!(json, r#"{"request":"status","user":"guest_0123"}"#);
        assert_eq!(Envelope::from_json(&json), Ok(env));

        let env = Envelope::new(&Request::GetUserId(None), None);
        assert_eq!(env.to_json().unwrap(), r#"{"request":"get_user_id"}"#);
        assert_eq!(
            Envelope::from_json(r#"{"request":"allocate"}"#).unwrap().request(),
            Ok(Request::Allocate)
        );

        assert_eq!(
            Reply::from_json(r#"{"response":"<your turn>"}"#),
            Ok(Reply {
                response: "<your turn>".into()
            })
        );
        assert!(matches!(
            Reply::from_json("{}"),
            Err(ProtocolError::BadEnvelope(_))
        ));
    }
}
