//! Line-oriented messages exchanged with the agent after connecting
//!
//! Only the minimal subset needed for the handshake and single-line queries
//! is modelled here; multi-line data responses are not.

use std::fmt;

use crate::error::ProtocolError;

/// Exact greeting the agent sends after accepting the token
pub const GREETING: &[u8] = b"OK Pleased to meet you\n";

/// Longest line the agent may send, terminator included
pub const MAX_LINE_LEN: usize = 1002;

/// Single-line command sent to the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `GETINFO <what>` query (e.g. `version`, `pid`)
    GetInfo(String),
    /// No-op, useful as a liveness check
    Nop,
    /// End of session
    Bye,
    /// Any other single-line command, sent verbatim
    Raw(String),
}

impl Command {
    /// The agent version query
    pub fn version() -> Self {
        Command::GetInfo("version".to_string())
    }

    /// Encode the command as one `\n`-terminated protocol line
    ///
    /// Fails if the command text is empty or contains a line break, since it
    /// would then be read as more than one command.
    pub fn to_line(&self) -> Result<String, ProtocolError> {
        let text = self.to_string();
        if text.trim().is_empty() || text.contains(['\n', '\r']) {
            return Err(ProtocolError::InvalidCommand(text));
        }
        Ok(format!("{}\n", text))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::GetInfo(what) => write!(f, "GETINFO {}", what),
            Command::Nop => write!(f, "NOP"),
            Command::Bye => write!(f, "BYE"),
            Command::Raw(text) => write!(f, "{}", text),
        }
    }
}

/// One response line split into status tag and payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status tag before the first space (`D`, `OK`, `ERR`, ...)
    pub tag: String,
    /// Everything after the first space, line terminator removed
    pub payload: String,
}

impl Response {
    /// Parse a `<tag> <payload>\n` line
    ///
    /// Splits on the first space only, so the payload may itself contain
    /// spaces. The trailing `\n` (and a `\r` before it) is optional.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let (tag, rest) = line
            .split_once(' ')
            .ok_or_else(|| ProtocolError::MissingSeparator {
                line: line.to_string(),
            })?;

        let payload = rest.strip_suffix('\n').unwrap_or(rest);
        let payload = payload.strip_suffix('\r').unwrap_or(payload);

        Ok(Self {
            tag: tag.to_string(),
            payload: payload.to_string(),
        })
    }

    /// Whether the agent reported an error
    pub fn is_error(&self) -> bool {
        self.tag == "ERR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_line() {
        let response = Response::parse("D 2.4.0\n").unwrap();
        assert_eq!(response.tag, "D");
        assert_eq!(response.payload, "2.4.0");
    }

    #[test]
    fn test_parse_without_newline() {
        let response = Response::parse("D 2.4.0").unwrap();
        assert_eq!(response.payload, "2.4.0");
    }

    #[test]
    fn test_parse_keeps_spaces_in_payload() {
        let response = Response::parse("ERR 67108881 Not implemented <GPG Agent>\r\n").unwrap();
        assert!(response.is_error());
        assert_eq!(response.payload, "67108881 Not implemented <GPG Agent>");
    }

    #[test]
    fn test_parse_missing_separator() {
        let err = Response::parse("OK\n").unwrap_err();
        assert!(matches!(err, ProtocolError::MissingSeparator { ref line } if line == "OK\n"));
    }

    #[test]
    fn test_command_lines() {
        assert_eq!(Command::version().to_line().unwrap(), "GETINFO version\n");
        assert_eq!(Command::Bye.to_line().unwrap(), "BYE\n");
        assert_eq!(Command::Nop.to_line().unwrap(), "NOP\n");
        assert_eq!(
            Command::Raw("GETINFO pid".into()).to_line().unwrap(),
            "GETINFO pid\n"
        );
    }

    #[test]
    fn test_multi_line_command_rejected() {
        for text in ["GETINFO version\nBYE", "", "   ", "NOP\r"] {
            let err = Command::Raw(text.into()).to_line().unwrap_err();
            assert!(matches!(err, ProtocolError::InvalidCommand(_)));
        }
    }

    #[test]
    fn test_greeting_literal() {
        assert_eq!(GREETING, b"OK Pleased to meet you\n");
    }
}
