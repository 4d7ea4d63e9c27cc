// ── KATCP message codec ──
//
// One message per line:
//
//     <type><name>[<mid>] <arg> <arg> ...
//
// where type is `?` (request), `!` (reply) or `#` (inform), the optional
// message id is a bracketed positive integer, and arguments are separated
// by spaces or tabs. Arguments use backslash escapes; `\@` is the empty
// argument.

use std::fmt;

use thiserror::Error;

/// Errors from parsing one KATCP line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("empty message")]
    Empty,

    #[error("unknown message type '{0}'")]
    BadType(char),

    #[error("invalid message name '{0}'")]
    BadName(String),

    #[error("invalid message id in '{0}'")]
    BadMid(String),

    #[error("invalid escape sequence '\\{0}'")]
    BadEscape(char),

    #[error("trailing backslash")]
    TrailingBackslash,
}

/// Request, reply or inform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Reply,
    Inform,
}

impl MessageKind {
    fn sigil(self) -> char {
        match self {
            Self::Request => '?',
            Self::Reply => '!',
            Self::Inform => '#',
        }
    }

    fn from_sigil(c: char) -> Option<Self> {
        match c {
            '?' => Some(Self::Request),
            '!' => Some(Self::Reply),
            '#' => Some(Self::Inform),
            _ => None,
        }
    }
}

/// A decoded KATCP message. Arguments are held unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub name: String,
    pub mid: Option<u32>,
    pub args: Vec<String>,
}

impl Message {
    pub fn new<I, S>(kind: MessageKind, name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            name: name.to_owned(),
            mid: None,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn request<I, S>(name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MessageKind::Request, name, args)
    }

    pub fn reply<I, S>(name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MessageKind::Reply, name, args)
    }

    pub fn inform<I, S>(name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MessageKind::Inform, name, args)
    }

    /// Attach a message id, typically copied from the request.
    pub fn with_mid(mut self, mid: Option<u32>) -> Self {
        self.mid = mid;
        self
    }

    /// Decode one line (without its line terminator).
    pub fn parse(line: &str) -> Result<Self, MessageError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut words = line.split([' ', '\t']).filter(|w| !w.is_empty());

        let head = words.next().ok_or(MessageError::Empty)?;
        let mut chars = head.chars();
        let sigil = chars.next().ok_or(MessageError::Empty)?;
        let kind = MessageKind::from_sigil(sigil).ok_or(MessageError::BadType(sigil))?;
        let rest = chars.as_str();

        let (name, mid) = match rest.find('[') {
            Some(open) => {
                let (name, tail) = rest.split_at(open);
                let digits = tail
                    .strip_prefix('[')
                    .and_then(|t| t.strip_suffix(']'))
                    .ok_or_else(|| MessageError::BadMid(head.to_owned()))?;
                let mid = digits
                    .parse::<u32>()
                    .ok()
                    .filter(|mid| *mid > 0 && !digits.starts_with('+'))
                    .ok_or_else(|| MessageError::BadMid(head.to_owned()))?;
                (name, Some(mid))
            }
            None => (rest, None),
        };
        if !is_valid_name(name) {
            return Err(MessageError::BadName(name.to_owned()));
        }

        let args = words.map(unescape).collect::<Result<_, _>>()?;
        Ok(Self {
            kind,
            name: name.to_owned(),
            mid,
            args,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.sigil(), self.name)?;
        if let Some(mid) = self.mid {
            write!(f, "[{mid}]")?;
        }
        for arg in &self.args {
            write!(f, " {}", escape(arg))?;
        }
        Ok(())
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Escape one argument for the wire.
pub fn escape(arg: &str) -> String {
    if arg.is_empty() {
        return "\\@".into();
    }
    let mut out = String::with_capacity(arg.len());
    for c in arg.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ' ' => out.push_str("\\_"),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1b' => out.push_str("\\e"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`].
pub fn unescape(arg: &str) -> Result<String, MessageError> {
    if arg == "\\@" {
        return Ok(String::new());
    }
    let mut out = String::with_capacity(arg.len());
    let mut chars = arg.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or(MessageError::TrailingBackslash)?;
        out.push(match escaped {
            '\\' => '\\',
            '_' => ' ',
            '0' => '\0',
            'n' => '\n',
            'r' => '\r',
            'e' => '\x1b',
            't' => '\t',
            other => return Err(MessageError::BadEscape(other)),
        });
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_request_with_arguments() {
        let msg = Message::parse("?set-protocol udps 1024  2048\t4\r\n").unwrap();
        assert_eq!(msg.kind, MessageKind::Request);
        assert_eq!(msg.name, "set-protocol");
        assert_eq!(msg.mid, None);
        assert_eq!(msg.args, vec!["udps", "1024", "2048", "4"]);
    }

    #[test]
    fn parses_message_id() {
        let msg = Message::parse("?record-start[42] scan_1").unwrap();
        assert_eq!(msg.name, "record-start");
        assert_eq!(msg.mid, Some(42));
        assert_eq!(msg.args, vec!["scan_1"]);
    }

    #[test]
    fn rejects_malformed_heads() {
        assert_eq!(Message::parse(""), Err(MessageError::Empty));
        assert_eq!(Message::parse("   "), Err(MessageError::Empty));
        assert_eq!(Message::parse("status"), Err(MessageError::BadType('s')));
        assert_eq!(
            Message::parse("?1status"),
            Err(MessageError::BadName("1status".into()))
        );
        assert_eq!(
            Message::parse("?status[0]"),
            Err(MessageError::BadMid("?status[0]".into()))
        );
        assert_eq!(
            Message::parse("?status[x"),
            Err(MessageError::BadMid("?status[x".into()))
        );
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(escape(""), "\\@");
        assert_eq!(escape("Idle 0B udps 50000"), "Idle\\_0B\\_udps\\_50000");
        assert_eq!(escape("a\\b\tc\nd"), "a\\\\b\\tc\\nd");
        assert_eq!(unescape("Idle\\_0B").unwrap(), "Idle 0B");
        assert_eq!(unescape("\\@").unwrap(), "");
        assert_eq!(unescape("\\e\\0\\r").unwrap(), "\x1b\0\r");
        assert_eq!(unescape("bad\\q"), Err(MessageError::BadEscape('q')));
        assert_eq!(unescape("bad\\"), Err(MessageError::TrailingBackslash));
    }

    #[test]
    fn encodes_reply_with_mid_and_escaped_args() {
        let msg = Message::reply("status", ["ok", "unknown 0B unknown unknown"]).with_mid(Some(7));
        assert_eq!(
            msg.to_string(),
            "!status[7] ok unknown\\_0B\\_unknown\\_unknown"
        );

        let msg = Message::reply("set-port", ["ok", ""]);
        assert_eq!(msg.to_string(), "!set-port ok \\@");
    }

    #[test]
    fn decodes_what_it_encodes() {
        let original = Message::inform("log", ["warn", "a b\\c", ""]).with_mid(Some(3));
        let decoded = Message::parse(&original.to_string()).unwrap();
        assert_eq!(decoded, original);
    }
}
