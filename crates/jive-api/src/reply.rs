// ── Reply parsing ──
//
// jive5ab replies look like
//
//     !<keyword>? <code> : <field> : <field> ... ;
//     !<keyword> = <code> [: <field> ...] ;
//
// `Reply::parse` tokenizes that grammar on `:` and whitespace. The typed
// extractors below never fail: text that does not match the expected shape
// (including a reply to a different command) yields a documented fallback,
// or `None` where the caller shows the raw reply instead.

/// Fallback for text values that could not be extracted.
pub const UNKNOWN: &str = "unknown";

/// Whether a reply answers a query (`?`) or an assignment (`=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Query,
    Assignment,
}

/// A reply split into its grammatical parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply<'a> {
    pub keyword: &'a str,
    pub kind: ReplyKind,
    pub code: i32,
    pub fields: Vec<&'a str>,
}

impl<'a> Reply<'a> {
    /// Tokenize the first reply found in `text`.
    ///
    /// Returns `None` when there is no `!`, no `?`/`=` separator, or no
    /// integer return code.
    pub fn parse(text: &'a str) -> Option<Self> {
        let start = text.find('!')?;
        let rest = text.get(start + 1..)?;
        let body = match rest.find(';') {
            Some(end) => rest.get(..end)?,
            None => rest.split(['\r', '\n']).next().unwrap_or_default(),
        };

        let mut segments = body.split(':');
        let head = segments.next()?;

        let (keyword, kind, code_text) = if let Some(pos) = head.find('?') {
            (head.get(..pos)?, ReplyKind::Query, head.get(pos + 1..)?)
        } else if let Some(pos) = head.find('=') {
            (head.get(..pos)?, ReplyKind::Assignment, head.get(pos + 1..)?)
        } else {
            return None;
        };

        let keyword = keyword.trim();
        if keyword.is_empty() || keyword.contains(char::is_whitespace) {
            return None;
        }
        let code = code_text.trim().parse().ok()?;
        let fields = segments.map(str::trim).collect();

        Some(Self {
            keyword,
            kind,
            code,
            fields,
        })
    }

    /// Returns `true` if this reply answers `keyword` in the given form.
    pub fn answers(&self, keyword: &str, kind: ReplyKind) -> bool {
        self.keyword == keyword && self.kind == kind
    }
}

/// A `<state> : <bytes>` pair, as reported by `status?`, `net2file?` and `record?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub state: String,
    pub bytes: u64,
}

impl ProgressReport {
    /// The fallback report: state `"unknown"`, zero bytes.
    pub fn unknown() -> Self {
        Self {
            state: UNKNOWN.into(),
            bytes: 0,
        }
    }
}

impl Default for ProgressReport {
    fn default() -> Self {
        Self::unknown()
    }
}

/// How the device answered an assignment command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// Return code 0.
    Done,
    /// Return code 1: accepted and still in progress.
    Initiated,
    /// Any other return code, with the remaining fields joined for context.
    Rejected { code: i32, detail: String },
    /// No recognisable assignment reply for the expected keyword.
    Unrecognised,
}

/// Extract state and byte count from a `status?` reply.
pub fn parse_status(text: &str) -> ProgressReport {
    progress(text, "status").unwrap_or_default()
}

/// Extract state and byte count from a `net2file?` reply.
pub fn parse_net2file(text: &str) -> Option<ProgressReport> {
    progress(text, "net2file")
}

/// Extract state and byte count from a `record?` reply.
///
/// Not every jive5ab build reports a byte count here, so the caller gets
/// `None` and decides how to present the raw text.
pub fn parse_record(text: &str) -> Option<ProgressReport> {
    progress(text, "record")
}

/// Extract the protocol name from a `net_protocol?` reply.
pub fn parse_protocol(text: &str) -> String {
    Reply::parse(text)
        .filter(|r| r.answers("net_protocol", ReplyKind::Query))
        .and_then(|r| r.fields.first().copied())
        .filter(|field| is_word(field))
        .map_or_else(|| UNKNOWN.into(), str::to_owned)
}

/// Extract the configured destination from a `net_port?` reply.
///
/// The whole field list is kept, so `239.1.2.3@50000` and any trailing
/// fields survive as reported.
pub fn parse_port(text: &str) -> String {
    Reply::parse(text)
        .filter(|r| r.answers("net_port", ReplyKind::Query))
        .map(|r| r.fields.join(" : "))
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| UNKNOWN.into())
}

/// Interpret the reply to an assignment (`<keyword> = ...`) command.
pub fn parse_ack(text: &str, keyword: &str) -> Ack {
    let Some(reply) = Reply::parse(text).filter(|r| r.answers(keyword, ReplyKind::Assignment))
    else {
        return Ack::Unrecognised;
    };
    match reply.code {
        0 => Ack::Done,
        1 => Ack::Initiated,
        code => Ack::Rejected {
            code,
            detail: reply.fields.join(" : "),
        },
    }
}

fn progress(text: &str, keyword: &str) -> Option<ProgressReport> {
    let reply = Reply::parse(text)?;
    if !reply.answers(keyword, ReplyKind::Query) {
        return None;
    }
    let state = reply.fields.first().copied().filter(|s| is_word(s))?;
    let bytes = reply.fields.get(1)?.parse().ok()?;
    Some(ProgressReport {
        state: state.to_owned(),
        bytes,
    })
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
