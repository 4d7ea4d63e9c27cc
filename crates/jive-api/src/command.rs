// ── Control channel commands ──
//
// Typed forms of the jive5ab commands the proxy issues. `Display` renders
// the wire text without the terminator; the transport appends it.

use std::fmt;
use std::net::IpAddr;

/// Status queries, rendered as `<keyword>?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Status,
    NetProtocol,
    NetPort,
    Net2File,
    Record,
}

impl Query {
    /// The command keyword, as echoed back in the reply.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::NetProtocol => "net_protocol",
            Self::NetPort => "net_port",
            Self::Net2File => "net2file",
            Self::Record => "record",
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?", self.keyword())
    }
}

/// Network protocol settings for `net_protocol = ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetProtocol {
    Udp,
    /// UDP with sequence numbers, plus socket buffer sizes and reader threads.
    Udps {
        recv_buf: u64,
        send_buf: u64,
        threads: u32,
    },
}

impl fmt::Display for NetProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => f.write_str("udp"),
            Self::Udps {
                recv_buf,
                send_buf,
                threads,
            } => write!(f, "udps : {recv_buf} : {send_buf} : {threads}"),
        }
    }
}

/// Destination for `net_port = ...`: a bare port, or a multicast group and port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetDestination {
    pub group: Option<IpAddr>,
    pub port: u16,
}

impl fmt::Display for NetDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.group {
            Some(group) => write!(f, "{group}@{}", self.port),
            None => write!(f, "{}", self.port),
        }
    }
}

/// Steps of the legacy `net2file` capture state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Net2FileAction {
    Open { path: String },
    Connect,
    On,
    Off,
    Flush,
    Close,
}

impl fmt::Display for Net2FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path } => write!(f, "open : {path}, w"),
            Self::Connect => f.write_str("connect"),
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Flush => f.write_str("flush"),
            Self::Close => f.write_str("close"),
        }
    }
}

/// Every command the proxy sends to jive5ab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query(Query),
    SetNetProtocol(NetProtocol),
    SetNetPort(NetDestination),
    SetDisks(Vec<String>),
    RecordOn { scan_name: String },
    RecordOff,
    Net2File(Net2FileAction),
}

impl Command {
    /// The command keyword, as echoed back in the reply.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Query(query) => query.keyword(),
            Self::SetNetProtocol(_) => "net_protocol",
            Self::SetNetPort(_) => "net_port",
            Self::SetDisks(_) => "set_disks",
            Self::RecordOn { .. } | Self::RecordOff => "record",
            Self::Net2File(_) => "net2file",
        }
    }

    /// Returns `true` for `<keyword>?` queries that leave device state alone.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}

impl From<Query> for Command {
    fn from(query: Query) -> Self {
        Self::Query(query)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(query) => fmt::Display::fmt(query, f),
            Self::SetNetProtocol(proto) => write!(f, "net_protocol = {proto}"),
            Self::SetNetPort(dest) => write!(f, "net_port = {dest}"),
            Self::SetDisks(paths) => write!(f, "set_disks = {}", paths.join(":")),
            Self::RecordOn { scan_name } => write!(f, "record = on:{scan_name}"),
            Self::RecordOff => f.write_str("record = off"),
            Self::Net2File(action) => write!(f, "net2file = {action}"),
        }
    }
}
