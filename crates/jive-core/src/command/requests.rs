// ── Typed requests ──
//
// Argument parsing and validation for every structured request. Nothing
// here touches the device: a `Request` that exists is safe to put on the
// control channel.

use std::net::IpAddr;
use std::str::FromStr;

use jive_api::{NetDestination, NetProtocol};

use super::RequestKind;
use crate::error::CoreError;

/// Default socket buffer size for `set-protocol udps`.
pub const DEFAULT_SOCKET_BUFFER: u64 = 33_554_432;

/// Default reader thread count for `set-protocol udps`.
pub const DEFAULT_THREADS: u32 = 4;

/// A validated structured request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Status,
    SetProtocol(NetProtocol),
    SetPort(NetDestination),
    SetDisks(Vec<String>),
    RecordStart { scan_name: String },
    RecordStop,
    RecordStatus,
    /// `None` uses the configured default output path.
    Net2FileStart { path: Option<String> },
    Net2FileStop,
    Net2FileStatus,
}

impl Request {
    /// Parse a request by name.
    ///
    /// Unknown names fail with [`CoreError::UnknownRequest`]; bad
    /// arguments fail with [`CoreError::Validation`].
    pub fn parse(name: &str, args: &[&str]) -> Result<Self, CoreError> {
        let kind = RequestKind::from_str(name).map_err(|_| CoreError::UnknownRequest {
            name: name.to_owned(),
        })?;
        Self::from_kind(kind, args)
    }

    /// Build a request of a known kind from its arguments.
    pub fn from_kind(kind: RequestKind, args: &[&str]) -> Result<Self, CoreError> {
        match kind {
            RequestKind::Status => no_args(args).map(|()| Self::Status),
            RequestKind::SetProtocol => parse_protocol(args).map(Self::SetProtocol),
            RequestKind::SetPort => parse_destination(args).map(Self::SetPort),
            RequestKind::SetDisks => parse_disks(args).map(Self::SetDisks),
            RequestKind::RecordStart => {
                parse_scan_name(args).map(|scan_name| Self::RecordStart { scan_name })
            }
            RequestKind::RecordStop => no_args(args).map(|()| Self::RecordStop),
            RequestKind::RecordStatus => no_args(args).map(|()| Self::RecordStatus),
            RequestKind::Net2FileStart => {
                parse_output_path(args).map(|path| Self::Net2FileStart { path })
            }
            RequestKind::Net2FileStop => no_args(args).map(|()| Self::Net2FileStop),
            RequestKind::Net2FileStatus => no_args(args).map(|()| Self::Net2FileStatus),
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Status => RequestKind::Status,
            Self::SetProtocol(_) => RequestKind::SetProtocol,
            Self::SetPort(_) => RequestKind::SetPort,
            Self::SetDisks(_) => RequestKind::SetDisks,
            Self::RecordStart { .. } => RequestKind::RecordStart,
            Self::RecordStop => RequestKind::RecordStop,
            Self::RecordStatus => RequestKind::RecordStatus,
            Self::Net2FileStart { .. } => RequestKind::Net2FileStart,
            Self::Net2FileStop => RequestKind::Net2FileStop,
            Self::Net2FileStatus => RequestKind::Net2FileStatus,
        }
    }
}

// ── Argument parsers ─────────────────────────────────────────────────

fn no_args(args: &[&str]) -> Result<(), CoreError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CoreError::validation("too many arguments"))
    }
}

fn parse_protocol(args: &[&str]) -> Result<NetProtocol, CoreError> {
    let Some((proto, rest)) = args.split_first() else {
        return Err(CoreError::validation("protocol must be udp or udps"));
    };
    if rest.len() > 3 {
        return Err(CoreError::validation("too many arguments"));
    }

    match proto.to_ascii_lowercase().as_str() {
        "udp" => Ok(NetProtocol::Udp),
        "udps" => Ok(NetProtocol::Udps {
            recv_buf: numeric_arg(rest.first(), "rcv", DEFAULT_SOCKET_BUFFER)?,
            send_buf: numeric_arg(rest.get(1), "snd", DEFAULT_SOCKET_BUFFER)?,
            threads: numeric_arg(rest.get(2), "threads", DEFAULT_THREADS)?,
        }),
        _ => Err(CoreError::validation("protocol must be udp or udps")),
    }
}

fn numeric_arg<T: FromStr>(arg: Option<&&str>, label: &str, default: T) -> Result<T, CoreError> {
    match arg {
        None => Ok(default),
        Some(text) => text
            .parse()
            .map_err(|_| CoreError::validation(format!("invalid {label}: {text}"))),
    }
}

fn parse_destination(args: &[&str]) -> Result<NetDestination, CoreError> {
    let invalid = || CoreError::validation("invalid port");
    let [destination] = args else {
        return Err(invalid());
    };

    let (group, port) = match destination.split_once('@') {
        Some((ip, port)) => (Some(ip.parse::<IpAddr>().map_err(|_| invalid())?), port),
        None => (None, *destination),
    };
    let port: u16 = port.parse().map_err(|_| invalid())?;
    if port == 0 {
        return Err(invalid());
    }
    Ok(NetDestination { group, port })
}

fn parse_disks(args: &[&str]) -> Result<Vec<String>, CoreError> {
    // `?set-disks /mnt/disk0 : /mnt/disk1` passes the separators through.
    let paths: Vec<String> = args
        .iter()
        .filter(|arg| **arg != ":")
        .map(|arg| (*arg).to_owned())
        .collect();
    if paths.is_empty() {
        return Err(CoreError::validation("provide at least one disk path"));
    }
    if let Some(bad) = paths.iter().find(|path| !is_wire_safe(path, &[':', ','])) {
        return Err(CoreError::validation(format!("invalid disk path: {bad}")));
    }
    Ok(paths)
}

fn parse_scan_name(args: &[&str]) -> Result<String, CoreError> {
    let scan_name = match args {
        [] | [""] => return Err(CoreError::validation("scan_name required")),
        [scan_name] => *scan_name,
        _ => return Err(CoreError::validation("too many arguments")),
    };
    if !is_wire_safe(scan_name, &[':', ' ']) {
        return Err(CoreError::validation(format!("invalid scan_name: {scan_name}")));
    }
    Ok(scan_name.to_owned())
}

fn parse_output_path(args: &[&str]) -> Result<Option<String>, CoreError> {
    match args {
        [] => Ok(None),
        [path] if is_wire_safe(path, &[':', ',']) => Ok(Some((*path).to_owned())),
        [path] => Err(CoreError::validation(format!("invalid output_path: {path}"))),
        _ => Err(CoreError::validation("too many arguments")),
    }
}

/// A value can be embedded in a command if it is non-empty and holds no
/// terminator, control character, or any of `forbidden`.
fn is_wire_safe(value: &str, forbidden: &[char]) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|c| c == ';' || c.is_control() || forbidden.contains(&c))
}
