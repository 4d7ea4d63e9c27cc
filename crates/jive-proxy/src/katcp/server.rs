// ── KATCP device server ──
//
// Accepts KATCP clients, greets each with `#version-connect` informs,
// answers the built-in requests itself and routes every other request
// name to the bridge. Requests on one connection are answered in order;
// separate connections run concurrently.

use std::io;
use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use jive_api::{ControlChannel, TcpControlChannel};
use jive_core::{Bridge, Reading, RequestKind, SensorId};
use strum::IntoEnumIterator;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::message::{Message, MessageKind};

/// KATCP protocol version advertised to clients.
pub const PROTOCOL_VERSION: &str = "5.0-MI";

/// Device version string, as reported in `#version-connect`.
pub const DEVICE_VERSION: &str = concat!("jive5ab-katcp-proxy ", env!("CARGO_PKG_VERSION"));

const BUILD_STATE: &str = "unknown";
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Requests answered by the server itself, with their help text.
const BUILTIN_REQUESTS: [(&str, &str); 5] = [
    ("help", "Return help on the available requests. Usage: ?help [<request>]"),
    ("watchdog", "Check that the server is still alive. Usage: ?watchdog"),
    ("version-list", "List versions of the server components. Usage: ?version-list"),
    ("sensor-list", "List available sensors. Usage: ?sensor-list [<sensor>]"),
    ("sensor-value", "Report current sensor values. Usage: ?sensor-value [<sensor>]"),
];

/// A bound KATCP listener in front of one bridge.
pub struct KatcpServer<C: ControlChannel = TcpControlChannel> {
    listener: TcpListener,
    bridge: Bridge<C>,
}

impl<C: ControlChannel> KatcpServer<C> {
    pub async fn bind(addr: &str, bridge: Bridge<C>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, bridge })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept clients until `shutdown` fires, then wait for every open
    /// connection to close.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "client connected");
                        let bridge = self.bridge.clone();
                        let shutdown = shutdown.clone();
                        connections.spawn(async move {
                            if let Err(e) = serve_client(stream, &bridge, &shutdown).await {
                                debug!(%peer, error = %e, "client connection ended with error");
                            }
                            debug!(%peer, "client disconnected");
                        });
                    }
                    Err(e) => warn!(error = %e, "failed to accept client"),
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        while connections.join_next().await.is_some() {}
        info!("KATCP server stopped");
    }
}

// ── Per-connection loop ──────────────────────────────────────────────

async fn serve_client<C: ControlChannel>(
    stream: TcpStream,
    bridge: &Bridge<C>,
    shutdown: &CancellationToken,
) -> io::Result<()> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    for inform in version_connect() {
        framed.send(inform.to_string()).await.map_err(io::Error::other)?;
    }

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(()),
            line = framed.next() => line,
        };
        let Some(line) = line else {
            return Ok(());
        };
        let line = line.map_err(io::Error::other)?;
        if line.trim().is_empty() {
            continue;
        }

        let request = match Message::parse(&line) {
            Ok(msg) if msg.kind == MessageKind::Request => msg,
            Ok(msg) => {
                debug!(name = %msg.name, "ignoring non-request message from client");
                continue;
            }
            Err(e) => {
                warn!(line = %line.trim_end(), error = %e, "malformed KATCP message");
                continue;
            }
        };

        for response in respond(bridge, &request).await {
            framed
                .send(response.with_mid(request.mid).to_string())
                .await
                .map_err(io::Error::other)?;
        }
    }
}

/// Informs sent to every client on connect.
fn version_connect() -> [Message; 3] {
    [
        Message::inform("version-connect", ["katcp-protocol", PROTOCOL_VERSION]),
        Message::inform(
            "version-connect",
            ["katcp-library", concat!("jive-proxy-", env!("CARGO_PKG_VERSION"))],
        ),
        Message::inform("version-connect", ["katcp-device", DEVICE_VERSION, BUILD_STATE]),
    ]
}

// ── Request handling ─────────────────────────────────────────────────

/// Informs followed by the final reply for one request.
async fn respond<C: ControlChannel>(bridge: &Bridge<C>, request: &Message) -> Vec<Message> {
    let name = request.name.as_str();
    let args: Vec<&str> = request.args.iter().map(String::as_str).collect();

    match name {
        "help" => help(name, &args),
        "watchdog" => vec![Message::reply(name, ["ok"])],
        "version-list" => version_list(name),
        "sensor-list" => sensor_list(name, &args),
        "sensor-value" => sensor_value(bridge, name, &args),
        _ => {
            let outcome = bridge.handle_named(name, &args).await;
            debug!(request = name, status = %outcome.status, "request handled");
            vec![Message::reply(name, [outcome.status.to_string(), outcome.message])]
        }
    }
}

fn help(name: &str, args: &[&str]) -> Vec<Message> {
    let entries = BUILTIN_REQUESTS
        .iter()
        .copied()
        .chain(RequestKind::iter().map(|kind| (kind.name(), kind.help())));

    let mut informs: Vec<Message> = match args {
        [] => entries
            .map(|(request, text)| Message::inform(name, [request, text]))
            .collect(),
        [wanted] => entries
            .filter(|(request, _)| request == wanted)
            .map(|(request, text)| Message::inform(name, [request, text]))
            .collect(),
        _ => return vec![Message::reply(name, ["fail", "too many arguments"])],
    };

    if informs.is_empty() {
        return vec![Message::reply(name, ["fail", "Unknown request"])];
    }
    let count = informs.len().to_string();
    informs.push(Message::reply(name, ["ok".to_owned(), count]));
    informs
}

fn version_list(name: &str) -> Vec<Message> {
    vec![
        Message::inform(name, ["katcp-protocol", PROTOCOL_VERSION]),
        Message::inform(name, ["katcp-device", DEVICE_VERSION, BUILD_STATE]),
        Message::reply(name, ["ok", "2"]),
    ]
}

/// Sensors named by the optional argument, or all of them.
fn select_sensors(args: &[&str]) -> Result<Vec<SensorId>, &'static str> {
    match args {
        [] => Ok(SensorId::iter().collect()),
        [wanted] => wanted
            .parse::<SensorId>()
            .map(|id| vec![id])
            .map_err(|_| "Unknown sensor name"),
        _ => Err("too many arguments"),
    }
}

fn sensor_list(name: &str, args: &[&str]) -> Vec<Message> {
    let ids = match select_sensors(args) {
        Ok(ids) => ids,
        Err(reason) => return vec![Message::reply(name, ["fail", reason])],
    };

    let mut messages: Vec<Message> = ids
        .iter()
        .map(|id| {
            let units = if *id == SensorId::Bytes { "B" } else { "" };
            Message::inform(
                name,
                [
                    id.name().to_owned(),
                    id.description().to_owned(),
                    units.to_owned(),
                    id.kind().to_string(),
                ],
            )
        })
        .collect();
    messages.push(Message::reply(name, ["ok".to_owned(), ids.len().to_string()]));
    messages
}

fn sensor_value<C: ControlChannel>(bridge: &Bridge<C>, name: &str, args: &[&str]) -> Vec<Message> {
    let ids = match select_sensors(args) {
        Ok(ids) => ids,
        Err(reason) => return vec![Message::reply(name, ["fail", reason])],
    };

    // One snapshot so every reported value comes from the same table.
    let table = bridge.store().snapshot();
    let mut messages: Vec<Message> = ids
        .iter()
        .map(|id| sensor_value_inform(name, *id, table.get(*id)))
        .collect();
    messages.push(Message::reply(name, ["ok".to_owned(), ids.len().to_string()]));
    messages
}

fn sensor_value_inform(name: &str, id: SensorId, reading: &Reading) -> Message {
    Message::inform(
        name,
        [
            katcp_timestamp(reading.timestamp),
            "1".to_owned(),
            id.name().to_owned(),
            reading.status.to_string(),
            reading.value.to_string(),
        ],
    )
}

/// Seconds since the epoch with millisecond precision, as KATCP v5 expects.
fn katcp_timestamp(ts: DateTime<Utc>) -> String {
    format!("{}.{:03}", ts.timestamp(), ts.timestamp_subsec_millis())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use jive_core::BridgeConfig;

    use super::*;

    #[test]
    fn timestamps_have_millisecond_precision() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_042).single();
        assert_eq!(ts.map(katcp_timestamp).as_deref(), Some("1700000000.042"));
    }

    #[test]
    fn help_lists_builtins_and_bridge_requests() {
        let messages = help("help", &[]);
        let reply = messages.last().map(ToString::to_string);
        assert_eq!(reply.as_deref(), Some("!help ok 15"));
        assert!(
            messages
                .iter()
                .any(|m| m.args.first().is_some_and(|a| a == "net2file-status"))
        );

        let messages = help("help", &["record-start"]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].args[1], RequestKind::RecordStart.help());

        let messages = help("help", &["bogus"]);
        assert_eq!(messages[0].to_string(), "!help fail Unknown\\_request");
    }

    #[test]
    fn sensor_list_describes_each_sensor() {
        let messages = sensor_list("sensor-list", &["jive5ab-bytes"]);
        assert_eq!(
            messages[0].to_string(),
            "#sensor-list jive5ab-bytes bytes\\_written B integer"
        );
        assert_eq!(messages[1].to_string(), "!sensor-list ok 1");

        let messages = sensor_list("sensor-list", &["nope"]);
        assert_eq!(
            messages[0].to_string(),
            "!sensor-list fail Unknown\\_sensor\\_name"
        );
    }

    #[test]
    fn sensor_value_reports_defaults() {
        let bridge = Bridge::new(BridgeConfig::default());
        let messages = sensor_value(&bridge, "sensor-value", &[]);

        assert_eq!(messages.len(), 6);
        let error = &messages[4];
        assert_eq!(error.args[2], "jive5ab-error");
        assert_eq!(error.args[3], "nominal");
        assert_eq!(error.args[4], "");
        assert_eq!(messages[5].to_string(), "!sensor-value ok 5");
    }
}
