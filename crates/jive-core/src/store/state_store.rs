// ── Central sensor store ──
//
// Holds every sensor reading in one table behind a `watch` channel.
// Readers borrow or clone without ever touching the device; writers are
// crate-private and replace a whole value group in one `send_modify`.

use chrono::{DateTime, Utc};
use jive_api::ProgressReport;
use tokio::sync::watch;

use super::sensor::{Reading, SensorId, SensorStatus, SensorValue};

/// One reading per sensor. Always fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorTable {
    pub state: Reading,
    pub bytes: Reading,
    pub protocol: Reading,
    pub port: Reading,
    pub error: Reading,
}

impl SensorTable {
    fn initial(now: DateTime<Utc>) -> Self {
        Self {
            state: Reading::initial(SensorId::State, now),
            bytes: Reading::initial(SensorId::Bytes, now),
            protocol: Reading::initial(SensorId::Protocol, now),
            port: Reading::initial(SensorId::Port, now),
            error: Reading::initial(SensorId::Error, now),
        }
    }

    pub fn get(&self, id: SensorId) -> &Reading {
        match id {
            SensorId::State => &self.state,
            SensorId::Bytes => &self.bytes,
            SensorId::Protocol => &self.protocol,
            SensorId::Port => &self.port,
            SensorId::Error => &self.error,
        }
    }

    fn get_mut(&mut self, id: SensorId) -> &mut Reading {
        match id {
            SensorId::State => &mut self.state,
            SensorId::Bytes => &mut self.bytes,
            SensorId::Protocol => &mut self.protocol,
            SensorId::Port => &mut self.port,
            SensorId::Error => &mut self.error,
        }
    }

    fn write(&mut self, id: SensorId, value: SensorValue, now: DateTime<Utc>) {
        let reading = self.get_mut(id);
        reading.value = value;
        reading.timestamp = now;
    }

    /// Compact one-line summary: `<state> <bytes>B <protocol> <port>`.
    pub fn status_line(&self) -> String {
        format!(
            "{} {}B {} {}",
            self.state.value, self.bytes.value, self.protocol.value, self.port.value
        )
    }
}

/// Shared store for the bridge's published sensors.
///
/// `get` and `snapshot` never block on the device and never fail. Only
/// the poll scheduler and the request dispatcher write.
pub struct StateStore {
    table: watch::Sender<SensorTable>,
}

impl StateStore {
    pub fn new() -> Self {
        let (table, _) = watch::channel(SensorTable::initial(Utc::now()));
        Self { table }
    }

    /// Clone of one sensor's current reading.
    pub fn get(&self, id: SensorId) -> Reading {
        self.table.borrow().get(id).clone()
    }

    /// Clone of one sensor's current value.
    pub fn value(&self, id: SensorId) -> SensorValue {
        self.table.borrow().get(id).value.clone()
    }

    /// Consistent copy of every reading.
    pub fn snapshot(&self) -> SensorTable {
        self.table.borrow().clone()
    }

    /// Subscribe to table changes.
    pub fn subscribe(&self) -> watch::Receiver<SensorTable> {
        self.table.subscribe()
    }

    pub fn status_line(&self) -> String {
        self.table.borrow().status_line()
    }

    // ── Crate-private writers ────────────────────────────────────────

    /// Write state and byte count together.
    pub(crate) fn apply_progress(&self, report: ProgressReport) {
        let now = Utc::now();
        self.table.send_modify(|table| {
            table.write(SensorId::State, SensorValue::Text(report.state), now);
            table.write(SensorId::Bytes, SensorValue::Integer(report.bytes), now);
        });
    }

    pub(crate) fn set_text(&self, id: SensorId, value: String) {
        let now = Utc::now();
        self.table.send_modify(|table| {
            table.write(id, SensorValue::Text(value), now);
        });
    }

    /// Overwrite the error record with a failure message.
    pub(crate) fn record_error(&self, message: String) {
        let now = Utc::now();
        self.table.send_modify(|table| {
            table.write(SensorId::Error, SensorValue::Text(message), now);
            table.error.status = SensorStatus::Error;
        });
    }

    /// Clear the error record after a successful device interaction.
    pub(crate) fn clear_error(&self) {
        let now = Utc::now();
        self.table.send_if_modified(|table| {
            if table.error.status == SensorStatus::Nominal {
                return false;
            }
            table.write(SensorId::Error, SensorValue::Text(String::new()), now);
            table.error.status = SensorStatus::Nominal;
            true
        });
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
