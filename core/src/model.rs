use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::records::{Alert, ConsoleLight, Cover, Input, Output, Supply};
use crate::store::WatchedStore;
use crate::{targets, Error};

pub const DEFAULT_SNMP_PORT: u16 = 161;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpAddress {
    pub host: String,
    #[serde(default = "default_snmp_port")]
    pub port: u16,
}

impl SnmpAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn with_default_port(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SNMP_PORT,
        }
    }
}

impl fmt::Display for SnmpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

fn default_snmp_port() -> u16 {
    DEFAULT_SNMP_PORT
}

/// sysUpTime in hundredths of a second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeticks(pub u32);

impl fmt::Display for Timeticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ticks = u64::from(self.0);
        let millis = (ticks % 100) * 10;
        let seconds = ticks / 100;
        write!(
            f,
            "{}d {}h {}m {}s {}ms",
            seconds / 86_400,
            seconds / 3_600 % 24,
            seconds / 60 % 60,
            seconds % 60,
            millis
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedPrinter {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl WatchedPrinter {
    pub fn last_seen_label(&self) -> String {
        self.last_seen
            .map(|value| value.to_rfc3339())
            .unwrap_or_else(|| "never".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Printer {
    address: Ipv4Addr,
    pub name: String,
    pub location: String,
    pub description: String,
    pub contact: String,
    pub uptime: Timeticks,
    pub last_updated: Option<DateTime<Utc>>,
    pub monitored: bool,
    pub console_text: String,
    pub alerts: BTreeMap<u32, Alert>,
    pub supplies: BTreeMap<u32, Supply>,
    pub covers: BTreeMap<u32, Cover>,
    pub inputs: BTreeMap<u32, Input>,
    pub outputs: BTreeMap<u32, Output>,
    pub console_lights: BTreeMap<u32, ConsoleLight>,
}

impl Printer {
    pub fn new(address: Ipv4Addr) -> Self {
        Self {
            address,
            name: String::new(),
            location: String::new(),
            description: String::new(),
            contact: String::new(),
            uptime: Timeticks::default(),
            last_updated: None,
            monitored: false,
            console_text: String::new(),
            alerts: BTreeMap::new(),
            supplies: BTreeMap::new(),
            covers: BTreeMap::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            console_lights: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn snmp_address(&self, port: u16) -> SnmpAddress {
        SnmpAddress::new(self.address.to_string(), port)
    }

    pub fn watched_entry(&self) -> WatchedPrinter {
        WatchedPrinter {
            name: self.name.clone(),
            location: self.location.clone(),
            last_seen: self.last_updated,
        }
    }

    /// Adds the printer to (or removes it from) the watched store. With no
    /// explicit choice the current state is toggled. Afterwards `monitored`
    /// is true only if an insert actually wrote a row.
    pub fn set_monitored(
        &mut self,
        store: &dyn WatchedStore,
        monitor: Option<bool>,
    ) -> Result<bool, Error> {
        let monitor = monitor.unwrap_or(!self.monitored);
        self.monitored = if monitor {
            store.upsert(self.address, self.watched_entry())?
        } else {
            store.delete(self.address)?;
            false
        };
        info!(
            target: targets::STORAGE,
            address = %self.address,
            monitored = self.monitored,
            "Watch state changed"
        );
        Ok(self.monitored)
    }
}

impl PartialEq for Printer {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Printer {}

impl Hash for Printer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Display for Printer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {} ({})", self.name, self.location, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn printers_compare_by_address_only() {
        let mut first = Printer::new(Ipv4Addr::new(10, 0, 0, 5));
        first.name = "Lobby".to_string();
        let mut second = Printer::new(Ipv4Addr::new(10, 0, 0, 5));
        second.name = "Renamed".to_string();
        second.uptime = Timeticks(42);

        assert_eq!(first, second);
        assert_ne!(first, Printer::new(Ipv4Addr::new(10, 0, 0, 6)));
        assert_eq!(first.to_string(), "Lobby in  (10.0.0.5)");
    }

    #[test]
    fn timeticks_render_as_duration() {
        // 1 day, 2 hours, 3 minutes, 4.56 seconds
        let ticks = ((86_400 + 2 * 3_600 + 3 * 60 + 4) * 100 + 56) as u32;
        assert_eq!(Timeticks(ticks).to_string(), "1d 2h 3m 4s 560ms");
        assert_eq!(Timeticks(0).to_string(), "0d 0h 0m 0s 0ms");
    }

    #[test]
    fn watched_printer_roundtrip() {
        let entry = WatchedPrinter {
            name: "Finance MFP".to_string(),
            location: "Floor 2".to_string(),
            last_seen: Some(
                DateTime::parse_from_rfc3339("2024-05-01T08:30:00Z")
                    .expect("timestamp")
                    .with_timezone(&Utc),
            ),
        };

        let text = ron::ser::to_string_pretty(&entry, ron::ser::PrettyConfig::default())
            .expect("serialize RON");
        let decoded: WatchedPrinter = ron::from_str(&text).expect("deserialize RON");
        assert_eq!(decoded, entry);
        assert_eq!(decoded.last_seen_label(), "2024-05-01T08:30:00+00:00");
    }

    #[test]
    fn monitor_toggles_store_membership() {
        let store = MemoryStore::default();
        let mut printer = Printer::new(Ipv4Addr::new(10, 0, 0, 7));
        printer.name = "Warehouse".to_string();

        assert!(printer.set_monitored(&store, None).expect("watch"));
        assert!(store.list_watched().expect("list").contains_key(&printer.address()));

        assert!(!printer.set_monitored(&store, None).expect("unwatch"));
        assert!(store.list_watched().expect("list").is_empty());
    }
}
