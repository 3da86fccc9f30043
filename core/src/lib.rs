pub mod cancel;
pub mod config;
pub mod device;
pub mod discovery;
pub mod error;
pub mod mib;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod oids;
pub mod reconcile;
pub mod records;
pub mod snmp;
pub mod store;
pub mod table;
pub mod targets;
pub mod values;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::CancellationToken;
pub use config::{MonitorConfig, TimingConfig};
pub use device::{DeviceClient, PrinterHandle, SystemUpdate};
pub use discovery::{
    default_discovery_range, parse_address, validate_address, AddressRange, DiscoveryScanner,
    ScanEvent, ScanReport, ScanState,
};
pub use error::{Error, StorageAction, ValidationError, ValidationReport};
pub use model::{Printer, SnmpAddress, Timeticks, WatchedPrinter, DEFAULT_SNMP_PORT};
pub use monitor::Monitor;
pub use notify::{CollectingNotifier, LogNotifier, Notification, Notifier, Severity};
pub use reconcile::{
    DisplayedAlert, DisplayedState, DisplayedSupply, Observation, Owner, ReconcileSettings,
    Reconciler,
};
pub use records::{Alert, ConsoleLight, Cover, Input, LightState, Output, Supply, TableKind};
pub use snmp::{
    MockSnmpClient, Oid, OidParseError, Profile, SnmpClient, SnmpConfig, SnmpFuture,
    SnmpProfiles, SnmpRequest, SnmpResponse, SnmpSetRequest, SnmpV1Client, SnmpValue,
    SnmpVarBind, SnmpWalkRequest,
};
pub use store::{MemoryStore, RonStore, WatchedSet, WatchedStore};
pub use table::{decode_table, decode_table_with_width, Row};
