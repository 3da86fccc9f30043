use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;

use get_if_addrs::{get_if_addrs, IfAddr};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::device::DeviceClient;
use crate::model::Printer;
use crate::snmp::Profile;
use crate::{targets, ValidationError, ValidationReport};

pub const DEFAULT_DISCOVERY_CONCURRENCY: usize = 24;

/// Parses a dotted-quad address, accepting only its canonical spelling.
pub fn parse_address(text: &str) -> Option<Ipv4Addr> {
    let address: Ipv4Addr = text.parse().ok()?;
    (address.to_string() == text).then_some(address)
}

pub fn validate_address(text: &str) -> Result<Ipv4Addr, ValidationError> {
    parse_address(text).ok_or_else(|| ValidationError::InvalidAddress(text.to_string()))
}

// Numeric reading used only to order a range whose ends may be non-canonical.
fn loose_address(text: &str) -> Option<u32> {
    let mut octets = [0u8; 4];
    let mut parts = text.trim().split('.');
    for octet in &mut octets {
        *octet = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(u32::from_be_bytes(octets))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    start: u32,
    end: u32,
}

impl AddressRange {
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationReport> {
        let mut report = ValidationReport::default();
        let start_address = parse_address(start);
        let end_address = parse_address(end);

        if start_address.is_none() {
            report.push(ValidationError::InvalidStart(start.to_string()));
        }
        if end_address.is_none() {
            report.push(ValidationError::InvalidEnd(end.to_string()));
        }

        let start_value = start_address.map(ipv4_to_u32).or_else(|| loose_address(start));
        let end_value = end_address.map(ipv4_to_u32).or_else(|| loose_address(end));
        if let (Some(first), Some(last)) = (start_value, end_value) {
            if first > last {
                report.push(ValidationError::StartAfterEnd {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }

        let start = start_value.unwrap_or_default();
        let end = end_value.unwrap_or_default();
        report.into_result(|| Self { start, end })
    }

    pub fn from_cidr(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        let invalid = |details: String| ValidationError::InvalidCidr {
            value: value.to_string(),
            details,
        };

        let (addr, prefix) = value
            .split_once('/')
            .ok_or_else(|| invalid("CIDR must include a /prefix".to_string()))?;
        let ip = parse_address(addr).ok_or_else(|| invalid(format!("Invalid IPv4 address: {addr}")))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| invalid(format!("Invalid prefix length: {prefix}")))?;
        if prefix > 32 {
            return Err(invalid(format!("Prefix length out of range: {prefix}")));
        }

        Ok(Self::from_network(ip, prefix))
    }

    fn from_network(ip: Ipv4Addr, prefix: u8) -> Self {
        let mask = prefix_to_mask(prefix);
        let network = ipv4_to_u32(ip) & mask;
        let broadcast = network | !mask;

        if prefix <= 30 {
            Self {
                start: network + 1,
                end: broadcast - 1,
            }
        } else {
            Self {
                start: network,
                end: broadcast,
            }
        }
    }

    pub fn single(address: Ipv4Addr) -> Self {
        let value = ipv4_to_u32(address);
        Self {
            start: value,
            end: value,
        }
    }

    pub fn start(&self) -> Ipv4Addr {
        u32_to_ipv4(self.start)
    }

    pub fn end(&self) -> Ipv4Addr {
        u32_to_ipv4(self.end)
    }

    pub fn len(&self) -> u64 {
        u64::from(self.end) - u64::from(self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> AddressIter {
        AddressIter {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start(), self.end())
    }
}

impl IntoIterator for &AddressRange {
    type Item = Ipv4Addr;
    type IntoIter = AddressIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct AddressIter {
    next: Option<u32>,
    end: u32,
}

impl Iterator for AddressIter {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if current < self.end {
            Some(current + 1)
        } else {
            None
        };
        Some(u32_to_ipv4(current))
    }
}

pub fn default_discovery_range() -> Option<AddressRange> {
    let interfaces = get_if_addrs().ok()?;
    for iface in interfaces {
        let addr = match iface.addr {
            IfAddr::V4(v4) => v4,
            _ => continue,
        };
        if addr.ip.is_loopback() || addr.ip.is_link_local() {
            continue;
        }

        let Some(prefix) = netmask_to_prefix(addr.netmask) else {
            continue;
        };
        if prefix == 32 {
            continue;
        }
        debug!(
            target: targets::DISCOVERY,
            interface = %iface.name,
            ip = %addr.ip,
            prefix,
            "Default discovery interface"
        );
        return Some(AddressRange::from_network(addr.ip, prefix));
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Stopping,
    Completed,
    Stopped,
}

impl ScanState {
    pub fn label(self) -> &'static str {
        match self {
            ScanState::Idle => "Ready.",
            ScanState::Scanning => "Discovering...",
            ScanState::Stopping => "Stopping...",
            ScanState::Completed => "Completed.",
            ScanState::Stopped => "Stopped.",
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, ScanState::Completed | ScanState::Stopped)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub enum ScanEvent {
    Started { total: u64 },
    Found(Printer),
    Progress { completed: u64, total: u64 },
    Stopping,
    Finished { state: ScanState, found: usize },
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub state: ScanState,
    pub completed: u64,
    pub total: u64,
    pub found: Vec<Printer>,
}

pub struct DiscoveryScanner {
    device: DeviceClient,
    concurrency: usize,
    state: ScanState,
    results: BTreeMap<Ipv4Addr, Printer>,
}

impl DiscoveryScanner {
    pub fn new(device: DeviceClient) -> Self {
        Self {
            device,
            concurrency: DEFAULT_DISCOVERY_CONCURRENCY,
            state: ScanState::Idle,
            results: BTreeMap::new(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn results(&self) -> impl Iterator<Item = &Printer> {
        self.results.values()
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    /// Probes every address in `range`, at most `concurrency` at a time.
    ///
    /// Probes check `cancel` before starting; a cancelled probe still counts
    /// as completed, so the scan always ends with `completed == total`.
    pub async fn scan<F>(
        &mut self,
        range: &AddressRange,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> ScanReport
    where
        F: FnMut(ScanEvent),
    {
        let total = range.len();
        self.state = ScanState::Scanning;
        on_event(ScanEvent::Started { total });
        info!(
            target: targets::DISCOVERY,
            range = %range,
            total,
            concurrency = self.concurrency,
            "Discovery started"
        );

        let mut pending = range.iter();
        let mut tasks = JoinSet::new();
        let mut found = BTreeMap::new();
        let mut completed: u64 = 0;

        loop {
            while tasks.len() < self.concurrency {
                let Some(address) = pending.next() else {
                    break;
                };
                tasks.spawn(probe(self.device.clone(), address, cancel.clone()));
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            completed += 1;

            match joined {
                Ok(Some(printer)) => {
                    debug!(
                        target: targets::DISCOVERY,
                        address = %printer.address(),
                        name = %printer.name,
                        "Printer found"
                    );
                    found.insert(printer.address(), printer.clone());
                    self.results.insert(printer.address(), printer.clone());
                    on_event(ScanEvent::Found(printer));
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(
                        target: targets::DISCOVERY,
                        error = %error,
                        "Discovery probe task failed"
                    );
                }
            }
            on_event(ScanEvent::Progress { completed, total });

            if cancel.is_cancelled() && self.state == ScanState::Scanning {
                self.state = ScanState::Stopping;
                info!(target: targets::DISCOVERY, completed, total, "Discovery stopping");
                on_event(ScanEvent::Stopping);
            }
        }

        self.state = if cancel.is_cancelled() {
            ScanState::Stopped
        } else {
            ScanState::Completed
        };
        info!(
            target: targets::DISCOVERY,
            state = %self.state,
            completed,
            total,
            found = found.len(),
            "Discovery finished"
        );
        on_event(ScanEvent::Finished {
            state: self.state,
            found: found.len(),
        });

        ScanReport {
            state: self.state,
            completed,
            total,
            found: found.into_values().collect(),
        }
    }
}

async fn probe(device: DeviceClient, address: Ipv4Addr, cancel: CancellationToken) -> Option<Printer> {
    if cancel.is_cancelled() {
        return None;
    }
    let mut printer = Printer::new(address);
    device
        .fetch_basic_info(&mut printer, Profile::Discovery)
        .await
        .then_some(printer)
}

fn netmask_to_prefix(mask: Ipv4Addr) -> Option<u8> {
    let mask_u32 = ipv4_to_u32(mask);
    let prefix = u8::try_from(mask_u32.count_ones()).ok()?;
    if mask_u32 == prefix_to_mask(prefix) {
        Some(prefix)
    } else {
        warn!(
            target: targets::DISCOVERY,
            mask = %mask,
            "Non-contiguous netmask ignored"
        );
        None
    }
}

fn prefix_to_mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    }
}

fn ipv4_to_u32(ip: Ipv4Addr) -> u32 {
    u32::from_be_bytes(ip.octets())
}

fn u32_to_ipv4(value: u32) -> Ipv4Addr {
    Ipv4Addr::from(value)
}
