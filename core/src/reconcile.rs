use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::Ipv4Addr;

use tracing::{debug, info};

use crate::mib::{AlertCode, AlertSeverityLevel};
use crate::model::{Printer, WatchedPrinter};
use crate::notify::Notification;
use crate::records::{Alert, Supply};
use crate::store::WatchedSet;
use crate::targets;
use crate::values::DEFAULT_LOW_THRESHOLD;

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileSettings {
    pub severities: BTreeSet<AlertSeverityLevel>,
    pub low_threshold: f64,
}

impl ReconcileSettings {
    fn surfaces(&self, alert: &Alert) -> bool {
        self.severities.contains(&alert.severity_level) && alert.code != AlertCode::PowerUp
    }
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            severities: [AlertSeverityLevel::Critical, AlertSeverityLevel::Warning]
                .into_iter()
                .collect(),
            low_threshold: DEFAULT_LOW_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Observation {
    Reachable(Printer),
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub address: Ipv4Addr,
    pub name: String,
    pub location: String,
}

impl From<&Printer> for Owner {
    fn from(printer: &Printer) -> Self {
        Self {
            address: printer.address(),
            name: printer.name.clone(),
            location: printer.location.clone(),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {} ({})", self.name, self.location, self.address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedAlert {
    pub owner: Owner,
    pub alert: Alert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedSupply {
    pub owner: Owner,
    pub supply: Supply,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayedState {
    pub alerts: Vec<DisplayedAlert>,
    pub supplies: Vec<DisplayedSupply>,
    pub offline: BTreeMap<Ipv4Addr, WatchedPrinter>,
}

trait Condition: PartialEq + Clone {
    type Record: PartialEq + Clone;

    fn new(owner: Owner, record: Self::Record) -> Self;
    fn owner(&self) -> &Owner;
    fn record(&self) -> &Self::Record;
}

impl Condition for DisplayedAlert {
    type Record = Alert;

    fn new(owner: Owner, alert: Alert) -> Self {
        Self { owner, alert }
    }

    fn owner(&self) -> &Owner {
        &self.owner
    }

    fn record(&self) -> &Alert {
        &self.alert
    }
}

impl Condition for DisplayedSupply {
    type Record = Supply;

    fn new(owner: Owner, supply: Supply) -> Self {
        Self { owner, supply }
    }

    fn owner(&self) -> &Owner {
        &self.owner
    }

    fn record(&self) -> &Supply {
        &self.supply
    }
}

fn merge<C: Condition>(displayed: &mut Vec<C>, owner: &Owner, current: Vec<C::Record>) -> Vec<C::Record> {
    let mut added = Vec::new();
    for record in &current {
        let existing = displayed
            .iter_mut()
            .find(|entry| entry.owner().address == owner.address && entry.record() == record);
        match existing {
            None => {
                displayed.push(C::new(owner.clone(), record.clone()));
                added.push(record.clone());
            }
            Some(entry) => {
                let refreshed = C::new(owner.clone(), record.clone());
                if *entry != refreshed {
                    *entry = refreshed;
                }
            }
        }
    }
    displayed.retain(|entry| entry.owner().address != owner.address || current.contains(entry.record()));
    added
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    settings: ReconcileSettings,
    state: DisplayedState,
}

impl Reconciler {
    pub fn new(settings: ReconcileSettings) -> Self {
        Self {
            settings,
            state: DisplayedState::default(),
        }
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    pub fn state(&self) -> &DisplayedState {
        &self.state
    }

    pub fn snapshot(&self) -> DisplayedState {
        self.state.clone()
    }

    /// Applies one polling cycle over the watched set.
    ///
    /// A watched address with no observation is treated as unreachable.
    /// Conditions of addresses that are no longer watched are dropped
    /// without notification.
    pub fn apply_cycle(
        &mut self,
        watched: &WatchedSet,
        mut observations: BTreeMap<Ipv4Addr, Observation>,
    ) -> Vec<Notification> {
        let mut notifications = Vec::new();

        for (address, entry) in watched {
            match observations.remove(address) {
                Some(Observation::Reachable(printer)) => {
                    notifications.extend(self.apply_reachable(&printer));
                }
                Some(Observation::Unreachable) | None => {
                    notifications.extend(self.apply_unreachable(*address, entry));
                }
            }
        }

        self.state.alerts.retain(|entry| watched.contains_key(&entry.owner.address));
        self.state.supplies.retain(|entry| watched.contains_key(&entry.owner.address));
        self.state.offline.retain(|address, _| watched.contains_key(address));

        info!(
            target: targets::RECONCILE,
            watched = watched.len(),
            alerts = self.state.alerts.len(),
            supplies = self.state.supplies.len(),
            offline = self.state.offline.len(),
            notifications = notifications.len(),
            "Cycle reconciled"
        );
        notifications
    }

    fn apply_unreachable(&mut self, address: Ipv4Addr, entry: &WatchedPrinter) -> Option<Notification> {
        if self.state.offline.contains_key(&address) {
            return None;
        }
        self.state.offline.insert(address, entry.clone());
        debug!(target: targets::RECONCILE, address = %address, "Printer went offline");
        Some(Notification::unreachable(entry))
    }

    fn apply_reachable(&mut self, printer: &Printer) -> Vec<Notification> {
        let address = printer.address();
        if self.state.offline.remove(&address).is_some() {
            debug!(target: targets::RECONCILE, address = %address, "Printer back online");
        }
        let owner = Owner::from(printer);

        let alerts: Vec<Alert> = printer
            .alerts
            .values()
            .filter(|alert| self.settings.surfaces(alert))
            .cloned()
            .collect();
        let supplies: Vec<Supply> = printer
            .supplies
            .values()
            .filter(|supply| supply.is_low(self.settings.low_threshold))
            .cloned()
            .collect();

        let new_alerts = merge(&mut self.state.alerts, &owner, alerts);
        let new_supplies = merge(&mut self.state.supplies, &owner, supplies);

        new_alerts
            .iter()
            .map(|alert| Notification::alert(printer, alert))
            .chain(
                new_supplies
                    .iter()
                    .map(|supply| Notification::low_supply(printer, supply)),
            )
            .collect()
    }
}
