use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::device::DeviceClient;
use crate::model::Printer;
use crate::notify::{Notification, Notifier};
use crate::reconcile::{DisplayedState, Observation, ReconcileSettings, Reconciler};
use crate::snmp::Profile;
use crate::store::{WatchedSet, WatchedStore};
use crate::{targets, Error};

pub struct Monitor {
    device: DeviceClient,
    store: Arc<dyn WatchedStore>,
    notifier: Arc<dyn Notifier>,
    reconciler: Reconciler,
    published: watch::Sender<DisplayedState>,
}

impl Monitor {
    pub fn new(
        device: DeviceClient,
        store: Arc<dyn WatchedStore>,
        notifier: Arc<dyn Notifier>,
        settings: ReconcileSettings,
    ) -> Self {
        let (published, _) = watch::channel(DisplayedState::default());
        Self {
            device,
            store,
            notifier,
            reconciler: Reconciler::new(settings),
            published,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayedState> {
        self.published.subscribe()
    }

    pub fn state(&self) -> &DisplayedState {
        self.reconciler.state()
    }

    pub async fn run_cycle(&mut self) -> Result<Vec<Notification>, Error> {
        let watched = self.store.list_watched()?;
        let observations = self.observe(watched.keys().copied()).await;

        let seen: WatchedSet = observations
            .iter()
            .filter_map(|(address, observation)| match observation {
                Observation::Reachable(printer) => Some((*address, printer.watched_entry())),
                Observation::Unreachable => None,
            })
            .collect();
        self.record_seen(seen).await;

        let notifications = self.reconciler.apply_cycle(&watched, observations);
        for notification in &notifications {
            self.notifier.notify(notification);
        }
        self.published.send_replace(self.reconciler.snapshot());
        Ok(notifications)
    }

    /// Repeats cycles on `interval` until `cancel` is set. Ticks missed
    /// while a cycle is still running are skipped. Returns the number of
    /// cycles that ran.
    pub async fn run(&mut self, interval: Duration, cancel: &CancellationToken) -> usize {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycles = 0;

        info!(
            target: targets::MONITOR,
            interval_ms = interval.as_millis() as u64,
            "Monitor started"
        );
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = cancel.cancelled() => break,
            }
            if cancel.is_cancelled() {
                break;
            }
            match self.run_cycle().await {
                Ok(notifications) => debug!(
                    target: targets::MONITOR,
                    cycle = cycles,
                    notifications = notifications.len(),
                    "Cycle finished"
                ),
                Err(error) => warn!(
                    target: targets::MONITOR,
                    error = %error,
                    "Cycle skipped"
                ),
            }
            cycles += 1;
        }
        info!(target: targets::MONITOR, cycles, "Monitor stopped");
        cycles
    }

    // One batched store write per cycle, off the async workers.
    async fn record_seen(&self, seen: WatchedSet) {
        if seen.is_empty() {
            return;
        }
        let count = seen.len();
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.update_many(seen)).await {
            Ok(Ok(matched)) => debug!(
                target: targets::STORAGE,
                seen = count,
                matched,
                "Sightings recorded"
            ),
            Ok(Err(error)) => warn!(
                target: targets::STORAGE,
                error = %error,
                "Failed to record sightings"
            ),
            Err(error) => warn!(
                target: targets::STORAGE,
                error = %error,
                "Sighting task failed"
            ),
        }
    }

    async fn observe(
        &self,
        addresses: impl Iterator<Item = Ipv4Addr>,
    ) -> BTreeMap<Ipv4Addr, Observation> {
        let mut tasks = JoinSet::new();
        for address in addresses {
            let device = self.device.clone();
            tasks.spawn(async move {
                let mut printer = Printer::new(address);
                printer.monitored = true;
                let observation = if device.fetch_system_info(&mut printer, Profile::Query).await {
                    Observation::Reachable(printer)
                } else {
                    Observation::Unreachable
                };
                (address, observation)
            });
        }

        let mut observations = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((address, observation)) => {
                    observations.insert(address, observation);
                }
                Err(error) => {
                    warn!(target: targets::MONITOR, error = %error, "Fetch task failed");
                }
            }
        }
        observations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WatchedPrinter;
    use crate::notify::{CollectingNotifier, Severity};
    use crate::snmp::MockSnmpClient;
    use crate::store::{MemoryStore, RonStore};
    use crate::testing::{self, run_future};

    const HOST: &str = "10.0.0.40";

    fn address() -> Ipv4Addr {
        HOST.parse().expect("address")
    }

    fn watched_store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_entries([(
            address(),
            WatchedPrinter {
                name: "Reception".to_string(),
                location: "Lobby".to_string(),
                last_seen: None,
            },
        )]))
    }

    fn monitor(
        mock: &MockSnmpClient,
        store: Arc<dyn WatchedStore>,
        notifier: &CollectingNotifier,
    ) -> Monitor {
        Monitor::new(
            DeviceClient::new(Arc::new(mock.clone())),
            store,
            Arc::new(notifier.clone()),
            ReconcileSettings::default(),
        )
    }

    #[test]
    fn unreachable_printer_notifies_once() {
        let mock = MockSnmpClient::new();
        let notifier = CollectingNotifier::new();
        let mut monitor = monitor(&mock, watched_store(), &notifier);

        run_future(async {
            monitor.run_cycle().await.expect("first cycle");
            monitor.run_cycle().await.expect("second cycle");
        });

        let received = notifier.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].title, "Reception unreachable");
        assert_eq!(received[0].severity, Severity::Error);
        assert!(monitor.state().offline.contains_key(&address()));
    }

    #[test]
    fn reachable_printer_is_written_back() {
        let mock = MockSnmpClient::new();
        mock.add_agent(HOST, testing::printer("Front Desk", "Hall"));
        let store = watched_store();
        let notifier = CollectingNotifier::new();
        let mut monitor = monitor(&mock, store.clone(), &notifier);

        run_future(monitor.run_cycle()).expect("cycle");

        let entry = store.list_watched().expect("list")[&address()].clone();
        assert_eq!(entry.name, "Front Desk");
        assert_eq!(entry.location, "Hall");
        assert!(entry.last_seen.is_some());
        assert!(notifier.received().is_empty());
    }

    #[test]
    fn sightings_are_written_to_the_file_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(RonStore::new(dir.path().join("watched.ron")));
        let silent = Ipv4Addr::new(10, 0, 0, 41);
        for (address, name) in [(address(), "Reception"), (silent, "Annex")] {
            store
                .upsert(
                    address,
                    WatchedPrinter {
                        name: name.to_string(),
                        location: "Lobby".to_string(),
                        last_seen: None,
                    },
                )
                .expect("upsert");
        }
        let mock = MockSnmpClient::new();
        mock.add_agent(HOST, testing::printer("Front Desk", "Hall"));
        let notifier = CollectingNotifier::new();
        let mut monitor = monitor(&mock, store.clone(), &notifier);

        run_future(monitor.run_cycle()).expect("cycle");

        let watched = RonStore::new(store.path()).list_watched().expect("list");
        assert_eq!(watched[&address()].name, "Front Desk");
        assert!(watched[&address()].last_seen.is_some());
        assert_eq!(watched[&silent].name, "Annex");
        assert!(watched[&silent].last_seen.is_none());
        assert_eq!(notifier.received().len(), 1);
    }

    #[test]
    fn published_state_follows_conditions() {
        let mock = MockSnmpClient::new();
        let mut values = testing::printer("Front Desk", "Hall");
        values.extend(testing::supply(2, 100, 5, "Cyan Toner"));
        values.extend(testing::alert(1, 3, 8, "Paper jam"));
        mock.add_agent(HOST, values);
        let notifier = CollectingNotifier::new();
        let mut monitor = monitor(&mock, watched_store(), &notifier);
        let receiver = monitor.subscribe();

        run_future(monitor.run_cycle()).expect("cycle");
        {
            let state = receiver.borrow();
            assert_eq!(state.alerts.len(), 1);
            assert_eq!(state.supplies.len(), 1);
            assert_eq!(state.supplies[0].supply.description, "Cyan Toner");
        }
        assert_eq!(notifier.take().len(), 2);

        mock.remove_agent(HOST);
        run_future(monitor.run_cycle()).expect("cycle");
        let state = receiver.borrow();
        assert_eq!(state.offline.len(), 1);
        assert_eq!(state.alerts.len(), 1);
        assert_eq!(notifier.received().len(), 1);
    }

    #[test]
    fn run_stops_when_cancelled() {
        let mock = MockSnmpClient::new();
        let notifier = CollectingNotifier::new();
        let mut monitor = monitor(&mock, watched_store(), &notifier);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let cycles = run_future(monitor.run(Duration::from_millis(10), &cancel));
        assert_eq!(cycles, 0);
        assert!(notifier.received().is_empty());
    }
}
