use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::model::{Printer, SnmpAddress, Timeticks, DEFAULT_SNMP_PORT};
use crate::oids;
use crate::records::{build_rows, Alert, ConsoleLight, Cover, FromRow, Input, Output, Supply};
use crate::snmp::{
    FlatResult, Oid, Profile, SnmpClient, SnmpRequest, SnmpSetRequest, SnmpValue, SnmpVarBind,
    SnmpWalkRequest,
};
use crate::table::decode_table;
use crate::{targets, Error};

pub const TABLE_WALK_LIMIT: usize = 4096;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub contact: Option<String>,
}

impl SystemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.contact.is_none()
    }

    fn bindings(&self) -> Vec<SnmpVarBind> {
        [
            (&oids::SYS_CONTACT, &self.contact),
            (&oids::SYS_NAME, &self.name),
            (&oids::SYS_LOCATION, &self.location),
        ]
        .into_iter()
        .filter_map(|(oid, value)| {
            value
                .as_ref()
                .map(|text| SnmpVarBind::new(Oid::from_slice(oid), SnmpValue::text(text.clone())))
        })
        .collect()
    }
}

#[derive(Clone)]
pub struct DeviceClient {
    snmp: Arc<dyn SnmpClient>,
    port: u16,
}

impl DeviceClient {
    pub fn new(snmp: Arc<dyn SnmpClient>) -> Self {
        Self {
            snmp,
            port: DEFAULT_SNMP_PORT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn address(&self, address: Ipv4Addr) -> SnmpAddress {
        SnmpAddress::new(address.to_string(), self.port)
    }

    /// Full fetch: system scalars, the six tables and the console text.
    ///
    /// Nothing is written to `printer` unless every step that must succeed
    /// did. A table whose walk failed keeps its previous rows; every other
    /// table is replaced wholesale.
    pub async fn refresh(&self, printer: &mut Printer, profile: Profile) -> Result<(), Error> {
        let address = printer.snmp_address(self.port);

        let request = SnmpRequest::new(address.clone(), oids::system_scalars()).with_profile(profile);
        let system = self.snmp.get(request).await?.into_flat();

        let description = scalar_text(&address, &system, &oids::SYS_DESCR)?;
        let uptime = match scalar(&address, &system, &oids::SYS_UPTIME)? {
            SnmpValue::Timeticks(ticks) => Timeticks(*ticks),
            other => {
                return Err(Error::malformed(
                    &address,
                    format!("sysUpTime is not timeticks: {other:?}"),
                ));
            }
        };
        let contact = scalar_text(&address, &system, &oids::SYS_CONTACT)?;
        let name = scalar_text(&address, &system, &oids::SYS_NAME)?;
        let location = scalar_text(&address, &system, &oids::SYS_LOCATION)?;

        let alerts = self.fetch_table::<Alert>(&address, profile).await;
        let supplies = self.fetch_table::<Supply>(&address, profile).await;
        let covers = self.fetch_table::<Cover>(&address, profile).await;
        let inputs = self.fetch_table::<Input>(&address, profile).await;
        let outputs = self.fetch_table::<Output>(&address, profile).await;
        let console_lights = self.fetch_table::<ConsoleLight>(&address, profile).await;

        let console_oid = Oid::from_slice(&oids::CONSOLE_DISPLAY_TEXT);
        let request = SnmpRequest::new(address.clone(), vec![console_oid]).with_profile(profile);
        let console = self.snmp.get(request).await?.into_flat();
        let console_text = scalar_text(&address, &console, &oids::CONSOLE_DISPLAY_TEXT)?;

        printer.name = name;
        printer.location = location;
        printer.description = description;
        printer.contact = contact;
        printer.uptime = uptime;
        printer.console_text = console_text;
        replace_rows(&mut printer.alerts, alerts);
        replace_rows(&mut printer.supplies, supplies);
        replace_rows(&mut printer.covers, covers);
        replace_rows(&mut printer.inputs, inputs);
        replace_rows(&mut printer.outputs, outputs);
        replace_rows(&mut printer.console_lights, console_lights);
        printer.last_updated = Some(Utc::now());

        Ok(())
    }

    pub async fn fetch_system_info(&self, printer: &mut Printer, profile: Profile) -> bool {
        match self.refresh(printer, profile).await {
            Ok(()) => {
                debug!(
                    target: targets::DEVICE,
                    address = %printer.address(),
                    alerts = printer.alerts.len(),
                    supplies = printer.supplies.len(),
                    "Printer refreshed"
                );
                true
            }
            Err(error) => {
                warn!(
                    target: targets::DEVICE,
                    address = %printer.address(),
                    unreachable = error.is_unreachable(),
                    error = %error.technical_detail(),
                    "Printer refresh failed"
                );
                false
            }
        }
    }

    pub async fn fetch_basic_info(&self, printer: &mut Printer, profile: Profile) -> bool {
        let address = printer.snmp_address(self.port);
        let request = SnmpRequest::new(address.clone(), oids::basic_scalars()).with_profile(profile);

        let result = match self.snmp.get(request).await {
            Ok(response) => {
                let flat = response.into_flat();
                scalar_text(&address, &flat, &oids::SYS_NAME).and_then(|name| {
                    scalar_text(&address, &flat, &oids::SYS_LOCATION).map(|location| (name, location))
                })
            }
            Err(error) => Err(error),
        };

        match result {
            Ok((name, location)) => {
                printer.name = name;
                printer.location = location;
                true
            }
            Err(error) => {
                debug!(
                    target: targets::DEVICE,
                    address = %address,
                    error = %error.technical_detail(),
                    "Basic info unavailable"
                );
                false
            }
        }
    }

    pub async fn set_values(&self, address: Ipv4Addr, update: &SystemUpdate) -> Result<(), Error> {
        if update.is_empty() {
            return Ok(());
        }
        let request = SnmpSetRequest::new(self.address(address), update.bindings());
        self.snmp.set(request).await?;
        info!(
            target: targets::DEVICE,
            address = %address,
            name = ?update.name,
            location = ?update.location,
            contact = ?update.contact,
            "System values set"
        );
        Ok(())
    }

    async fn fetch_table<T: FromRow>(
        &self,
        address: &SnmpAddress,
        profile: Profile,
    ) -> Option<BTreeMap<u32, T>> {
        let table = T::KIND.table();
        let request = SnmpWalkRequest::new(address.clone(), table.entry_oid())
            .with_profile(profile)
            .with_max_results(TABLE_WALK_LIMIT);

        let flat = match self.snmp.walk(request).await {
            Ok(response) => Some(response.into_flat()),
            Err(error) => {
                warn!(
                    target: targets::DEVICE,
                    address = %address,
                    table = %T::KIND,
                    error = %error.technical_detail(),
                    "Table walk failed; keeping previous rows"
                );
                None
            }
        };

        let rows = decode_table(flat.as_ref(), table)?;
        Some(build_rows(&rows))
    }
}

fn replace_rows<T>(current: &mut BTreeMap<u32, T>, fetched: Option<BTreeMap<u32, T>>) {
    if let Some(rows) = fetched {
        *current = rows;
    }
}

fn scalar<'a>(
    address: &SnmpAddress,
    flat: &'a FlatResult,
    arcs: &[u32],
) -> Result<&'a SnmpValue, Error> {
    let oid = Oid::from_slice(arcs);
    flat.get(&oid)
        .ok_or_else(|| Error::malformed(address, format!("no value for {oid}")))
}

fn scalar_text(address: &SnmpAddress, flat: &FlatResult, arcs: &[u32]) -> Result<String, Error> {
    let value = scalar(address, flat, arcs)?;
    if value.is_missing() {
        return Ok(String::new());
    }
    let text = value.as_text_lossy().unwrap_or_else(|| value.to_string());
    Ok(text.trim_end_matches('\0').to_string())
}

#[derive(Debug, Clone)]
pub struct PrinterHandle {
    address: Ipv4Addr,
    inner: Arc<tokio::sync::Mutex<Printer>>,
}

impl PrinterHandle {
    pub fn new(printer: Printer) -> Self {
        Self {
            address: printer.address(),
            inner: Arc::new(tokio::sync::Mutex::new(printer)),
        }
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Returns false straight away if another fetch on this printer is
    /// still running; calls are never queued.
    pub async fn fetch_system_info(&self, client: &DeviceClient, profile: Profile) -> bool {
        let Ok(mut printer) = self.inner.try_lock() else {
            debug!(
                target: targets::DEVICE,
                address = %self.address,
                "Refresh already in flight"
            );
            return false;
        };
        client.fetch_system_info(&mut printer, profile).await
    }

    pub async fn fetch_basic_info(&self, client: &DeviceClient, profile: Profile) -> bool {
        let Ok(mut printer) = self.inner.try_lock() else {
            return false;
        };
        client.fetch_basic_info(&mut printer, profile).await
    }

    pub async fn snapshot(&self) -> Printer {
        self.inner.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mib::CoverStatus;
    use crate::snmp::MockSnmpClient;
    use crate::testing::{self, run_future};

    const HOST: &str = "10.0.0.20";

    fn address() -> Ipv4Addr {
        HOST.parse().expect("address")
    }

    fn client(mock: &MockSnmpClient) -> DeviceClient {
        DeviceClient::new(Arc::new(mock.clone()))
    }

    #[test]
    fn full_fetch_populates_printer() {
        let mock = MockSnmpClient::new();
        let mut values = testing::printer("Finance", "Floor 2");
        values.extend(testing::alert(4, 3, 8, "Paper jam"));
        mock.add_agent(HOST, values);

        let mut printer = Printer::new(address());
        assert!(run_future(client(&mock).fetch_system_info(&mut printer, Profile::Query)));

        assert_eq!(printer.name, "Finance");
        assert_eq!(printer.location, "Floor 2");
        assert_eq!(printer.description, "LaserJet 4250");
        assert_eq!(printer.uptime.to_string(), "0d 1h 0m 0s 0ms");
        assert_eq!(printer.console_text, "Ready");
        assert_eq!(printer.alerts.keys().copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(printer.supplies[&1].percent(), "40%");
        assert_eq!(printer.covers[&1].status, CoverStatus::CoverClosed);
        assert!(printer.inputs.is_empty());
        assert!(printer.last_updated.is_some());
        assert!(mock.recorded_profiles().iter().all(|profile| *profile == Profile::Query));
    }

    #[test]
    fn no_reply_leaves_printer_untouched() {
        let mock = MockSnmpClient::new();
        let mut printer = Printer::new(address());
        printer.name = "Before".to_string();

        assert!(!run_future(client(&mock).fetch_system_info(&mut printer, Profile::Query)));
        assert_eq!(printer.name, "Before");
        assert!(printer.last_updated.is_none());
    }

    #[test]
    fn missing_console_text_aborts_without_commit() {
        let mock = MockSnmpClient::new();
        let mut values = testing::system("New name", "Floor 3");
        values.extend(testing::supply(1, 100, 40, "Black Toner"));
        mock.add_agent(HOST, values);

        let mut printer = Printer::new(address());
        printer.name = "Old name".to_string();

        assert!(!run_future(client(&mock).fetch_system_info(&mut printer, Profile::Query)));
        assert_eq!(printer.name, "Old name");
        assert!(printer.supplies.is_empty());
    }

    #[test]
    fn non_timeticks_uptime_is_malformed() {
        let mock = MockSnmpClient::new();
        let mut values = testing::printer("Switch", "Rack");
        values.push((Oid::from_slice(&oids::SYS_UPTIME), SnmpValue::Integer(5)));
        mock.add_agent(HOST, values);

        let mut printer = Printer::new(address());
        let error = run_future(client(&mock).refresh(&mut printer, Profile::Query))
            .expect_err("malformed");
        assert!(matches!(error, Error::MalformedReply { .. }));
        assert!(printer.name.is_empty());
    }

    #[test]
    fn failed_walk_keeps_previous_rows_and_prunes_others() {
        let mock = MockSnmpClient::new();
        let mut values = testing::printer("Lab", "Basement");
        values.extend(testing::supply(2, 100, 3, "Cyan Toner"));
        mock.add_agent(HOST, values);

        let device = client(&mock);
        let mut printer = Printer::new(address());
        assert!(run_future(device.fetch_system_info(&mut printer, Profile::Query)));
        assert_eq!(printer.supplies.len(), 2);

        // Second device state: cyan toner gone, cover table unreachable.
        let mut values = testing::printer("Lab", "Basement");
        values.retain(|(oid, _)| !oid.is_descendant_of(&oids::COVERS.entry_oid()));
        mock.add_agent(HOST, values);
        let address = printer.snmp_address(device.port());
        // Queue: system get, alerts walk, supplies walk, then a timed-out covers walk.
        let system = run_future(mock.get(SnmpRequest::new(address.clone(), oids::system_scalars())))
            .expect("system");
        let alerts = run_future(mock.walk(SnmpWalkRequest::new(address.clone(), oids::ALERTS.entry_oid())))
            .expect("alerts");
        let supplies =
            run_future(mock.walk(SnmpWalkRequest::new(address.clone(), oids::SUPPLIES.entry_oid())))
                .expect("supplies");
        mock.push_response(system);
        mock.push_response(alerts);
        mock.push_response(supplies);
        mock.push_error(Error::SnmpTimeout {
            address: address.to_string(),
            timeout_ms: 2000,
        });

        assert!(run_future(device.fetch_system_info(&mut printer, Profile::Query)));
        assert_eq!(printer.supplies.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(printer.covers[&1].description, "Front cover");
    }

    #[test]
    fn concurrent_fetch_on_same_handle_is_rejected() {
        let mock = MockSnmpClient::new();
        mock.add_agent(HOST, testing::printer("Busy", "Hall"));
        let device = client(&mock);
        let handle = PrinterHandle::new(Printer::new(address()));

        let in_flight = handle.inner.try_lock().expect("first fetch holds the printer");
        assert!(!run_future(handle.fetch_system_info(&device, Profile::Query)));
        drop(in_flight);

        assert!(run_future(handle.fetch_system_info(&device, Profile::Query)));
        assert_eq!(run_future(handle.snapshot()).name, "Busy");
    }

    #[test]
    fn basic_info_reads_name_and_location_only() {
        let mock = MockSnmpClient::new();
        mock.add_agent(HOST, testing::system("Reception", "Ground floor"));

        let mut printer = Printer::new(address());
        assert!(run_future(client(&mock).fetch_basic_info(&mut printer, Profile::Discovery)));
        assert_eq!(printer.name, "Reception");
        assert_eq!(printer.location, "Ground floor");
        assert!(printer.description.is_empty());
        assert_eq!(mock.recorded_profiles(), vec![Profile::Discovery]);
    }

    #[test]
    fn set_values_writes_only_given_fields() {
        let mock = MockSnmpClient::new();
        mock.add_agent(HOST, testing::system("Old", "Somewhere"));
        let device = client(&mock);

        let update = SystemUpdate {
            name: Some("New".to_string()),
            ..SystemUpdate::default()
        };
        run_future(device.set_values(address(), &update)).expect("set");
        run_future(device.set_values(address(), &SystemUpdate::default())).expect("empty set");

        let sets = mock.recorded_sets();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].bindings.len(), 1);
        assert_eq!(
            mock.agent_value(HOST, &Oid::from_slice(&oids::SYS_NAME)),
            Some(SnmpValue::text("New"))
        );
        assert_eq!(
            mock.agent_value(HOST, &Oid::from_slice(&oids::SYS_LOCATION)),
            Some(SnmpValue::text("Somewhere"))
        );
    }
}
