use std::fmt;
use std::io;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use printstatus_core::{
    default_discovery_range, targets, validate_address, AddressRange, CancellationToken,
    DeviceClient, DiscoveryScanner, DisplayedState, Error, LogNotifier, Monitor, MonitorConfig,
    Printer, Profile, RonStore, ScanEvent, SnmpV1Client, SystemUpdate, ValidationReport,
    WatchedStore,
};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{}", .0.user_summary())]
    Core(#[from] Error),
    #[error("{0}")]
    Validation(#[from] ValidationReport),
    #[error("No local IPv4 network found; give a range or --cidr")]
    NoLocalNetwork,
    #[error("{0} did not answer")]
    Unreachable(Ipv4Addr),
    #[error("Nothing to set; pass --name, --location or --contact")]
    EmptyUpdate,
    #[error("Failed to start the async runtime: {0}")]
    Runtime(#[source] io::Error),
}

pub struct Context {
    pub config: MonitorConfig,
    pub device: DeviceClient,
    pub store: Arc<RonStore>,
}

impl Context {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let config = MonitorConfig::load(path)?;
        let snmp = Arc::new(SnmpV1Client::new(config.snmp_profiles()));
        let device = DeviceClient::new(snmp).with_port(config.port);
        let store = Arc::new(RonStore::new(config.store_path.clone()));
        Ok(Self {
            config,
            device,
            store,
        })
    }
}

pub fn init_config(path: &Path) -> Result<(), CliError> {
    MonitorConfig::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!(target: targets::CLI, "Ctrl-C received; stopping");
                trigger.cancel();
            }
            Err(error) => warn!(target: targets::CLI, error = %error, "Cannot listen for Ctrl-C"),
        }
    });
    cancel
}

pub async fn monitor(context: &Context) -> Result<(), CliError> {
    let mut monitor = Monitor::new(
        context.device.clone(),
        context.store.clone(),
        Arc::new(LogNotifier),
        context.config.reconcile_settings(),
    );
    let mut updates = monitor.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            print_state(&state);
        }
    });

    let cancel = cancel_on_ctrl_c();
    monitor.run(context.config.refresh_interval(), &cancel).await;
    Ok(())
}

fn print_state(state: &DisplayedState) {
    println!(
        "-- {} alert(s), {} low supply(ies), {} offline",
        state.alerts.len(),
        state.supplies.len(),
        state.offline.len()
    );
    for entry in &state.alerts {
        println!("  {}: {}", entry.owner, entry.alert);
    }
    for entry in &state.supplies {
        println!("  {}: {}", entry.owner, entry.supply);
    }
    for (address, watched) in &state.offline {
        println!(
            "  {} in {} ({address}) offline since {}",
            watched.name,
            watched.location,
            watched.last_seen_label()
        );
    }
}

pub async fn discover(
    context: &Context,
    bounds: Option<(String, String)>,
    cidr: Option<String>,
) -> Result<(), CliError> {
    let range = match (bounds, cidr) {
        (Some((start, end)), _) => AddressRange::parse(&start, &end)?,
        (None, Some(cidr)) => AddressRange::from_cidr(&cidr).map_err(ValidationReport::from)?,
        (None, None) => default_discovery_range().ok_or(CliError::NoLocalNetwork)?,
    };

    let mut scanner = DiscoveryScanner::new(context.device.clone())
        .with_concurrency(context.config.discovery_concurrency);
    let cancel = cancel_on_ctrl_c();
    let report = scanner
        .scan(&range, &cancel, |event| match event {
            ScanEvent::Started { total } => println!("Scanning {range} ({total} addresses)"),
            ScanEvent::Found(printer) => println!("  found {printer}"),
            ScanEvent::Stopping => println!("Stopping..."),
            ScanEvent::Progress { .. } | ScanEvent::Finished { .. } => {}
        })
        .await;

    println!(
        "{} {}/{} probed, {} printer(s)",
        report.state.label(),
        report.completed,
        report.total,
        report.found.len()
    );
    Ok(())
}

pub async fn inspect(context: &Context, address: &str) -> Result<(), CliError> {
    let address = validate_address(address).map_err(ValidationReport::from)?;
    let mut printer = Printer::new(address);
    context.device.refresh(&mut printer, Profile::Query).await?;
    print_printer(&printer);
    Ok(())
}

fn print_printer(printer: &Printer) {
    println!("{printer}");
    println!("  description: {}", printer.description);
    println!("  contact:     {}", printer.contact);
    println!("  uptime:      {}", printer.uptime);
    println!("  console:     {}", printer.console_text);

    print_rows("Alerts", printer.alerts.iter());
    print_rows("Supplies", printer.supplies.iter());
    print_rows("Covers", printer.covers.iter());
    print_rows("Inputs", printer.inputs.iter());
    print_rows("Outputs", printer.outputs.iter());
    print_rows("Console lights", printer.console_lights.iter());
}

fn print_rows<'a, T: fmt::Display + 'a>(
    title: &str,
    rows: impl ExactSizeIterator<Item = (&'a u32, &'a T)>,
) {
    println!("{title} ({})", rows.len());
    for (index, row) in rows {
        println!("  [{index}] {row}");
    }
}

pub async fn watch(context: &Context, address: &str, monitor: bool) -> Result<(), CliError> {
    let address = validate_address(address).map_err(ValidationReport::from)?;
    let mut printer = Printer::new(address);
    if monitor && !context.device.fetch_basic_info(&mut printer, Profile::Query).await {
        warn!(
            target: targets::CLI,
            address = %address,
            "Printer did not answer; watching it without a name"
        );
    }

    let store: &dyn WatchedStore = context.store.as_ref();
    if printer.set_monitored(store, Some(monitor))? {
        println!("Watching {printer}");
    } else {
        println!("Not watching {address}");
    }
    Ok(())
}

pub fn list(context: &Context) -> Result<(), CliError> {
    let watched = context.store.list_watched()?;
    if watched.is_empty() {
        println!("No watched printers");
    }
    for (address, entry) in &watched {
        println!(
            "{address}  {} in {} (last seen {})",
            entry.name,
            entry.location,
            entry.last_seen_label()
        );
    }
    Ok(())
}

pub async fn set(
    context: &Context,
    address: &str,
    name: Option<String>,
    location: Option<String>,
    contact: Option<String>,
) -> Result<(), CliError> {
    let address = validate_address(address).map_err(ValidationReport::from)?;
    let update = SystemUpdate {
        name,
        location,
        contact,
    };
    if update.is_empty() {
        return Err(CliError::EmptyUpdate);
    }
    context.device.set_values(address, &update).await.map_err(|error| {
        if error.is_unreachable() {
            CliError::Unreachable(address)
        } else {
            CliError::Core(error)
        }
    })?;
    println!("Updated {address}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_config_writes_loadable_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("printstatus.ron");
        init_config(&path).expect("init");
        assert_eq!(MonitorConfig::load(&path).expect("load"), MonitorConfig::default());
    }

    #[test]
    fn validation_errors_are_reported_together() {
        let report = AddressRange::parse("10.0.0.09", "10.0.0.1").expect_err("invalid");
        let message = CliError::from(report).to_string();
        assert_eq!(message.lines().count(), 2);
    }
}
