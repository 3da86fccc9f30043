use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ron::ser::{to_string_pretty, PrettyConfig};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::discovery::DEFAULT_DISCOVERY_CONCURRENCY;
use crate::mib::AlertSeverityLevel;
use crate::model::DEFAULT_SNMP_PORT;
use crate::reconcile::ReconcileSettings;
use crate::snmp::{SnmpConfig, SnmpProfiles};
use crate::values::DEFAULT_LOW_THRESHOLD;
use crate::{targets, Error, StorageAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub timeout_ms: u64,
    pub retries: u32,
}

impl TimingConfig {
    pub const QUERY: TimingConfig = TimingConfig {
        timeout_ms: 2000,
        retries: 2,
    };

    pub const DISCOVERY: TimingConfig = TimingConfig {
        timeout_ms: 500,
        retries: 0,
    };
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::QUERY
    }
}

// Discovery timing read with its own fallbacks, so a partial table keeps the
// discovery retry count instead of the query one.
#[derive(Deserialize)]
#[serde(rename = "TimingConfig", default)]
struct DiscoveryTiming {
    timeout_ms: u64,
    retries: u32,
}

impl Default for DiscoveryTiming {
    fn default() -> Self {
        Self {
            timeout_ms: TimingConfig::DISCOVERY.timeout_ms,
            retries: TimingConfig::DISCOVERY.retries,
        }
    }
}

fn discovery_timing<'de, D>(deserializer: D) -> Result<TimingConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let DiscoveryTiming {
        timeout_ms,
        retries,
    } = DiscoveryTiming::deserialize(deserializer)?;
    Ok(TimingConfig {
        timeout_ms,
        retries,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub community: String,
    pub port: u16,
    pub query: TimingConfig,
    #[serde(deserialize_with = "discovery_timing")]
    pub discovery: TimingConfig,
    pub low_supply_threshold: f64,
    pub alert_severities: Vec<i32>,
    pub refresh_interval_secs: u64,
    pub discovery_concurrency: usize,
    pub store_path: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            community: "public".to_string(),
            port: DEFAULT_SNMP_PORT,
            query: TimingConfig::QUERY,
            discovery: TimingConfig::DISCOVERY,
            low_supply_threshold: DEFAULT_LOW_THRESHOLD,
            alert_severities: vec![
                AlertSeverityLevel::Critical.code(),
                AlertSeverityLevel::Warning.code(),
            ],
            refresh_interval_secs: 5,
            discovery_concurrency: DEFAULT_DISCOVERY_CONCURRENCY,
            store_path: PathBuf::from("watched.ron"),
        }
    }
}

impl MonitorConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let path_label = Some(path.display().to_string());
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(
                    target: targets::STORAGE,
                    path = %path.display(),
                    "No config file; using defaults"
                );
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(Error::StorageIo {
                    action: StorageAction::Load,
                    path: path_label,
                    source,
                });
            }
        };

        ron::from_str(&contents).map_err(|error| Error::Ron {
            action: StorageAction::Load,
            path: path_label,
            source: error.code,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let path_label = Some(path.display().to_string());
        let contents = to_string_pretty(self, PrettyConfig::new()).map_err(|source| Error::Ron {
            action: StorageAction::Save,
            path: path_label.clone(),
            source,
        })?;
        fs::write(path, contents).map_err(|source| Error::StorageIo {
            action: StorageAction::Save,
            path: path_label,
            source,
        })?;
        info!(target: targets::STORAGE, path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn snmp_profiles(&self) -> SnmpProfiles {
        let profile = |timing: TimingConfig| SnmpConfig {
            community: self.community.clone(),
            timeout: Duration::from_millis(timing.timeout_ms),
            retries: timing.retries,
        };
        SnmpProfiles {
            discovery: profile(self.discovery),
            query: profile(self.query),
        }
    }

    pub fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            severities: self
                .alert_severities
                .iter()
                .map(|code| AlertSeverityLevel::from_code(*code))
                .collect(),
            low_threshold: self.low_supply_threshold,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = MonitorConfig::load(&dir.path().join("absent.ron")).expect("load");
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.reconcile_settings(), ReconcileSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.ron");
        fs::write(
            &path,
            "(community: \"private\", discovery: (timeout_ms: 250), query: (retries: 4))",
        )
        .expect("write");

        let config = MonitorConfig::load(&path).expect("load");
        assert_eq!(config.community, "private");
        assert_eq!(config.port, 161);

        let profiles = config.snmp_profiles();
        assert_eq!(profiles.discovery.timeout, Duration::from_millis(250));
        assert_eq!(profiles.discovery.community, "private");
        assert_eq!(profiles.discovery.retries, 0);
        assert_eq!(profiles.query.retries, 4);
        assert_eq!(profiles.query.timeout, Duration::from_millis(2000));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.ron");
        let config = MonitorConfig {
            low_supply_threshold: 0.2,
            alert_severities: vec![3],
            ..MonitorConfig::default()
        };
        config.save(&path).expect("save");
        assert_eq!(MonitorConfig::load(&path).expect("load"), config);
    }

    #[test]
    fn malformed_file_is_a_ron_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.ron");
        fs::write(&path, "(community: 5").expect("write");
        assert!(matches!(
            MonitorConfig::load(&path),
            Err(Error::Ron {
                action: StorageAction::Load,
                ..
            })
        ));
    }
}
