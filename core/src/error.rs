use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SNMP authentication failed for {address}")]
    SnmpAuth {
        address: String,
        details: Option<String>,
    },
    #[error("SNMP timeout for {address}")]
    SnmpTimeout {
        address: String,
        timeout_ms: u64,
    },
    #[error("SNMP failure for {address}")]
    SnmpFailure {
        address: String,
        details: String,
    },
    #[error("Malformed reply from {address}")]
    MalformedReply {
        address: String,
        details: String,
    },
    #[error("RON {action} error")]
    Ron {
        action: StorageAction,
        path: Option<String>,
        #[source]
        source: ron::Error,
    },
    #[error("Storage {action} error")]
    StorageIo {
        action: StorageAction,
        path: Option<String>,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Start IP invalid: {0:?}")]
    InvalidStart(String),
    #[error("End IP invalid: {0:?}")]
    InvalidEnd(String),
    #[error("IP address range less than zero: {start} is after {end}")]
    StartAfterEnd { start: String, end: String },
    #[error("IP address invalid: {0:?}")]
    InvalidAddress(String),
    #[error("CIDR invalid: {value:?} ({details})")]
    InvalidCidr { value: String, details: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport(pub Vec<ValidationError>);

impl ValidationReport {
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationReport> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationReport {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("\n")?;
            }
            first = false;
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageAction {
    Load,
    Save,
}

impl fmt::Display for StorageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageAction::Load => f.write_str("load"),
            StorageAction::Save => f.write_str("save"),
        }
    }
}

impl Error {
    pub(crate) fn malformed(address: impl fmt::Display, details: impl Into<String>) -> Self {
        Error::MalformedReply {
            address: address.to_string(),
            details: details.into(),
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::SnmpTimeout { .. } | Error::SnmpAuth { .. })
    }

    pub fn user_summary(&self) -> String {
        match self {
            Error::SnmpAuth { address, .. } => {
                format!("SNMP authentication failed for {address}.")
            }
            Error::SnmpTimeout { address, .. } => {
                format!("Unable to reach printer {address}.")
            }
            Error::SnmpFailure { address, .. } => {
                format!("SNMP error for {address}.")
            }
            Error::MalformedReply { address, .. } => {
                format!("{address} did not answer like a printer.")
            }
            Error::Ron { action, .. } => format!("Failed to {action} configuration data."),
            Error::StorageIo { action, .. } => format!("Failed to {action} configuration file."),
        }
    }

    pub fn technical_detail(&self) -> String {
        match self {
            Error::SnmpAuth { address, details } => {
                let extra = details
                    .as_ref()
                    .map(|text| format!(" ({text})"))
                    .unwrap_or_default();
                format!("SNMP auth failed for {address}{extra}.")
            }
            Error::SnmpTimeout {
                address,
                timeout_ms,
            } => format!("SNMP timeout after {timeout_ms}ms for {address}."),
            Error::SnmpFailure { address, details } => {
                format!("SNMP failure for {address}: {details}")
            }
            Error::MalformedReply { address, details } => {
                format!("Malformed reply from {address}: {details}")
            }
            Error::Ron {
                action,
                path,
                source,
            } => {
                let path = path
                    .as_ref()
                    .map(|value| format!(" path={value}."))
                    .unwrap_or_default();
                format!("RON {action} error.{path} {source}")
            }
            Error::StorageIo {
                action,
                path,
                source,
            } => {
                let path = path
                    .as_ref()
                    .map(|value| format!(" path={value}."))
                    .unwrap_or_default();
                format!("Storage {action} error.{path} {source}")
            }
        }
    }
}
