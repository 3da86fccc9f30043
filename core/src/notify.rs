use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info, warn};

use crate::model::{Printer, WatchedPrinter};
use crate::records::{Alert, Supply};
use crate::targets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn unreachable(watched: &WatchedPrinter) -> Self {
        Self {
            title: format!("{} unreachable", watched.name),
            message: format!(
                "{} in {} has been unreachable since {}",
                watched.name,
                watched.location,
                watched.last_seen_label()
            ),
            severity: Severity::Error,
        }
    }

    pub fn alert(printer: &Printer, alert: &Alert) -> Self {
        Self {
            title: printer.name.clone(),
            message: format!("{printer} has alert {alert}"),
            severity: Severity::Warning,
        }
    }

    pub fn low_supply(printer: &Printer, supply: &Supply) -> Self {
        Self {
            title: printer.name.clone(),
            message: format!("{printer} is low on {supply}"),
            severity: Severity::Warning,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.title, self.message)
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        let title = notification.title.as_str();
        let message = notification.message.as_str();
        match notification.severity {
            Severity::Info => info!(target: targets::NOTIFY, title, "{message}"),
            Severity::Warning => warn!(target: targets::NOTIFY, title, "{message}"),
            Severity::Error => error!(target: targets::NOTIFY, title, "{message}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<Notification> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: &Notification) {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_text() {
        let watched = WatchedPrinter {
            name: "Lobby".to_string(),
            location: "Ground".to_string(),
            last_seen: None,
        };
        let notification = Notification::unreachable(&watched);
        assert_eq!(notification.title, "Lobby unreachable");
        assert_eq!(
            notification.message,
            "Lobby in Ground has been unreachable since never"
        );
        assert_eq!(notification.severity, Severity::Error);
    }

    #[test]
    fn collecting_notifier_take_drains() {
        let notifier = CollectingNotifier::new();
        let notification = Notification {
            title: "t".to_string(),
            message: "m".to_string(),
            severity: Severity::Info,
        };
        notifier.notify(&notification);
        LogNotifier.notify(&notification);

        assert_eq!(notifier.take(), vec![notification]);
        assert!(notifier.received().is_empty());
    }
}
