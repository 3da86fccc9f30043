pub const SNMP: &str = "snmp";
pub const DEVICE: &str = "device";
pub const DISCOVERY: &str = "discovery";
pub const RECONCILE: &str = "reconcile";
pub const MONITOR: &str = "monitor";
pub const STORAGE: &str = "storage";
pub const NOTIFY: &str = "notify";
pub const CLI: &str = "cli";
