use crate::oids::{self, TableSpec};
use crate::snmp::{Oid, SnmpValue};

pub(crate) type AgentValues = Vec<(Oid, SnmpValue)>;

pub(crate) fn run_future<T>(future: impl std::future::Future<Output = T>) -> T {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("tokio runtime");
    runtime.block_on(future)
}

fn cell(table: &TableSpec, column: &str, index: u32, value: SnmpValue) -> (Oid, SnmpValue) {
    let column = table
        .columns
        .iter()
        .find(|candidate| candidate.name == column)
        .expect("known column");
    (table.column_prefix(column).join(&[index]), value)
}

pub(crate) fn system(name: &str, location: &str) -> AgentValues {
    vec![
        (Oid::from_slice(&oids::SYS_DESCR), SnmpValue::text("LaserJet 4250")),
        (Oid::from_slice(&oids::SYS_UPTIME), SnmpValue::Timeticks(360_000)),
        (Oid::from_slice(&oids::SYS_CONTACT), SnmpValue::text("helpdesk")),
        (Oid::from_slice(&oids::SYS_NAME), SnmpValue::text(name)),
        (Oid::from_slice(&oids::SYS_LOCATION), SnmpValue::text(location)),
    ]
}

pub(crate) fn console_text(text: &str) -> AgentValues {
    vec![(Oid::from_slice(&oids::CONSOLE_DISPLAY_TEXT), SnmpValue::text(text))]
}

pub(crate) fn alert(index: u32, severity: i64, code: i64, description: &str) -> AgentValues {
    let table = &oids::ALERTS;
    vec![
        cell(table, "severity_level", index, SnmpValue::Integer(severity)),
        cell(table, "training_level", index, SnmpValue::Integer(4)),
        cell(table, "group", index, SnmpValue::Integer(8)),
        cell(table, "group_index", index, SnmpValue::Integer(1)),
        cell(table, "location", index, SnmpValue::Integer(0)),
        cell(table, "code", index, SnmpValue::Integer(code)),
        cell(table, "description", index, SnmpValue::text(description)),
    ]
}

pub(crate) fn supply(index: u32, max_capacity: i64, level: i64, description: &str) -> AgentValues {
    let table = &oids::SUPPLIES;
    vec![
        cell(table, "class", index, SnmpValue::Integer(3)),
        cell(table, "type", index, SnmpValue::Integer(3)),
        cell(table, "description", index, SnmpValue::text(description)),
        cell(table, "supply_unit", index, SnmpValue::Integer(19)),
        cell(table, "max_capacity", index, SnmpValue::Integer(max_capacity)),
        cell(table, "level", index, SnmpValue::Integer(level)),
    ]
}

pub(crate) fn cover(index: u32, status: i64, description: &str) -> AgentValues {
    let table = &oids::COVERS;
    vec![
        cell(table, "description", index, SnmpValue::text(description)),
        cell(table, "status", index, SnmpValue::Integer(status)),
    ]
}

/// A healthy printer: one toner at 40%, front cover closed, console "Ready".
pub(crate) fn printer(name: &str, location: &str) -> AgentValues {
    let mut values = system(name, location);
    values.extend(console_text("Ready"));
    values.extend(supply(1, 100, 40, "Black Toner"));
    values.extend(cover(1, 4, "Front cover"));
    values
}
