use std::collections::{BTreeMap, BTreeSet};

use crate::oids::TableSpec;
use crate::snmp::{FlatResult, Oid, SnmpValue};
use crate::values::{lenient_int, UNKNOWN_CODE};

pub const DEFAULT_INDEX_WIDTH: usize = 1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: BTreeMap<&'static str, SnmpValue>,
}

impl Row {
    pub fn insert(&mut self, column: &'static str, value: SnmpValue) {
        self.values.insert(column, value);
    }

    pub fn get(&self, column: &str) -> Option<&SnmpValue> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn int(&self, column: &str) -> i32 {
        self.get(column).map(lenient_int).unwrap_or(UNKNOWN_CODE)
    }

    pub fn text(&self, column: &str) -> String {
        match self.get(column) {
            Some(value) if !value.is_missing() => {
                value.to_string().trim_end_matches('\0').to_string()
            }
            _ => String::new(),
        }
    }
}

impl FromIterator<(&'static str, SnmpValue)> for Row {
    fn from_iter<T: IntoIterator<Item = (&'static str, SnmpValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Decodes a standard single-index table, keyed by row index.
///
/// `None` in means the walk got no reply, and is passed straight through.
pub fn decode_table(flat: Option<&FlatResult>, table: &TableSpec) -> Option<BTreeMap<u32, Row>> {
    let rows = decode_rows(
        flat,
        &table.entry_oid(),
        &table.column_prefixes(),
        DEFAULT_INDEX_WIDTH,
    )?;
    Some(
        rows.into_iter()
            .filter_map(|(suffix, row)| suffix.last().map(|index| (*index, row)))
            .collect(),
    )
}

pub fn decode_table_with_width(
    flat: Option<&FlatResult>,
    table: &TableSpec,
    width: usize,
) -> Option<BTreeMap<Vec<u32>, Row>> {
    decode_rows(flat, &table.entry_oid(), &table.column_prefixes(), width)
}

/// Groups every descendant of `entry` by its trailing `width` arcs, then
/// reads each column at `prefix + suffix`. Columns the agent did not report
/// come back as an empty octet string.
pub fn decode_rows(
    flat: Option<&FlatResult>,
    entry: &Oid,
    columns: &[(&'static str, Oid)],
    width: usize,
) -> Option<BTreeMap<Vec<u32>, Row>> {
    let flat = flat?;
    let width = width.max(1);

    let suffixes: BTreeSet<Vec<u32>> = flat
        .keys()
        .filter(|oid| oid.is_descendant_of(entry))
        .map(|oid| oid.tail(width).to_vec())
        .collect();

    let mut rows = BTreeMap::new();
    for suffix in suffixes {
        let row = columns
            .iter()
            .map(|(name, prefix)| {
                let value = flat
                    .get(&prefix.join(&suffix))
                    .cloned()
                    .unwrap_or_else(SnmpValue::empty);
                (*name, value)
            })
            .collect();
        rows.insert(suffix, row);
    }
    Some(rows)
}
