use crate::snmp::Oid;

pub const SYS_DESCR: [u32; 9] = [1, 3, 6, 1, 2, 1, 1, 1, 0];
pub const SYS_UPTIME: [u32; 9] = [1, 3, 6, 1, 2, 1, 1, 3, 0];
pub const SYS_CONTACT: [u32; 9] = [1, 3, 6, 1, 2, 1, 1, 4, 0];
pub const SYS_NAME: [u32; 9] = [1, 3, 6, 1, 2, 1, 1, 5, 0];
pub const SYS_LOCATION: [u32; 9] = [1, 3, 6, 1, 2, 1, 1, 6, 0];

pub const CONSOLE_DISPLAY_TEXT: [u32; 13] = [1, 3, 6, 1, 2, 1, 43, 16, 5, 1, 2, 1, 1];

pub const DEVICE_INDEX: u32 = 1;

pub fn system_scalars() -> Vec<Oid> {
    [SYS_DESCR, SYS_UPTIME, SYS_CONTACT, SYS_NAME, SYS_LOCATION]
        .iter()
        .map(|arcs| Oid::from_slice(arcs))
        .collect()
}

pub fn basic_scalars() -> Vec<Oid> {
    vec![Oid::from_slice(&SYS_NAME), Oid::from_slice(&SYS_LOCATION)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub arc: u32,
}

const fn column(name: &'static str, arc: u32) -> Column {
    Column { name, arc }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub entry: &'static [u32],
    pub columns: &'static [Column],
}

impl TableSpec {
    pub fn entry_oid(&self) -> Oid {
        Oid::from_slice(self.entry)
    }

    pub fn column_prefix(&self, column: &Column) -> Oid {
        self.entry_oid().join(&[column.arc, DEVICE_INDEX])
    }

    pub fn column_prefixes(&self) -> Vec<(&'static str, Oid)> {
        self.columns
            .iter()
            .map(|column| (column.name, self.column_prefix(column)))
            .collect()
    }
}

pub const ALERTS: TableSpec = TableSpec {
    name: "alerts",
    entry: &[1, 3, 6, 1, 2, 1, 43, 18, 1, 1],
    columns: &[
        column("severity_level", 2),
        column("training_level", 3),
        column("group", 4),
        column("group_index", 5),
        column("location", 6),
        column("code", 7),
        column("description", 8),
    ],
};

pub const SUPPLIES: TableSpec = TableSpec {
    name: "supplies",
    entry: &[1, 3, 6, 1, 2, 1, 43, 11, 1, 1],
    columns: &[
        column("class", 4),
        column("type", 5),
        column("description", 6),
        column("supply_unit", 7),
        column("max_capacity", 8),
        column("level", 9),
    ],
};

pub const COVERS: TableSpec = TableSpec {
    name: "covers",
    entry: &[1, 3, 6, 1, 2, 1, 43, 6, 1, 1],
    columns: &[column("description", 2), column("status", 3)],
};

pub const INPUTS: TableSpec = TableSpec {
    name: "inputs",
    entry: &[1, 3, 6, 1, 2, 1, 43, 8, 2, 1],
    columns: &[
        column("type", 2),
        column("dim_unit", 3),
        column("capacity_unit", 8),
        column("max_capacity", 9),
        column("current_level", 10),
        column("status", 11),
        column("media_name", 12),
        column("name", 13),
        column("vendor_name", 14),
        column("model", 15),
        column("version", 16),
        column("serial_number", 17),
        column("description", 18),
        column("security", 19),
        column("media_weight", 20),
        column("media_type", 21),
        column("media_color", 22),
        column("media_form_parts", 23),
        column("media_load_timeout", 24),
        column("next_index", 25),
    ],
};

pub const OUTPUTS: TableSpec = TableSpec {
    name: "outputs",
    entry: &[1, 3, 6, 1, 2, 1, 43, 9, 2, 1],
    columns: &[
        column("type", 2),
        column("capacity_unit", 3),
        column("max_capacity", 4),
        column("remaining_capacity", 5),
        column("status", 6),
        column("name", 7),
        column("vendor_name", 8),
        column("model", 9),
        column("version", 10),
        column("serial_number", 11),
        column("description", 12),
        column("security", 13),
        column("dim_unit", 14),
        column("stacking_order", 19),
        column("page_delivery_orientation", 20),
        column("bursting", 21),
        column("decollating", 22),
        column("page_collated", 23),
        column("offset_stacking", 24),
    ],
};

pub const CONSOLE_LIGHTS: TableSpec = TableSpec {
    name: "console lights",
    entry: &[1, 3, 6, 1, 2, 1, 43, 17, 6, 1],
    columns: &[
        column("on_time", 2),
        column("off_time", 3),
        column("color", 4),
        column("description", 5),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_prefix_includes_device_index() {
        let level = SUPPLIES
            .columns
            .iter()
            .find(|column| column.name == "level")
            .expect("level column");
        assert_eq!(
            SUPPLIES.column_prefix(level).to_string(),
            "1.3.6.1.2.1.43.11.1.1.9.1"
        );
    }

    #[test]
    fn column_names_are_unique_per_table() {
        for table in [ALERTS, SUPPLIES, COVERS, INPUTS, OUTPUTS, CONSOLE_LIGHTS] {
            let mut names: Vec<&str> = table.columns.iter().map(|column| column.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), table.columns.len(), "{}", table.name);
        }
    }
}
