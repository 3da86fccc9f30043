use std::collections::BTreeMap;
use std::fmt;

use crate::mib::{
    AlertCode, AlertGroup, AlertSeverityLevel, AlertTrainingLevel, CapacityUnit, ConsoleColor,
    CoverStatus, InputType, MediaUnit, OutputType, PageDeliveryOrientation, PresentOnOff,
    StackingOrder, SupplyClass, SupplyType, SupplyUnit,
};
use crate::oids::{self, TableSpec};
use crate::table::Row;
use crate::values::{is_low, level_to_percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Alerts,
    Supplies,
    Covers,
    Inputs,
    Outputs,
    ConsoleLights,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::Alerts,
        TableKind::Supplies,
        TableKind::Covers,
        TableKind::Inputs,
        TableKind::Outputs,
        TableKind::ConsoleLights,
    ];

    pub fn table(self) -> &'static TableSpec {
        match self {
            TableKind::Alerts => &oids::ALERTS,
            TableKind::Supplies => &oids::SUPPLIES,
            TableKind::Covers => &oids::COVERS,
            TableKind::Inputs => &oids::INPUTS,
            TableKind::Outputs => &oids::OUTPUTS,
            TableKind::ConsoleLights => &oids::CONSOLE_LIGHTS,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table().name)
    }
}

pub trait FromRow: Sized {
    const KIND: TableKind;

    fn from_row(row: &Row) -> Self;
}

pub fn build_rows<T: FromRow>(rows: &BTreeMap<u32, Row>) -> BTreeMap<u32, T> {
    rows.iter()
        .map(|(index, row)| (*index, T::from_row(row)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alert {
    pub severity_level: AlertSeverityLevel,
    pub training_level: AlertTrainingLevel,
    pub group: AlertGroup,
    pub group_index: i32,
    pub location: i32,
    pub code: AlertCode,
    pub description: String,
}

impl FromRow for Alert {
    const KIND: TableKind = TableKind::Alerts;

    fn from_row(row: &Row) -> Self {
        Self {
            severity_level: AlertSeverityLevel::from_code(row.int("severity_level")),
            training_level: AlertTrainingLevel::from_code(row.int("training_level")),
            group: AlertGroup::from_code(row.int("group")),
            group_index: row.int("group_index"),
            location: row.int("location"),
            code: AlertCode::from_code(row.int("code")),
            description: row.text("description"),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({} - {}): {} '{}' in {}.{}",
            self.severity_level,
            self.training_level,
            self.code,
            self.description,
            self.group,
            self.group_index
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Supply {
    pub class: SupplyClass,
    pub supply_type: SupplyType,
    pub description: String,
    pub unit: SupplyUnit,
    pub max_capacity: i32,
    pub level: i32,
}

impl Supply {
    pub fn percent(&self) -> String {
        level_to_percent(self.max_capacity, self.level)
    }

    pub fn is_low(&self, threshold: f64) -> bool {
        is_low(self.max_capacity, self.level, threshold)
    }
}

impl FromRow for Supply {
    const KIND: TableKind = TableKind::Supplies;

    fn from_row(row: &Row) -> Self {
        Self {
            class: SupplyClass::from_code(row.int("class")),
            supply_type: SupplyType::from_code(row.int("type")),
            description: row.text("description"),
            unit: SupplyUnit::from_code(row.int("supply_unit")),
            max_capacity: row.int("max_capacity"),
            level: row.int("level"),
        }
    }
}

impl fmt::Display for Supply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}: {} ({} / {} {})",
            self.supply_type,
            self.class,
            self.description,
            self.percent(),
            self.level,
            self.max_capacity,
            self.unit
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cover {
    pub description: String,
    pub status: CoverStatus,
}

impl FromRow for Cover {
    const KIND: TableKind = TableKind::Covers;

    fn from_row(row: &Row) -> Self {
        Self {
            description: row.text("description"),
            status: CoverStatus::from_code(row.int("status")),
        }
    }
}

impl fmt::Display for Cover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.description, self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Input {
    pub input_type: InputType,
    pub dim_unit: MediaUnit,
    pub capacity_unit: CapacityUnit,
    pub max_capacity: i32,
    pub current_level: i32,
    pub status: i32,
    pub media_name: String,
    pub name: String,
    pub vendor_name: String,
    pub model: String,
    pub version: String,
    pub serial_number: String,
    pub description: String,
    pub security: PresentOnOff,
    pub media_weight: i32,
    pub media_type: String,
    pub media_color: String,
    pub media_form_parts: i32,
    pub media_load_timeout: i32,
    pub next_index: i32,
}

impl Input {
    pub fn percent(&self) -> String {
        level_to_percent(self.max_capacity, self.current_level)
    }
}

impl FromRow for Input {
    const KIND: TableKind = TableKind::Inputs;

    fn from_row(row: &Row) -> Self {
        Self {
            input_type: InputType::from_code(row.int("type")),
            dim_unit: MediaUnit::from_code(row.int("dim_unit")),
            capacity_unit: CapacityUnit::from_code(row.int("capacity_unit")),
            max_capacity: row.int("max_capacity"),
            current_level: row.int("current_level"),
            status: row.int("status"),
            media_name: row.text("media_name"),
            name: row.text("name"),
            vendor_name: row.text("vendor_name"),
            model: row.text("model"),
            version: row.text("version"),
            serial_number: row.text("serial_number"),
            description: row.text("description"),
            security: PresentOnOff::from_code(row.int("security")),
            media_weight: row.int("media_weight"),
            media_type: row.text("media_type"),
            media_color: row.text("media_color"),
            media_form_parts: row.int("media_form_parts"),
            media_load_timeout: row.int("media_load_timeout"),
            next_index: row.int("next_index"),
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} {}",
            self.name,
            self.input_type,
            self.media_name,
            self.percent()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Output {
    pub output_type: OutputType,
    pub capacity_unit: CapacityUnit,
    pub max_capacity: i32,
    pub remaining_capacity: i32,
    pub status: i32,
    pub name: String,
    pub vendor_name: String,
    pub model: String,
    pub version: String,
    pub serial_number: String,
    pub description: String,
    pub security: PresentOnOff,
    pub dim_unit: MediaUnit,
    pub stacking_order: StackingOrder,
    pub page_delivery_orientation: PageDeliveryOrientation,
    pub bursting: PresentOnOff,
    pub decollating: PresentOnOff,
    pub page_collated: PresentOnOff,
    pub offset_stacking: PresentOnOff,
}

impl Output {
    pub fn percent(&self) -> String {
        level_to_percent(self.max_capacity, self.remaining_capacity)
    }
}

impl FromRow for Output {
    const KIND: TableKind = TableKind::Outputs;

    fn from_row(row: &Row) -> Self {
        Self {
            output_type: OutputType::from_code(row.int("type")),
            capacity_unit: CapacityUnit::from_code(row.int("capacity_unit")),
            max_capacity: row.int("max_capacity"),
            remaining_capacity: row.int("remaining_capacity"),
            status: row.int("status"),
            name: row.text("name"),
            vendor_name: row.text("vendor_name"),
            model: row.text("model"),
            version: row.text("version"),
            serial_number: row.text("serial_number"),
            description: row.text("description"),
            security: PresentOnOff::from_code(row.int("security")),
            dim_unit: MediaUnit::from_code(row.int("dim_unit")),
            stacking_order: StackingOrder::from_code(row.int("stacking_order")),
            page_delivery_orientation: PageDeliveryOrientation::from_code(
                row.int("page_delivery_orientation"),
            ),
            bursting: PresentOnOff::from_code(row.int("bursting")),
            decollating: PresentOnOff::from_code(row.int("decollating")),
            page_collated: PresentOnOff::from_code(row.int("page_collated")),
            offset_stacking: PresentOnOff::from_code(row.int("offset_stacking")),
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.name,
            self.output_type,
            self.percent()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    On,
    Off,
    Flashing,
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightState::On => f.write_str("on"),
            LightState::Off => f.write_str("off"),
            LightState::Flashing => f.write_str("flashing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConsoleLight {
    pub on_time: i32,
    pub off_time: i32,
    pub color: ConsoleColor,
    pub description: String,
}

impl ConsoleLight {
    pub fn rgb(&self) -> (u8, u8, u8) {
        self.color.rgb()
    }

    pub fn state(&self) -> LightState {
        match (self.on_time > 0, self.off_time > 0) {
            (true, true) => LightState::Flashing,
            (true, false) => LightState::On,
            (false, _) => LightState::Off,
        }
    }
}

impl FromRow for ConsoleLight {
    const KIND: TableKind = TableKind::ConsoleLights;

    fn from_row(row: &Row) -> Self {
        Self {
            on_time: row.int("on_time"),
            off_time: row.int("off_time"),
            color: ConsoleColor::from_code(row.int("color")),
            description: row.text("description"),
        }
    }
}

impl fmt::Display for ConsoleLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.description, self.color, self.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::SnmpValue;
    use crate::values::UNKNOWN_CODE;

    fn row(values: &[(&'static str, SnmpValue)]) -> Row {
        values.iter().cloned().collect()
    }

    #[test]
    fn alert_from_row_and_display() {
        let alert = Alert::from_row(&row(&[
            ("severity_level", SnmpValue::Integer(3)),
            ("training_level", SnmpValue::Integer(4)),
            ("group", SnmpValue::Integer(8)),
            ("group_index", SnmpValue::Integer(1)),
            ("location", SnmpValue::Integer(0)),
            ("code", SnmpValue::Integer(8)),
            ("description", SnmpValue::text("Paper jam")),
        ]));

        assert_eq!(alert.severity_level, AlertSeverityLevel::Critical);
        assert_eq!(alert.code, AlertCode::Jam);
        assert_eq!(alert.to_string(), "(critical - trained): jam 'Paper jam' in input.1");
    }

    #[test]
    fn supply_display_and_derived_fields() {
        let supply = Supply::from_row(&row(&[
            ("class", SnmpValue::Integer(3)),
            ("type", SnmpValue::Integer(3)),
            ("description", SnmpValue::text("Black Toner")),
            ("supply_unit", SnmpValue::Integer(19)),
            ("max_capacity", SnmpValue::Integer(100)),
            ("level", SnmpValue::Integer(40)),
        ]));

        assert_eq!(
            supply.to_string(),
            "toner supplyThatIsConsumed: Black Toner: 40% (40 / 100 percent)"
        );
        assert!(!supply.is_low(0.1));

        let nearly_empty = Supply { level: 10, ..supply };
        assert!(nearly_empty.is_low(0.1));
    }

    #[test]
    fn defaulted_columns_become_unknown() {
        let supply = Supply::from_row(&row(&[
            ("class", SnmpValue::empty()),
            ("type", SnmpValue::empty()),
            ("description", SnmpValue::empty()),
            ("supply_unit", SnmpValue::empty()),
            ("max_capacity", SnmpValue::empty()),
            ("level", SnmpValue::empty()),
        ]));

        assert_eq!(supply.class, SupplyClass::Unrecognized(UNKNOWN_CODE));
        assert_eq!(supply.supply_type.code(), UNKNOWN_CODE);
        assert_eq!(supply.percent(), "unknown");
        assert!(!supply.is_low(0.1));
    }

    #[test]
    fn input_and_output_percentages() {
        let input = Input::from_row(&row(&[
            ("max_capacity", SnmpValue::Integer(500)),
            ("current_level", SnmpValue::Integer(250)),
            ("name", SnmpValue::text("Tray 1")),
        ]));
        assert_eq!(input.percent(), "50%");
        assert_eq!(input.media_name, "");

        let output = Output::from_row(&row(&[
            ("max_capacity", SnmpValue::Integer(-2)),
            ("remaining_capacity", SnmpValue::Integer(-3)),
        ]));
        assert_eq!(output.percent(), "OK");
    }

    #[test]
    fn console_light_state() {
        let light = ConsoleLight::from_row(&row(&[
            ("on_time", SnmpValue::Integer(500)),
            ("off_time", SnmpValue::Integer(500)),
            ("color", SnmpValue::Integer(10)),
            ("description", SnmpValue::text("Attention")),
        ]));
        assert_eq!(light.state(), LightState::Flashing);
        assert_eq!(light.rgb(), (255, 128, 0));
        assert_eq!(light.to_string(), "Attention (orange flashing)");

        let steady = ConsoleLight {
            off_time: 0,
            ..light.clone()
        };
        assert_eq!(steady.state(), LightState::On);
    }

    #[test]
    fn table_kinds_map_to_tables() {
        assert_eq!(Alert::KIND.table().name, "alerts");
        assert_eq!(TableKind::ConsoleLights.to_string(), "console lights");
    }
}
