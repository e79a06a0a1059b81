use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    api::benning::Entry,
    core::{
        registry::Readings,
        value::{Value, normalize},
    },
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn value_cell(value: &Value) -> Cell {
    match value {
        Value::Number(_) => Cell::new(value).set_alignment(CellAlignment::Right),
        Value::Raw(_) => Cell::new(value).fg(Color::DarkYellow),
    }
}

pub fn build_entries_table(entries: &[Entry]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["OID", "Label", "Type", "Raw", "Factor", "Value", "Entity ID"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.oid).set_alignment(CellAlignment::Right),
            Cell::new(&entry.label),
            Cell::new(entry.type_code.as_deref().unwrap_or_default()).add_attribute(Attribute::Dim),
            Cell::new(&entry.value).add_attribute(Attribute::Dim),
            Cell::new(&entry.factor).add_attribute(Attribute::Dim),
            value_cell(&normalize(entry)),
            Cell::new(entry.entity_id()).add_attribute(Attribute::Dim),
        ]);
    }
    table
}

pub fn build_readings_table(readings: &Readings) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Entity ID", "Label", "Value", "Fetched at"]);
    for (entity_id, reading) in readings.iter() {
        table.add_row(vec![
            Cell::new(entity_id),
            Cell::new(&reading.label),
            value_cell(&reading.value),
            Cell::new(reading.fetched_at.format("%H:%M:%S")).add_attribute(Attribute::Dim),
        ]);
    }
    table
}
