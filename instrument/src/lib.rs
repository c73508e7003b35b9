//! Telemetry capture for simulation runs.
//!
//! The engine emits `tracing` events with a target per phase
//! (`tracing::info!(target: "retirement", tick, count, ...)`). The
//! subscriber here collects those events into one column-oriented table per
//! target; columns appear as fields appear, rows are padded so every column
//! stays aligned, and everything converts to `polars` DataFrames for
//! analysis in tests.
//!
//! # Usage
//!
//! ```ignore
//! let telemetry = instrument::capture(|| {
//!     // ... run simulation ticks ...
//! });
//! let retirements = &telemetry.tables["retirement"];
//! assert_eq!(retirements.rows, 12);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

// === TABLES ===

/// One column of homogeneously typed values.
#[derive(Debug, Clone)]
pub enum ColumnData {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::U64(v) => v.len(),
            ColumnData::I64(v) => v.len(),
            ColumnData::F64(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pad_to(&mut self, rows: usize) {
        match self {
            ColumnData::U64(v) => v.resize(rows, 0),
            ColumnData::I64(v) => v.resize(rows, 0),
            ColumnData::F64(v) => v.resize(rows, 0.0),
            ColumnData::Bool(v) => v.resize(rows, false),
            ColumnData::Str(v) => v.resize(rows, String::new()),
        }
    }
}

/// All events recorded under one tracing target. Column order is
/// deterministic (BTreeMap), matching the engine's reproducibility rules.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    pub columns: BTreeMap<String, ColumnData>,
    pub rows: usize,
}

impl EventTable {
    fn align(&mut self) {
        for column in self.columns.values_mut() {
            column.pad_to(self.rows);
        }
    }

    pub fn u64s(&self, name: &str) -> Option<&[u64]> {
        match self.columns.get(name)? {
            ColumnData::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn f64s(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            ColumnData::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn strs(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name)? {
            ColumnData::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Sum of a u64 column; 0 when absent.
    pub fn total_u64(&self, name: &str) -> u64 {
        self.u64s(name).map_or(0, |v| v.iter().sum())
    }
}

/// Tables keyed by tracing target.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    pub tables: BTreeMap<String, EventTable>,
}

impl Telemetry {
    pub fn table(&self, target: &str) -> Option<&EventTable> {
        self.tables.get(target)
    }
}

thread_local! {
    static TELEMETRY: RefCell<Telemetry> = RefCell::default();
}

// === SUBSCRIBER ===

struct FieldVisitor<'a> {
    table: &'a mut EventTable,
    rows_before: usize,
}

impl FieldVisitor<'_> {
    fn push<T>(
        &mut self,
        field: &Field,
        value: T,
        make: fn(Vec<T>) -> ColumnData,
        append: fn(&mut ColumnData, T),
    ) {
        let rows_before = self.rows_before;
        let column = self
            .table
            .columns
            .entry(field.name().to_string())
            .or_insert_with(|| {
                let mut fresh = make(Vec::new());
                fresh.pad_to(rows_before);
                fresh
            });
        append(column, value);
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value, ColumnData::U64, |c, v| {
            if let ColumnData::U64(col) = c {
                col.push(v);
            }
        });
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value, ColumnData::I64, |c, v| {
            if let ColumnData::I64(col) = c {
                col.push(v);
            }
        });
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, value, ColumnData::F64, |c, v| {
            if let ColumnData::F64(col) = c {
                col.push(v);
            }
        });
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value, ColumnData::Bool, |c, v| {
            if let ColumnData::Bool(col) = c {
                col.push(v);
            }
        });
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string(), ColumnData::Str, |c, v| {
            if let ColumnData::Str(col) = c {
                col.push(v);
            }
        });
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{:?}", value));
    }
}

/// Subscriber that appends every info-level event to the table named by its
/// target.
pub struct TableSubscriber;

impl Subscriber for TableSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let target = event.metadata().target().to_string();
        TELEMETRY.with(|t| {
            let mut telemetry = t.borrow_mut();
            let table = telemetry.tables.entry(target).or_default();
            table.align();
            let rows_before = table.rows;
            event.record(&mut FieldVisitor {
                table,
                rows_before,
            });
            table.rows += 1;
            table.align();
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

// === CAPTURE API ===

/// Run a closure with the table subscriber installed for the current thread
/// and return everything it recorded. The preferred entry point for tests.
pub fn capture<F: FnOnce()>(f: F) -> Telemetry {
    clear();
    tracing::subscriber::with_default(TableSubscriber, f);
    drain()
}

/// Install the subscriber globally (long-running hosts). Events recorded
/// before a `drain` accumulate in thread-local tables.
pub fn install_global() {
    let _ = tracing::subscriber::set_global_default(TableSubscriber);
}

/// Take all recorded telemetry, leaving the buffers empty.
pub fn drain() -> Telemetry {
    TELEMETRY.with(|t| std::mem::take(&mut *t.borrow_mut()))
}

/// Discard all recorded telemetry.
pub fn clear() {
    TELEMETRY.with(|t| *t.borrow_mut() = Telemetry::default());
}

// === POLARS ===

use polars::prelude::*;

impl EventTable {
    /// Convert this table to a polars DataFrame.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::new();
        for (name, data) in &self.columns {
            let column = match data {
                ColumnData::U64(v) => Column::new(name.into(), v),
                ColumnData::I64(v) => Column::new(name.into(), v),
                ColumnData::F64(v) => Column::new(name.into(), v),
                ColumnData::Bool(v) => Column::new(name.into(), v),
                ColumnData::Str(v) => Column::new(name.into(), v),
            };
            columns.push(column);
        }
        DataFrame::new(columns)
    }
}

impl Telemetry {
    /// Convert every table to a polars DataFrame.
    pub fn to_dataframes(&self) -> BTreeMap<String, DataFrame> {
        self.tables
            .iter()
            .filter_map(|(name, table)| table.to_dataframe().ok().map(|df| (name.clone(), df)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_builds_aligned_tables() {
        let telemetry = capture(|| {
            tracing::info!(target: "test_phase", tick = 1u64, value = 10.5f64, label = "first");
            tracing::info!(target: "test_phase", tick = 2u64, value = 20.5f64);
            tracing::info!(target: "test_phase", tick = 3u64, value = 30.5f64, extra = true);
        });

        let table = telemetry.table("test_phase").expect("table exists");
        assert_eq!(table.rows, 3);
        assert_eq!(table.u64s("tick").unwrap(), &[1, 2, 3]);
        assert_eq!(table.f64s("value").unwrap(), &[10.5, 20.5, 30.5]);

        // Missing values pad with defaults on both sides of the row.
        let labels = table.strs("label").unwrap();
        assert_eq!(labels, &["first".to_string(), String::new(), String::new()]);
        assert_eq!(table.total_u64("tick"), 6);
    }

    #[test]
    fn targets_get_separate_tables() {
        let telemetry = capture(|| {
            tracing::info!(target: "alpha", tick = 1u64);
            tracing::info!(target: "beta", tick = 1u64, count = 5u64);
        });
        assert_eq!(telemetry.tables.len(), 2);
        assert_eq!(telemetry.table("beta").unwrap().total_u64("count"), 5);
    }

    #[test]
    fn debug_fields_become_strings() {
        let telemetry = capture(|| {
            tracing::info!(target: "debugged", education = ?Some(3));
        });
        let table = telemetry.table("debugged").unwrap();
        assert_eq!(table.strs("education").unwrap(), &["Some(3)".to_string()]);
    }

    #[test]
    fn dataframe_conversion_round_trips_shape() {
        let telemetry = capture(|| {
            for tick in 0..4u64 {
                tracing::info!(target: "frames", tick = tick, value = tick as f64 * 1.5);
            }
        });
        let frames = telemetry.to_dataframes();
        let df = &frames["frames"];
        assert_eq!(df.height(), 4);
        assert_eq!(df.width(), 2);
    }
}
