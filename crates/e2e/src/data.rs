//! Test data loading from a workbook

use calamine::{open_workbook_auto, Data, Range, Reader};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::DataConfig;
use crate::error::{E2eError, E2eResult};

/// The item to search for and the prices accepted for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    item: String,
    expected_prices: Vec<String>,
}

impl TestRecord {
    pub fn new(item: impl Into<String>, expected_prices: Vec<String>) -> E2eResult<Self> {
        let item = item.into();
        if item.is_empty() {
            return Err(E2eError::DataSource("item name is empty".to_string()));
        }
        if expected_prices.is_empty() {
            return Err(E2eError::DataSource(format!(
                "no expected prices for '{}'",
                item
            )));
        }
        Ok(Self {
            item,
            expected_prices,
        })
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn expected_prices(&self) -> &[String] {
        &self.expected_prices
    }
}

/// Load the record described by `source` from its workbook
pub fn load(source: &DataConfig) -> E2eResult<TestRecord> {
    let result = open_workbook_auto(&source.path)
        .map_err(|e| {
            E2eError::DataSource(format!("cannot open {}: {}", source.path.display(), e))
        })
        .and_then(|mut workbook| {
            workbook.worksheet_range(&source.sheet).map_err(|e| {
                E2eError::DataSource(format!(
                    "sheet '{}' unreadable in {}: {}",
                    source.sheet,
                    source.path.display(),
                    e
                ))
            })
        })
        .and_then(|range| record_from_range(&range, source));

    match &result {
        Ok(record) => info!(
            "Loaded test data: item '{}', {} expected price(s)",
            record.item(),
            record.expected_prices().len()
        ),
        Err(e) => error!("Error reading test data: {}", e),
    }
    result
}

/// Build a record from an already opened sheet
pub fn record_from_range(range: &Range<Data>, source: &DataConfig) -> E2eResult<TestRecord> {
    let item = required_cell(range, source.row, source.item_column)?;
    let expected_prices = source
        .price_columns
        .iter()
        .map(|&col| required_cell(range, source.row, col))
        .collect::<E2eResult<Vec<_>>>()?;

    TestRecord::new(item, expected_prices)
}

fn required_cell(range: &Range<Data>, row: u32, col: u32) -> E2eResult<String> {
    let cell = range.get_value((row, col)).ok_or_else(|| {
        E2eError::DataSource(format!("cell ({}, {}) is outside the sheet", row, col))
    })?;

    match (cell, cell_text(cell)) {
        (_, Some(text)) if !text.is_empty() => Ok(text),
        (Data::Empty, _) | (Data::String(_), _) => Err(E2eError::DataSource(format!(
            "cell ({}, {}) is empty",
            row, col
        ))),
        _ => Err(E2eError::DataSource(format!(
            "cell ({}, {}) has unsupported content: {:?}",
            row, col, cell
        ))),
    }
}

/// Render a cell the way prices are compared: numbers lose any fractional
/// part, strings pass through untouched.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.is_finite() => Some((f.trunc() as i64).to_string()),
        _ => None,
    }
}
