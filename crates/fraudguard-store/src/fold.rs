//! Local-fold aggregate semantics
//!
//! The portable fallback for backends without server-side aggregates.
//! Both paths must agree: SUM/AVG/MIN/MAX fold the numeric column,
//! COUNT_DISTINCT folds the stringified value, COUNT counts rows, and an
//! empty input folds to 0.

use crate::error::{Result, StoreError};
use crate::history::AggregateWindow;
use fraudguard_core::{AggregateFunction, FieldRef, Transaction, Value};
use std::collections::HashSet;

/// Restrict `rows` to the window: delta filter first, then the most recent
/// `max_count` rows. Rows are sorted most recent first on return.
pub fn apply_window(mut rows: Vec<Transaction>, window: AggregateWindow) -> Vec<Transaction> {
    rows.sort_by_key(|t| std::cmp::Reverse(t.epoch_seconds()));

    if let Some(delta) = window.max_delta_time {
        let cutoff = window.reference_ts - i64::from(delta);
        rows.retain(|t| t.epoch_seconds() >= cutoff);
    }

    if let Some(count) = window.max_count {
        rows.truncate(count as usize);
    }

    rows
}

/// Fold an aggregate over the given rows.
pub fn fold(
    function: AggregateFunction,
    field: Option<FieldRef>,
    rows: &[Transaction],
) -> Result<f64> {
    match function {
        AggregateFunction::Count => Ok(rows.len() as f64),
        AggregateFunction::CountDistinct => {
            let field = require_field(function, field)?;
            let distinct: HashSet<String> =
                rows.iter().map(|t| stringified(field, t)).collect();
            Ok(distinct.len() as f64)
        }
        AggregateFunction::Sum => Ok(numeric_column(function, field, rows)?.iter().sum()),
        AggregateFunction::Avg => {
            let column = numeric_column(function, field, rows)?;
            if column.is_empty() {
                Ok(0.0)
            } else {
                Ok(column.iter().sum::<f64>() / column.len() as f64)
            }
        }
        AggregateFunction::Min => Ok(numeric_column(function, field, rows)?
            .into_iter()
            .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.min(v))))
            .unwrap_or(0.0)),
        AggregateFunction::Max => Ok(numeric_column(function, field, rows)?
            .into_iter()
            .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.max(v))))
            .unwrap_or(0.0)),
    }
}

fn require_field(function: AggregateFunction, field: Option<FieldRef>) -> Result<FieldRef> {
    field.ok_or_else(|| {
        StoreError::InvalidAggregate(format!("{function:?} requires a field operand"))
    })
}

/// The numeric column for SUM/AVG/MIN/MAX. Only `amount` is numeric in
/// the store; asking for anything else is a configuration mistake.
fn numeric_column(
    function: AggregateFunction,
    field: Option<FieldRef>,
    rows: &[Transaction],
) -> Result<Vec<f64>> {
    let field = require_field(function, field)?;
    if field != FieldRef::Amount {
        return Err(StoreError::InvalidAggregate(format!(
            "{function:?} is only defined over the amount field, got {field:?}"
        )));
    }
    Ok(rows.iter().map(|t| t.amount).collect())
}

fn stringified(field: FieldRef, txn: &Transaction) -> String {
    match field.extract(txn) {
        Value::Str(s) => s,
        Value::Float(f) => f.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Bool(b) => b.to_string(),
    }
}
