//! Daily time series and the builder that aggregates raw transaction rows.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde_json::Value;

use crate::error::{ForecastError, Result};

/// Column names used when reading transaction rows.
#[derive(Debug, Clone)]
pub struct FieldNames {
    /// Transaction date field.
    pub date: String,
    /// Quantity field; when absent from every row, rows are counted instead.
    pub quantity: String,
    /// Product identifier field.
    pub product: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            quantity: "Quantity".to_string(),
            product: "Product_ID".to_string(),
        }
    }
}

/// A contiguous daily demand series.
///
/// Invariant: one value per calendar day over `[start, end]`, dates
/// ascending. Built once per forecasting run and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series from parallel date/value vectors.
    ///
    /// Dates must be consecutive calendar days; anything else is a
    /// validation error, since downstream lag and seasonality features
    /// assume a gap-free daily grid.
    pub fn from_daily(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::validation(format!(
                "dates ({}) and values ({}) must have equal length",
                dates.len(),
                values.len()
            )));
        }
        for pair in dates.windows(2) {
            if pair[1] != pair[0] + Days::new(1) {
                return Err(ForecastError::validation(format!(
                    "dates must be consecutive calendar days, found {} after {}",
                    pair[1], pair[0]
                )));
            }
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::validation(
                "series values must be finite".to_string(),
            ));
        }
        Ok(Self { dates, values })
    }

    /// Create a series of consecutive days starting at `start`.
    pub fn daily(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        let dates = (0..values.len())
            .map(|i| start + Days::new(i as u64))
            .collect();
        Self::from_daily(dates, values)
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Observation dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Observation values, aligned with [`dates`](Self::dates).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First observation date, if any.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Last observation date, if any.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Chronological head/tail split at `train_len` observations.
    pub fn split_at(&self, train_len: usize) -> (TimeSeries, TimeSeries) {
        let at = train_len.min(self.len());
        let head = Self {
            dates: self.dates[..at].to_vec(),
            values: self.values[..at].to_vec(),
        };
        let tail = Self {
            dates: self.dates[at..].to_vec(),
            values: self.values[at..].to_vec(),
        };
        (head, tail)
    }
}

/// Aggregates raw transaction rows into a gap-free [`TimeSeries`].
///
/// Rows are JSON objects as delivered by the data layer. The builder
/// filters to one product when asked, sums the quantity field per calendar
/// date (falling back to counting rows when no row carries that field),
/// and materializes every day of the observed range, filling absent days
/// with zero.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesBuilder {
    fields: FieldNames,
}

impl TimeSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use caller-specific column names instead of the defaults.
    pub fn with_fields(fields: FieldNames) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FieldNames {
        &self.fields
    }

    /// Build the daily series, optionally restricted to one product.
    pub fn build(&self, records: &[Value], product_id: Option<&str>) -> Result<TimeSeries> {
        let rows: Vec<&Value> = match product_id {
            Some(id) => records
                .iter()
                .filter(|row| {
                    row.get(&self.fields.product)
                        .and_then(Value::as_str)
                        .is_some_and(|p| p == id)
                })
                .collect(),
            None => records.iter().collect(),
        };

        if rows.is_empty() {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }

        let has_quantity = rows.iter().any(|row| row.get(&self.fields.quantity).is_some());

        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for row in rows {
            let raw_date = row
                .get(&self.fields.date)
                .ok_or_else(|| ForecastError::missing_field(&self.fields.date))?;
            let date = parse_date(raw_date)?;

            if has_quantity {
                // Coerce-then-drop: a row whose quantity cannot be read as
                // a number is skipped, not an error.
                match row.get(&self.fields.quantity).and_then(coerce_numeric) {
                    Some(qty) => *by_date.entry(date).or_insert(0.0) += qty,
                    None => continue,
                }
            } else {
                *by_date.entry(date).or_insert(0.0) += 1.0;
            }
        }

        let (&start, _) = by_date
            .first_key_value()
            .ok_or(ForecastError::InsufficientData { needed: 1, got: 0 })?;
        let (&end, _) = by_date.last_key_value().expect("non-empty map");

        let mut dates = Vec::new();
        let mut values = Vec::new();
        let mut day = start;
        while day <= end {
            dates.push(day);
            values.push(by_date.get(&day).copied().unwrap_or(0.0));
            day = day + Days::new(1);
        }

        TimeSeries::from_daily(dates, values)
    }
}

/// Parse a transaction date: ISO-8601 date, datetime, or RFC 3339.
fn parse_date(value: &Value) -> Result<NaiveDate> {
    let text = value
        .as_str()
        .ok_or_else(|| ForecastError::validation(format!("date field must be a string, got {value}")))?;

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Ok(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt.date());
        }
    }
    Err(ForecastError::validation(format!(
        "could not parse date '{text}'"
    )))
}

/// Read a JSON value as f64, accepting numbers and numeric strings.
fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn from_daily_rejects_gapped_dates() {
        let dates = vec![date("2024-01-01"), date("2024-01-03")];
        let result = TimeSeries::from_daily(dates, vec![1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::Validation(_))));
    }

    #[test]
    fn from_daily_rejects_length_mismatch() {
        let dates = vec![date("2024-01-01")];
        let result = TimeSeries::from_daily(dates, vec![1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::Validation(_))));
    }

    #[test]
    fn daily_constructor_generates_consecutive_dates() {
        let ts = TimeSeries::daily(date("2024-02-27"), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ts.dates()[2], date("2024-02-29"));
        assert_eq!(ts.end_date(), Some(date("2024-02-29")));
    }

    #[test]
    fn builder_fills_gaps_with_zero() {
        let records = vec![
            json!({"Date": "2024-01-01", "Quantity": 5}),
            json!({"Date": "2024-01-04", "Quantity": 3}),
            json!({"Date": "2024-01-04", "Quantity": 2}),
        ];
        let ts = TimeSeriesBuilder::new().build(&records, None).unwrap();

        assert_eq!(ts.len(), 4);
        assert_eq!(ts.values(), &[5.0, 0.0, 0.0, 5.0]);
        assert_eq!(ts.start_date(), Some(date("2024-01-01")));
    }

    #[test]
    fn builder_filters_by_product() {
        let records = vec![
            json!({"Date": "2024-01-01", "Quantity": 5, "Product_ID": "P1"}),
            json!({"Date": "2024-01-01", "Quantity": 9, "Product_ID": "P2"}),
            json!({"Date": "2024-01-02", "Quantity": 2, "Product_ID": "P1"}),
        ];
        let ts = TimeSeriesBuilder::new().build(&records, Some("P1")).unwrap();

        assert_eq!(ts.values(), &[5.0, 2.0]);
    }

    #[test]
    fn builder_counts_rows_without_quantity_field() {
        let records = vec![
            json!({"Date": "2024-01-01"}),
            json!({"Date": "2024-01-01"}),
            json!({"Date": "2024-01-02"}),
        ];
        let ts = TimeSeriesBuilder::new().build(&records, None).unwrap();

        assert_eq!(ts.values(), &[2.0, 1.0]);
    }

    #[test]
    fn builder_drops_non_numeric_quantities() {
        let records = vec![
            json!({"Date": "2024-01-01", "Quantity": "7"}),
            json!({"Date": "2024-01-01", "Quantity": "n/a"}),
            json!({"Date": "2024-01-02", "Quantity": 1.5}),
        ];
        let ts = TimeSeriesBuilder::new().build(&records, None).unwrap();

        assert_eq!(ts.values(), &[7.0, 1.5]);
    }

    #[test]
    fn builder_requires_date_field() {
        let records = vec![json!({"Quantity": 5})];
        let err = TimeSeriesBuilder::new().build(&records, None).unwrap_err();
        assert_eq!(err, ForecastError::missing_field("Date"));
    }

    #[test]
    fn builder_rejects_empty_input() {
        let err = TimeSeriesBuilder::new().build(&[], None).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
    }

    #[test]
    fn builder_rejects_unknown_product() {
        let records = vec![json!({"Date": "2024-01-01", "Product_ID": "P1"})];
        let err = TimeSeriesBuilder::new()
            .build(&records, Some("P9"))
            .unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
    }

    #[test]
    fn builder_accepts_datetime_strings() {
        let records = vec![
            json!({"Date": "2024-01-01T09:30:00", "Quantity": 1}),
            json!({"Date": "2024-01-01 17:00:00", "Quantity": 2}),
            json!({"Date": "2024-01-02T00:00:00Z", "Quantity": 4}),
        ];
        let ts = TimeSeriesBuilder::new().build(&records, None).unwrap();

        assert_eq!(ts.values(), &[3.0, 4.0]);
    }

    #[test]
    fn builder_honors_custom_field_names() {
        let fields = FieldNames {
            date: "ds".into(),
            quantity: "y".into(),
            product: "sku".into(),
        };
        let records = vec![
            json!({"ds": "2024-01-01", "y": 4, "sku": "A"}),
            json!({"ds": "2024-01-02", "y": 6, "sku": "B"}),
        ];
        let ts = TimeSeriesBuilder::with_fields(fields)
            .build(&records, Some("A"))
            .unwrap();

        assert_eq!(ts.values(), &[4.0]);
    }

    #[test]
    fn split_at_is_chronological() {
        let ts = TimeSeries::daily(date("2024-01-01"), (1..=10).map(f64::from).collect()).unwrap();
        let (head, tail) = ts.split_at(8);

        assert_eq!(head.len(), 8);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.values(), &[9.0, 10.0]);
        assert_eq!(tail.start_date(), Some(date("2024-01-09")));
    }
}
