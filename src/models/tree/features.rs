//! Calendar, lag, and rolling-window feature engineering for the tree
//! regressor.
//!
//! Columns are built with holes where a lag or rolling window reaches
//! before the start of the series, then back-filled with the first valid
//! value of the column and zero-filled when a column never becomes valid.

use chrono::{Datelike, Days, NaiveDate};

/// Lag offsets, in days.
pub(super) const LAGS: [usize; 4] = [1, 7, 14, 30];

/// Rolling mean/std window sizes, in days.
pub(super) const WINDOWS: [usize; 3] = [7, 14, 30];

/// 9 calendar columns + one per lag + mean and std per window.
pub(super) const NUM_FEATURES: usize = 9 + LAGS.len() + 2 * WINDOWS.len();

/// Build the full feature matrix, one row per observation.
///
/// `dates` and `values` must be aligned; the caller guarantees a
/// contiguous daily grid. Rolling statistics include the current row, and
/// lags look strictly backward, so the last row of a matrix built over
/// history plus a placeholder day depends on the placeholder only through
/// its rolling columns.
pub(super) fn feature_matrix(dates: &[NaiveDate], values: &[f64]) -> Vec<Vec<f64>> {
    let n = dates.len();
    let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(NUM_FEATURES);

    columns.push(calendar(dates, |d| d.weekday().num_days_from_monday() as f64));
    columns.push(calendar(dates, |d| d.day() as f64));
    columns.push(calendar(dates, |d| d.month() as f64));
    columns.push(calendar(dates, |d| ((d.month0() / 3) + 1) as f64));
    columns.push(calendar(dates, |d| d.year() as f64));
    columns.push(calendar(dates, |d| d.iso_week().week() as f64));
    columns.push(calendar(dates, |d| {
        f64::from(u8::from(d.weekday().num_days_from_monday() >= 5))
    }));
    columns.push(calendar(dates, |d| f64::from(u8::from(d.day() == 1))));
    columns.push(calendar(dates, |d| {
        f64::from(u8::from((*d + Days::new(1)).day() == 1))
    }));

    for lag in LAGS {
        columns.push(
            (0..n)
                .map(|i| (i >= lag).then(|| values[i - lag]))
                .collect(),
        );
    }

    for window in WINDOWS {
        let mut means = Vec::with_capacity(n);
        let mut stds = Vec::with_capacity(n);
        for i in 0..n {
            if i + 1 >= window {
                let slice = &values[i + 1 - window..=i];
                let mean = slice.iter().sum::<f64>() / window as f64;
                let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / (window - 1) as f64;
                means.push(Some(mean));
                stds.push(Some(var.sqrt()));
            } else {
                means.push(None);
                stds.push(None);
            }
        }
        columns.push(means);
        columns.push(stds);
    }

    for column in &mut columns {
        backfill_then_zero(column);
    }

    (0..n)
        .map(|i| {
            columns
                .iter()
                .map(|col| col[i].expect("columns are filled"))
                .collect()
        })
        .collect()
}

fn calendar(dates: &[NaiveDate], f: impl Fn(&NaiveDate) -> f64) -> Vec<Option<f64>> {
    dates.iter().map(|d| Some(f(d))).collect()
}

fn backfill_then_zero(column: &mut [Option<f64>]) {
    let first_valid = column.iter().flatten().next().copied().unwrap_or(0.0);
    for cell in column.iter_mut() {
        if cell.is_none() {
            *cell = Some(first_valid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dates(start: (i32, u32, u32), n: usize) -> Vec<NaiveDate> {
        let base = NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap();
        (0..n).map(|i| base + Days::new(i as u64)).collect()
    }

    #[test]
    fn calendar_features_match_the_date() {
        // 2024-03-31 is a Sunday and a month end.
        let matrix = feature_matrix(&dates((2024, 3, 31), 1), &[5.0]);
        let row = &matrix[0];

        assert_eq!(row[0], 6.0); // day of week, Monday = 0
        assert_eq!(row[1], 31.0); // day of month
        assert_eq!(row[2], 3.0); // month
        assert_eq!(row[3], 1.0); // quarter
        assert_eq!(row[4], 2024.0); // year
        assert_eq!(row[6], 1.0); // weekend
        assert_eq!(row[7], 0.0); // month start
        assert_eq!(row[8], 1.0); // month end
    }

    #[test]
    fn lag_columns_shift_values_backward() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let matrix = feature_matrix(&dates((2024, 1, 1), 10), &values);

        // lag_1 at row 5 is values[4].
        assert_eq!(matrix[5][9], 5.0);
        // lag_7 at row 9 is values[2].
        assert_eq!(matrix[9][10], 3.0);
    }

    #[test]
    fn short_series_backfills_then_zero_fills() {
        let values = vec![4.0, 8.0, 6.0];
        let matrix = feature_matrix(&dates((2024, 1, 1), 3), &values);

        // lag_1 has its first valid value at row 1 (values[0] = 4.0);
        // row 0 back-fills to it.
        assert_eq!(matrix[0][9], 4.0);
        // lag_30 never becomes valid on 3 rows: all zeros.
        assert_eq!(matrix[2][12], 0.0);
        // rolling_mean_7 never valid either.
        assert_eq!(matrix[2][13], 0.0);
    }

    #[test]
    fn rolling_stats_include_the_current_row() {
        let values: Vec<f64> = (1..=8).map(f64::from).collect();
        let matrix = feature_matrix(&dates((2024, 1, 1), 8), &values);

        // rolling_mean_7 at row 6 covers values[0..=6] = 1..=7.
        assert_relative_eq!(matrix[6][13], 4.0, epsilon = 1e-12);
        // Sample std of 1..=7 is sqrt(28/6).
        assert_relative_eq!(matrix[6][14], (28.0_f64 / 6.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn matrix_width_is_stable() {
        let matrix = feature_matrix(&dates((2024, 1, 1), 40), &vec![1.0; 40]);
        assert!(matrix.iter().all(|row| row.len() == NUM_FEATURES));
    }
}
