//! TimeSeries data structure for dated, fixed-frequency observations.

use crate::error::{DiagnosticsError, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// A univariate time series with timestamps and values.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    label: Option<String>,
    frequency: Option<Duration>,
}

impl TimeSeries {
    /// Create a univariate time series.
    ///
    /// Timestamps must be strictly increasing and match the number of values.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(DiagnosticsError::InvalidInput(format!(
                "{} timestamps for {} values",
                timestamps.len(),
                values.len()
            )));
        }
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(DiagnosticsError::InvalidInput(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        Ok(Self {
            timestamps,
            values,
            label: None,
            frequency: None,
        })
    }

    /// Quarterly series stamped at quarter ends, starting with quarter
    /// `start_quarter` (1 to 4) of `start_year`.
    ///
    /// # Example
    /// ```
    /// use tsdiag::core::TimeSeries;
    ///
    /// let ts = TimeSeries::quarterly(1947, 1, vec![243.1, 245.9, 249.6]).unwrap();
    /// assert_eq!(ts.timestamps()[0].format("%Y-%m-%d").to_string(), "1947-03-31");
    /// assert_eq!(ts.timestamps()[2].format("%Y-%m-%d").to_string(), "1947-09-30");
    /// ```
    pub fn quarterly(start_year: i32, start_quarter: u32, values: Vec<f64>) -> Result<Self> {
        if !(1..=4).contains(&start_quarter) {
            return Err(DiagnosticsError::InvalidParameter(format!(
                "quarter must be between 1 and 4, got {}",
                start_quarter
            )));
        }

        let first = (start_year as i64) * 4 + (start_quarter as i64 - 1);
        let timestamps = (0..values.len() as i64)
            .map(|offset| quarter_end(first + offset))
            .collect::<Result<Vec<_>>>()?;

        let mut ts = Self::univariate(timestamps, values)?;
        ts.frequency = Some(Duration::days(91));
        Ok(ts)
    }

    /// Attach a label (e.g. the dataset name).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Nominal spacing between observations, if known.
    pub fn frequency(&self) -> Option<Duration> {
        self.frequency
    }
}

/// Last day of the quarter with absolute index `year * 4 + (quarter - 1)`.
fn quarter_end(index: i64) -> Result<DateTime<Utc>> {
    let year = index.div_euclid(4) as i32;
    let quarter = index.rem_euclid(4) as u32;
    // First day of the next quarter, minus one day
    let (next_year, next_month) = if quarter == 3 {
        (year + 1, 1)
    } else {
        (year, 3 * (quarter + 1) + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
        .ok_or_else(|| DiagnosticsError::InvalidParameter(format!("year {} out of range", year)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_daily_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        (0..n)
            .map(|i| Utc.with_ymd_and_hms(2024, 1, 1 + i as u32, 0, 0, 0).unwrap())
            .collect()
    }

    #[test]
    fn time_series_constructs_univariate_data() {
        let timestamps = make_daily_timestamps(5);
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];

        let ts = TimeSeries::univariate(timestamps.clone(), values.clone()).unwrap();

        assert_eq!(ts.len(), 5);
        assert!(!ts.is_empty());
        assert_eq!(ts.values(), &values[..]);
        assert_eq!(ts.timestamps(), &timestamps[..]);
        assert!(ts.label().is_none());
    }

    #[test]
    fn time_series_rejects_unsorted_timestamps() {
        let mut timestamps = make_daily_timestamps(3);
        timestamps.swap(0, 1);
        let result = TimeSeries::univariate(timestamps, vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(DiagnosticsError::InvalidInput(_))));
    }

    #[test]
    fn time_series_rejects_length_mismatch() {
        let result = TimeSeries::univariate(make_daily_timestamps(3), vec![1.0, 2.0]);
        assert!(matches!(result, Err(DiagnosticsError::InvalidInput(_))));
    }

    #[test]
    fn quarterly_uses_quarter_end_dates() {
        let ts = TimeSeries::quarterly(1999, 3, vec![1.0; 4]).unwrap();
        let dates: Vec<String> = ts
            .timestamps()
            .iter()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .collect();
        assert_eq!(
            dates,
            vec!["1999-09-30", "1999-12-31", "2000-03-31", "2000-06-30"]
        );
        assert!(ts.frequency().is_some());
    }

    #[test]
    fn quarterly_rejects_bad_quarter() {
        assert!(matches!(
            TimeSeries::quarterly(2000, 5, vec![1.0]),
            Err(DiagnosticsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn time_series_label() {
        let ts = TimeSeries::quarterly(1947, 1, vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .with_label("GDP");
        assert_eq!(ts.label(), Some("GDP"));
        assert_eq!(ts.len(), 4);
    }
}
