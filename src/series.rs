//! Time-indexed tables of named `f64` columns.

use chrono::NaiveDateTime;

use crate::error::BenchError;

/// Sampling step of every table handled by the testbench (hours).
pub const DT_HOURS: f64 = 0.5;

/// Samples per day at [`DT_HOURS`] resolution.
pub const STEPS_PER_DAY: usize = 48;

/// Format used for calendar timestamps written to result files.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Row labels of a [`TimeSeries`].
#[derive(Debug, Clone, PartialEq)]
pub enum TimeIndex {
    /// Elapsed hours since the first sample.
    Hours(Vec<f64>),
    /// Calendar timestamps of each sample.
    Dates(Vec<NaiveDateTime>),
}

impl TimeIndex {
    /// Elapsed-hours index `0, dt, 2*dt, ...` of length `n`.
    ///
    /// # Examples
    ///
    /// ```
    /// use solarhome_bench::series::TimeIndex;
    ///
    /// let index = TimeIndex::hours(4, 0.5);
    /// assert_eq!(index, TimeIndex::Hours(vec![0.0, 0.5, 1.0, 1.5]));
    /// ```
    pub fn hours(n: usize, dt_hours: f64) -> Self {
        Self::Hours((0..n).map(|i| i as f64 * dt_hours).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Hours(h) => h.len(),
            Self::Dates(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text label of row `i`, as written to CSV.
    pub fn label(&self, i: usize) -> Option<String> {
        match self {
            Self::Hours(h) => h.get(i).map(f64::to_string),
            Self::Dates(d) => d.get(i).map(|t| t.format(DATE_FORMAT).to_string()),
        }
    }

    /// Parses row labels back into an index.
    ///
    /// Labels are read as elapsed hours when they are all numeric, otherwise
    /// as timestamps in [`DATE_FORMAT`].
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` if a label is neither.
    pub fn parse_labels(labels: &[String]) -> Result<Self, BenchError> {
        let hours: Option<Vec<f64>> = labels.iter().map(|s| s.trim().parse().ok()).collect();
        if let Some(hours) = hours {
            return Ok(Self::Hours(hours));
        }
        labels
            .iter()
            .map(|s| {
                NaiveDateTime::parse_from_str(s.trim(), DATE_FORMAT).map_err(|e| {
                    BenchError::SchemaViolation(format!("invalid time index label \"{s}\": {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Dates)
    }
}

/// A named column of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// An index plus ordered named columns, all of the index length.
///
/// Column order is preserved; it is part of the on-disk contract of
/// trajectories.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    index: TimeIndex,
    columns: Vec<Column>,
}

impl TimeSeries {
    /// Creates a table with no columns.
    pub fn new(index: TimeIndex) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` if the name is already used or the length
    /// differs from the index.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), BenchError> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(BenchError::SchemaViolation(format!(
                "duplicate column \"{name}\""
            )));
        }
        if values.len() != self.index.len() {
            return Err(BenchError::SchemaViolation(format!(
                "column \"{name}\" has {} values, index has {}",
                values.len(),
                self.index.len()
            )));
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Builder form of [`TimeSeries::push_column`].
    ///
    /// # Errors
    ///
    /// Same as [`TimeSeries::push_column`].
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, BenchError> {
        self.push_column(name, values)?;
        Ok(self)
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`TimeSeries::column`], failing when the column is absent.
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` naming the missing column.
    pub fn require(&self, name: &str) -> Result<&[f64], BenchError> {
        self.column(name)
            .ok_or_else(|| BenchError::SchemaViolation(format!("missing column \"{name}\"")))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
