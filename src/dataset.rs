//! Historical dataset loader for the solar home testbench.
//!
//! Reads the half-hourly source table, slices the requested train or test
//! window and derives the tariff column.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use tracing::{debug, warn};

use crate::config::{BenchConfig, DatasetConfig};
use crate::error::BenchError;
use crate::params::TestbenchParameters;
use crate::schema::DATA_COLUMNS;
use crate::series::{DT_HOURS, STEPS_PER_DAY, TimeIndex, TimeSeries};

/// Number of days loaded when the caller has no preference.
pub const DEFAULT_NDAYS: usize = 30;

/// Upper bound on the samples reserved before the source is read.
const MAX_PREALLOCATED_SAMPLES: usize = 366 * STEPS_PER_DAY;

/// Timestamp layouts accepted in the first column of the source file.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Extraction window of the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subset {
    /// Test period, starting late November 2011.
    Test,
    /// Training period, starting one month before the test period.
    Train,
}

impl Subset {
    /// First day of this window.
    pub fn start_date(self, dataset: &DatasetConfig) -> NaiveDate {
        match self {
            Self::Test => dataset.test_start,
            Self::Train => dataset.train_start,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Train => "train",
        }
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subset {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "test" => Ok(Self::Test),
            "train" => Ok(Self::Train),
            other => Err(BenchError::InvalidArgument(format!(
                "subset should be either \"test\" or \"train\", got \"{other}\""
            ))),
        }
    }
}

/// Loads `ndays` of testbench input data from the conventional source file.
///
/// Returns the testbench parameters and a table with columns `P_load_sp`
/// (kW), `P_sun_1k` (kW/kWp) and `c_grid` (€/kWh). The index is elapsed
/// hours unless `keep_date` is set.
///
/// # Errors
///
/// * `InvalidArgument` if `subset` is not `"test"` or `"train"`, or `ndays` is 0
///   or too large to count in samples
/// * `NotFound` if the source file is missing
/// * `DataIntegrity` if the source runs out before `ndays` are read
pub fn load_data(
    ndays: usize,
    subset: &str,
    keep_date: bool,
) -> Result<(TestbenchParameters, TimeSeries), BenchError> {
    let subset = subset.parse()?;
    load_data_with(&BenchConfig::default(), ndays, subset, keep_date)
}

/// Like [`load_data`], with explicit configuration.
///
/// # Errors
///
/// Same as [`load_data`], plus `Config` if `config` fails validation and
/// `SchemaViolation` if the source lacks the configured load or solar column.
pub fn load_data_with(
    config: &BenchConfig,
    ndays: usize,
    subset: Subset,
    keep_date: bool,
) -> Result<(TestbenchParameters, TimeSeries), BenchError> {
    if ndays == 0 {
        return Err(BenchError::InvalidArgument("ndays must be > 0".to_string()));
    }
    let n = ndays.checked_mul(STEPS_PER_DAY).ok_or_else(|| {
        BenchError::InvalidArgument(format!("ndays = {ndays} is too large"))
    })?;
    config.check()?;
    let params = config.testbench.parameters()?;
    let dataset = &config.dataset;

    if !dataset.path.exists() {
        return Err(BenchError::NotFound {
            path: dataset.path.clone(),
        });
    }

    let gap_days = dataset.train_test_gap_days();
    if subset == Subset::Train && i64::try_from(ndays).unwrap_or(i64::MAX) > gap_days {
        warn!(
            ndays,
            gap_days, "ndays > {gap_days} makes training period overlap with test period"
        );
    }

    let start = subset.start_date(dataset).and_time(NaiveTime::MIN);
    let samples = read_window(&dataset.path, dataset, start, n)?;
    if samples.len() != n {
        return Err(BenchError::DataIntegrity(format!(
            "requested {n} samples from {start}, source \"{}\" only has {}",
            dataset.path.display(),
            samples.len()
        )));
    }
    check_contiguous(&samples)?;
    debug!(%subset, %start, n, "Sliced dataset window");

    // price depends on elapsed hours only, whatever the index kind
    let c_grid = config.tariff.price_series(n, DT_HOURS);
    let index = if keep_date {
        TimeIndex::Dates(samples.iter().map(|s| s.timestamp).collect())
    } else {
        TimeIndex::hours(n, DT_HOURS)
    };

    let calibration = dataset.solar_calibration;
    let [load_name, sun_name, price_name] = DATA_COLUMNS;
    let data = TimeSeries::new(index)
        .with_column(load_name, samples.iter().map(|s| s.load).collect())?
        .with_column(
            sun_name,
            samples.iter().map(|s| s.solar / calibration).collect(),
        )?
        .with_column(price_name, c_grid)?;

    Ok((params, data))
}

/// One row of the source file.
#[derive(Debug, Clone, Copy)]
struct SourceSample {
    timestamp: NaiveDateTime,
    load: f64,
    solar: f64,
}

/// Reads up to `n` samples stamped at or after `start`.
fn read_window(
    path: &Path,
    dataset: &DatasetConfig,
    start: NaiveDateTime,
    n: usize,
) -> Result<Vec<SourceSample>, BenchError> {
    let file = File::open(path).map_err(|e| BenchError::io(path, e))?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .skip(1)
            .position(|h| h == name)
            .map(|pos| pos + 1)
            .ok_or_else(|| {
                BenchError::SchemaViolation(format!(
                    "source \"{}\" has no column \"{name}\"",
                    path.display()
                ))
            })
    };
    let load_col = find(&dataset.load_column)?;
    let solar_col = find(&dataset.solar_column)?;

    let mut samples = Vec::with_capacity(n.min(MAX_PREALLOCATED_SAMPLES));
    for record in rdr.records() {
        if samples.len() == n {
            break;
        }
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        let timestamp = parse_timestamp(record.get(0).unwrap_or_default()).ok_or_else(|| {
            BenchError::DataIntegrity(format!(
                "line {line}: invalid timestamp \"{}\"",
                record.get(0).unwrap_or_default()
            ))
        })?;
        if timestamp < start {
            continue;
        }
        samples.push(SourceSample {
            timestamp,
            load: parse_value(&record, load_col, line)?,
            solar: parse_value(&record, solar_col, line)?,
        });
    }
    Ok(samples)
}

fn parse_value(record: &csv::StringRecord, col: usize, line: u64) -> Result<f64, BenchError> {
    let raw = record.get(col).unwrap_or_default();
    raw.parse().map_err(|_| {
        BenchError::DataIntegrity(format!(
            "line {line}: column {col} value \"{raw}\" is not a number"
        ))
    })
}

/// Parses a source timestamp, keeping the wall-clock time of offset-aware ones.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z"))
                .ok()
                .map(|t| t.naive_local())
        })
}

fn check_contiguous(samples: &[SourceSample]) -> Result<(), BenchError> {
    let step = TimeDelta::minutes(30);
    for pair in samples.windows(2) {
        let delta = pair[1].timestamp - pair[0].timestamp;
        if delta != step {
            return Err(BenchError::DataIntegrity(format!(
                "samples {} and {} are {} min apart, expected 30",
                pair[0].timestamp,
                pair[1].timestamp,
                delta.num_minutes()
            )));
        }
    }
    Ok(())
}
