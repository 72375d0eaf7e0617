//! Three-file CSV persistence of simulation result sets.
//!
//! A result set for method `<name>` is stored as `<name>_meta.csv`,
//! `<name>_stat.csv` and `<name>_traj.csv` in one directory. Each file is
//! written to a temporary sibling and renamed into place; there is no
//! transaction across the three files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::params::TestbenchParameters;
use crate::schema::{META_HEADER, STAT_KEYS, TIME_INDEX_COLUMN, check_trajectory_columns};
use crate::series::{TimeIndex, TimeSeries};
use crate::stats::DailyStatistics;

/// Directory used by [`save_results`].
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Method name and testbench sizing of a saved result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMetadata {
    /// Name of the control method that produced the run.
    pub method: String,
    pub params: TestbenchParameters,
}

/// The persisted unit: metadata, statistics and trajectory of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub meta: ResultMetadata,
    pub stats: DailyStatistics,
    pub trajectory: TimeSeries,
}

/// File paths of one result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPaths {
    pub meta: PathBuf,
    pub stat: PathBuf,
    pub traj: PathBuf,
}

/// A directory holding result sets.
#[derive(Debug, Clone)]
pub struct ResultsStore {
    dir: PathBuf,
}

impl ResultsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the `[results] dir` of `config`.
    ///
    /// [`save_results`] always uses [`DEFAULT_RESULTS_DIR`]; build the store
    /// this way to honour a configured directory.
    pub fn from_config(config: &BenchConfig) -> Self {
        Self::new(config.results.dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of the three files of method `name`.
    pub fn paths(&self, name: &str) -> ResultPaths {
        ResultPaths {
            meta: self.dir.join(format!("{name}_meta.csv")),
            stat: self.dir.join(format!("{name}_stat.csv")),
            traj: self.dir.join(format!("{name}_traj.csv")),
        }
    }

    /// Saves a result set, overwriting any previous one of the same name.
    ///
    /// The trajectory column contract is checked before anything is
    /// written, so a violation leaves the directory untouched.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` if `name` is empty or contains a path separator
    /// * `SchemaViolation` if the trajectory columns differ from the contract
    /// * `Io`/`Csv` if a file cannot be written
    pub fn save(
        &self,
        name: &str,
        params: &TestbenchParameters,
        stats: &DailyStatistics,
        traj: &TimeSeries,
    ) -> Result<(), BenchError> {
        check_method_name(name)?;
        check_trajectory_columns(traj.column_names())?;

        fs::create_dir_all(&self.dir).map_err(|e| BenchError::io(&self.dir, e))?;
        let paths = self.paths(name);

        write_atomically(&paths.meta, |w| write_meta(w, name, params))?;
        write_atomically(&paths.stat, |w| write_stats(w, stats))?;
        write_atomically(&paths.traj, |w| write_traj(w, traj))?;

        info!(method = name, dir = %self.dir.display(), "Result files written");
        Ok(())
    }

    /// Loads the result set of method `name`.
    ///
    /// # Errors
    ///
    /// * `NotFound` if any of the three files is missing
    /// * `SchemaViolation` if a header or row count does not match the contract
    pub fn load(&self, name: &str) -> Result<ResultSet, BenchError> {
        let paths = self.paths(name);
        for path in [&paths.meta, &paths.stat, &paths.traj] {
            if !path.exists() {
                return Err(BenchError::NotFound { path: path.clone() });
            }
        }

        let meta = read_meta(open(&paths.meta)?)?;
        let stats = read_stats(open(&paths.stat)?)?;
        let trajectory = read_traj(open(&paths.traj)?)?;

        info!(method = %meta.method, rows = trajectory.len(), "Result set loaded");
        Ok(ResultSet {
            meta,
            stats,
            trajectory,
        })
    }
}

/// Saves a result set under the conventional `results` directory.
///
/// Use [`ResultsStore::from_config`] to write elsewhere.
///
/// # Errors
///
/// See [`ResultsStore::save`].
pub fn save_results(
    name: &str,
    params: &TestbenchParameters,
    stats: &DailyStatistics,
    traj: &TimeSeries,
) -> Result<(), BenchError> {
    ResultsStore::new(DEFAULT_RESULTS_DIR).save(name, params, stats, traj)
}

/// Loads the result set of method `name` from `folder`.
///
/// # Errors
///
/// See [`ResultsStore::load`].
pub fn load_results(folder: impl AsRef<Path>, name: &str) -> Result<ResultSet, BenchError> {
    ResultsStore::new(folder.as_ref()).load(name).map_err(|e| match e {
        BenchError::SchemaViolation(msg) => {
            BenchError::SchemaViolation(format!("result set \"{name}\": {msg}"))
        }
        other => other,
    })
}

fn check_method_name(name: &str) -> Result<(), BenchError> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(BenchError::InvalidArgument(format!(
            "method name \"{name}\" cannot be used as a file prefix"
        )));
    }
    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>, BenchError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| BenchError::io(path, e))
}

/// Writes `path` through a temporary sibling, leaving any prior file intact on failure.
fn write_atomically(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<(), BenchError>,
) -> Result<(), BenchError> {
    let tmp = path.with_extension("csv.tmp");
    let result = File::create(&tmp)
        .map_err(|e| BenchError::io(&tmp, e))
        .and_then(|file| {
            let mut buf = BufWriter::new(file);
            write(&mut buf)?;
            buf.flush().map_err(|e| BenchError::io(&tmp, e))
        })
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| BenchError::io(path, e)));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Writes the metadata header and row, numbers with 3 decimals.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_meta(
    writer: impl Write,
    name: &str,
    params: &TestbenchParameters,
) -> Result<(), BenchError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(META_HEADER)?;
    wtr.write_record([
        name.to_string(),
        format!("{:.3}", params.e_rated()),
        format!("{:.3}", params.p_pvp()),
        params
            .p_grid_max()
            .map(|p| format!("{p:.3}"))
            .unwrap_or_default(),
    ])?;
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes the statistics header and row, with near-zero values clamped to 0.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_stats(writer: impl Write, stats: &DailyStatistics) -> Result<(), BenchError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.serialize(stats.clamped())?;
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes the trajectory: a `t` index column, then every column in order.
///
/// Values use the shortest representation that parses back exactly.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_traj(writer: impl Write, traj: &TimeSeries) -> Result<(), BenchError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(std::iter::once(TIME_INDEX_COLUMN).chain(traj.column_names()))?;

    let index = traj.index();
    let mut row = Vec::with_capacity(traj.columns().len() + 1);
    for i in 0..traj.len() {
        row.clear();
        row.push(index.label(i).unwrap_or_default());
        row.extend(traj.columns().iter().map(|c| c.values[i].to_string()));
        wtr.write_record(&row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Reads a metadata file.
///
/// Files written before the grid limit was recorded (three columns) are
/// accepted and yield `P_grid_max = None`.
///
/// # Errors
///
/// Returns `SchemaViolation` if the header differs or there is not exactly one row.
pub fn read_meta(reader: impl Read) -> Result<ResultMetadata, BenchError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let legacy = &META_HEADER[..3];
    if !headers.iter().eq(META_HEADER) && !headers.iter().eq(legacy.iter().copied()) {
        return Err(BenchError::SchemaViolation(format!(
            "metadata header is {:?}, expected {META_HEADER:?}",
            headers.iter().collect::<Vec<_>>()
        )));
    }
    let rows = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(ragged_row)?;
    let record = single_row(rows, "metadata")?;

    let number = |i: usize| -> Result<Option<f64>, BenchError> {
        match record.get(i).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                BenchError::SchemaViolation(format!(
                    "metadata field {} is not a number: \"{raw}\"",
                    META_HEADER[i]
                ))
            }),
        }
    };
    let required = |i: usize| {
        number(i)?.ok_or_else(|| {
            BenchError::SchemaViolation(format!("metadata field {} is empty", META_HEADER[i]))
        })
    };

    let params = TestbenchParameters::new(required(1)?, required(2)?, number(3)?)
        .map_err(|e| BenchError::SchemaViolation(format!("metadata: {e}")))?;
    Ok(ResultMetadata {
        method: record.get(0).unwrap_or_default().to_string(),
        params,
    })
}

/// Reads a statistics file.
///
/// # Errors
///
/// Returns `SchemaViolation` if the header differs from the fixed key order
/// or there is not exactly one row.
pub fn read_stats(reader: impl Read) -> Result<DailyStatistics, BenchError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    if !headers.iter().eq(STAT_KEYS) {
        return Err(BenchError::SchemaViolation(format!(
            "statistics header is {:?}, expected {STAT_KEYS:?}",
            headers.iter().collect::<Vec<_>>()
        )));
    }
    let rows = rdr
        .deserialize::<DailyStatistics>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(ragged_row)?;
    single_row(rows, "statistics")
}

/// Reads a trajectory file, taking its first column as the index.
///
/// # Errors
///
/// Returns `SchemaViolation` if the columns after the index differ from the
/// contract, a row has the wrong number of fields or a value is not numeric.
pub fn read_traj(reader: impl Read) -> Result<TimeSeries, BenchError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(BenchError::SchemaViolation(
            "trajectory file has no header".to_string(),
        ));
    }
    let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    check_trajectory_columns(names.iter().map(String::as_str))?;

    let mut labels = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for record in rdr.records() {
        let record = record.map_err(ragged_row)?;
        let line = record.position().map_or(0, csv::Position::line);
        labels.push(record.get(0).unwrap_or_default().to_string());
        for (col, values) in columns.iter_mut().enumerate() {
            let raw = record.get(col + 1).unwrap_or_default();
            let value = raw.trim().parse().map_err(|_| {
                BenchError::SchemaViolation(format!(
                    "line {line}: {} value \"{raw}\" is not a number",
                    names[col]
                ))
            })?;
            values.push(value);
        }
    }

    let mut traj = TimeSeries::new(TimeIndex::parse_labels(&labels)?);
    for (name, values) in names.into_iter().zip(columns) {
        traj.push_column(name, values)?;
    }
    Ok(traj)
}

/// Reports rows whose field count differs from the header as `SchemaViolation`.
fn ragged_row(err: csv::Error) -> BenchError {
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => BenchError::SchemaViolation(format!(
            "line {}: {len} fields, header has {expected_len}",
            pos.as_ref().map_or(0, csv::Position::line)
        )),
        _ => BenchError::Csv(err),
    }
}

fn single_row<T>(rows: Vec<T>, what: &str) -> Result<T, BenchError> {
    let n = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(row), None) => Ok(row),
        _ => Err(BenchError::SchemaViolation(format!(
            "{what} file must contain exactly one data row, found {n}"
        ))),
    }
}
