//! Shared test fixtures for integration tests.

use std::f64::consts::PI;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use solarhome_bench::schema::TRAJECTORY_COLUMNS;
use solarhome_bench::{BenchConfig, TestbenchParameters, TimeIndex, TimeSeries};

/// Days covered by the default synthetic source (October to December 2011).
pub const SOURCE_DAYS: usize = 92;

/// One row of the synthetic source file.
#[derive(Debug, Clone, Copy)]
pub struct SourceRow {
    pub timestamp: NaiveDateTime,
    pub gc: f64,
    pub gg: f64,
}

/// First timestamp of the synthetic source file.
pub fn source_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2011, 10, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid start timestamp")
}

/// Noisy half-hourly load (`GC`) and solar (`GG`) profiles over `days`.
///
/// Load follows a daily sinusoid around 0.6 kW; solar is a half-sine
/// between 6h and 18h scaled by a random cloud factor.
pub fn synthetic_rows(days: usize, seed: u64) -> Vec<SourceRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..days * 48)
        .map(|i| {
            let hour = (i % 48) as f64 * 0.5;
            let gc = 0.6 + 0.4 * (2.0 * PI * (hour - 14.0) / 24.0).cos() + rng.random_range(0.0..0.1);
            let sun = if (6.0..18.0).contains(&hour) {
                (PI * (hour - 6.0) / 12.0).sin()
            } else {
                0.0
            };
            let gg = 0.9 * sun * rng.random_range(0.3..1.0);
            SourceRow {
                timestamp: source_start() + TimeDelta::minutes(30 * i as i64),
                gc,
                gg,
            }
        })
        .collect()
}

/// Writes rows in the layout of the historical source file.
pub fn write_source(path: &Path, rows: &[SourceRow]) {
    let file = File::create(path).expect("source file should be created");
    let mut w = BufWriter::new(file);
    writeln!(w, ",GC,GG,CL").expect("header should be written");
    for r in rows {
        writeln!(
            w,
            "{},{},{},0.0",
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.gc,
            r.gg
        )
        .expect("row should be written");
    }
    w.flush().expect("source file should be flushed");
}

/// Default configuration reading its source from `path`.
pub fn config_for(path: &Path) -> BenchConfig {
    let mut config = BenchConfig::default();
    config.dataset.path = path.to_path_buf();
    config
}

/// Trajectory of a storage-free policy: PV covers load first, the grid
/// supplies the rest, and surplus above zero export is curtailed.
pub fn pure_solar_trajectory(params: &TestbenchParameters, data: &TimeSeries) -> TimeSeries {
    let load = data.column("P_load_sp").expect("loader provides P_load_sp");
    let sun_1k = data.column("P_sun_1k").expect("loader provides P_sun_1k");
    let price = data.column("c_grid").expect("loader provides c_grid");
    let n = data.len();

    let p_sun: Vec<f64> = sun_1k.iter().map(|s| s * params.p_pvp()).collect();
    let p_pv: Vec<f64> = p_sun.iter().zip(load).map(|(&s, &l)| s.min(l)).collect();
    let p_curt: Vec<f64> = p_sun.iter().zip(&p_pv).map(|(s, pv)| s - pv).collect();
    let p_grid: Vec<f64> = load.iter().zip(&p_pv).map(|(l, pv)| l - pv).collect();

    let columns: [(&str, Vec<f64>); 10] = [
        ("E_sto", vec![0.0; n]),
        ("P_sto", vec![0.0; n]),
        ("P_load_sp", load.to_vec()),
        ("P_shed", vec![0.0; n]),
        ("P_load", load.to_vec()),
        ("P_sun", p_sun),
        ("P_curt", p_curt),
        ("P_pv", p_pv),
        ("P_grid", p_grid),
        ("c_grid", price.to_vec()),
    ];
    let mut traj = TimeSeries::new(data.index().clone());
    for (name, values) in columns {
        traj.push_column(name, values).expect("column should be added");
    }
    traj
}

/// Arbitrary trajectory honouring the column contract.
pub fn random_trajectory(n: usize, seed: u64) -> TimeSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut traj = TimeSeries::new(TimeIndex::hours(n, 0.5));
    for name in TRAJECTORY_COLUMNS {
        let values = (0..n).map(|_| rng.random_range(-3.0..3.0)).collect();
        traj.push_column(name, values).expect("column should be added");
    }
    traj
}

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a plain-text subscriber and returns its result and log output.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let sink = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let logs = buffer
        .0
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    (out, String::from_utf8_lossy(&logs).into_owned())
}
