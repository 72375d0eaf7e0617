//! Integration tests for the dataset loader against synthetic source files.

mod common;

use chrono::{NaiveDate, TimeDelta};
use solarhome_bench::dataset::DEFAULT_NDAYS;
use solarhome_bench::schema::DATA_COLUMNS;
use solarhome_bench::{BenchError, Subset, TimeIndex, load_data_with};
use tempfile::TempDir;

/// Writes the default synthetic source into a fresh temp dir.
fn source_dir() -> (TempDir, Vec<common::SourceRow>) {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let rows = common::synthetic_rows(common::SOURCE_DAYS, 7);
    common::write_source(&dir.path().join("data.csv"), &rows);
    (dir, rows)
}

#[test]
fn loads_exactly_ndays_half_hours() {
    let (dir, _) = source_dir();
    let config = common::config_for(&dir.path().join("data.csv"));
    for subset in [Subset::Test, Subset::Train] {
        for ndays in [1, 7, DEFAULT_NDAYS] {
            let (_, data) =
                load_data_with(&config, ndays, subset, false).expect("window should load");
            assert_eq!(data.len(), ndays * 48, "{subset} with {ndays} days");
            assert_eq!(data.index(), &TimeIndex::hours(ndays * 48, 0.5));
        }
    }
}

#[test]
fn returns_reference_parameters_and_columns() {
    let (dir, _) = source_dir();
    let config = common::config_for(&dir.path().join("data.csv"));
    let (params, data) =
        load_data_with(&config, 2, Subset::Test, false).expect("window should load");
    assert_eq!(params.e_rated(), 8.0);
    assert_eq!(params.p_pvp(), 4.0);
    assert_eq!(params.p_grid_max(), Some(3.0));
    let names: Vec<&str> = data.column_names().collect();
    assert_eq!(names, DATA_COLUMNS.to_vec());
}

#[test]
fn test_window_starts_on_november_29() {
    let (dir, rows) = source_dir();
    let config = common::config_for(&dir.path().join("data.csv"));
    let (_, data) = load_data_with(&config, 3, Subset::Test, true).expect("window should load");

    let start = NaiveDate::from_ymd_opt(2011, 11, 29)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid timestamp");
    let TimeIndex::Dates(dates) = data.index() else {
        panic!("keep_date should yield a calendar index");
    };
    assert_eq!(dates[0], start);
    for pair in dates.windows(2) {
        assert_eq!(pair[1] - pair[0], TimeDelta::minutes(30));
    }

    let first = rows
        .iter()
        .position(|r| r.timestamp == start)
        .expect("source covers the test window");
    let load = data.column("P_load_sp").expect("load column");
    let sun = data.column("P_sun_1k").expect("solar column");
    for i in 0..data.len() {
        assert!((load[i] - rows[first + i].gc).abs() < 1e-12);
        assert!((sun[i] - rows[first + i].gg / 1.04).abs() < 1e-12);
    }
}

#[test]
fn train_window_starts_on_october_29() {
    let (dir, _) = source_dir();
    let config = common::config_for(&dir.path().join("data.csv"));
    let (_, data) = load_data_with(&config, 1, Subset::Train, true).expect("window should load");
    let TimeIndex::Dates(dates) = data.index() else {
        panic!("keep_date should yield a calendar index");
    };
    assert_eq!(
        Some(dates[0]),
        NaiveDate::from_ymd_opt(2011, 10, 29).and_then(|d| d.and_hms_opt(0, 0, 0))
    );
}

#[test]
fn tariff_follows_hour_of_day_regardless_of_index() {
    let (dir, _) = source_dir();
    let config = common::config_for(&dir.path().join("data.csv"));
    let (_, by_hours) = load_data_with(&config, 5, Subset::Test, false).expect("hours index");
    let (_, by_dates) = load_data_with(&config, 5, Subset::Test, true).expect("dates index");

    let prices = by_hours.column("c_grid").expect("price column");
    assert_eq!(Some(prices), by_dates.column("c_grid"));
    for (i, &price) in prices.iter().enumerate() {
        let hour = (i as f64 * 0.5) % 24.0;
        let expected = if hour < 6.0 { 0.10 } else { 0.20 };
        assert_eq!(price, expected, "sample {i} at hour {hour}");
    }
}

#[test]
fn long_training_window_overlapping_test_still_loads() {
    let (dir, _) = source_dir();
    let config = common::config_for(&dir.path().join("data.csv"));
    let (result, logs) =
        common::capture_logs(|| load_data_with(&config, 35, Subset::Train, false));
    let (_, data) = result.expect("window should load");
    assert_eq!(data.len(), 35 * 48);
    assert!(logs.contains("WARN"), "expected an overlap warning: {logs}");
}

#[test]
fn overlap_warning_starts_past_the_train_test_gap() {
    let (dir, _) = source_dir();
    let config = common::config_for(&dir.path().join("data.csv"));
    let warned = |ndays: usize, subset: Subset| {
        let (result, logs) = common::capture_logs(|| load_data_with(&config, ndays, subset, false));
        assert!(result.is_ok(), "{subset} with {ndays} days should load");
        logs.contains("overlap")
    };
    assert!(warned(32, Subset::Train));
    assert!(!warned(31, Subset::Train));
    assert!(!warned(1, Subset::Train));
    assert!(!warned(32, Subset::Test));
    assert!(!warned(33, Subset::Test));
}

#[test]
fn window_past_end_of_source_is_data_integrity_error() {
    let (dir, _) = source_dir();
    let config = common::config_for(&dir.path().join("data.csv"));
    // Nov 29 to Dec 31 leaves 33 days
    assert!(load_data_with(&config, 33, Subset::Test, false).is_ok());
    let err = load_data_with(&config, 34, Subset::Test, false);
    assert!(matches!(err, Err(BenchError::DataIntegrity(_))));
}

#[test]
fn missing_source_is_not_found() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let config = common::config_for(&dir.path().join("absent.csv"));
    let err = load_data_with(&config, 1, Subset::Test, false);
    assert!(matches!(err, Err(BenchError::NotFound { .. })));
}

#[test]
fn gap_in_source_is_data_integrity_error() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let mut rows = common::synthetic_rows(common::SOURCE_DAYS, 3);
    let start = NaiveDate::from_ymd_opt(2011, 11, 29)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .expect("valid timestamp");
    rows.retain(|r| r.timestamp != start);
    common::write_source(&dir.path().join("data.csv"), &rows);

    let config = common::config_for(&dir.path().join("data.csv"));
    let err = load_data_with(&config, 1, Subset::Test, false);
    assert!(matches!(err, Err(BenchError::DataIntegrity(_))));
}

#[test]
fn missing_source_column_is_schema_violation() {
    let (dir, _) = source_dir();
    let mut config = common::config_for(&dir.path().join("data.csv"));
    config.dataset.solar_column = "PV".to_string();
    let err = load_data_with(&config, 1, Subset::Test, false);
    assert!(matches!(err, Err(BenchError::SchemaViolation(_))));
}

#[test]
fn huge_window_is_data_integrity_error() {
    let (dir, _) = source_dir();
    let config = common::config_for(&dir.path().join("data.csv"));
    let err = load_data_with(&config, 1_000_000_000_000, Subset::Test, false);
    assert!(matches!(err, Err(BenchError::DataIntegrity(_))));
}

#[test]
fn overflowing_sample_count_is_invalid_argument() {
    let (dir, _) = source_dir();
    let config = common::config_for(&dir.path().join("data.csv"));
    let err = load_data_with(&config, usize::MAX / 2, Subset::Test, false);
    assert!(matches!(err, Err(BenchError::InvalidArgument(_))));
}

#[test]
fn invalid_config_is_rejected_before_loading() {
    let (dir, _) = source_dir();
    let mut config = common::config_for(&dir.path().join("data.csv"));
    config.dataset.solar_calibration = 0.0;
    let err = load_data_with(&config, 1, Subset::Test, false);
    assert!(matches!(err, Err(BenchError::Config(e)) if e.field == "dataset.solar_calibration"));

    let mut config = common::config_for(&dir.path().join("data.csv"));
    config.tariff.night_end_hour = 30.0;
    let err = load_data_with(&config, 1, Subset::Test, false);
    assert!(matches!(err, Err(BenchError::Config(e)) if e.field == "tariff.night_end_hour"));

    let mut config = common::config_for(&dir.path().join("data.csv"));
    config.tariff.day_price = f64::NAN;
    let err = load_data_with(&config, 1, Subset::Test, false);
    assert!(matches!(err, Err(BenchError::Config(_))));
}

#[test]
fn zero_days_is_invalid_argument() {
    let (dir, _) = source_dir();
    let config = common::config_for(&dir.path().join("data.csv"));
    let err = load_data_with(&config, 0, Subset::Test, false);
    assert!(matches!(err, Err(BenchError::InvalidArgument(_))));
}

#[test]
fn unknown_subset_is_invalid_argument() {
    let err = "foo".parse::<Subset>();
    assert!(matches!(err, Err(BenchError::InvalidArgument(_))));
    let err = solarhome_bench::load_data(1, "foo", false);
    assert!(matches!(err, Err(BenchError::InvalidArgument(_))));
}
