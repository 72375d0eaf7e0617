//! Ordered column-name contracts shared by the loader and the results store.

use crate::error::BenchError;

/// Header of the time index column in trajectory files.
pub const TIME_INDEX_COLUMN: &str = "t";

/// Trajectory columns, in file order, following the time index.
#[rustfmt::skip]
pub const TRAJECTORY_COLUMNS: [&str; 10] = [
    "E_sto", "P_sto", // storage
    "P_load_sp", "P_shed", "P_load", // load
    "P_sun", "P_curt", "P_pv", // sun
    "P_grid", "c_grid", // grid
];

/// Daily statistic keys, in file order.
#[rustfmt::skip]
pub const STAT_KEYS: [&str; 9] = [
    "P_sto",
    "P_load_sp", "P_shed", "P_load",
    "P_sun", "P_curt", "P_pv",
    "P_grid", "C_grid",
];

/// Metadata file header.
pub const META_HEADER: [&str; 4] = ["control method", "E_rated", "P_pvp", "P_grid_max"];

/// Columns produced by the dataset loader.
pub const DATA_COLUMNS: [&str; 3] = ["P_load_sp", "P_sun_1k", "c_grid"];

/// Checks that `names` is exactly [`TRAJECTORY_COLUMNS`], in order.
///
/// # Errors
///
/// Returns `SchemaViolation` describing the first mismatch.
pub fn check_trajectory_columns<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), BenchError> {
    let names: Vec<&str> = names.into_iter().collect();
    for (pos, expected) in TRAJECTORY_COLUMNS.iter().enumerate() {
        match names.get(pos) {
            Some(found) if found == expected => {}
            Some(found) => {
                return Err(BenchError::SchemaViolation(format!(
                    "trajectory column {pos} is \"{found}\", expected \"{expected}\""
                )));
            }
            None => {
                return Err(BenchError::SchemaViolation(format!(
                    "trajectory is missing column \"{expected}\" at position {pos}"
                )));
            }
        }
    }
    if names.len() > TRAJECTORY_COLUMNS.len() {
        return Err(BenchError::SchemaViolation(format!(
            "trajectory has unexpected extra columns: {}",
            names[TRAJECTORY_COLUMNS.len()..].join(", ")
        )));
    }
    Ok(())
}
