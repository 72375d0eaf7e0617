//! Daily-average performance statistics of a simulated trajectory.

use serde::{Deserialize, Serialize};

use crate::error::BenchError;
use crate::schema::STAT_KEYS;
use crate::series::TimeSeries;

/// Hours per day, scaling a mean power (kW) to a daily energy (kWh/d).
const HOURS_PER_DAY: f64 = 24.0;

/// Magnitude below which a statistic is treated as floating-point noise.
pub const ZERO_TOLERANCE: f64 = 1e-13;

/// Daily energy (kWh/d) and cost (€/d) figures of one simulation run.
///
/// Field order matches [`STAT_KEYS`], which is also the column order of
/// statistics files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyStatistics {
    #[serde(rename = "P_sto")]
    pub p_sto: f64,
    #[serde(rename = "P_load_sp")]
    pub p_load_sp: f64,
    #[serde(rename = "P_shed")]
    pub p_shed: f64,
    #[serde(rename = "P_load")]
    pub p_load: f64,
    #[serde(rename = "P_sun")]
    pub p_sun: f64,
    #[serde(rename = "P_curt")]
    pub p_curt: f64,
    #[serde(rename = "P_pv")]
    pub p_pv: f64,
    #[serde(rename = "P_grid")]
    pub p_grid: f64,
    /// Grid energy cost (€/d).
    #[serde(rename = "C_grid")]
    pub c_grid: f64,
}

impl DailyStatistics {
    /// Value of the statistic named `key` (one of [`STAT_KEYS`]).
    pub fn get(&self, key: &str) -> Option<f64> {
        let value = match key {
            "P_sto" => self.p_sto,
            "P_load_sp" => self.p_load_sp,
            "P_shed" => self.p_shed,
            "P_load" => self.p_load,
            "P_sun" => self.p_sun,
            "P_curt" => self.p_curt,
            "P_pv" => self.p_pv,
            "P_grid" => self.p_grid,
            "C_grid" => self.c_grid,
            _ => return None,
        };
        Some(value)
    }

    /// `(key, value)` pairs in [`STAT_KEYS`] order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        STAT_KEYS
            .iter()
            .filter_map(|&k| self.get(k).map(|v| (k, v)))
    }

    /// Copy with every value of magnitude `<= ZERO_TOLERANCE` set to exactly 0.
    pub fn clamped(&self) -> Self {
        let clamp = |v: f64| if v.abs() <= ZERO_TOLERANCE { 0.0 } else { v };
        Self {
            p_sto: clamp(self.p_sto),
            p_load_sp: clamp(self.p_load_sp),
            p_shed: clamp(self.p_shed),
            p_load: clamp(self.p_load),
            p_sun: clamp(self.p_sun),
            p_curt: clamp(self.p_curt),
            p_pv: clamp(self.p_pv),
            p_grid: clamp(self.p_grid),
            c_grid: clamp(self.c_grid),
        }
    }
}

/// Computes the daily statistics of a trajectory.
///
/// Each power column is reduced to `mean * 24`. The grid cost is the mean
/// of the elementwise product `P_grid * c_grid`, times 24, so that the
/// correlation between import and price is accounted for.
///
/// # Errors
///
/// * `SchemaViolation` if a required column is missing
/// * `DataIntegrity` if the trajectory has no rows
pub fn compute_stats(traj: &TimeSeries) -> Result<DailyStatistics, BenchError> {
    if traj.is_empty() {
        return Err(BenchError::DataIntegrity(
            "cannot compute statistics of an empty trajectory".to_string(),
        ));
    }
    let daily = |name: &str| traj.require(name).map(|v| mean(v) * HOURS_PER_DAY);

    let p_grid = traj.require("P_grid")?;
    let c_grid = traj.require("c_grid")?;
    let cost: Vec<f64> = p_grid.iter().zip(c_grid).map(|(p, c)| p * c).collect();

    Ok(DailyStatistics {
        p_sto: daily("P_sto")?,
        p_load_sp: daily("P_load_sp")?,
        p_shed: daily("P_shed")?,
        p_load: daily("P_load")?,
        p_sun: daily("P_sun")?,
        p_curt: daily("P_curt")?,
        p_pv: daily("P_pv")?,
        p_grid: daily("P_grid")?,
        c_grid: mean(&cost) * HOURS_PER_DAY,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
