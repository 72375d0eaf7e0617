//! Data pipeline of the solar home energy-management testbench.
//!
//! Loads the half-hourly input dataset, reduces simulated trajectories to
//! daily statistics and persists result sets as three CSV files.

pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod params;
#[cfg(feature = "plot")]
pub mod plot;
pub mod reporting;
pub mod schema;
pub mod series;
pub mod stats;
mod tariff;

pub use config::BenchConfig;
pub use dataset::{DEFAULT_NDAYS, Subset, load_data, load_data_with};
pub use error::{BenchError, Result};
pub use io::store::{ResultMetadata, ResultSet, ResultsStore, load_results, save_results};
pub use params::TestbenchParameters;
#[cfg(feature = "plot")]
pub use plot::plot_traj;
pub use reporting::{format_stats, pprint_stats};
pub use series::{TimeIndex, TimeSeries};
pub use stats::{DailyStatistics, compute_stats};
