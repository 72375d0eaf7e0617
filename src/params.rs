//! Fixed scalar sizing of one testbench instance.

use crate::error::BenchError;

/// Storage, PV and grid sizing attached to every saved result set.
///
/// Fields are private so a constructed value stays valid and immutable.
///
/// # Examples
///
/// ```
/// use solarhome_bench::params::TestbenchParameters;
///
/// let params = TestbenchParameters::new(8.0, 4.0, Some(3.0)).unwrap();
/// assert_eq!(params.e_rated(), 8.0);
/// assert!(TestbenchParameters::new(0.0, 4.0, None).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestbenchParameters {
    e_rated: f64,
    p_pvp: f64,
    p_grid_max: Option<f64>,
}

impl TestbenchParameters {
    /// Creates a parameter set.
    ///
    /// # Arguments
    ///
    /// * `e_rated` - Storage capacity (kWh)
    /// * `p_pvp` - PV panel size (kWp)
    /// * `p_grid_max` - Subscribed grid capacity (kW), absent in older result sets
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any present value is not a positive finite number.
    pub fn new(e_rated: f64, p_pvp: f64, p_grid_max: Option<f64>) -> Result<Self, BenchError> {
        check_positive("E_rated", e_rated)?;
        check_positive("P_pvp", p_pvp)?;
        if let Some(p) = p_grid_max {
            check_positive("P_grid_max", p)?;
        }
        Ok(Self {
            e_rated,
            p_pvp,
            p_grid_max,
        })
    }

    /// Storage capacity (kWh).
    pub fn e_rated(&self) -> f64 {
        self.e_rated
    }

    /// PV panel size (kWp).
    pub fn p_pvp(&self) -> f64 {
        self.p_pvp
    }

    /// Subscribed grid capacity (kW).
    pub fn p_grid_max(&self) -> Option<f64> {
        self.p_grid_max
    }
}

impl Default for TestbenchParameters {
    fn default() -> Self {
        Self {
            e_rated: 8.0,
            p_pvp: 4.0,
            p_grid_max: Some(3.0),
        }
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), BenchError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(BenchError::InvalidArgument(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}
