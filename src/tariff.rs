//! Two-tier day/night grid tariff.

use crate::config::TariffConfig;

impl TariffConfig {
    /// Grid energy price (€/kWh) at `elapsed_hours` after the window start.
    ///
    /// Only the hour of day (`elapsed_hours mod 24`) matters.
    ///
    /// # Examples
    ///
    /// ```
    /// use solarhome_bench::config::TariffConfig;
    ///
    /// let tariff = TariffConfig::default();
    /// assert_eq!(tariff.price_at(5.5), 0.10);
    /// assert_eq!(tariff.price_at(6.0), 0.20);
    /// assert_eq!(tariff.price_at(24.0 + 1.0), 0.10);
    /// ```
    pub fn price_at(&self, elapsed_hours: f64) -> f64 {
        let hour_of_day = elapsed_hours.rem_euclid(24.0);
        if hour_of_day < self.night_end_hour {
            self.night_price
        } else {
            self.day_price
        }
    }

    /// Price threshold separating the low and high tiers.
    ///
    /// Trajectory plots shade samples priced below it.
    pub fn low_price_threshold(&self) -> f64 {
        0.5 * (self.night_price + self.day_price)
    }

    /// Price series for `n` samples spaced `dt_hours` apart.
    pub fn price_series(&self, n: usize, dt_hours: f64) -> Vec<f64> {
        (0..n).map(|i| self.price_at(i as f64 * dt_hours)).collect()
    }
}
