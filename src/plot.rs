//! Trajectory charts rendered with `plotters`.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::config::TariffConfig;
use crate::error::BenchError;
use crate::series::{DT_HOURS, TimeSeries};

const NET_LOAD_COLOR: RGBColor = RGBColor(128, 128, 128);
const LOW_PRICE_COLOR: RGBColor = RGBColor(230, 230, 230);

/// Renders a trajectory as two stacked charts into a PNG file.
///
/// 1. Power flows in compact form: net load (`P_load_sp - P_sun`) and
///    grid minus curtailment (`P_grid - P_curt`), its positive area shaded
///    red and its negative area yellow. With `show_p_sto`, the storage
///    output `-P_sto` is added.
/// 2. Stored energy `E_sto` between reference lines at 0 and `e_rated`.
///
/// Samples priced below the midpoint of the reference tariff tiers are
/// shaded light grey in both charts as low-price periods. The x axis is
/// in days.
///
/// # Errors
///
/// * `InvalidArgument` if the trajectory is empty
/// * `SchemaViolation` if a plotted column is missing
/// * `Plot` if rendering or writing the image fails
pub fn plot_traj(
    traj: &TimeSeries,
    e_rated: f64,
    show_p_sto: bool,
    path: &Path,
) -> Result<(), BenchError> {
    if traj.is_empty() {
        return Err(BenchError::InvalidArgument(
            "cannot plot an empty trajectory".to_string(),
        ));
    }
    let series = PlotSeries::from_trajectory(traj)?;
    draw(&series, e_rated, show_p_sto, path).map_err(|e| BenchError::Plot(e.to_string()))
}

/// Columns derived from a trajectory, ready to draw.
struct PlotSeries {
    /// Time in days.
    td: Vec<f64>,
    net_load: Vec<f64>,
    grid_minus_curt: Vec<f64>,
    sto_gen: Vec<f64>,
    e_sto: Vec<f64>,
    low_price: Vec<bool>,
}

impl PlotSeries {
    fn from_trajectory(traj: &TimeSeries) -> Result<Self, BenchError> {
        let threshold = TariffConfig::default().low_price_threshold();
        let diff = |a: &[f64], b: &[f64]| -> Vec<f64> {
            a.iter().zip(b).map(|(x, y)| x - y).collect()
        };
        Ok(Self {
            td: (0..traj.len()).map(|i| i as f64 * DT_HOURS / 24.0).collect(),
            net_load: diff(traj.require("P_load_sp")?, traj.require("P_sun")?),
            grid_minus_curt: diff(traj.require("P_grid")?, traj.require("P_curt")?),
            sto_gen: traj.require("P_sto")?.iter().map(|p| -p).collect(),
            e_sto: traj.require("E_sto")?.to_vec(),
            low_price: traj
                .require("c_grid")?
                .iter()
                .map(|&c| c < threshold)
                .collect(),
        })
    }

    fn points<'a>(&'a self, values: &'a [f64]) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.td.iter().copied().zip(values.iter().copied())
    }

    /// Shaded bands covering consecutive low-price samples.
    fn low_price_bands(&self, y1: f64, y2: f64) -> Vec<Rectangle<(f64, f64)>> {
        let dt_days = DT_HOURS / 24.0;
        let mut bands = Vec::new();
        let mut start = None;
        for (i, &low) in self.low_price.iter().enumerate() {
            match (low, start) {
                (true, None) => start = Some(self.td[i]),
                (false, Some(t0)) => {
                    bands.push(Rectangle::new(
                        [(t0, y1), (self.td[i], y2)],
                        LOW_PRICE_COLOR.filled(),
                    ));
                    start = None;
                }
                _ => {}
            }
        }
        if let (Some(t0), Some(&last)) = (start, self.td.last()) {
            bands.push(Rectangle::new(
                [(t0, y1), (last + dt_days, y2)],
                LOW_PRICE_COLOR.filled(),
            ));
        }
        bands
    }
}

fn draw(
    s: &PlotSeries,
    e_rated: f64,
    show_p_sto: bool,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, (900, 525)).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((2, 1));

    let x0 = s.td.first().copied().unwrap_or(0.0);
    let x1 = s.td.last().copied().unwrap_or(0.0) + DT_HOURS / 24.0;

    // Power flows
    let mut plotted: Vec<f64> = s
        .net_load
        .iter()
        .chain(&s.grid_minus_curt)
        .copied()
        .collect();
    if show_p_sto {
        plotted.extend(&s.sto_gen);
    }
    let (y1, y2) = padded_range(&plotted);

    let mut power = ChartBuilder::on(&areas[0])
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y1..y2)?;
    power.configure_mesh().y_desc("Power (kW)").draw()?;

    power.draw_series(s.low_price_bands(y1, y2))?;
    power.draw_series(AreaSeries::new(
        s.points(&s.grid_minus_curt).map(|(t, p)| (t, p.max(0.0))),
        0.0,
        RED.mix(0.25),
    ))?;
    power.draw_series(AreaSeries::new(
        s.points(&s.grid_minus_curt).map(|(t, p)| (t, p.min(0.0))),
        0.0,
        YELLOW.mix(0.25),
    ))?;

    power
        .draw_series(LineSeries::new(s.points(&s.net_load), &NET_LOAD_COLOR))?
        .label("load − sun")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &NET_LOAD_COLOR));
    if show_p_sto {
        power
            .draw_series(LineSeries::new(s.points(&s.sto_gen), &GREEN))?
            .label("sto (gen)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &GREEN));
    }
    power
        .draw_series(LineSeries::new(s.points(&s.grid_minus_curt), &RED))?
        .label("grid − curt")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &RED));
    power
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    // Stored energy
    let (e1, e2) = (-0.05 * e_rated, 1.05 * e_rated);
    let mut energy = ChartBuilder::on(&areas[1])
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, e1..e2)?;
    energy
        .configure_mesh()
        .x_desc("time (days)")
        .y_desc("Energy (kWh)")
        .draw()?;

    energy.draw_series(s.low_price_bands(e1, e2))?;
    for level in [0.0, e_rated] {
        energy.draw_series(LineSeries::new(
            [(x0, level), (x1, level)],
            GREEN.stroke_width(1),
        ))?;
    }
    energy
        .draw_series(LineSeries::new(s.points(&s.e_sto), GREEN.stroke_width(2)))?
        .label("E_sto")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &GREEN));
    energy
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Data range with a 5% margin, widened when all values are equal.
fn padded_range(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let span = hi - lo;
    if span < 1e-9 {
        return (lo - 1.0, hi + 1.0);
    }
    (lo - 0.05 * span, hi + 0.05 * span)
}
