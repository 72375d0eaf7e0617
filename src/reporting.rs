//! Fixed-width text reports of daily statistics.

use std::fmt::{self, Write};

use crate::stats::DailyStatistics;

/// Formats daily statistics as fixed-width text.
///
/// The `P_load_sp` and `P_shed` lines only appear when some load was shed;
/// otherwise served load equals the set point and one line suffices.
pub fn format_stats(stats: &DailyStatistics) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = write_report(&mut out, stats);
    out
}

/// Prints [`format_stats`] to stdout.
pub fn pprint_stats(stats: &DailyStatistics) {
    println!("{}", format_stats(stats));
}

fn write_report(f: &mut impl Write, s: &DailyStatistics) -> fmt::Result {
    if s.p_shed > 0.0 {
        writeln!(f, "P_load_sp: {:5.2} kWh/d (data)", s.p_load_sp)?;
        writeln!(f, "P_shed:    {:5.2} kWh/d", s.p_shed)?;
    }
    writeln!(f, "P_load:    {:5.2} kWh/d", s.p_load)?;
    writeln!(f)?;
    writeln!(f, "P_sun:     {:5.2} kWh/d (data)", s.p_sun)?;
    writeln!(f, "P_curt:    {:5.2} kWh/d", s.p_curt)?;
    writeln!(f, "P_pv:      {:5.2} kWh/d", s.p_pv)?;
    writeln!(f)?;
    writeln!(f, "P_sto:     {:5.2} kWh/d", s.p_sto)?;
    writeln!(f)?;
    writeln!(f, "P_grid:    {:5.2} kWh/d", s.p_grid)?;
    writeln!(f, "C_grid:    {:.3} €/d", s.c_grid)
}

impl fmt::Display for DailyStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(f, self)
    }
}
