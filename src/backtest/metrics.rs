//! Performance metric kernels
//!
//! Shared between the backtest report and the live execution tracker so the
//! two modes can never drift apart.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Annualized Sharpe ratio of step returns; 0 when volatility is 0
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    let sd = stddev(returns);
    if sd == 0.0 {
        return 0.0;
    }
    mean(returns) / sd * periods_per_year.sqrt()
}

/// Step-over-step returns of an equity curve
pub fn step_returns(equity: &[Decimal]) -> Vec<f64> {
    equity
        .windows(2)
        .filter_map(|pair| {
            let prev = pair[0].to_f64()?;
            let curr = pair[1].to_f64()?;
            if prev == 0.0 {
                return None;
            }
            Some((curr - prev) / prev)
        })
        .collect()
}

/// Largest peak-to-trough decline as a fraction of the running peak
///
/// Always in [0, 1] for non-negative equity curves.
pub fn max_drawdown(equity: &[Decimal]) -> f64 {
    let mut peak = Decimal::MIN;
    let mut worst = 0.0f64;

    for value in equity {
        if *value > peak {
            peak = *value;
        }
        if peak > Decimal::ZERO {
            let dd = ((peak - *value) / peak).to_f64().unwrap_or(0.0);
            if dd > worst {
                worst = dd;
            }
        }
    }

    worst.clamp(0.0, 1.0)
}
