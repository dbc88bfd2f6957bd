//! Classical additive seasonal decomposition
//!
//! `observed = trend + seasonal + residual`, where the trend is a centred
//! moving average whose missing ends are extended linearly, and the seasonal
//! component is the per-phase mean of the detrended series, centred on zero.
//! The adjusted series is `trend + residual`.

use statrs::statistics::Statistics;

use super::frame::Series;

/// Components of a decomposed series
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    pub period: usize,
}

impl Decomposition {
    /// `trend + residual`, i.e. the observed series minus its seasonal part
    #[must_use]
    pub fn adjusted(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(&self.residual)
            .map(|(t, r)| t + r)
            .collect()
    }
}

/// Decompose `data` with a seasonal cycle of `period` observations
///
/// Returns `None` when the period is below 2 or the series holds fewer than
/// two full cycles.
#[must_use]
pub fn decompose(data: &[f64], period: usize) -> Option<Decomposition> {
    let n = data.len();
    if period < 2 || n < period * 2 {
        return None;
    }

    let mut trend = centered_moving_average(data, period);
    extrapolate_ends(&mut trend, period);

    let detrended: Vec<f64> = data.iter().zip(&trend).map(|(y, t)| y - t).collect();

    let mut phase_means: Vec<f64> = (0..period)
        .map(|phase| detrended.iter().skip(phase).step_by(period).mean())
        .collect();
    let centre = phase_means.iter().mean();
    for m in &mut phase_means {
        *m -= centre;
    }

    let seasonal: Vec<f64> = (0..n).map(|i| phase_means[i % period]).collect();
    let residual: Vec<f64> = detrended
        .iter()
        .zip(&seasonal)
        .map(|(d, s)| d - s)
        .collect();

    Some(Decomposition {
        trend,
        seasonal,
        residual,
        period,
    })
}

/// Seasonally adjusted copy of `series`, or `None` when it is too short
#[must_use]
pub fn seasonally_adjust(series: &Series, period: usize) -> Option<Series> {
    decompose(&series.values, period).map(|d| series.with_values(d.adjusted()))
}

/// Centred moving average; `NaN` where the window does not fit
///
/// Even periods use the 2×m filter (half weight on both ends) so the window
/// stays centred.
fn centered_moving_average(data: &[f64], period: usize) -> Vec<f64> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] = 0.5 / period as f64;
        w[period] = 0.5 / period as f64;
        w
    } else {
        vec![1.0 / period as f64; period]
    };
    let half = (weights.len() - 1) / 2;

    let n = data.len();
    let mut trend = vec![f64::NAN; n];
    for i in half..n.saturating_sub(half) {
        trend[i] = weights
            .iter()
            .enumerate()
            .map(|(k, w)| w * data[i + k - half])
            .sum();
    }
    trend
}

/// Replace leading and trailing `NaN`s with least-squares lines fitted to the
/// nearest `npoints` defined values on each side
fn extrapolate_ends(trend: &mut [f64], npoints: usize) {
    let Some(front) = trend.iter().position(|v| !v.is_nan()) else {
        return;
    };
    let Some(back) = trend.iter().rposition(|v| !v.is_nan()) else {
        return;
    };

    let front_end = (front + npoints).min(back + 1);
    let (slope, intercept) = fit_line(front, &trend[front..front_end]);
    for (i, v) in trend.iter_mut().enumerate().take(front) {
        *v = slope * i as f64 + intercept;
    }

    let back_start = (back + 1).saturating_sub(npoints).max(front);
    let (slope, intercept) = fit_line(back_start, &trend[back_start..=back]);
    for (i, v) in trend.iter_mut().enumerate().skip(back + 1) {
        *v = slope * i as f64 + intercept;
    }
}

/// Ordinary least squares of `ys` against `offset..offset + ys.len()`
fn fit_line(offset: usize, ys: &[f64]) -> (f64, f64) {
    let n = ys.len() as f64;
    if ys.len() < 2 {
        return (0.0, ys.first().copied().unwrap_or(0.0));
    }
    let xs: Vec<f64> = (0..ys.len()).map(|i| (offset + i) as f64).collect();
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let cov: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();
    let var: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();

    let slope = cov / var;
    (slope, y_mean - slope * x_mean)
}
