//! Log-scale zoom helpers and tick placement.
//!
//! Zoom factors live in natural-log space so repeated in/out steps are exact
//! inverses; the linear factor is always recovered as `exp(scale_log)`.
//! Ticks land on the 1/2/5 x 10^n ladder with a minimum pixel spacing.

/// Hard cap on ticks returned for one axis, regardless of spacing.
const MAX_TICKS: usize = 256;

pub fn scale_from_log(scale_log: f64) -> f64 {
    scale_log.exp()
}

/// Smallest 1/2/5 x 10^n value that is >= `raw`.
pub fn nice_step_at_least(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let pow = 10f64.powf(raw.log10().floor());
    let m = raw / pow;
    let nice = if m <= 1.0 {
        1.0
    } else if m <= 2.0 {
        2.0
    } else if m <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * pow
}

/// Tick positions covering `[min, max]` in data units, spaced so adjacent
/// ticks sit at least `min_px_spacing` apart on screen at `scale` pixels
/// per data unit.
pub fn ticks(min: f64, max: f64, scale: f64, min_px_spacing: f64) -> Vec<f64> {
    if !(max > min) || scale <= 0.0 {
        return Vec::new();
    }
    let step = nice_step_at_least(min_px_spacing / scale);
    let mut out = Vec::new();
    let mut t = (min / step).ceil() * step;
    while t <= max + step * 1e-9 && out.len() < MAX_TICKS {
        out.push(t);
        t += step;
    }
    out
}

/// Trace coordinates are integers; fractional ticks only appear at extreme
/// zoom-in, so labels stay terse.
pub fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 || value.abs() >= 1000.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
