use tessel_core::{Rejection, MIN_PROPORTION};

// ──────────────────────────────────────────────
// Fixed-precision width shares
// ──────────────────────────────────────────────

/// Shares are kept as multiples of 1/10000 so repeated split/close/resize
/// cycles cannot accumulate float drift.
const UNITS: i64 = 10_000;

fn min_units() -> i64 {
    (MIN_PROPORTION * UNITS as f32).round() as i64
}

fn to_units(share: f32) -> i64 {
    (share * UNITS as f32).round() as i64
}

fn from_units(units: &[i64]) -> Vec<f32> {
    units.iter().map(|&u| u as f32 / UNITS as f32).collect()
}

fn widest(units: &[i64]) -> usize {
    let mut best = 0;
    for (i, &u) in units.iter().enumerate() {
        if u > units[best] {
            best = i;
        }
    }
    best
}

/// Make `units` sum to exactly UNITS with every entry at least the minimum.
/// Rounding remainder and minimum top-ups are both paid by the widest pane.
fn settle(units: &mut [i64]) {
    if units.is_empty() {
        return;
    }

    let drift = UNITS - units.iter().sum::<i64>();
    let w = widest(units);
    units[w] += drift;

    let min = min_units();
    if units.len() as i64 * min > UNITS {
        return;
    }
    for i in 0..units.len() {
        if units[i] >= min {
            continue;
        }
        let mut deficit = min - units[i];
        units[i] = min;
        while deficit > 0 {
            let w = widest(units);
            let available = units[w] - min;
            if available <= 0 {
                break;
            }
            let taken = available.min(deficit);
            units[w] -= taken;
            deficit -= taken;
        }
    }
}

/// Equal shares for `count` panes.
pub(crate) fn equal(count: usize) -> Vec<f32> {
    normalize(&[], count)
}

/// Rescale `shares` to `count` entries summing to one, each at least
/// `MIN_PROPORTION`, quantized to four decimal places.
///
/// Falls back to equal shares unless `shares` holds `count` finite positive
/// values with a finite sum.
pub(crate) fn normalize(shares: &[f32], count: usize) -> Vec<f32> {
    if count == 0 {
        return Vec::new();
    }

    let usable = shares.len() == count
        && shares.iter().all(|s| s.is_finite() && *s > 0.0)
        && shares.iter().sum::<f32>().is_finite();
    let weights: Vec<f32> = if usable {
        shares.to_vec()
    } else {
        vec![1.0; count]
    };

    let total: f32 = weights.iter().sum();
    let mut units: Vec<i64> = weights.iter().map(|w| to_units(w / total)).collect();
    settle(&mut units);
    from_units(&units)
}

/// Split the share at `index` in half, inserting the new half right after it.
pub(crate) fn split(shares: &[f32], index: usize) -> Vec<f32> {
    let mut out = shares.to_vec();
    let half = (out[index] / 2.0).max(MIN_PROPORTION);
    out[index] = half;
    out.insert(index + 1, half);
    normalize(&out, out.len())
}

/// Hand the share at `from` to `into` and drop the `from` slot.
pub(crate) fn merge(shares: &[f32], from: usize, into: usize) -> Vec<f32> {
    let mut out = shares.to_vec();
    out[into] += out[from];
    out.remove(from);
    normalize(&out, out.len())
}

/// Move `delta` of width from pane `index + 1` to pane `index`, clamped so
/// neither side drops below `MIN_PROPORTION`.
pub(crate) fn shift(shares: &[f32], index: usize, delta: f32) -> Result<Vec<f32>, Rejection> {
    if index >= shares.len().saturating_sub(1) {
        return Err(Rejection::IndexOutOfRange);
    }
    if !delta.is_finite() {
        return Err(Rejection::InvalidDelta);
    }

    let mut units: Vec<i64> = shares.iter().map(|&s| to_units(s)).collect();
    let min = min_units();
    let pair = units[index] + units[index + 1];
    if pair < 2 * min {
        return Err(Rejection::NoChange);
    }

    // No pane can gain more than the whole row, so larger deltas clamp
    // the same way and stay clear of integer overflow.
    let delta = to_units(delta.clamp(-1.0, 1.0));
    let left = (units[index] + delta).clamp(min, pair - min);
    if left == units[index] {
        return Err(Rejection::NoChange);
    }
    units[index] = left;
    units[index + 1] = pair - left;
    settle(&mut units);
    Ok(from_units(&units))
}
