// Symmetric moving-average smoothing for display sequences

/// Moving average over the inclusive window `[i - radius, i + radius]`,
/// clipped to the array bounds. Edge windows are genuinely narrower - the
/// divisor shrinks there instead of padding or wrapping. Radius 0 returns
/// the input values unchanged.
///
/// Applied only to display-value sequences, never to stored series.
pub fn smooth(values: &[f64], radius: usize) -> Vec<f64> {
    if radius == 0 {
        return values.to_vec();
    }
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let start = i.saturating_sub(radius);
        let end = (i + radius + 1).min(values.len());
        let sum: f64 = values[start..end].iter().sum();
        out.push(sum / (end - start) as f64);
    }
    out
}
