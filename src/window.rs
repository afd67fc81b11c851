use std::ops::Range;

/// Finds the index range of all values in `[center - radius, center + radius)`
/// within a sorted slice.
///
/// Both edges use insertion-point (lower-bound) semantics via
/// `partition_point`, so the result is always a valid sub-range of `xs`, even
/// when the window falls entirely off either end of the slice. Exact matches
/// are not expected in practice; the caller filters candidates by full
/// squared distance anyway.
#[inline(always)]
pub fn x_window(xs: &[f64], center: f64, radius: f64) -> Range<usize> {
    let left = xs.partition_point(|&x| x < center - radius);
    let right = xs.partition_point(|&x| x < center + radius);
    left..right
}
