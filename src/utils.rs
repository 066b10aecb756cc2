use std::collections::HashSet;
use std::ops::Range;

/// Minimum and maximum of the iterated values, None for an empty iterator.
pub fn min_and_max<'a, I, T>(mut s: I) -> Option<(T, T)>
where
    I: Iterator<Item = &'a T>,
    T: 'a + std::cmp::PartialOrd + Clone,
{
    let (mut min, mut max) = match s.next() {
        Some(v) => (v, v),
        None => return None,
    };
    for es in s {
        if es > max {
            max = es
        } else if es < min {
            min = es
        }
    }
    return Some((min.clone(), max.clone()));
}

/// Axis range around the finite values, extended by a tenth of the span on each side.
/// A single value, or no finite value at all, still gives a drawable range.
pub fn padded_range<'a, I>(values: I) -> Range<f64>
where
    I: Iterator<Item = &'a f64>,
{
    match min_and_max(values.filter(|v| v.is_finite())) {
        Some((min, max)) if max > min => {
            let pad = (max - min) / 10f64;
            (min - pad)..(max + pad)
        }
        Some((v, _)) => (v - 1.)..(v + 1.),
        None => 0f64..1f64,
    }
}

/// Split the points into the runs of consecutive finite y values,
/// dropping the NaN points that separate them.
pub fn split_at_nan(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    points
        .split(|(_, y)| !y.is_finite())
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Make a file identifier usable as a file name stem.
pub fn sanitize_file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        return String::from("_");
    }
    return stem;
}

/// One file name stem per identifier, distinct even on a case-insensitive filesystem.
/// Identifiers that sanitize to a stem already taken get a `-2`, `-3`, ... suffix.
pub fn unique_file_stems(ids: &[&str]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut stems: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let base = sanitize_file_stem(id);
        let mut stem = base.clone();
        let mut n = 2usize;
        while taken.contains(&stem.to_lowercase()) {
            stem = format!("{}-{}", base, n);
            n += 1;
        }
        taken.insert(stem.to_lowercase());
        stems.push(stem);
    }
    return stems;
}
