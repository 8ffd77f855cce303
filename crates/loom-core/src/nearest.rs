//! Nearest-in-ordered-set matching.
//!
//! Palette colors, font steps and spacing steps are all matched with the same
//! primitive: scan an ordered candidate set, measure each candidate with a
//! distance function, keep the closest, and settle equal distances with a
//! fixed tie-break rule so that results are reproducible.

/// Which candidate wins when two are equally close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Prefer the candidate that comes first in the set (the smaller step for
    /// an ascending scale).
    #[default]
    Lower,
    /// Prefer the candidate that comes last in the set.
    Higher,
}

/// The winning candidate of a nearest search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<'a, T> {
    pub index: usize,
    pub value: &'a T,
    pub distance: f64,
}

/// Find the candidate with the smallest distance.
///
/// Candidates whose distance is not finite are skipped. When `limit` is set,
/// candidates farther than `limit` are discarded; a candidate exactly at the
/// limit is accepted.
pub fn nearest_by<'a, T, F>(
    candidates: &'a [T],
    distance: F,
    tie: TieBreak,
    limit: Option<f64>,
) -> Option<Nearest<'a, T>>
where
    F: Fn(&T) -> f64,
{
    let mut best: Option<Nearest<'a, T>> = None;

    for (index, value) in candidates.iter().enumerate() {
        let d = distance(value);
        if !d.is_finite() || limit.is_some_and(|limit| d > limit) {
            continue;
        }

        let better = match &best {
            None => true,
            Some(current) => match tie {
                TieBreak::Lower => d < current.distance,
                TieBreak::Higher => d <= current.distance,
            },
        };

        if better {
            best = Some(Nearest { index, value, distance: d });
        }
    }

    best
}

/// Snap a value onto an ascending step scale; ties go to the smaller step.
pub fn nearest_step(steps: &[f64], value: f64) -> Option<Nearest<'_, f64>> {
    nearest_by(steps, |step| (step - value).abs(), TieBreak::Lower, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const STEPS: [f64; 4] = [4.0, 8.0, 16.0, 24.0];

    #[test]
    fn test_snap_to_closest_step() {
        let hit = nearest_step(&STEPS, 13.0).unwrap();
        assert_eq!(*hit.value, 16.0);
        assert_eq!(hit.index, 2);
        assert!((hit.distance - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_tie_goes_to_smaller_step() {
        assert_eq!(*nearest_step(&STEPS, 12.0).unwrap().value, 8.0);
        assert_eq!(*nearest_step(&STEPS, 20.0).unwrap().value, 16.0);
    }

    #[test]
    fn test_tie_higher() {
        let hit = nearest_by(&STEPS, |s| (s - 12.0).abs(), TieBreak::Higher, None).unwrap();
        assert_eq!(*hit.value, 16.0);
    }

    #[test]
    fn test_values_outside_the_scale() {
        assert_eq!(*nearest_step(&STEPS, 0.0).unwrap().value, 4.0);
        assert_eq!(*nearest_step(&STEPS, 400.0).unwrap().value, 24.0);
    }

    #[test]
    fn test_limit_is_inclusive() {
        let within = nearest_by(&STEPS, |s| (s - 10.0).abs(), TieBreak::Lower, Some(2.0));
        assert_eq!(within.map(|n| *n.value), Some(8.0));

        let beyond = nearest_by(&STEPS, |s| (s - 11.0).abs(), TieBreak::Lower, Some(2.0));
        assert!(beyond.is_none());
    }

    #[test]
    fn test_empty_set() {
        assert!(nearest_step(&[], 3.0).is_none());
    }

    #[test]
    fn test_non_finite_distances_skipped() {
        let hit = nearest_by(&STEPS, |s| if *s == 4.0 { f64::NAN } else { *s }, TieBreak::Lower, None);
        assert_eq!(hit.map(|n| *n.value), Some(8.0));
    }

    proptest! {
        #[test]
        fn prop_no_step_is_strictly_closer(value in 0.0f64..100.0) {
            let hit = nearest_step(&STEPS, value).unwrap();
            for step in STEPS {
                prop_assert!((step - value).abs() >= hit.distance);
            }
        }

        #[test]
        fn prop_ties_prefer_the_earlier_step(value in 0.0f64..100.0) {
            let hit = nearest_step(&STEPS, value).unwrap();
            for step in &STEPS[..hit.index] {
                prop_assert!((step - value).abs() > hit.distance);
            }
        }
    }
}
