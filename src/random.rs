use rand::Rng;
use std::collections::HashSet;

/// Number of VNs returned by `/random`.
pub const RANDOM_BATCH: usize = 4;

/// Draw rounds before `/random` settles for fewer records.
pub const MAX_RANDOM_ROUNDS: usize = 3;

/// Draw up to `count` distinct ids in `1..=max`, skipping anything in `exclude`.
/// Rejection sampling; the request is clipped to the ids still available.
pub fn draw_distinct<R: Rng>(
    rng: &mut R,
    count: usize,
    max: u64,
    exclude: &HashSet<u64>,
) -> Vec<u64> {
    let excluded_in_range = exclude.iter().filter(|&&id| (1..=max).contains(&id)).count();
    let available = max.saturating_sub(excluded_in_range as u64);
    let count = count.min(available as usize);

    let mut drawn: Vec<u64> = Vec::with_capacity(count);
    while drawn.len() < count {
        let candidate = rng.gen_range(1..=max);
        if !exclude.contains(&candidate) && !drawn.contains(&candidate) {
            drawn.push(candidate);
        }
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_draws_distinct_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let ids = draw_distinct(&mut rng, RANDOM_BATCH, 20, &HashSet::new());
            assert_eq!(ids.len(), RANDOM_BATCH);
            let unique: HashSet<_> = ids.iter().collect();
            assert_eq!(unique.len(), RANDOM_BATCH);
            assert!(ids.iter().all(|&id| (1..=20).contains(&id)));
        }
    }

    #[test]
    fn test_small_range_is_clipped() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ids = draw_distinct(&mut rng, RANDOM_BATCH, 2, &HashSet::new());
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
        assert!(draw_distinct(&mut rng, RANDOM_BATCH, 0, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_excluded_ids_are_skipped() {
        let mut rng = StdRng::seed_from_u64(3);
        let exclude: HashSet<u64> = [1, 2, 3].into_iter().collect();
        let mut ids = draw_distinct(&mut rng, RANDOM_BATCH, 5, &exclude);
        ids.sort();
        assert_eq!(ids, vec![4, 5]);
    }
}
