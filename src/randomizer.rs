use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("cannot select {requested} of {available} available candidates")]
    Range { requested: usize, available: usize },
    #[error("weights must be finite and non-negative")]
    InvalidWeights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    ChooseAll,
    Seeded,
}

#[derive(Debug, Clone)]
pub struct Randomizer {
    rng: Option<ChaCha20Rng>,
}

impl Randomizer {
    pub fn new(mode: SelectionMode, seed: &str) -> Self {
        match mode {
            SelectionMode::ChooseAll => Self::choose_all(),
            SelectionMode::Seeded => Self::seeded(seed),
        }
    }

    pub fn seeded(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self {
            rng: Some(ChaCha20Rng::from_seed(bytes)),
        }
    }

    pub fn choose_all() -> Self {
        Self { rng: None }
    }

    pub fn mode(&self) -> SelectionMode {
        match self.rng {
            Some(_) => SelectionMode::Seeded,
            None => SelectionMode::ChooseAll,
        }
    }

    // u64 draws consume the stream identically on 32- and 64-bit targets
    fn float(&mut self) -> f64 {
        match self.rng.as_mut() {
            Some(rng) => rng.gen::<f64>(),
            None => 0.0,
        }
    }

    fn range(&mut self, n: usize) -> usize {
        match self.rng.as_mut() {
            Some(rng) if n > 0 => rng.gen_range(0..n as u64) as usize,
            _ => 0,
        }
    }

    /// Picks `count` distinct candidates. The result keeps pool order.
    pub fn choose_n<T: Clone>(&mut self, pool: &[T], count: usize) -> Result<Vec<T>, SelectionError> {
        if count > pool.len() {
            return Err(SelectionError::Range {
                requested: count,
                available: pool.len(),
            });
        }
        if self.rng.is_none() {
            return Ok(pool.to_vec());
        }

        // partial Fisher-Yates over indices
        let mut indices: Vec<usize> = (0..pool.len()).collect();
        for i in 0..count {
            let j = i + self.range(indices.len() - i);
            indices.swap(i, j);
        }
        let mut picked = indices[..count].to_vec();
        picked.sort_unstable();
        Ok(picked.into_iter().map(|i| pool[i].clone()).collect())
    }

    /// Weighted sampling without replacement. Zero-weight candidates are
    /// never drawn. The result keeps pool order.
    pub fn choose_weighted<T: Clone>(
        &mut self,
        pool: &[(T, f64)],
        count: usize,
    ) -> Result<Vec<T>, SelectionError> {
        if pool.iter().any(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(SelectionError::InvalidWeights);
        }
        if self.rng.is_none() {
            if count > pool.len() {
                return Err(SelectionError::Range {
                    requested: count,
                    available: pool.len(),
                });
            }
            return Ok(pool.iter().map(|(item, _)| item.clone()).collect());
        }

        let mut remaining: Vec<usize> = (0..pool.len()).filter(|&i| pool[i].1 > 0.0).collect();
        if count > remaining.len() {
            return Err(SelectionError::Range {
                requested: count,
                available: remaining.len(),
            });
        }

        let mut picked = Vec::with_capacity(count);
        for _ in 0..count {
            let total: f64 = remaining.iter().map(|&i| pool[i].1).sum();
            let mut target = self.float() * total;
            let mut slot = remaining.len() - 1;
            for (pos, &i) in remaining.iter().enumerate() {
                if target < pool[i].1 {
                    slot = pos;
                    break;
                }
                target -= pool[i].1;
            }
            picked.push(remaining.remove(slot));
        }
        picked.sort_unstable();
        Ok(picked.into_iter().map(|i| pool[i].0.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_selection() {
        let pool: Vec<u32> = (0..50).collect();
        let a = Randomizer::seeded("abc123-exam").choose_n(&pool, 7).unwrap();
        let b = Randomizer::seeded("abc123-exam").choose_n(&pool, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_diverge() {
        let pool: Vec<u32> = (0..50).collect();
        let a = Randomizer::seeded("student-a").choose_n(&pool, 10).unwrap();
        let b = Randomizer::seeded("student-b").choose_n(&pool, 10).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn selection_keeps_pool_order_without_repeats() {
        let pool: Vec<u32> = (0..20).collect();
        let picked = Randomizer::seeded("order").choose_n(&pool, 8).unwrap();
        assert_eq!(picked.len(), 8);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn choose_all_is_identity() {
        let pool = vec!["x", "y", "z"];
        let mut rand = Randomizer::new(SelectionMode::ChooseAll, "ignored");
        assert_eq!(rand.mode(), SelectionMode::ChooseAll);
        assert_eq!(rand.choose_n(&pool, 1).unwrap(), pool);
        assert_eq!(
            rand.choose_weighted(&[("x", 1.0), ("y", 0.0)], 1).unwrap(),
            vec!["x", "y"]
        );
    }

    #[test]
    fn overdraw_fails_for_every_mode() {
        for available in 0..5usize {
            let pool: Vec<usize> = (0..available).collect();
            for requested in available + 1..available + 4 {
                let expected = SelectionError::Range { requested, available };
                assert_eq!(
                    Randomizer::seeded("s").choose_n(&pool, requested).unwrap_err(),
                    expected
                );
                assert_eq!(
                    Randomizer::choose_all().choose_n(&pool, requested).unwrap_err(),
                    expected
                );
            }
        }
    }

    #[test]
    fn weighted_rejects_bad_weights() {
        let mut rand = Randomizer::seeded("w");
        assert_eq!(
            rand.choose_weighted(&[("a", -1.0), ("b", 1.0)], 1).unwrap_err(),
            SelectionError::InvalidWeights
        );
        assert_eq!(
            rand.choose_weighted(&[("a", f64::NAN)], 1).unwrap_err(),
            SelectionError::InvalidWeights
        );
    }

    #[test]
    fn weighted_counts_only_positive_candidates() {
        let mut rand = Randomizer::seeded("w");
        let err = rand
            .choose_weighted(&[("a", 0.0), ("b", 1.0)], 2)
            .unwrap_err();
        assert_eq!(err, SelectionError::Range { requested: 2, available: 1 });
    }

    #[test]
    fn weighted_favours_heavier_candidates() {
        let pool = [("light", 1.0), ("heavy", 99.0)];
        let heavy = (0..200)
            .filter(|i| {
                Randomizer::seeded(&format!("seed-{i}"))
                    .choose_weighted(&pool, 1)
                    .unwrap()
                    == vec!["heavy"]
            })
            .count();
        assert!(heavy > 150, "heavy picked {heavy} times");
    }

    #[test]
    fn seeded_selections_are_pinned() {
        let pool: Vec<u32> = (0..10).collect();
        assert_eq!(
            Randomizer::seeded("abc123-eecs280_f22").choose_n(&pool, 3).unwrap(),
            vec![2, 3, 5]
        );
        let pool: Vec<u32> = (0..20).collect();
        assert_eq!(
            Randomizer::seeded("golden").choose_n(&pool, 5).unwrap(),
            vec![3, 7, 10, 14, 19]
        );
        let weighted = [("a", 1.0), ("b", 2.0), ("c", 0.0), ("d", 3.0), ("e", 4.0)];
        assert_eq!(
            Randomizer::seeded("abc123-eecs280_f22")
                .choose_weighted(&weighted, 2)
                .unwrap(),
            vec!["b", "d"]
        );
        let mut rand = Randomizer::seeded("golden");
        let draws: Vec<usize> = (0..4).map(|_| rand.range(1000)).collect();
        assert_eq!(draws, vec![164, 704, 290, 624]);
    }

    #[test]
    fn range_stays_in_bounds() {
        let mut rand = Randomizer::seeded("range");
        for _ in 0..100 {
            assert!(rand.range(3) < 3);
            let f = rand.float();
            assert!((0.0..1.0).contains(&f));
        }
        assert_eq!(rand.range(0), 0);
    }
}
