use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

#[derive(Clone, Debug)]
pub struct Rng {
    inner: StdRng,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::rng().random())
    }

    pub fn next_seed(&mut self) -> u64 {
        self.inner.random()
    }

    /// Inclusive on both ends.
    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.inner.random_range(min..=max)
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.inner.random_range(0..len)
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.pick_index(items.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn same_seed_yields_same_sequence() {
        let mut a = Rng::new(77);
        let mut b = Rng::new(77);
        for _ in 0..100 {
            assert_eq!(a.int(0, 1_000), b.int(0, 1_000));
            assert_eq!(a.pick_index(13), b.pick_index(13));
        }
    }

    #[test]
    fn int_stays_within_inclusive_bounds() {
        let mut rng = Rng::new(5);
        for _ in 0..1_000 {
            let value = rng.int(-2, 2);
            assert!((-2..=2).contains(&value));
        }
        assert_eq!(rng.int(4, 4), 4);
        assert_eq!(rng.int(9, 3), 9);
    }

    #[test]
    fn pick_handles_empty_and_single_slices() {
        let mut rng = Rng::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
        assert_eq!(rng.pick(&[42]), Some(&42));
        assert_eq!(rng.pick_index(0), 0);
    }
}
