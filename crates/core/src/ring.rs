use crate::timing::FrameTiming;

/// Fixed-capacity circular buffer of recent frame samples.
///
/// `head` advances on push; when it would collide with `tail`, the oldest
/// sample is silently overwritten. One slot stays unused so empty and full
/// are distinguishable with just the two indices, which caps the live sample
/// count at `capacity - 1`.
pub struct FrameSampleRing {
    samples: Box<[FrameTiming]>,
    head: usize,
    tail: usize,
}

impl FrameSampleRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "ring needs room for at least one live sample");
        Self {
            samples: vec![FrameTiming::default(); capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn len(&self) -> usize {
        let cap = self.samples.len();
        (self.head + cap - self.tail) % cap
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn push(&mut self, sample: FrameTiming) {
        let cap = self.samples.len();
        self.samples[self.head] = sample;
        self.head = (self.head + 1) % cap;
        if self.head == self.tail {
            self.tail = (self.tail + 1) % cap;
        }
    }

    /// Walks the live samples oldest to newest. Restartable; does not mutate
    /// ring state.
    pub fn iter(&self) -> impl Iterator<Item = &FrameTiming> {
        let cap = self.samples.len();
        (0..self.len()).map(move |i| &self.samples[(self.tail + i) % cap])
    }

    pub fn latest(&self) -> Option<&FrameTiming> {
        if self.is_empty() {
            return None;
        }
        let cap = self.samples.len();
        Some(&self.samples[(self.head + cap - 1) % cap])
    }

    /// Mean of `selector` over the live samples, or `None` when empty.
    pub fn average<F: Fn(&FrameTiming) -> f64>(&self, selector: F) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let sum: f64 = self.iter().map(selector).sum();
        Some(sum / self.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(elapsed: f64) -> FrameTiming {
        FrameTiming {
            elapsed,
            ..FrameTiming::default()
        }
    }

    #[test]
    fn pushing_capacity_samples_keeps_capacity_minus_one() {
        let mut ring = FrameSampleRing::new(4);
        for i in 0..4 {
            ring.push(sample(i as f64));
        }

        assert_eq!(ring.len(), 3);
        let live: Vec<f64> = ring.iter().map(|s| s.elapsed).collect();
        // The oldest push (0.0) is the one evicted.
        assert_eq!(live, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn iteration_is_restartable() {
        let mut ring = FrameSampleRing::new(8);
        ring.push(sample(1.0));
        ring.push(sample(2.0));

        assert_eq!(ring.iter().count(), 2);
        assert_eq!(ring.iter().count(), 2);
    }

    #[test]
    fn average_over_empty_ring_is_none() {
        let ring = FrameSampleRing::new(8);
        assert!(ring.average(|s| s.elapsed).is_none());
    }

    #[test]
    fn average_reduces_over_live_samples() {
        let mut ring = FrameSampleRing::new(8);
        ring.push(sample(0.010));
        ring.push(sample(0.020));
        ring.push(sample(0.030));

        let avg = ring.average(|s| s.elapsed).unwrap();
        assert!((avg - 0.020).abs() < 1e-12);
    }

    #[test]
    fn latest_tracks_most_recent_push() {
        let mut ring = FrameSampleRing::new(3);
        assert!(ring.latest().is_none());

        for i in 0..10 {
            ring.push(sample(i as f64));
            assert_eq!(ring.latest().unwrap().elapsed, i as f64);
        }
    }

    #[test]
    fn long_wraparound_preserves_order() {
        let mut ring = FrameSampleRing::new(5);
        for i in 0..23 {
            ring.push(sample(i as f64));
        }

        let live: Vec<f64> = ring.iter().map(|s| s.elapsed).collect();
        assert_eq!(live, vec![19.0, 20.0, 21.0, 22.0]);
    }
}
