//! Seeded RNG discipline.
//!
//! Every stochastic decision in the simulator — contact plan generation,
//! traffic generation, segment loss, bundle sizing, priority assignment,
//! destination assignment — draws from its own independently-seeded stream.
//! Each stream is derived from the master seed by mixing in an FNV-1a hash of
//! the stream's name, so adding or removing draws in one subsystem never
//! perturbs another subsystem's sequence. This is what keeps fixed-seed
//! regression scenarios stable under refactors that reorder unrelated draws.

use rand::rngs::SmallRng;
use rand::SeedableRng;

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in s.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// A master RNG split into six independently-seeded named streams.
pub struct SimRng {
    plan: SmallRng,
    traffic: SmallRng,
    loss: SmallRng,
    size: SmallRng,
    priority: SmallRng,
    dest: SmallRng,
}

impl SimRng {
    /// Derives all six subsystem streams from a single master seed.
    pub fn new(master_seed: u64) -> Self {
        let seeded = |name: &str| SmallRng::seed_from_u64(master_seed ^ fnv1a(name));
        Self {
            plan: seeded("plan"),
            traffic: seeded("traffic"),
            loss: seeded("loss"),
            size: seeded("size"),
            priority: seeded("priority"),
            dest: seeded("dest"),
        }
    }

    /// The stream driving contact plan generation.
    pub fn plan(&mut self) -> &mut SmallRng {
        &mut self.plan
    }

    /// The stream driving application bundle-generation inter-arrival times.
    pub fn traffic(&mut self) -> &mut SmallRng {
        &mut self.traffic
    }

    /// The stream driving per-segment Bernoulli loss draws.
    pub fn loss(&mut self) -> &mut SmallRng {
        &mut self.loss
    }

    /// The stream driving bundle size draws.
    pub fn size(&mut self) -> &mut SmallRng {
        &mut self.size
    }

    /// The stream driving bundle priority draws.
    pub fn priority(&mut self) -> &mut SmallRng {
        &mut self.priority
    }

    /// The stream driving bundle destination draws.
    pub fn dest(&mut self) -> &mut SmallRng {
        &mut self.dest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn streams_are_independent_of_draw_order() {
        let mut a = SimRng::new(42);
        let x1: u32 = a.plan().gen();
        let _: u32 = a.traffic().gen();
        let x2: u32 = a.plan().gen();

        let mut b = SimRng::new(42);
        let y1: u32 = b.plan().gen();
        let y2: u32 = b.plan().gen();
        // drawing from `traffic` in between did not disturb `plan`'s sequence
        assert_eq!(x1, y1);
        assert_eq!(x2, y2);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        let xs: Vec<u32> = (0..5).map(|_| a.loss().gen()).collect();
        let ys: Vec<u32> = (0..5).map(|_| b.loss().gen()).collect();
        assert_eq!(xs, ys);
    }
}
