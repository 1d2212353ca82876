//! Walkable map rectangles where wild pokemon may appear.

use covey_types::{Direction, PokemonLocation};
use rand::Rng;

/// An axis-aligned rectangle given by its bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRegion {
    /// Left edge.
    pub x_min: f64,
    /// Right edge.
    pub x_max: f64,
    /// Top edge.
    pub y_min: f64,
    /// Bottom edge.
    pub y_max: f64,
}

impl SpawnRegion {
    const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Uniformly random point inside the region.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let x = rng.random::<f64>().mul_add(self.x_max - self.x_min, self.x_min);
        let y = rng.random::<f64>().mul_add(self.y_max - self.y_min, self.y_min);
        (x, y)
    }
}

/// Spawn regions of the town map.
pub const SPAWN_REGIONS: [SpawnRegion; 17] = [
    SpawnRegion::new(300.0, 649.0, 876.0, 1070.0),
    SpawnRegion::new(300.0, 2383.0, 1217.0, 1283.0),
    SpawnRegion::new(752.0, 938.0, 432.0, 681.0),
    SpawnRegion::new(1940.0, 2445.0, 851.0, 916.0),
    SpawnRegion::new(659.0, 981.0, 867.0, 962.0),
    SpawnRegion::new(1010.0, 1513.0, 867.0, 1087.0),
    SpawnRegion::new(1547.0, 1862.0, 867.0, 962.0),
    SpawnRegion::new(1998.0, 2352.0, 1076.0, 1100.0),
    SpawnRegion::new(1581.0, 1750.0, 556.0, 701.0),
    SpawnRegion::new(1581.0, 1770.0, 276.0, 414.0),
    SpawnRegion::new(591.0, 1591.0, 228.0, 260.0),
    SpawnRegion::new(330.0, 525.0, 243.0, 384.0),
    SpawnRegion::new(330.0, 525.0, 584.0, 737.0),
    SpawnRegion::new(1997.0, 2378.0, 257.0, 673.0),
    SpawnRegion::new(2645.0, 3298.0, 437.0, 525.0),
    SpawnRegion::new(2645.0, 2736.0, 571.0, 952.0),
    SpawnRegion::new(3130.0, 3209.0, 1089.0, 1250.0),
];

/// Pick a region uniformly, then a point inside it, for a new wild pokemon.
pub fn random_spawn_location<R: Rng + ?Sized>(rng: &mut R) -> PokemonLocation {
    let index = rng.random_range(0..SPAWN_REGIONS.len());
    let (x, y) = SPAWN_REGIONS
        .get(index)
        .map_or((0.0, 0.0), |region| region.sample(rng));
    PokemonLocation {
        x,
        y,
        is_wild: true,
        direction: Direction::Front,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn regions_are_well_formed() {
        assert!(
            SPAWN_REGIONS
                .iter()
                .all(|r| r.x_min < r.x_max && r.y_min < r.y_max)
        );
    }

    #[test]
    fn spawn_points_fall_inside_some_region() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1_000 {
            let location = random_spawn_location(&mut rng);
            assert!(location.is_wild);
            assert_eq!(location.direction, Direction::Front);
            assert!(SPAWN_REGIONS.iter().any(|r| {
                (r.x_min..=r.x_max).contains(&location.x) && (r.y_min..=r.y_max).contains(&location.y)
            }));
        }
    }
}
