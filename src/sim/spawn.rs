//! Entity spawn scheduling
//!
//! Three independent streams (obstacles, constituents, bribes) share one
//! distance cursor: nothing single-spawns until the world has scrolled at
//! least `min_spawn_gap` since the previous spawn of any kind. Each stream
//! layers its own timing rule on top of that.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::{Enemy, HeightClass, Obstacle, Pickup};
use crate::tuning::Tuning;

/// Shared distance accumulator gating every single spawn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnCursor {
    last_spawn_distance: f32,
    min_spawn_gap: f32,
}

impl SpawnCursor {
    pub fn new(min_spawn_gap: f32) -> Self {
        Self {
            last_spawn_distance: 0.0,
            min_spawn_gap,
        }
    }

    /// Accumulate world scroll since the last spawn
    #[inline]
    pub fn advance(&mut self, distance: f32) {
        self.last_spawn_distance += distance;
    }

    #[inline]
    pub fn can_spawn_entity(&self) -> bool {
        self.last_spawn_distance >= self.min_spawn_gap
    }

    #[inline]
    pub fn reset(&mut self) {
        self.last_spawn_distance = 0.0;
    }

    pub fn distance(&self) -> f32 {
        self.last_spawn_distance
    }
}

/// Bribe altitude bands (px above ground), shallow to parachute-only
pub const ALTITUDE_BANDS: [f32; 7] = [30.0, 70.0, 110.0, 150.0, 200.0, 250.0, 300.0];
const ALTITUDE_JITTER: f32 = 10.0;

/// Multi-bribe formations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupPattern {
    /// Sine arc, highest in the middle
    Arch,
    /// Phase-shifted sine
    Wave,
    /// Straight line rising or falling
    Diagonal,
    /// Loose random clump
    Cluster,
    /// Steps up then back down
    Stairs,
}

impl PickupPattern {
    pub const ALL: [PickupPattern; 5] = [
        PickupPattern::Arch,
        PickupPattern::Wave,
        PickupPattern::Diagonal,
        PickupPattern::Cluster,
        PickupPattern::Stairs,
    ];

    /// `(x offset, altitude above ground)` for each bribe in the formation
    pub fn layout<R: Rng + ?Sized>(
        self,
        count: usize,
        base_altitude: f32,
        spacing: f32,
        rng: &mut R,
    ) -> Vec<(f32, f32)> {
        let last = count.saturating_sub(1).max(1) as f32;
        let phase = rng.random_range(0.0..std::f32::consts::TAU);
        let rising = rng.random_bool(0.5);

        (0..count)
            .map(|i| {
                let fi = i as f32;
                let x = fi * spacing;
                match self {
                    PickupPattern::Arch => {
                        (x, base_altitude + 80.0 * (std::f32::consts::PI * fi / last).sin())
                    }
                    PickupPattern::Wave => (x, base_altitude + 40.0 * (fi * 1.1 + phase).sin()),
                    PickupPattern::Diagonal => {
                        let rank = if rising { fi } else { last - fi };
                        (x, base_altitude + 30.0 * rank)
                    }
                    PickupPattern::Cluster => (
                        x + rng.random_range(-10.0..=10.0),
                        base_altitude + rng.random_range(-30.0..=30.0),
                    ),
                    PickupPattern::Stairs => {
                        let rank = fi.min(last - fi);
                        (x, base_altitude + 35.0 * rank)
                    }
                }
            })
            .collect()
    }
}

/// What the scheduler produced this tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnReport {
    pub obstacle: Option<HeightClass>,
    pub enemy: bool,
    pub pickup: bool,
    pub pattern: Option<(PickupPattern, usize)>,
}

impl SpawnReport {
    pub fn any(&self) -> bool {
        self.obstacle.is_some() || self.enemy || self.pickup || self.pattern.is_some()
    }
}

/// Per-session spawn timers plus the entity id allocator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnScheduler {
    pub cursor: SpawnCursor,
    tall_counter: u32,
    next_tall_interval: u32,
    pattern_counter: u32,
    next_pattern_interval: u32,
    next_id: u32,
}

impl SpawnScheduler {
    pub fn new<R: Rng + ?Sized>(tuning: &Tuning, rng: &mut R) -> Self {
        Self {
            cursor: SpawnCursor::new(tuning.min_spawn_gap),
            tall_counter: 0,
            next_tall_interval: draw_interval(tuning.tall_interval_min, tuning.tall_interval_max, rng),
            pattern_counter: 0,
            next_pattern_interval: draw_interval(
                tuning.pattern_interval_min,
                tuning.pattern_interval_max,
                rng,
            ),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn next_tall_interval(&self) -> u32 {
        self.next_tall_interval
    }

    pub fn next_pattern_interval(&self) -> u32 {
        self.next_pattern_interval
    }

    /// Run every stream once, obstacles first
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        frame: u64,
        obstacles: &mut Vec<Obstacle>,
        enemies: &mut Vec<Enemy>,
        pickups: &mut Vec<Pickup>,
        tuning: &Tuning,
        rng: &mut R,
    ) -> SpawnReport {
        let obstacle = self.spawn_obstacles(frame, obstacles, tuning, rng);
        let enemy = self.spawn_enemy(frame, enemies, tuning);
        let pickup = self.spawn_pickup(frame, pickups, tuning, rng);
        let pattern = self.spawn_pattern(pickups, tuning, rng);
        SpawnReport {
            obstacle,
            enemy,
            pickup,
            pattern,
        }
    }

    /// Low obstacles on a frame cadence, tall ones on a randomized counter
    pub fn spawn_obstacles<R: Rng + ?Sized>(
        &mut self,
        frame: u64,
        obstacles: &mut Vec<Obstacle>,
        tuning: &Tuning,
        rng: &mut R,
    ) -> Option<HeightClass> {
        let mut spawned = None;

        if frame.is_multiple_of(tuning.obstacle_frequency)
            && self.cursor.can_spawn_entity()
            && has_obstacle_gap(obstacles, tuning)
        {
            let id = self.next_entity_id();
            obstacles.push(Obstacle::spawn(id, HeightClass::Low, tuning, rng));
            self.cursor.reset();
            spawned = Some(HeightClass::Low);
        }

        // The tall counter only runs while the lane is open, and the spawn
        // re-checks because a low obstacle above may have just closed it.
        if self.cursor.can_spawn_entity() {
            self.tall_counter += 1;
        }
        if self.tall_counter >= self.next_tall_interval && self.cursor.can_spawn_entity() {
            let id = self.next_entity_id();
            obstacles.push(Obstacle::spawn(id, HeightClass::Tall, tuning, rng));
            self.cursor.reset();
            self.tall_counter = 0;
            self.next_tall_interval =
                draw_interval(tuning.tall_interval_min, tuning.tall_interval_max, rng);
            spawned = Some(HeightClass::Tall);
        }

        if let Some(class) = spawned {
            log::debug!("Spawned {:?} obstacle at frame {}", class, frame);
        }
        spawned
    }

    pub fn spawn_enemy(&mut self, frame: u64, enemies: &mut Vec<Enemy>, tuning: &Tuning) -> bool {
        if !frame.is_multiple_of(tuning.enemy_frequency) || !self.cursor.can_spawn_entity() {
            return false;
        }
        let id = self.next_entity_id();
        enemies.push(Enemy::spawn(id, tuning));
        self.cursor.reset();
        log::debug!("Spawned constituent {} at frame {}", id, frame);
        true
    }

    /// Single bribe at one of the altitude bands
    pub fn spawn_pickup<R: Rng + ?Sized>(
        &mut self,
        frame: u64,
        pickups: &mut Vec<Pickup>,
        tuning: &Tuning,
        rng: &mut R,
    ) -> bool {
        if !frame.is_multiple_of(tuning.pickup_frequency) || !self.cursor.can_spawn_entity() {
            return false;
        }
        let band = ALTITUDE_BANDS[rng.random_range(0..ALTITUDE_BANDS.len())];
        let altitude = band + rng.random_range(-ALTITUDE_JITTER..=ALTITUDE_JITTER);
        let id = self.next_entity_id();
        let phase = rng.random_range(0.0..std::f32::consts::TAU);
        pickups.push(Pickup::new(
            id,
            tuning.canvas_width,
            pickup_y(altitude, tuning),
            tuning.pickup_size,
            phase,
        ));
        self.cursor.reset();
        log::debug!("Spawned bribe {} at altitude {:.0} on frame {}", id, altitude, frame);
        true
    }

    /// Formation burst on its own randomized counter
    ///
    /// A burst is one compound event: it ignores the cursor gate, then resets
    /// the cursor so the next single spawn keeps its distance.
    pub fn spawn_pattern<R: Rng + ?Sized>(
        &mut self,
        pickups: &mut Vec<Pickup>,
        tuning: &Tuning,
        rng: &mut R,
    ) -> Option<(PickupPattern, usize)> {
        self.pattern_counter += 1;
        if self.pattern_counter < self.next_pattern_interval {
            return None;
        }
        self.pattern_counter = 0;
        self.next_pattern_interval =
            draw_interval(tuning.pattern_interval_min, tuning.pattern_interval_max, rng);

        let pattern = PickupPattern::ALL[rng.random_range(0..PickupPattern::ALL.len())];
        let count = rng.random_range(3..=6);
        let base_altitude = rng.random_range(40.0..=120.0);
        let start_x = tuning.canvas_width + 50.0;

        for (dx, altitude) in pattern.layout(count, base_altitude, tuning.pattern_spacing, rng) {
            let id = self.next_entity_id();
            let phase = rng.random_range(0.0..std::f32::consts::TAU);
            pickups.push(Pickup::new(
                id,
                start_x + dx,
                pickup_y(altitude, tuning),
                tuning.pickup_size,
                phase,
            ));
        }
        self.cursor.reset();

        log::debug!("Pattern burst {:?} x{}", pattern, count);
        Some((pattern, count))
    }
}

/// Previous obstacle's trailing edge must be far enough from the screen edge
fn has_obstacle_gap(obstacles: &[Obstacle], tuning: &Tuning) -> bool {
    obstacles
        .last()
        .is_none_or(|last| tuning.canvas_width - last.rect.right() >= tuning.min_obstacle_gap)
}

/// Top-left y for a bribe whose bottom sits `altitude` above the ground
fn pickup_y(altitude: f32, tuning: &Tuning) -> f32 {
    let max_altitude = tuning.ground_y - tuning.pickup_size;
    tuning.ground_y - altitude.clamp(0.0, max_altitude) - tuning.pickup_size
}

fn draw_interval<R: Rng + ?Sized>(min: u32, max: u32, rng: &mut R) -> u32 {
    rng.random_range(min..=max.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Tuning where only the stream under test is live
    fn quiet_tuning() -> Tuning {
        Tuning {
            obstacle_frequency: 0,
            enemy_frequency: 0,
            pickup_frequency: 0,
            tall_interval_min: u32::MAX,
            tall_interval_max: u32::MAX,
            pattern_interval_min: u32::MAX,
            pattern_interval_max: u32::MAX,
            ..Tuning::default()
        }
    }

    #[test]
    fn test_cursor_gate() {
        let mut cursor = SpawnCursor::new(200.0);
        assert!(!cursor.can_spawn_entity());
        cursor.advance(199.0);
        assert!(!cursor.can_spawn_entity());
        cursor.advance(1.0);
        assert!(cursor.can_spawn_entity());
        cursor.reset();
        assert!(!cursor.can_spawn_entity());
        assert_eq!(cursor.distance(), 0.0);
    }

    #[test]
    fn test_spawn_waits_for_gap_at_speed_4() {
        let tuning = Tuning {
            enemy_frequency: 1,
            ..quiet_tuning()
        };
        let mut rng = Pcg32::seed_from_u64(1);
        let mut scheduler = SpawnScheduler::new(&tuning, &mut rng);
        let mut enemies = Vec::new();

        let mut frame = 0;
        while scheduler.cursor.distance() < 190.0 {
            frame += 1;
            scheduler.cursor.advance(4.0);
            assert!(!scheduler.spawn_enemy(frame, &mut enemies, &tuning));
        }
        assert_eq!(scheduler.cursor.distance(), 192.0);
        // 196: still closed
        frame += 1;
        scheduler.cursor.advance(4.0);
        assert!(!scheduler.spawn_enemy(frame, &mut enemies, &tuning));
        // 200: open
        frame += 1;
        scheduler.cursor.advance(4.0);
        assert!(scheduler.spawn_enemy(frame, &mut enemies, &tuning));
        assert_eq!(enemies.len(), 1);
        assert!(!scheduler.cursor.can_spawn_entity());
    }

    #[test]
    fn test_low_obstacle_respects_pixel_gap() {
        let tuning = Tuning {
            obstacle_frequency: 1,
            ..quiet_tuning()
        };
        let mut rng = Pcg32::seed_from_u64(2);
        let mut scheduler = SpawnScheduler::new(&tuning, &mut rng);
        let mut obstacles = Vec::new();

        scheduler.cursor.advance(tuning.min_spawn_gap);
        assert_eq!(
            scheduler.spawn_obstacles(1, &mut obstacles, &tuning, &mut rng),
            Some(HeightClass::Low)
        );

        // Cursor open again but the last obstacle is still at the edge
        scheduler.cursor.advance(tuning.min_spawn_gap);
        assert_eq!(scheduler.spawn_obstacles(2, &mut obstacles, &tuning, &mut rng), None);

        let width = obstacles[0].rect.size.x;
        obstacles[0].advance(tuning.min_obstacle_gap + width);
        assert_eq!(
            scheduler.spawn_obstacles(3, &mut obstacles, &tuning, &mut rng),
            Some(HeightClass::Low)
        );
    }

    #[test]
    fn test_low_obstacle_only_on_cadence() {
        let tuning = Tuning {
            obstacle_frequency: 90,
            ..quiet_tuning()
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let mut scheduler = SpawnScheduler::new(&tuning, &mut rng);
        let mut obstacles = Vec::new();
        scheduler.cursor.advance(1000.0);
        assert_eq!(scheduler.spawn_obstacles(89, &mut obstacles, &tuning, &mut rng), None);
        assert!(scheduler.spawn_obstacles(90, &mut obstacles, &tuning, &mut rng).is_some());
    }

    #[test]
    fn test_tall_interval_redrawn_in_range() {
        let tuning = Tuning {
            tall_interval_min: 5,
            tall_interval_max: 9,
            ..quiet_tuning()
        };
        let mut rng = Pcg32::seed_from_u64(4);
        let mut scheduler = SpawnScheduler::new(&tuning, &mut rng);
        let mut obstacles = Vec::new();

        let mut spawned_at = Vec::new();
        for frame in 1..200 {
            scheduler.cursor.advance(tuning.min_spawn_gap);
            if scheduler.spawn_obstacles(frame, &mut obstacles, &tuning, &mut rng)
                == Some(HeightClass::Tall)
            {
                spawned_at.push(frame);
            }
            assert!((5..=9).contains(&scheduler.next_tall_interval()));
        }
        assert!(spawned_at.len() > 10);
        for pair in spawned_at.windows(2) {
            let gap = pair[1] - pair[0];
            assert!((5..=9).contains(&gap), "gap {}", gap);
        }
    }

    #[test]
    fn test_tall_counter_stalls_while_cursor_closed() {
        let tuning = Tuning {
            tall_interval_min: 3,
            tall_interval_max: 3,
            ..quiet_tuning()
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let mut scheduler = SpawnScheduler::new(&tuning, &mut rng);
        let mut obstacles = Vec::new();
        for frame in 1..50 {
            assert_eq!(scheduler.spawn_obstacles(frame, &mut obstacles, &tuning, &mut rng), None);
        }
        assert!(obstacles.is_empty());
    }

    #[test]
    fn test_obstacle_beats_enemy_in_same_tick() {
        let tuning = Tuning {
            obstacle_frequency: 1,
            enemy_frequency: 1,
            pickup_frequency: 1,
            ..quiet_tuning()
        };
        let mut rng = Pcg32::seed_from_u64(6);
        let mut scheduler = SpawnScheduler::new(&tuning, &mut rng);
        let (mut obstacles, mut enemies, mut pickups) = (Vec::new(), Vec::new(), Vec::new());
        scheduler.cursor.advance(tuning.min_spawn_gap);
        let report = scheduler.update(
            1,
            &mut obstacles,
            &mut enemies,
            &mut pickups,
            &tuning,
            &mut rng,
        );
        assert_eq!(report.obstacle, Some(HeightClass::Low));
        assert!(!report.enemy);
        assert!(!report.pickup);
        assert!(enemies.is_empty() && pickups.is_empty());
    }

    #[test]
    fn test_pickup_uses_altitude_bands() {
        let tuning = Tuning {
            pickup_frequency: 1,
            ..quiet_tuning()
        };
        let mut rng = Pcg32::seed_from_u64(7);
        let mut scheduler = SpawnScheduler::new(&tuning, &mut rng);
        let mut pickups = Vec::new();
        for frame in 1..100 {
            scheduler.cursor.advance(tuning.min_spawn_gap);
            assert!(scheduler.spawn_pickup(frame, &mut pickups, &tuning, &mut rng));
        }
        for pickup in &pickups {
            let altitude = tuning.ground_y - pickup.rect.bottom();
            let near_band = ALTITUDE_BANDS
                .iter()
                .any(|band| (altitude - band).abs() <= ALTITUDE_JITTER + 1e-3);
            assert!(near_band, "altitude {}", altitude);
        }
    }

    #[test]
    fn test_pattern_burst_bypasses_cursor() {
        let tuning = Tuning {
            pattern_interval_min: 10,
            pattern_interval_max: 10,
            ..quiet_tuning()
        };
        let mut rng = Pcg32::seed_from_u64(8);
        let mut scheduler = SpawnScheduler::new(&tuning, &mut rng);
        let mut pickups = Vec::new();
        for _ in 0..9 {
            assert!(scheduler.spawn_pattern(&mut pickups, &tuning, &mut rng).is_none());
        }
        assert!(!scheduler.cursor.can_spawn_entity());
        let (_, count) = scheduler.spawn_pattern(&mut pickups, &tuning, &mut rng).unwrap();
        assert!((3..=6).contains(&count));
        assert_eq!(pickups.len(), count);
        for pickup in &pickups {
            assert!(pickup.rect.left() > tuning.canvas_width);
            assert!(pickup.rect.top() >= 0.0);
            assert!(pickup.rect.bottom() <= tuning.ground_y);
        }
    }

    #[test]
    fn test_pattern_shapes() {
        let mut rng = Pcg32::seed_from_u64(9);

        let arch = PickupPattern::Arch.layout(5, 50.0, 45.0, &mut rng);
        assert!(arch[2].1 > arch[0].1 && arch[2].1 > arch[4].1);
        assert!((arch[0].1 - arch[4].1).abs() < 1e-3);

        let stairs = PickupPattern::Stairs.layout(5, 50.0, 45.0, &mut rng);
        assert!(stairs[0].1 < stairs[1].1 && stairs[1].1 < stairs[2].1);
        assert!(stairs[2].1 > stairs[3].1 && stairs[3].1 > stairs[4].1);

        let diagonal = PickupPattern::Diagonal.layout(4, 50.0, 45.0, &mut rng);
        let rising = diagonal[1].1 > diagonal[0].1;
        for pair in diagonal.windows(2) {
            assert_eq!(pair[1].1 > pair[0].1, rising);
        }

        for pattern in [PickupPattern::Arch, PickupPattern::Wave, PickupPattern::Stairs] {
            let layout = pattern.layout(6, 50.0, 45.0, &mut rng);
            for (i, (x, _)) in layout.iter().enumerate() {
                assert!((x - i as f32 * 45.0).abs() < 1e-3);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_single_spawns_keep_min_gap(
            speeds in proptest::collection::vec(1.0f32..12.0, 50..400),
            seed in any::<u64>(),
        ) {
            let tuning = Tuning {
                obstacle_frequency: 1,
                enemy_frequency: 1,
                pickup_frequency: 1,
                tall_interval_min: 1,
                tall_interval_max: 4,
                pattern_interval_min: u32::MAX,
                pattern_interval_max: u32::MAX,
                ..Tuning::default()
            };
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut scheduler = SpawnScheduler::new(&tuning, &mut rng);
            let mut obstacles: Vec<Obstacle> = Vec::new();
            let mut enemies: Vec<Enemy> = Vec::new();
            let mut pickups: Vec<Pickup> = Vec::new();

            let mut traveled = 0.0f32;
            let mut last_spawn: Option<f32> = None;
            for (frame, speed) in speeds.iter().enumerate() {
                traveled += speed;
                scheduler.cursor.advance(*speed);
                for obstacle in &mut obstacles {
                    obstacle.advance(*speed);
                }
                let report = scheduler.update(
                    frame as u64 + 1,
                    &mut obstacles,
                    &mut enemies,
                    &mut pickups,
                    &tuning,
                    &mut rng,
                );
                let singles = report.obstacle.is_some() as u32 + report.enemy as u32 + report.pickup as u32;
                prop_assert!(singles <= 1);
                if singles == 1 {
                    if let Some(previous) = last_spawn {
                        prop_assert!(traveled - previous >= tuning.min_spawn_gap - 1e-2);
                    }
                    last_spawn = Some(traveled);
                }
            }
        }
    }
}
