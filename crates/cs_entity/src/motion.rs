//! Shared movement model for everything that walks on the height field.
//!
//! Player, caravans and NPCs all integrate horizontal motion and then
//! re-resolve the vertical position from the terrain; the y coordinate is
//! never authoritative on its own.

use bevy::prelude::*;
use cs_terrain::HeightField;

/// Squared horizontal distance below which a target counts as reached.
pub const ARRIVE_TOLERANCE_SQ: f32 = 0.2;

/// Terrain-glued movement state.
#[derive(Debug, Clone)]
pub struct MotionState {
    pub position: Vec3,
    /// Heading angle in radians, `atan2(dir.x, dir.z)` of the last movement.
    pub heading: f32,
    /// Horizontal speed in world units per second.
    pub speed: f32,
    /// Constant offset above the ground (capsule half-height etc.).
    pub vertical_offset: f32,
}

impl MotionState {
    /// Place a new entity on the terrain surface at `(x, z)`.
    pub fn on_ground(x: f32, z: f32, speed: f32, vertical_offset: f32, terrain: &HeightField) -> Self {
        let y = terrain.height_at(x, z) + vertical_offset;
        Self {
            position: Vec3::new(x, y, z),
            heading: 0.0,
            speed,
            vertical_offset,
        }
    }

    fn advance(&mut self, direction: Vec2, delta: f32) {
        if direction == Vec2::ZERO {
            return;
        }
        self.position.x += direction.x * self.speed * delta;
        self.position.z += direction.y * self.speed * delta;
        self.heading = direction.x.atan2(direction.y);
    }

    /// Advance along a unit-length (or zero) horizontal direction, then
    /// glue to the terrain. A zero direction leaves the heading unchanged.
    pub fn step(&mut self, direction: Vec2, delta: f32, terrain: &HeightField) {
        self.advance(direction, delta);
        self.snap_to_ground(terrain);
    }

    /// [`MotionState::step`], with the horizontal position clamped to the
    /// terrain's movement bounds.
    pub fn step_clamped(&mut self, direction: Vec2, delta: f32, terrain: &HeightField) {
        self.advance(direction, delta);
        let bounds = terrain.movement_bounds();
        self.position.x = self.position.x.clamp(-bounds, bounds);
        self.position.z = self.position.z.clamp(-bounds, bounds);
        self.snap_to_ground(terrain);
    }

    /// Walk toward a horizontal target point; returns true once within the
    /// arrival tolerance.
    pub fn step_toward(&mut self, target: Vec2, delta: f32, terrain: &HeightField) -> bool {
        let to_target = target - self.horizontal();
        if to_target.length_squared() <= ARRIVE_TOLERANCE_SQ {
            self.snap_to_ground(terrain);
            return true;
        }
        self.step(to_target.normalize(), delta, terrain);
        false
    }

    /// Displace by an explicit offset (scripted paths), with the same
    /// heading rule and terrain gluing as directed movement.
    pub fn translate(&mut self, dx: f32, dz: f32, terrain: &HeightField) {
        self.position.x += dx;
        self.position.z += dz;
        if dx != 0.0 || dz != 0.0 {
            self.heading = dx.atan2(dz);
        }
        self.snap_to_ground(terrain);
    }

    /// Re-resolve the vertical position from the height field.
    pub fn snap_to_ground(&mut self, terrain: &HeightField) {
        self.position.y = terrain.height_at(self.position.x, self.position.z) + self.vertical_offset;
    }

    /// Position projected onto the horizontal plane.
    pub fn horizontal(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_terrain(height: f32) -> HeightField {
        HeightField::from_heights(100.0, 2, 10.0, vec![height; 9])
    }

    #[test]
    fn spawns_on_surface() {
        let terrain = flat_terrain(7.0);
        let motion = MotionState::on_ground(3.0, -4.0, 2.0, 1.0, &terrain);
        assert_eq!(motion.position, Vec3::new(3.0, 8.0, -4.0));
    }

    #[test]
    fn step_integrates_speed_and_delta() {
        let terrain = flat_terrain(0.0);
        let mut motion = MotionState::on_ground(0.0, 0.0, 4.0, 0.5, &terrain);
        motion.step(Vec2::new(1.0, 0.0), 0.5, &terrain);
        assert_eq!(motion.position.x, 2.0);
        assert_eq!(motion.position.z, 0.0);
        assert_eq!(motion.position.y, 0.5);
    }

    #[test]
    fn zero_direction_keeps_heading() {
        let terrain = flat_terrain(0.0);
        let mut motion = MotionState::on_ground(0.0, 0.0, 4.0, 0.0, &terrain);
        motion.step(Vec2::new(0.0, 1.0), 0.1, &terrain);
        let heading = motion.heading;
        motion.step(Vec2::ZERO, 0.1, &terrain);
        assert_eq!(motion.heading, heading);
    }

    #[test]
    fn heading_follows_direction() {
        let terrain = flat_terrain(0.0);
        let mut motion = MotionState::on_ground(0.0, 0.0, 1.0, 0.0, &terrain);
        motion.step(Vec2::new(1.0, 0.0), 0.1, &terrain);
        assert!((motion.heading - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn clamped_step_respects_bounds() {
        let terrain = flat_terrain(0.0);
        let mut motion = MotionState::on_ground(39.0, 0.0, 100.0, 0.0, &terrain);
        motion.step_clamped(Vec2::new(1.0, 0.0), 1.0, &terrain);
        assert_eq!(motion.position.x, terrain.movement_bounds());
    }

    #[test]
    fn step_toward_arrives() {
        let terrain = flat_terrain(0.0);
        let mut motion = MotionState::on_ground(0.0, 0.0, 2.0, 0.0, &terrain);
        let target = Vec2::new(3.0, 0.0);
        let mut arrived = false;
        for _ in 0..100 {
            if motion.step_toward(target, 0.05, &terrain) {
                arrived = true;
                break;
            }
        }
        assert!(arrived);
        assert!((motion.horizontal() - target).length_squared() <= ARRIVE_TOLERANCE_SQ);
    }

    #[test]
    fn vertical_position_tracks_terrain() {
        // Sloped 1-cell terrain: height rises with x.
        let terrain = HeightField::from_heights(10.0, 1, 0.0, vec![0.0, 10.0, 0.0, 10.0]);
        let mut motion = MotionState::on_ground(-5.0, 0.0, 1.0, 0.0, &terrain);
        assert_eq!(motion.position.y, 0.0);
        motion.translate(5.0, 0.0, &terrain);
        assert_eq!(motion.position.y, 5.0);
    }
}
