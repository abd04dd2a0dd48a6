//! [`PhysicsWorld`] backed by `rapier2d`.

use std::collections::HashMap;

use glam::Vec2;
use rapier2d::prelude::*;

use crate::{BodyHandle, BodyParams, CirclePart, PhysicsError, PhysicsWorld};

/// Default gravity magnitude in px/s² when the gravity factor is 1.
pub const DEFAULT_GRAVITY_PX: f32 = 980.0;

/// Thickness of the off-screen floor and wall slabs.
const WALL_THICKNESS: f32 = 50.0;

/// A body is either described but not yet simulated, or live in the sets.
enum Entry {
    Pending {
        body:      RigidBody,
        colliders: Vec<Collider>,
        parts:     Vec<Vec2>,
    },
    Live {
        rigid:     RigidBodyHandle,
        colliders: Vec<ColliderHandle>,
    },
}

pub struct RapierWorld {
    gravity_scale:    f32,
    gravity:          Vector<Real>,
    params:           IntegrationParameters,
    pipeline:         PhysicsPipeline,
    islands:          IslandManager,
    broad_phase:      BroadPhaseBvh,
    narrow_phase:     NarrowPhase,
    bodies:           RigidBodySet,
    colliders:        ColliderSet,
    impulse_joints:   ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver:       CCDSolver,

    entries: HashMap<BodyHandle, Entry>,
    next_id: u32,
}

impl Default for RapierWorld {
    fn default() -> Self { Self::new(DEFAULT_GRAVITY_PX) }
}

impl RapierWorld {
    /// Empty world with gravity initially off.  `gravity_scale` is the
    /// acceleration in px/s² applied when the gravity factor is 1.
    pub fn new(gravity_scale: f32) -> Self {
        RapierWorld {
            gravity_scale,
            gravity:          vector![0.0, 0.0],
            params:           IntegrationParameters::default(),
            pipeline:         PhysicsPipeline::new(),
            islands:          IslandManager::new(),
            broad_phase:      BroadPhaseBvh::new(),
            narrow_phase:     NarrowPhase::new(),
            bodies:           RigidBodySet::new(),
            colliders:        ColliderSet::new(),
            impulse_joints:   ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver:       CCDSolver::new(),
            entries:          HashMap::new(),
            next_id:          0,
        }
    }

    /// World with a static floor and two side walls just outside a
    /// `width × height` canvas, so released strokes land on screen.
    pub fn with_bounds(gravity_scale: f32, width: f32, height: f32) -> Self {
        let mut world = Self::new(gravity_scale);
        let t = WALL_THICKNESS;
        let ground = world.bodies.insert(RigidBodyBuilder::fixed().build());
        let slabs = [
            // floor
            (vector![width / 2.0, height + t], width / 2.0 + 2.0 * t, t),
            // left wall
            (vector![-t, height / 2.0], t, height),
            // right wall
            (vector![width + t, height / 2.0], t, height),
        ];
        for (center, hx, hy) in slabs {
            let col = ColliderBuilder::cuboid(hx, hy)
                .translation(center)
                .friction(0.8)
                .restitution(0.0)
                .build();
            world.colliders.insert_with_parent(col, ground, &mut world.bodies);
        }
        world
    }

    /// Number of bodies created through the [`PhysicsWorld`] interface that
    /// are currently simulated.
    pub fn live_body_count(&self) -> usize {
        self.entries.values().filter(|e| matches!(e, Entry::Live { .. })).count()
    }

    pub fn is_in_world(&self, body: BodyHandle) -> bool {
        matches!(self.entries.get(&body), Some(Entry::Live { .. }))
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    pub fn is_sleeping(&self, body: BodyHandle) -> Option<bool> {
        self.rigid_body(body).map(|rb| rb.is_sleeping())
    }

    fn rigid_body(&self, body: BodyHandle) -> Option<&RigidBody> {
        match self.entries.get(&body)? {
            Entry::Pending { body, .. } => Some(body),
            Entry::Live { rigid, .. }   => self.bodies.get(*rigid),
        }
    }

    fn rigid_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody, PhysicsError> {
        let found = match self.entries.get_mut(&handle) {
            Some(Entry::Pending { body, .. }) => Some(body),
            Some(Entry::Live { rigid, .. })   => self.bodies.get_mut(*rigid),
            None => None,
        };
        found.ok_or(PhysicsError::UnknownBody(handle))
    }
}

fn validate_parts(parts: &[CirclePart]) -> Result<(), PhysicsError> {
    if parts.is_empty() {
        return Err(PhysicsError::EmptyBody);
    }
    for (index, p) in parts.iter().enumerate() {
        if !(p.radius > 0.0 && p.radius.is_finite()) || !p.center.is_finite() {
            return Err(PhysicsError::InvalidPart { index, radius: p.radius, center: p.center });
        }
    }
    Ok(())
}

impl PhysicsWorld for RapierWorld {
    fn create_compound_body(
        &mut self,
        parts:  &[CirclePart],
        params: &BodyParams,
    ) -> Result<BodyHandle, PhysicsError> {
        validate_parts(parts)?;
        let centers: Vec<Vec2> = parts.iter().map(|p| p.center).collect();
        let c = ink_geom::centroid(&centers).ok_or(PhysicsError::EmptyBody)?;

        let builder = if params.is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let body = builder
            .translation(vector![c.x, c.y])
            .linear_damping(params.air_damping)
            .angular_damping(params.air_damping)
            .build();

        let colliders = parts
            .iter()
            .map(|p| {
                ColliderBuilder::ball(p.radius)
                    .translation(vector![p.center.x - c.x, p.center.y - c.y])
                    .friction(params.friction)
                    .restitution(params.restitution)
                    .density(params.density)
                    .build()
            })
            .collect();

        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        tracing::debug!(%handle, parts = parts.len(), is_static = params.is_static, "created compound body");
        self.entries.insert(handle, Entry::Pending { body, colliders, parts: centers });
        Ok(handle)
    }

    fn add_to_world(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        match self.entries.remove(&handle) {
            Some(Entry::Pending { body, colliders, .. }) => {
                let rigid = self.bodies.insert(body);
                let colliders = colliders
                    .into_iter()
                    .map(|col| self.colliders.insert_with_parent(col, rigid, &mut self.bodies))
                    .collect();
                self.entries.insert(handle, Entry::Live { rigid, colliders });
                Ok(())
            }
            Some(live @ Entry::Live { .. }) => {
                self.entries.insert(handle, live);
                Err(PhysicsError::AlreadyInWorld(handle))
            }
            None => Err(PhysicsError::UnknownBody(handle)),
        }
    }

    fn remove_from_world(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        match self.entries.remove(&handle) {
            Some(Entry::Live { rigid, .. }) => {
                self.bodies.remove(
                    rigid,
                    &mut self.islands,
                    &mut self.colliders,
                    &mut self.impulse_joints,
                    &mut self.multibody_joints,
                    true,
                );
                tracing::debug!(%handle, "removed body");
                Ok(())
            }
            Some(Entry::Pending { .. }) => Ok(()),
            None => Err(PhysicsError::UnknownBody(handle)),
        }
    }

    fn set_static(&mut self, handle: BodyHandle, is_static: bool) -> Result<(), PhysicsError> {
        let rb = self.rigid_body_mut(handle)?;
        let target = if is_static { RigidBodyType::Fixed } else { RigidBodyType::Dynamic };
        if rb.body_type() != target {
            rb.set_body_type(target, true);
        }
        Ok(())
    }

    fn set_linear_velocity(&mut self, handle: BodyHandle, v: Vec2) -> Result<(), PhysicsError> {
        self.rigid_body_mut(handle)?.set_linvel(vector![v.x, v.y], false);
        Ok(())
    }

    fn set_angular_velocity(&mut self, handle: BodyHandle, w: f32) -> Result<(), PhysicsError> {
        self.rigid_body_mut(handle)?.set_angvel(w, false);
        Ok(())
    }

    fn wake(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        self.rigid_body_mut(handle)?.wake_up(true);
        Ok(())
    }

    fn part_positions(&self, handle: BodyHandle) -> Option<Vec<Vec2>> {
        match self.entries.get(&handle)? {
            Entry::Pending { parts, .. } => Some(parts.clone()),
            Entry::Live { colliders, .. } => colliders
                .iter()
                .map(|h| {
                    self.colliders.get(*h).map(|col| {
                        let t = col.translation();
                        Vec2::new(t.x, t.y)
                    })
                })
                .collect(),
        }
    }

    fn is_static(&self, handle: BodyHandle) -> Option<bool> {
        self.rigid_body(handle).map(|rb| rb.is_fixed())
    }

    fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.rigid_body(handle).map(|rb| {
            let v = rb.linvel();
            Vec2::new(v.x, v.y)
        })
    }

    fn angular_velocity(&self, handle: BodyHandle) -> Option<f32> {
        self.rigid_body(handle).map(|rb| rb.angvel())
    }

    fn set_gravity(&mut self, y: f32) {
        self.gravity = vector![0.0, y * self.gravity_scale];
    }

    fn step(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(n: usize, y: f32) -> Vec<CirclePart> {
        (0..n).map(|i| CirclePart::new(Vec2::new(100.0 + 4.0 * i as f32, y), 5.0)).collect()
    }

    fn dynamic() -> BodyParams {
        BodyParams { is_static: false, ..BodyParams::default() }
    }

    #[test]
    fn empty_body_rejected() {
        let mut w = RapierWorld::default();
        assert_eq!(w.create_compound_body(&[], &dynamic()), Err(PhysicsError::EmptyBody));
    }

    #[test]
    fn degenerate_part_rejected() {
        let mut w = RapierWorld::default();
        let mut parts = row(3, 10.0);
        parts[1].radius = 0.0;
        assert!(matches!(
            w.create_compound_body(&parts, &dynamic()),
            Err(PhysicsError::InvalidPart { index: 1, .. })
        ));
    }

    #[test]
    fn pending_body_reports_creation_positions() {
        let mut w = RapierWorld::default();
        let parts = row(4, 50.0);
        let h = w.create_compound_body(&parts, &dynamic()).unwrap();
        assert!(!w.is_in_world(h));
        let pos = w.part_positions(h).unwrap();
        assert_eq!(pos, parts.iter().map(|p| p.center).collect::<Vec<_>>());
    }

    #[test]
    fn live_positions_keep_order_and_count() {
        let mut w = RapierWorld::default();
        let parts = row(5, 50.0);
        let h = w.create_compound_body(&parts, &dynamic()).unwrap();
        w.add_to_world(h).unwrap();
        let pos = w.part_positions(h).unwrap();
        assert_eq!(pos.len(), 5);
        for (p, part) in pos.iter().zip(&parts) {
            assert_relative_eq!(p.x, part.center.x, epsilon = 1e-3);
            assert_relative_eq!(p.y, part.center.y, epsilon = 1e-3);
        }
    }

    #[test]
    fn add_twice_is_an_error() {
        let mut w = RapierWorld::default();
        let h = w.create_compound_body(&row(2, 0.0), &dynamic()).unwrap();
        w.add_to_world(h).unwrap();
        assert_eq!(w.add_to_world(h), Err(PhysicsError::AlreadyInWorld(h)));
        assert_eq!(w.live_body_count(), 1);
    }

    #[test]
    fn dynamic_body_falls_under_gravity() {
        let mut w = RapierWorld::default();
        let h = w.create_compound_body(&row(3, 100.0), &dynamic()).unwrap();
        w.add_to_world(h).unwrap();
        w.set_gravity(1.0);
        for _ in 0..30 { w.step(1.0 / 60.0); }
        let y = w.part_positions(h).unwrap()[0].y;
        assert!(y > 110.0, "body should have fallen, y = {}", y);
    }

    #[test]
    fn static_body_stays_put() {
        let mut w = RapierWorld::default();
        let params = BodyParams { is_static: true, ..BodyParams::default() };
        let h = w.create_compound_body(&row(3, 100.0), &params).unwrap();
        w.add_to_world(h).unwrap();
        w.set_gravity(1.0);
        for _ in 0..30 { w.step(1.0 / 60.0); }
        assert_relative_eq!(w.part_positions(h).unwrap()[0].y, 100.0, epsilon = 1e-3);
        assert_eq!(w.is_static(h), Some(true));
    }

    #[test]
    fn floor_stops_falling_bodies() {
        let mut w = RapierWorld::with_bounds(DEFAULT_GRAVITY_PX, 400.0, 300.0);
        let h = w.create_compound_body(&row(6, 100.0), &dynamic()).unwrap();
        w.add_to_world(h).unwrap();
        w.set_gravity(1.0);
        for _ in 0..600 { w.step(1.0 / 60.0); }
        for p in w.part_positions(h).unwrap() {
            assert!(p.y < 300.0 + 1.0, "part fell through the floor: {:?}", p);
        }
    }

    #[test]
    fn set_static_switches_body_type() {
        let mut w = RapierWorld::default();
        let h = w.create_compound_body(&row(2, 0.0), &dynamic()).unwrap();
        w.add_to_world(h).unwrap();
        w.set_static(h, true).unwrap();
        assert_eq!(w.is_static(h), Some(true));
        w.set_static(h, false).unwrap();
        assert_eq!(w.is_static(h), Some(false));
    }

    #[test]
    fn velocities_round_trip() {
        let mut w = RapierWorld::default();
        let h = w.create_compound_body(&row(2, 0.0), &dynamic()).unwrap();
        w.add_to_world(h).unwrap();
        w.set_linear_velocity(h, Vec2::new(3.0, -4.0)).unwrap();
        w.set_angular_velocity(h, 1.5).unwrap();
        assert_eq!(w.linear_velocity(h), Some(Vec2::new(3.0, -4.0)));
        assert_eq!(w.angular_velocity(h), Some(1.5));
    }

    #[test]
    fn remove_forgets_body() {
        let mut w = RapierWorld::default();
        let h = w.create_compound_body(&row(2, 0.0), &dynamic()).unwrap();
        w.add_to_world(h).unwrap();
        w.remove_from_world(h).unwrap();
        assert_eq!(w.live_body_count(), 0);
        assert!(w.part_positions(h).is_none());
        assert_eq!(w.remove_from_world(h), Err(PhysicsError::UnknownBody(h)));
    }

    #[test]
    fn gravity_factor_scales() {
        let mut w = RapierWorld::new(500.0);
        w.set_gravity(1.0);
        assert_eq!(w.gravity(), Vec2::new(0.0, 500.0));
        w.set_gravity(0.0);
        assert_eq!(w.gravity(), Vec2::ZERO);
    }
}
