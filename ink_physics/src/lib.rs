//! # ink_physics
//!
//! The physics boundary for finger ink.  The drawing core never talks to a
//! rigid-body engine directly; it goes through [`PhysicsWorld`]:
//!
//! | Operation | Meaning |
//! |---|---|
//! | [`create_compound_body`](PhysicsWorld::create_compound_body) | one rigid body from N circles, not yet simulated |
//! | [`add_to_world`](PhysicsWorld::add_to_world) / [`remove_from_world`](PhysicsWorld::remove_from_world) | world membership |
//! | [`set_static`](PhysicsWorld::set_static) | freeze / release a body |
//! | [`set_linear_velocity`](PhysicsWorld::set_linear_velocity), [`set_angular_velocity`](PhysicsWorld::set_angular_velocity), [`wake`](PhysicsWorld::wake) | motion state |
//! | [`part_positions`](PhysicsWorld::part_positions) | current circle centers, in creation order |
//! | [`set_gravity`](PhysicsWorld::set_gravity) / [`step`](PhysicsWorld::step) | the simulation itself |
//!
//! [`RapierWorld`] is the production implementation.  World units are canvas
//! pixels with y pointing down, so positive gravity pulls strokes toward the
//! bottom of the screen.

use glam::Vec2;

mod rapier;
pub use rapier::RapierWorld;

// ════════════════════════════════════════════════════════════════════════════
// Handles and descriptions
// ════════════════════════════════════════════════════════════════════════════

/// Opaque reference to a body created by a [`PhysicsWorld`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(u32);

impl std::fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// One circular collision shape, in world coordinates at creation time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CirclePart {
    pub center: Vec2,
    pub radius: f32,
}

impl CirclePart {
    pub fn new(center: Vec2, radius: f32) -> Self {
        CirclePart { center, radius }
    }
}

/// Material and motion parameters applied to every part of a compound body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyParams {
    pub is_static:   bool,
    pub friction:    f32,
    /// Linear and angular damping ("air friction").
    pub air_damping: f32,
    pub restitution: f32,
    pub density:     f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        BodyParams {
            is_static:   false,
            friction:    0.5,
            air_damping: 0.0,
            restitution: 0.0,
            density:     1.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("a compound body needs at least one part")]
    EmptyBody,
    #[error("part {index} is degenerate (radius {radius}, center {center:?})")]
    InvalidPart { index: usize, radius: f32, center: Vec2 },
    #[error("unknown {0}")]
    UnknownBody(BodyHandle),
    #[error("{0} is already in the world")]
    AlreadyInWorld(BodyHandle),
}

// ════════════════════════════════════════════════════════════════════════════
// PhysicsWorld: the engine contract
// ════════════════════════════════════════════════════════════════════════════

/// Everything the drawing core needs from a 2D rigid-body engine.
pub trait PhysicsWorld {
    /// Build one rigid body out of `parts`, centered on their centroid.
    /// The body is not simulated until [`add_to_world`](Self::add_to_world).
    fn create_compound_body(
        &mut self,
        parts:  &[CirclePart],
        params: &BodyParams,
    ) -> Result<BodyHandle, PhysicsError>;

    fn add_to_world(&mut self, body: BodyHandle) -> Result<(), PhysicsError>;

    /// Remove the body from the simulation and forget it; the handle is dead
    /// afterwards.
    fn remove_from_world(&mut self, body: BodyHandle) -> Result<(), PhysicsError>;

    fn set_static(&mut self, body: BodyHandle, is_static: bool) -> Result<(), PhysicsError>;
    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> Result<(), PhysicsError>;
    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: f32) -> Result<(), PhysicsError>;
    fn wake(&mut self, body: BodyHandle) -> Result<(), PhysicsError>;

    /// Current world-space centers of the body's parts, in creation order.
    fn part_positions(&self, body: BodyHandle) -> Option<Vec<Vec2>>;

    fn is_static(&self, body: BodyHandle) -> Option<bool>;
    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2>;
    fn angular_velocity(&self, body: BodyHandle) -> Option<f32>;

    /// Set the vertical gravity factor: 0 = off, 1 = on.
    fn set_gravity(&mut self, y: f32);

    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f32);
}
