//! The drawing session: live settings plus every committed stroke.
//!
//! `SessionState` is the only owner of the physics world.  Strokes enter
//! through [`commit_path`](SessionState::commit_path) and leave only through
//! [`clear`](SessionState::clear); the gravity toggle is the one thing that
//! touches them in between.

use glam::Vec2;
use ink_geom::Point;
use ink_physics::{BodyHandle, PhysicsError, PhysicsWorld};

use crate::config::{HexColor, SessionConfig, Thickness};
use crate::stroke::{Stroke, StrokeBuilder};

pub struct SessionState<W: PhysicsWorld> {
    config:  SessionConfig,
    builder: StrokeBuilder,
    world:   W,
    strokes: Vec<Stroke>,
}

impl<W: PhysicsWorld> SessionState<W> {
    pub fn new(config: SessionConfig, builder: StrokeBuilder, mut world: W) -> Self {
        world.set_gravity(if config.gravity { 1.0 } else { 0.0 });
        SessionState { config, builder, world, strokes: Vec::new() }
    }

    // ── strokes ──────────────────────────────────────────────────────────

    /// Turn a finished path into a stroke with the current thickness and
    /// color, and put its body into the world.
    pub fn commit_path(&mut self, path: &[Point]) -> Option<&Stroke> {
        let stroke = self.builder.build(
            &mut self.world,
            path,
            self.config.thickness_px(),
            self.config.color(),
            self.config.gravity,
        )?;

        if let Err(e) = self.world.add_to_world(stroke.body) {
            tracing::warn!(error = %e, body = %stroke.body, "could not add stroke to world");
            let _ = self.world.remove_from_world(stroke.body);
            return None;
        }

        tracing::info!(
            body = %stroke.body,
            parts = stroke.part_count,
            color = %ink_geom::color::to_hex(stroke.color),
            "stroke committed"
        );
        self.strokes.push(stroke);
        self.strokes.last()
    }

    /// Remove every stroke and its body.  Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.strokes.len();
        for stroke in self.strokes.drain(..) {
            if let Err(e) = self.world.remove_from_world(stroke.body) {
                tracing::warn!(error = %e, body = %stroke.body, "stale stroke body");
            }
        }
        tracing::info!(count, "cleared canvas");
        count
    }

    /// Current world positions of a stroke's parts, in resampled order.
    pub fn stroke_points(&self, stroke: &Stroke) -> Option<Vec<Point>> {
        self.world.part_positions(stroke.body)
    }

    // ── settings ─────────────────────────────────────────────────────────

    /// Switch gravity on or off for the world and every existing stroke.
    ///
    /// On: strokes become dynamic and are woken.  Off: strokes lose all
    /// velocity and freeze in place.  Calling it twice with the same value
    /// changes nothing the second time.
    pub fn set_gravity(&mut self, enabled: bool) {
        self.config.gravity = enabled;
        self.world.set_gravity(if enabled { 1.0 } else { 0.0 });
        for stroke in &self.strokes {
            if let Err(e) = apply_gravity(&mut self.world, stroke.body, enabled) {
                tracing::warn!(error = %e, body = %stroke.body, "gravity toggle skipped stroke");
            }
        }
        tracing::info!(enabled, strokes = self.strokes.len(), "gravity");
    }

    pub fn toggle_gravity(&mut self) -> bool {
        self.set_gravity(!self.config.gravity);
        self.config.gravity
    }

    pub fn set_wiggle(&mut self, enabled: bool) {
        self.config.wiggle = enabled;
    }

    pub fn toggle_wiggle(&mut self) -> bool {
        self.config.wiggle = !self.config.wiggle;
        self.config.wiggle
    }

    /// Affects strokes committed from now on.
    pub fn set_thickness(&mut self, thickness: Thickness) {
        self.config.thickness = thickness;
    }

    /// Affects strokes committed from now on.
    pub fn set_color(&mut self, color: u32) {
        self.config.color = HexColor(color);
    }

    // ── simulation ───────────────────────────────────────────────────────

    pub fn step(&mut self, dt: f32) {
        self.world.step(dt);
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig { &self.config }
    pub fn strokes(&self) -> &[Stroke]     { &self.strokes }
    pub fn world(&self) -> &W              { &self.world }
}

fn apply_gravity<W: PhysicsWorld>(world: &mut W, body: BodyHandle, enabled: bool) -> Result<(), PhysicsError> {
    if enabled {
        world.set_static(body, false)?;
        world.wake(body)?;
    } else {
        // Velocities first: engines ignore velocity writes on static bodies.
        world.set_linear_velocity(body, Vec2::ZERO)?;
        world.set_angular_velocity(body, 0.0)?;
        world.set_static(body, true)?;
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
