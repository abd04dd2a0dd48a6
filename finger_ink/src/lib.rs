//! # finger_ink
//!
//! Hand-tracked finger painting.  Fingertip paths become compound rigid
//! bodies in a 2D physics world and are drawn, together with the ink still
//! being laid down, on a software-rendered canvas.
//!
//! ## Pipeline
//!
//! ```text
//!   detector ──► GestureTracker ──► StrokeBuilder ──► PhysicsWorld
//!   (landmarks)   (live paths)       (circle parts)     (bodies)
//!                      │                                   │
//!                      └──────────► FrameRenderer ◄────────┘
//!                                   (+ SparkEffect, HUD)
//! ```
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Extend a finger | Start a path at its tip; a spark follows the tip |
//! | Move while extended | Extend the path (tiny moves are ignored) |
//! | Curl the finger | Finish the path; it becomes a physics stroke |
//! | Hand leaves the frame | Finish every open path |
//!
//! ## Landmark sources
//!
//! * (default): **Simulated hand**: the mouse drives a synthetic hand.
//! * `detector.command`: **External detector**: a subprocess printing one
//!   JSON detection per line (see [`detector`]).
//!
//! ### Keys
//!
//! | Key | Action |
//! |---|---|
//! | Left mouse / `1` | Extend index finger (simulated hand) |
//! | `2` `3` `4` | Extend middle / ring / pinky (simulated hand) |
//! | `G` | Toggle gravity |
//! | `W` | Toggle wiggle |
//! | `C` | Clear all strokes |
//! | `[` / `]` | Thinner / thicker ink |
//! | `Tab` | Next palette color |
//! | `P` | Save the current frame as PNG |
//! | `Q` / `Escape` | Quit |

pub mod app;
pub mod canvas;
pub mod clock;
pub mod config;
pub mod detector;
pub mod error;
pub mod gesture;
pub mod renderer;
pub mod session;
pub mod spark;
pub mod stroke;
pub mod visualizer;

pub use error::{Error, Result};
