//! Where hand landmarks come from.
//!
//! The render loop only ever sees [`Detection`]s.  Two producers exist:
//!
//! * [`SubprocessDetector`]: an external program (e.g. a MediaPipe script)
//!   that prints one JSON object per line.  Its output is read on its own
//!   thread by a [`JsonLinesSource`] and drained by a [`DetectorFeed`].
//! * [`SimulatedHand`]: builds a synthetic hand from the mouse pointer and
//!   held keys, synchronously on the render thread.
//!
//! Either way, a [`DetectionGate`] drops results whose timestamp has not
//! advanced, so a slow detector never feeds the same frame twice.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use ink_geom::{lerp, Point};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::gesture::{landmark, Finger, HandLandmarks};

// ════════════════════════════════════════════════════════════════════════════
// Detection
// ════════════════════════════════════════════════════════════════════════════

/// One detector result: at most one hand.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub timestamp_ms: f64,
    pub hand:         Option<HandLandmarks>,
}

impl Detection {
    pub fn no_hand(timestamp_ms: f64) -> Self {
        Detection { timestamp_ms, hand: None }
    }
}

/// Admits a detection only when its timestamp is newer than the last one
/// admitted.
#[derive(Debug, Default)]
pub struct DetectionGate {
    last: Option<f64>,
}

impl DetectionGate {
    pub fn admit(&mut self, timestamp_ms: f64) -> bool {
        if self.last.is_some_and(|last| timestamp_ms <= last) {
            return false;
        }
        self.last = Some(timestamp_ms);
        true
    }

    pub fn last(&self) -> Option<f64> { self.last }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource: threaded producers
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`Detection`]s over a channel.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<Detection>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<Detection> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

/// Render-thread end of a threaded source.
pub struct DetectorFeed {
    rx:       Receiver<Detection>,
    last_ts:  f64,
    finished: bool,
}

impl DetectorFeed {
    pub fn new(rx: Receiver<Detection>) -> Self {
        DetectorFeed { rx, last_ts: 0.0, finished: false }
    }

    /// Drain everything queued, oldest first.
    ///
    /// When the source goes away a single "no hand" detection is appended so
    /// that any in-progress strokes are committed; after that, nothing.
    pub fn poll(&mut self) -> Vec<Detection> {
        let mut queued = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(d) => {
                    self.last_ts = d.timestamp_ms;
                    queued.push(d);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.finished {
                        self.finished = true;
                        tracing::warn!("landmark detector stopped; continuing without a hand");
                        queued.push(Detection::no_hand(self.last_ts + 1.0));
                    }
                    break;
                }
            }
        }
        queued
    }

    pub fn is_finished(&self) -> bool { self.finished }
}

// ════════════════════════════════════════════════════════════════════════════
// SubprocessDetector
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct PointJson {
    x: f32,
    y: f32,
}

#[derive(Deserialize, Debug)]
struct DetectionJson {
    timestamp_ms: f64,
    #[serde(default)]
    hands: Vec<Vec<PointJson>>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse one line of detector output.
///
/// Only the first hand with exactly 21 landmarks is kept.  A line carrying an
/// `error` field is reported as "no hand".
pub fn parse_detection_line(line: &str) -> Result<Detection> {
    let raw: DetectionJson = serde_json::from_str(line)?;

    if let Some(error) = raw.error {
        tracing::warn!(%error, "detector reported an error");
        return Ok(Detection::no_hand(raw.timestamp_ms));
    }

    let hand = raw.hands.iter().find_map(|pts| {
        if pts.len() != landmark::COUNT {
            tracing::warn!(got = pts.len(), "expected {} landmarks, skipping hand", landmark::COUNT);
            return None;
        }
        let pts: Vec<Point> = pts.iter().map(|p| Point::new(p.x, p.y)).collect();
        HandLandmarks::from_slice(&pts)
    });

    Ok(Detection { timestamp_ms: raw.timestamp_ms, hand })
}

/// An external landmark detector and its command line.
pub struct SubprocessDetector {
    program: String,
    args:    Vec<String>,
}

impl SubprocessDetector {
    /// `command[0]` is the program, the rest its arguments.
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Detector("empty detector command".to_string()))?;
        if program.trim().is_empty() {
            return Err(Error::Detector("detector program name is blank".to_string()));
        }
        Ok(SubprocessDetector { program: program.clone(), args: args.to_vec() })
    }

    /// Split a shell-style command line on whitespace.
    pub fn from_command_line(line: &str) -> Result<Self> {
        let parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        Self::new(&parts)
    }

    /// Program followed by its arguments, as stored in `detector.command`.
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.program.clone()).chain(self.args.iter().cloned()).collect()
    }

    /// Launch the program and start reading its stdout on a background
    /// thread.  The process lives as long as the returned [`DetectorProcess`].
    pub fn start(self) -> Result<(DetectorProcess, Receiver<Detection>)> {
        tracing::info!(program = %self.program, args = ?self.args, "starting landmark detector");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Detector(format!("could not start {:?}: {e}", self.program)))?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Detector("detector stdout unavailable".to_string()));
        };

        let rx = spawn_landmark_source(JsonLinesSource::new(stdout));
        Ok((DetectorProcess { child }, rx))
    }
}

/// A running detector process.  Killed and reaped on [`shutdown`] or drop.
///
/// [`shutdown`]: DetectorProcess::shutdown
pub struct DetectorProcess {
    child: Child,
}

impl DetectorProcess {
    /// Stop the process if it is still running and wait for it.
    pub fn shutdown(&mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(%status, "detector already exited");
                return;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "could not query detector"),
        }
        if let Err(e) = self.child.kill() {
            tracing::warn!(error = %e, "could not kill detector");
        }
        match self.child.wait() {
            Ok(status) => tracing::info!(%status, "detector stopped"),
            Err(e)     => tracing::warn!(error = %e, "could not reap detector"),
        }
    }

    /// `true` once the process has exited.
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Reads one JSON detection per line until EOF.
pub struct JsonLinesSource<R> {
    reader: R,
}

impl<R: Read + Send + 'static> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesSource { reader }
    }
}

impl<R: Read + Send + 'static> LandmarkSource for JsonLinesSource<R> {
    fn run(self: Box<Self>, tx: Sender<Detection>) {
        for line in BufReader::new(self.reader).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "detector output unreadable");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_detection_line(&line) {
                Ok(detection) => {
                    if tx.send(detection).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "skipping malformed detector line"),
            }
        }
        tracing::info!("detector output closed");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimulatedHand
// ════════════════════════════════════════════════════════════════════════════

/// Normalized knuckle distance from the wrist.
const SIM_KNUCKLE: f32 = 0.1;
/// Angle between neighbouring simulated fingers, radians.
const SIM_SPREAD: f32 = 0.18;

/// Synthesizes landmark frames from pointer input.
///
/// The index fingertip lands exactly under the pointer; the other fingers fan
/// out to its side.  `held[finger.slot()]` decides which fingers are
/// extended.
pub struct SimulatedHand {
    canvas_width:    f32,
    canvas_height:   f32,
    extension_ratio: f32,
}

impl SimulatedHand {
    pub fn new(canvas_width: f32, canvas_height: f32, extension_ratio: f32) -> Self {
        SimulatedHand { canvas_width, canvas_height, extension_ratio }
    }

    /// `pointer` is in canvas pixels; `None` means the pointer left the window,
    /// which reads as the hand leaving the frame.
    pub fn detect(&self, timestamp_ms: f64, pointer: Option<Point>, held: [bool; 4]) -> Detection {
        Detection {
            timestamp_ms,
            hand: pointer.map(|p| self.landmarks(p, held)),
        }
    }

    pub fn landmarks(&self, pointer: Point, held: [bool; 4]) -> HandLandmarks {
        let reach_out  = SIM_KNUCKLE * (self.extension_ratio + 1.0);
        let reach_in   = SIM_KNUCKLE * 0.8;

        // Undo the canvas mirroring so the tracker maps the tip back onto the pointer.
        let tip   = Point::new(1.0 - pointer.x / self.canvas_width, pointer.y / self.canvas_height);
        let wrist = tip + Point::new(0.0, reach_out);

        let mut pts = [wrist; landmark::COUNT];
        for finger in Finger::ALL {
            let angle = finger.slot() as f32 * SIM_SPREAD;
            let dir   = Point::new(-angle.sin(), -angle.cos());
            let reach = if held[finger.slot()] { reach_out } else { reach_in };
            let mcp   = wrist + dir * SIM_KNUCKLE;
            let tip   = wrist + dir * reach;
            let base  = finger.mcp_landmark();
            pts[base]     = mcp;
            pts[base + 1] = lerp(mcp, tip, 0.4);
            pts[base + 2] = lerp(mcp, tip, 0.7);
            pts[base + 3] = tip;
        }
        let thumb_dir = Point::new(0.6, -0.5);
        for (i, idx) in (1..=landmark::THUMB_TIP).enumerate() {
            pts[idx] = wrist + thumb_dir * (SIM_KNUCKLE * 0.5 * (i + 1) as f32);
        }
        HandLandmarks::new(pts)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
