//! Simulated end-to-end session: calibrate a synthetic board from four
//! fiducials, then track a token through promotion to an external
//! entity. No camera needed; frames and markers are synthetic.
//!
//! Run with: `cargo run --example simulated_session`

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use log::{info, LevelFilter};
use nalgebra::Point2;

use tokenboard::calib::{
    BoardDetector, CalibrationParams, CornerMarker, CornerTag, MarkerFinder,
};
use tokenboard::core::{init_with_level, Frame, FrameView};
use tokenboard::track::{
    HitTester, RemoteAuthority, RemoteError, RemoteToken, SpaceRegistry, TokenTracker,
    TrackerParams,
};
use tokenboard::{Extent, Pipeline, TokenColor, TokenShape, TrackedToken};

struct FixedFinder(Vec<CornerMarker>);

impl MarkerFinder for FixedFinder {
    fn find_markers(&self, binary: &FrameView<'_>) -> Vec<CornerMarker> {
        if binary.data.iter().any(|&v| v > 0) {
            self.0.clone()
        } else {
            Vec::new()
        }
    }
}

struct LoggingRemote(AtomicU32);

impl RemoteAuthority for LoggingRemote {
    fn create(
        &self,
        shape: TokenShape,
        color: TokenColor,
        world: Point2<f64>,
    ) -> Result<u32, RemoteError> {
        let id = self.0.fetch_add(1, Ordering::Relaxed);
        info!("authority: created {shape:?}/{color:?} at ({:.1}, {:.1}) as {id}", world.x, world.y);
        Ok(id)
    }

    fn remove(&self, remote_id: u32) -> Result<(), RemoteError> {
        info!("authority: removed {remote_id}");
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<RemoteToken>, RemoteError> {
        Ok(Vec::new())
    }
}

struct NoUi;

impl HitTester for NoUi {
    fn is_on_ui(&self, _token: &TrackedToken) -> bool {
        false
    }
}

fn corner_marker(tag: CornerTag, cx: f32, cy: f32) -> CornerMarker {
    CornerMarker {
        tag,
        corners: [
            Point2::new(cx - 10.0, cy - 10.0),
            Point2::new(cx + 10.0, cy - 10.0),
            Point2::new(cx + 10.0, cy + 10.0),
            Point2::new(cx - 10.0, cy + 10.0),
        ],
    }
}

fn main() {
    init_with_level(LevelFilter::Info).expect("logger installs once");

    let spaces = Arc::new(SpaceRegistry::new());
    spaces.set_display(Extent::new(0.0, 0.0, 1280.0, 720.0, true).expect("display extent"));
    spaces.set_map(Extent::new(-500.0, -500.0, 500.0, 500.0, false).expect("map extent"));

    let remote = Arc::new(LoggingRemote(AtomicU32::new(1)));
    let tracker = TokenTracker::new(
        TrackerParams::default(),
        Arc::clone(&spaces),
        remote,
        Arc::new(NoUi),
    )
    .expect("valid tracker params");

    let detector =
        BoardDetector::new(CalibrationParams::default()).expect("valid calibration params");
    let mut pipeline = Pipeline::new(detector, Arc::new(Mutex::new(tracker)), Arc::clone(&spaces));

    let finder = FixedFinder(vec![
        corner_marker(CornerTag::TopLeft, 100.0, 100.0),
        corner_marker(CornerTag::TopRight, 500.0, 100.0),
        corner_marker(CornerTag::BottomRight, 500.0, 400.0),
        corner_marker(CornerTag::BottomLeft, 100.0, 400.0),
    ]);

    // An empty table while the background plate settles, then a lit
    // scene with the fiducials in view.
    let dark = Frame::new(640, 480);
    let lit = Frame {
        width: 640,
        height: 480,
        data: vec![200; 640 * 480],
    };
    while pipeline.stage().runs_calibration() {
        let frame = if pipeline.stage() == tokenboard::ProgramStage::WhiteBalance {
            &dark
        } else {
            &lit
        };
        pipeline.process_frame(&frame.view(), &finder, &[]);
    }
    info!("stage after calibration: {:?}", pipeline.stage());

    // A token placed on the table survives its appearance threshold.
    let token = TrackedToken::candidate(210, 160, TokenShape::Square, TokenColor::Red);
    let mut confirmed = Vec::new();
    for _ in 0..8 {
        confirmed = pipeline.process_frame(&lit.view(), &finder, std::slice::from_ref(&token));
    }
    for t in &confirmed {
        info!(
            "confirmed token: id {:?} status {:?} world {:?}",
            t.id, t.status, t.world
        );
    }
}
