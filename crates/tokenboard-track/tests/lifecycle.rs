use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nalgebra::Point2;

use tokenboard_core::{Extent, TokenColor, TokenShape, TokenStatus, TrackedToken};
use tokenboard_track::{
    HitTester, RemoteAuthority, RemoteError, RemoteToken, SpaceRegistry, SyncWorker, TokenTracker,
    TrackerParams,
};

struct MockRemote {
    next_id: AtomicU32,
    created: Mutex<Vec<(TokenShape, TokenColor, Point2<f64>)>>,
    removed: Mutex<Vec<u32>>,
    listing: Mutex<Vec<RemoteToken>>,
    fail_create: AtomicBool,
}

impl MockRemote {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU32::new(100),
            created: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            listing: Mutex::new(Vec::new()),
            fail_create: AtomicBool::new(false),
        })
    }

    fn create_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    fn removed_ids(&self) -> Vec<u32> {
        self.removed.lock().unwrap().clone()
    }
}

impl RemoteAuthority for MockRemote {
    fn create(
        &self,
        shape: TokenShape,
        color: TokenColor,
        world: Point2<f64>,
    ) -> Result<u32, RemoteError> {
        if self.fail_create.load(Ordering::Relaxed) {
            return Err(RemoteError::Unavailable("server down".into()));
        }
        self.created.lock().unwrap().push((shape, color, world));
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn remove(&self, remote_id: u32) -> Result<(), RemoteError> {
        self.removed.lock().unwrap().push(remote_id);
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<RemoteToken>, RemoteError> {
        Ok(self.listing.lock().unwrap().clone())
    }
}

/// Hit tester answering a fixed or externally switched value.
struct SwitchUi(Arc<AtomicBool>);

impl HitTester for SwitchUi {
    fn is_on_ui(&self, _token: &TrackedToken) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

fn identity_extent() -> Extent {
    Extent::new(0.0, 0.0, 100.0, 100.0, false).unwrap()
}

fn params() -> TrackerParams {
    TrackerParams {
        min_distance: 4,
        internal_min_appeared: 3,
        external_min_appeared: 5,
        internal_max_disappeared: 3,
        external_max_disappeared: 10,
    }
}

struct Fixture {
    tracker: TokenTracker,
    remote: Arc<MockRemote>,
    spaces: Arc<SpaceRegistry>,
    ui: Arc<AtomicBool>,
}

fn fixture(on_ui: bool) -> Fixture {
    let spaces = Arc::new(SpaceRegistry::new());
    spaces.set_board(identity_extent());
    spaces.set_display(identity_extent());
    spaces.set_map(identity_extent());
    let remote = MockRemote::new();
    let ui = Arc::new(AtomicBool::new(on_ui));
    let tracker = TokenTracker::new(
        params(),
        Arc::clone(&spaces),
        remote.clone(),
        Arc::new(SwitchUi(Arc::clone(&ui))),
    )
    .expect("valid params");
    Fixture {
        tracker,
        remote,
        spaces,
        ui,
    }
}

fn red_square(x: i32, y: i32) -> TrackedToken {
    TrackedToken::candidate(x, y, TokenShape::Square, TokenColor::Red)
}

#[test]
fn external_promotion_happens_on_the_frame_after_the_threshold() {
    let mut fx = fixture(false);
    let cand = red_square(50, 50);

    // Exactly external_min_appeared sightings: not yet confirmed.
    for frame in 1..=5 {
        let confirmed = fx.tracker.update(std::slice::from_ref(&cand)).to_vec();
        assert!(confirmed.is_empty(), "confirmed too early at frame {frame}");
    }

    let confirmed = fx.tracker.update(std::slice::from_ref(&cand)).to_vec();
    assert_eq!(confirmed.len(), 1);
    let token = &confirmed[0];
    assert_eq!(token.status, TokenStatus::External);
    assert_eq!(token.id, Some(100));
    assert_eq!(token.world, Some(Point2::new(50.0, 50.0)));
    assert_eq!(fx.remote.create_count(), 1);
}

#[test]
fn ui_candidates_confirm_faster_and_stay_local() {
    let mut fx = fixture(true);
    let cand = red_square(20, 20);

    for _ in 1..=3 {
        assert!(fx.tracker.update(std::slice::from_ref(&cand)).is_empty());
    }
    let confirmed = fx.tracker.update(std::slice::from_ref(&cand)).to_vec();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].status, TokenStatus::Internal);
    assert!(confirmed[0].id.is_none());
    assert_eq!(fx.remote.create_count(), 0);
}

#[test]
fn eviction_happens_on_the_frame_after_the_absence_budget() {
    let mut fx = fixture(false);
    let cand = red_square(50, 50);
    for _ in 1..=6 {
        fx.tracker.update(std::slice::from_ref(&cand));
    }
    assert_eq!(fx.tracker.confirmed().len(), 1);

    // Absent exactly external_max_disappeared frames: still confirmed.
    for frame in 1..=10 {
        let confirmed = fx.tracker.update(&[]).to_vec();
        assert_eq!(confirmed.len(), 1, "evicted too early at absence {frame}");
        assert_ne!(confirmed[0].status, TokenStatus::Candidate);
    }

    let confirmed = fx.tracker.update(&[]).to_vec();
    assert!(confirmed.is_empty());
    assert_eq!(fx.remote.removed_ids(), vec![100]);
}

#[test]
fn interrupted_appearance_restarts_the_count() {
    let mut fx = fixture(false);
    let cand = red_square(50, 50);
    for _ in 1..=4 {
        fx.tracker.update(std::slice::from_ref(&cand));
    }
    // One missed frame: the appearance streak is gone.
    fx.tracker.update(&[]);

    for frame in 1..=5 {
        let confirmed = fx.tracker.update(std::slice::from_ref(&cand)).to_vec();
        assert!(
            confirmed.is_empty(),
            "confirmed too early at restarted frame {frame}"
        );
    }
    let confirmed = fx.tracker.update(std::slice::from_ref(&cand)).to_vec();
    assert_eq!(confirmed.len(), 1);
}

#[test]
fn detection_jitter_within_the_distance_bound_keeps_a_token_alive() {
    let mut fx = fixture(false);
    for _ in 1..=6 {
        fx.tracker.update(&[red_square(50, 50)]);
    }
    assert_eq!(fx.tracker.confirmed().len(), 1);

    // Jittered detections match the confirmed token, clearing its
    // disappearance ticks and creating no second entity.
    for dx in [-2, 3, -1, 2, 0] {
        let confirmed = fx.tracker.update(&[red_square(50 + dx, 50)]).to_vec();
        assert_eq!(confirmed.len(), 1);
    }
    assert_eq!(fx.remote.create_count(), 1);
}

#[test]
fn external_ids_are_pairwise_distinct() {
    let mut fx = fixture(false);
    let a = red_square(10, 10);
    let b = red_square(80, 80);
    for _ in 1..=6 {
        fx.tracker.update(&[a.clone(), b.clone()]);
    }
    let ids: Vec<u32> = fx
        .tracker
        .confirmed()
        .iter()
        .filter_map(|t| t.id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[test]
fn duplicate_detections_collapse_into_one_token() {
    let mut fx = fixture(false);
    let cand = red_square(50, 50);
    let dup = red_square(51, 50);
    for _ in 1..=6 {
        fx.tracker.update(&[cand.clone(), dup.clone()]);
    }
    assert_eq!(fx.tracker.confirmed().len(), 1);
    assert_eq!(fx.remote.create_count(), 1);
}

#[test]
fn map_extent_change_ghosts_external_tokens() {
    let mut fx = fixture(false);
    let cand = red_square(10, 20);
    for _ in 1..=6 {
        fx.tracker.update(std::slice::from_ref(&cand));
    }
    assert_eq!(fx.tracker.confirmed()[0].status, TokenStatus::External);

    fx.spaces.set_map(identity_extent());
    fx.tracker.update(&[]);

    let ghosts = fx.tracker.virtual_tokens();
    assert_eq!(ghosts.len(), 1);
    assert_eq!(ghosts[0].status, TokenStatus::Outdated);
    assert_eq!(ghosts[0].world, Some(Point2::new(10.0, 20.0)));
    assert_eq!(fx.tracker.confirmed()[0].status, TokenStatus::Outdated);
}

#[test]
fn physical_token_stands_in_for_a_virtual_entity() {
    let mut fx = fixture(false);
    let mut known = red_square(30, 30);
    known.status = TokenStatus::External;
    known.id = Some(7);
    known.world = Some(Point2::new(30.0, 30.0));
    fx.tracker.place_virtual(known);

    let cand = red_square(30, 30);
    for _ in 1..=6 {
        fx.tracker.update(std::slice::from_ref(&cand));
    }

    assert!(fx.tracker.virtual_tokens().is_empty());
    let confirmed = fx.tracker.confirmed();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].status, TokenStatus::Outdated);
    assert_eq!(confirmed[0].id, Some(7));
    // Standing in is not a fresh registration.
    assert_eq!(fx.remote.create_count(), 0);
}

#[test]
fn hidden_ui_control_outdates_its_token_and_prunes_virtuals() {
    let mut fx = fixture(true);
    let cand = red_square(20, 20);
    for _ in 1..=4 {
        fx.tracker.update(std::slice::from_ref(&cand));
    }
    assert_eq!(fx.tracker.confirmed()[0].status, TokenStatus::Internal);

    let mut widget = red_square(60, 60);
    widget.status = TokenStatus::Internal;
    fx.tracker.place_virtual(widget);

    // The widget layer hides its controls.
    fx.ui.store(false, Ordering::Relaxed);
    fx.tracker.update(std::slice::from_ref(&cand));

    assert_eq!(fx.tracker.confirmed()[0].status, TokenStatus::Outdated);
    assert!(fx.tracker.virtual_tokens().is_empty());
}

#[test]
fn failed_create_outdates_the_token_without_an_id() {
    let fx = fixture(false);
    fx.remote.fail_create.store(true, Ordering::Relaxed);
    let mut tracker = fx.tracker;

    let cand = red_square(50, 50);
    for _ in 1..=6 {
        tracker.update(std::slice::from_ref(&cand));
    }
    let confirmed = tracker.confirmed();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].status, TokenStatus::Outdated);
    assert!(confirmed[0].id.is_none());
    assert_eq!(fx.remote.create_count(), 0);

    // Nothing exists remotely, so eviction must not emit a remove.
    for _ in 0..12 {
        tracker.update(&[]);
    }
    assert!(tracker.confirmed().is_empty());
    assert!(fx.remote.removed_ids().is_empty());
}

#[test]
fn reconcile_adopts_unknown_entities_and_drops_stale_ones() {
    let mut fx = fixture(false);
    let listing = vec![RemoteToken {
        remote_id: 9,
        world: Point2::new(40.0, 40.0),
        shape: TokenShape::Rectangle,
        color: TokenColor::Blue,
    }];

    fx.tracker.reconcile(&listing);
    assert_eq!(fx.tracker.virtual_tokens().len(), 1);
    let adopted = &fx.tracker.virtual_tokens()[0];
    assert_eq!(adopted.id, Some(9));
    assert_eq!(adopted.status, TokenStatus::External);
    assert_eq!((adopted.local_x, adopted.local_y), (40, 40));

    // Idempotent: the same listing adds nothing.
    fx.tracker.reconcile(&listing);
    assert_eq!(fx.tracker.virtual_tokens().len(), 1);

    // The authority forgot the entity: the virtual token goes too.
    fx.tracker.reconcile(&[]);
    assert!(fx.tracker.virtual_tokens().is_empty());
}

#[test]
fn reconcile_skips_entities_already_confirmed_locally() {
    let mut fx = fixture(false);
    let cand = red_square(50, 50);
    for _ in 1..=6 {
        fx.tracker.update(std::slice::from_ref(&cand));
    }
    let id = fx.tracker.confirmed()[0].id.expect("external id");

    fx.tracker.reconcile(&[RemoteToken {
        remote_id: id,
        world: Point2::new(50.0, 50.0),
        shape: TokenShape::Square,
        color: TokenColor::Red,
    }]);
    assert!(fx.tracker.virtual_tokens().is_empty());
}

#[test]
fn sync_worker_reconciles_periodically_and_shuts_down() {
    let fx = fixture(false);
    fx.remote.listing.lock().unwrap().push(RemoteToken {
        remote_id: 42,
        world: Point2::new(25.0, 25.0),
        shape: TokenShape::Square,
        color: TokenColor::Green,
    });

    let tracker = Arc::new(Mutex::new(fx.tracker));
    let remote: Arc<dyn RemoteAuthority> = fx.remote.clone();
    let worker = SyncWorker::spawn(Arc::clone(&tracker), remote, Duration::from_millis(10))
        .expect("worker spawns");

    // Give the timer a few periods to fire.
    std::thread::sleep(Duration::from_millis(80));
    worker.shutdown();

    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.virtual_tokens().len(), 1);
    assert_eq!(tracker.virtual_tokens()[0].id, Some(42));
}
