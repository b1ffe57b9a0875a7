use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, info, warn};

use tokenboard_core::{
    assign_world, local_from_world, remap_token, TokenKey, TokenStatus, TrackedToken,
};

use crate::boundary::{HitTester, RemoteAuthority, RemoteToken};
use crate::params::{TrackerParams, TrackerParamsError};
use crate::spaces::SpaceRegistry;

/// Per-frame token lifecycle tracker.
///
/// All tracking tables are instance fields; independent trackers never
/// share state. When the tracker is shared with the sync worker it
/// lives behind one mutex, and both `update` and `reconcile` run for
/// their whole duration under that lock so the two never interleave
/// partially.
pub struct TokenTracker {
    params: TrackerParams,
    spaces: Arc<SpaceRegistry>,
    remote: Arc<dyn RemoteAuthority>,
    hit: Arc<dyn HitTester>,
    confirmed: Vec<TrackedToken>,
    virtual_tokens: Vec<TrackedToken>,
    appeared: HashMap<TokenKey, u32>,
    disappeared: HashMap<TokenKey, u32>,
    next_id: u32,
}

impl TokenTracker {
    pub fn new(
        params: TrackerParams,
        spaces: Arc<SpaceRegistry>,
        remote: Arc<dyn RemoteAuthority>,
        hit: Arc<dyn HitTester>,
    ) -> Result<Self, TrackerParamsError> {
        params.validate()?;
        Ok(Self {
            params,
            spaces,
            remote,
            hit,
            confirmed: Vec::new(),
            virtual_tokens: Vec::new(),
            appeared: HashMap::new(),
            disappeared: HashMap::new(),
            next_id: 1,
        })
    }

    /// Confirmed tokens as of the last update.
    pub fn confirmed(&self) -> &[TrackedToken] {
        &self.confirmed
    }

    /// Tokens known only from the authority or manual placement.
    pub fn virtual_tokens(&self) -> &[TrackedToken] {
        &self.virtual_tokens
    }

    /// Place a token known without camera evidence (manual override).
    pub fn place_virtual(&mut self, token: TrackedToken) {
        self.virtual_tokens.push(token);
    }

    /// Process one frame of candidate detections.
    ///
    /// The steps run in a fixed order; later steps depend on the
    /// earlier ones having been applied to this frame already.
    pub fn update(&mut self, candidates: &[TrackedToken]) -> &[TrackedToken] {
        let seen = self.track_candidates(candidates);
        self.tick_disappearances(&seen);
        self.evict_disappeared();
        self.mark_ui_flips();
        self.prune_virtual();
        self.promote_candidates();
        self.invalidate_on_map_change();
        &self.confirmed
    }

    /// Step 1a: tick bookkeeping for this frame's candidates. Returns
    /// the keys of confirmed tokens that were seen.
    fn track_candidates(&mut self, candidates: &[TrackedToken]) -> HashSet<TokenKey> {
        // Duplicate detections of one physical token collapse onto the
        // first; the classifier gives no ordering guarantee.
        let mut distinct: Vec<&TrackedToken> = Vec::new();
        for cand in candidates {
            if distinct
                .iter()
                .any(|c| c.matches(cand) || c.is_near(cand, self.params.min_distance))
            {
                continue;
            }
            distinct.push(cand);
        }

        let mut seen = HashSet::new();
        let mut touched: HashSet<TokenKey> = HashSet::new();
        for cand in distinct {
            // A detection at or near a confirmed token is that token.
            if let Some(existing) = self
                .confirmed
                .iter()
                .find(|t| t.matches(cand) || t.is_near(cand, self.params.min_distance))
            {
                let key = existing.key();
                self.disappeared.remove(&key);
                seen.insert(key);
                continue;
            }

            let key = cand.key();
            let nearest = self
                .appeared
                .keys()
                .filter(|k| k.is_near(&key, self.params.min_distance))
                .min_by_key(|k| k.axis_distance(&key))
                .copied();
            match nearest {
                Some(prev) => {
                    // Carry the tick count under the detection's new
                    // position so slow drift keeps accumulating.
                    if let Some(ticks) = self.appeared.remove(&prev) {
                        self.appeared.insert(key, ticks + 1);
                    }
                }
                None => {
                    self.appeared.insert(key, 0);
                }
            }
            touched.insert(key);
        }

        // Appearance requires consecutive sightings; a candidate absent
        // this frame restarts from zero.
        self.appeared.retain(|k, _| touched.contains(k));
        seen
    }

    /// Step 1b: confirmed tokens with no matching candidate this frame
    /// accrue a disappearance tick.
    fn tick_disappearances(&mut self, seen: &HashSet<TokenKey>) {
        for token in &self.confirmed {
            let key = token.key();
            if !seen.contains(&key) {
                *self.disappeared.entry(key).or_insert(0) += 1;
            }
        }
    }

    /// Step 2: evict confirmed tokens absent beyond their
    /// status-specific budget. UI tokens drop fast; geographic tokens
    /// tolerate brief occlusion by hands and tools.
    fn evict_disappeared(&mut self) {
        let disappeared = &self.disappeared;
        let internal_max = self.params.internal_max_disappeared;
        let external_max = self.params.external_max_disappeared;

        let mut evicted: Vec<TrackedToken> = Vec::new();
        self.confirmed.retain(|token| {
            let ticks = disappeared.get(&token.key()).copied().unwrap_or(0);
            let budget = match token.status {
                TokenStatus::Internal => internal_max,
                _ => external_max,
            };
            if ticks > budget {
                evicted.push(token.clone());
                false
            } else {
                true
            }
        });

        for token in evicted {
            self.disappeared.remove(&token.key());
            info!(
                "token at ({}, {}) evicted after prolonged absence",
                token.local_x, token.local_y
            );
            if token.status == TokenStatus::External {
                if let Some(id) = token.id {
                    match self.remote.remove(id) {
                        Ok(()) => debug!("remote token {id} removed"),
                        // The stale id resurfaces in the next list_all
                        // and reconciliation prunes it there.
                        Err(err) => warn!("remote remove of {id} failed: {err}"),
                    }
                }
            }
        }
    }

    /// Step 3: a confirmed token whose UI-region containment no longer
    /// matches its classification is superseded. Handles UI widgets
    /// being shown or hidden mid-session.
    fn mark_ui_flips(&mut self) {
        let board = self.spaces.board();
        let display = self.spaces.display();

        let on_ui: Vec<bool> = self
            .confirmed
            .iter()
            .map(|t| {
                let projected = remap_token(t, board.as_ref(), display.as_ref());
                self.hit.is_on_ui(&projected)
            })
            .collect();

        for (token, on_ui) in self.confirmed.iter_mut().zip(on_ui) {
            let expected = if on_ui {
                TokenStatus::Internal
            } else {
                TokenStatus::External
            };
            if token.status != expected && token.status != TokenStatus::Outdated {
                debug!(
                    "token at ({}, {}) outdated: UI containment flipped",
                    token.local_x, token.local_y
                );
                token.status = TokenStatus::Outdated;
            }
        }
    }

    /// Step 4: drop virtual UI tokens whose control is gone.
    fn prune_virtual(&mut self) {
        let board = self.spaces.board();
        let display = self.spaces.display();
        let hit = &self.hit;
        self.virtual_tokens.retain(|token| {
            if token.status != TokenStatus::Internal {
                return true;
            }
            let projected = remap_token(token, board.as_ref(), display.as_ref());
            hit.is_on_ui(&projected)
        });
    }

    /// Step 5: promote candidates that survived their appearance
    /// threshold.
    fn promote_candidates(&mut self) {
        let board = self.spaces.board();
        let display = self.spaces.display();
        let map = self.spaces.map();

        let entries: Vec<(TokenKey, u32)> =
            self.appeared.iter().map(|(k, &v)| (*k, v)).collect();

        for (key, ticks) in entries {
            let cand = TrackedToken::candidate(key.x, key.y, key.shape, key.color);

            // An entry that meanwhile coincides with a confirmed token
            // is stale bookkeeping, not a new object.
            if self
                .confirmed
                .iter()
                .any(|t| t.key() == key || t.is_near(&cand, self.params.min_distance))
            {
                self.appeared.remove(&key);
                continue;
            }

            let projected = remap_token(&cand, board.as_ref(), display.as_ref());
            let on_ui = self.hit.is_on_ui(&projected);
            let threshold = if on_ui {
                self.params.internal_min_appeared
            } else {
                self.params.external_min_appeared
            };
            if ticks < threshold {
                continue;
            }
            self.appeared.remove(&key);

            assert!(
                cand.id.is_none() && cand.status == TokenStatus::Candidate,
                "promotion input must be an identityless candidate"
            );

            // A physical token landing on a virtual one stands in for
            // an entity that is already known.
            if let Some(pos) = self
                .virtual_tokens
                .iter()
                .position(|v| v.is_near(&cand, self.params.min_distance))
            {
                let stood_in = self.virtual_tokens.remove(pos);
                let mut token = cand;
                token.status = TokenStatus::Outdated;
                token.id = stood_in.id;
                token.world = stood_in.world;
                info!(
                    "token at ({}, {}) stands in for known entity {:?}",
                    token.local_x, token.local_y, token.id
                );
                self.confirmed.push(token);
                continue;
            }

            let mut token = cand;
            if on_ui {
                token.status = TokenStatus::Internal;
                info!(
                    "token at ({}, {}) confirmed as UI control",
                    token.local_x, token.local_y
                );
                self.confirmed.push(token);
                continue;
            }

            token.status = TokenStatus::External;
            assign_world(&mut token, board.as_ref(), map.as_ref());
            let Some(world) = token.world else {
                // Without a map extent the token cannot be mirrored;
                // treat it like a failed create.
                warn!(
                    "token at ({}, {}) cannot be geo-located yet; outdated",
                    token.local_x, token.local_y
                );
                token.status = TokenStatus::Outdated;
                self.confirmed.push(token);
                continue;
            };

            let local_id = self.alloc_id();
            token.id = Some(local_id);
            match self.remote.create(token.shape, token.color, world) {
                Ok(remote_id) => {
                    if remote_id != local_id {
                        debug!("authority assigned id {remote_id} (local {local_id})");
                        token.id = Some(remote_id);
                    }
                    info!(
                        "token at ({}, {}) confirmed as external entity {}",
                        token.local_x,
                        token.local_y,
                        remote_id
                    );
                }
                Err(err) => {
                    warn!("remote create failed: {err}; token outdated");
                    token.status = TokenStatus::Outdated;
                    token.id = None;
                }
            }
            self.confirmed.push(token);
        }
    }

    /// Step 6: a map pan or zoom invalidates every geographic token.
    /// The renderer still needs to show where each one used to be, so a
    /// virtual ghost keeps the old world position.
    fn invalidate_on_map_change(&mut self) {
        if !self.spaces.take_map_changed() {
            return;
        }
        let externals = self
            .confirmed
            .iter()
            .filter(|t| t.status == TokenStatus::External)
            .count();
        info!("map extent changed; invalidating {externals} external tokens");
        for token in self.confirmed.iter_mut() {
            if token.status != TokenStatus::External {
                continue;
            }
            let mut ghost = token.clone();
            ghost.status = TokenStatus::Outdated;
            self.virtual_tokens.push(ghost);
            token.status = TokenStatus::Outdated;
        }
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Apply the authority's full object list.
    ///
    /// Idempotent by construction; runs under the same lock as
    /// `update`, so a concurrent promotion can never race it.
    pub fn reconcile(&mut self, remote: &[RemoteToken]) {
        let board = self.spaces.board();
        let map = self.spaces.map();

        let known: HashSet<u32> = self
            .confirmed
            .iter()
            .chain(&self.virtual_tokens)
            .filter_map(|t| t.id)
            .collect();

        for entry in remote {
            if known.contains(&entry.remote_id) {
                continue;
            }
            let (local_x, local_y) =
                local_from_world(entry.world, map.as_ref(), board.as_ref()).unwrap_or((0, 0));
            debug!("adopting remote entity {} as virtual token", entry.remote_id);
            self.virtual_tokens.push(TrackedToken {
                id: Some(entry.remote_id),
                local_x,
                local_y,
                shape: entry.shape,
                color: entry.color,
                status: TokenStatus::External,
                world: Some(entry.world),
            });
        }

        // Virtual externals the authority no longer knows are gone.
        let remote_ids: HashSet<u32> = remote.iter().map(|r| r.remote_id).collect();
        self.virtual_tokens.retain(|token| {
            if token.status != TokenStatus::External {
                return true;
            }
            match token.id {
                Some(id) => remote_ids.contains(&id),
                None => true,
            }
        });
    }
}
