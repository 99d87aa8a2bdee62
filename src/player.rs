//! Trajectory player
//!
//! Holds a loaded trajectory set and scrubs a shared time index over it,
//! either manually (`seek`) or on a fixed 500 ms ticker (`play`).

use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::projection::{project, Extent};
use crate::scheduler::FrameSchedule;
use crate::surface::{ensure_usable, RenderSurface};
use crate::trajectory::{
    self, Fetch, Trajectory, TrajectoryRequest, TrajectoryResponse, TrajectorySource,
};
use crate::util::Rng;

/// Auto-advance period
pub const TICK_SECONDS: f64 = 0.5;
/// Forecast hours per time step when the request does not say
const DEFAULT_HOURS_PER_STEP: f32 = 24.0;

const MIN_RADIUS: f32 = 2.0;
const MAX_RADIUS: f32 = 5.0;
const RADIUS_PER_SPEED: f32 = 15.0;
const MAX_HUE: f32 = 240.0;
const HUE_PER_SPEED: f32 = 200.0;
const SATURATION: f32 = 1.0;
const LIGHTNESS: f32 = 0.6;
const ALPHA: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Nothing loaded, or hidden
    Idle,
    /// Visible and paused
    Loaded,
    /// Ticker running
    Playing,
}

/// Where the current trajectory set came from
#[derive(Debug, Clone, PartialEq)]
pub enum DataOrigin {
    Fetched,
    /// Fetch failed; the reason is kept for the UI
    Synthetic(String),
}

/// Draw radius for a sample speed
#[inline]
pub fn speed_radius(speed: f32) -> f32 {
    (speed * RADIUS_PER_SPEED).clamp(MIN_RADIUS, MAX_RADIUS)
}

/// Fill colour for a sample speed: slow is blue, fast runs toward red
pub fn speed_color(speed: f32) -> Rgba {
    let hue = (MAX_HUE - speed * HUE_PER_SPEED).clamp(0.0, MAX_HUE);
    Rgba::from_hsla(hue, SATURATION, LIGHTNESS, ALPHA)
}

/// A request still waiting on its answer
#[derive(Debug, Clone, Copy)]
struct PendingLoad {
    deadline: f64,
    wait: f64,
    forecast_hours: Option<f32>,
}

pub struct TrajectoryPlayer<S: RenderSurface> {
    surface: S,
    trajectories: Vec<Trajectory>,
    origin: Option<DataOrigin>,
    current_index: usize,
    hours_per_step: f32,
    extent: Extent,
    ticker: FrameSchedule,
    visible: bool,
    pending: Option<PendingLoad>,
    rng: Rng,
}

impl<S: RenderSurface> TrajectoryPlayer<S> {
    pub fn new(surface: S, extent: Extent, rng: Rng) -> Result<Self> {
        ensure_usable(&surface)?;
        Ok(Self {
            surface,
            trajectories: Vec::new(),
            origin: None,
            current_index: 0,
            hours_per_step: DEFAULT_HOURS_PER_STEP,
            extent,
            ticker: FrameSchedule::interval(TICK_SECONDS),
            visible: false,
            pending: None,
            rng,
        })
    }

    /// Request a trajectory set. Returns true when it was applied on the spot;
    /// a source that answers later is collected by `poll_load`.
    pub fn load(
        &mut self,
        source: &mut dyn TrajectorySource,
        request: &TrajectoryRequest,
        now: f64,
    ) -> bool {
        log::info!(
            "Loading trajectories from {} (date {}, region {}, depth {}, count {})",
            source.describe(),
            request.date,
            request.region,
            request.depth_index,
            request.particle_count
        );

        match source.request(request) {
            Fetch::Ready(result) => {
                self.pending = None;
                self.apply_response(result, request.forecast_hours());
                true
            },
            Fetch::Pending => {
                let wait = source.timeout().as_secs_f64();
                log::debug!("Waiting up to {:.1}s for {}", wait, source.describe());
                self.pending = Some(PendingLoad {
                    deadline: now + wait,
                    wait,
                    forecast_hours: request.forecast_hours(),
                });
                false
            },
        }
    }

    /// Pick up the answer to a pending load, or fall back once its deadline passes.
    /// Returns true on the frame the new set is applied.
    pub fn poll_load(&mut self, source: &mut dyn TrajectorySource, now: f64) -> bool {
        let Some(pending) = self.pending else {
            return false;
        };
        let result = match source.poll() {
            Some(result) => result,
            None if now >= pending.deadline => Err(Error::DataFetch(format!(
                "no response within {:.0}s",
                pending.wait
            ))),
            None => return false,
        };
        self.pending = None;
        self.apply_response(result, pending.forecast_hours);
        true
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Show a fetched set. A failure is logged and replaced by the synthetic set;
    /// it never reaches the caller.
    fn apply_response(&mut self, response: Result<TrajectoryResponse>, forecast_hours: Option<f32>) {
        let (set, origin) = match response.and_then(TrajectoryResponse::into_trajectories) {
            Ok(set) => {
                log::info!("Loaded {} trajectories", set.len());
                (set, DataOrigin::Fetched)
            },
            Err(e) => {
                log::warn!("{}; using synthetic trajectories", e);
                let set = trajectory::synthetic(&mut self.rng);
                log::info!("Generated {} synthetic trajectories", set.len());
                (set, DataOrigin::Synthetic(e.to_string()))
            },
        };

        self.trajectories = set;
        self.origin = Some(origin);

        let steps = self.sample_count().saturating_sub(1).max(1) as f32;
        self.hours_per_step = forecast_hours.map_or(DEFAULT_HOURS_PER_STEP, |h| h / steps);
        self.current_index = self.current_index.min(self.last_index());
        self.visible = true;
        self.render();
    }

    pub fn state(&self) -> PlayerState {
        if self.trajectories.is_empty() || !self.visible {
            PlayerState::Idle
        } else if self.ticker.is_armed() {
            PlayerState::Playing
        } else {
            PlayerState::Loaded
        }
    }

    /// Start auto-advance. Returns false if already playing or nothing is loaded.
    pub fn play(&mut self, now: f64) -> bool {
        if self.trajectories.is_empty() {
            log::warn!("Play requested with no trajectories loaded");
            return false;
        }
        self.visible = true;
        self.ticker.start(Some(now))
    }

    /// Cancel auto-advance; the time index stays where it is
    pub fn stop(&mut self) {
        self.ticker.cancel();
    }

    /// Jump to a time index (clamped) and pause. Drawing the frame makes a
    /// hidden set visible again.
    pub fn seek(&mut self, index: i64) {
        let clamped = index.clamp(0, self.last_index() as i64) as usize;
        if clamped as i64 != index {
            log::debug!("Seek to {} clamped to {}", index, clamped);
        }
        self.current_index = clamped;
        if !self.trajectories.is_empty() {
            self.visible = true;
        }
        self.render();
        self.stop();
    }

    /// Clear the surface and pause, keeping the loaded set
    pub fn hide(&mut self) {
        self.stop();
        self.surface.clear_all();
        self.visible = false;
    }

    /// Show the retained set again at the current index
    pub fn show(&mut self) {
        if self.trajectories.is_empty() {
            return;
        }
        self.visible = true;
        self.render();
    }

    /// Per-frame hook: advance and redraw when the ticker fires
    pub fn frame(&mut self, now: f64) {
        if self.ticker.poll(now).is_some() {
            let n = self.sample_count().max(1);
            self.current_index = (self.current_index + 1) % n;
            self.render();
        }
    }

    pub fn set_extent(&mut self, extent: Extent) {
        self.extent = extent;
        if self.visible {
            self.render();
        }
    }

    /// Redraw at the current index
    pub fn render(&mut self) {
        self.render_at(self.current_index);
    }

    /// Draw every trajectory's sample at `index`; trajectories that end earlier are skipped
    pub fn render_at(&mut self, index: usize) {
        if self.trajectories.is_empty() {
            return;
        }
        self.surface.clear_all();

        let (w, h) = (self.surface.width(), self.surface.height());
        for sample in self.trajectories.iter().filter_map(|t| t.sample(index)) {
            let (x, y) = project(sample.lon, sample.lat, w, h, self.extent);
            self.surface
                .fill_circle(x, y, speed_radius(sample.speed), speed_color(sample.speed));
        }

        let label = self.time_label(index);
        self.surface.fill_text(&label, 10.0, h - 20.0, Rgba::WHITE);
    }

    /// Readout such as `T+48H (2/10)`
    pub fn time_label(&self, index: usize) -> String {
        let hours = (index as f32 * self.hours_per_step).round() as i64;
        format!("T+{}H ({}/{})", hours, index, self.last_index())
    }

    /// N: the longest trajectory's sample count
    pub fn sample_count(&self) -> usize {
        self.trajectories.iter().map(|t| t.points.len()).max().unwrap_or(0)
    }

    fn last_index(&self) -> usize {
        self.sample_count().saturating_sub(1)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }

    pub fn origin(&self) -> Option<&DataOrigin> {
        self.origin.as_ref()
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn is_playing(&self) -> bool {
        self.ticker.is_armed()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use crate::trajectory::{Sample, SYNTHETIC_SAMPLES, SYNTHETIC_TRAJECTORIES};
    use std::time::Duration;

    /// Source that hands out a fixed response
    struct Canned(Option<TrajectoryResponse>);

    impl TrajectorySource for Canned {
        fn request(&mut self, _request: &TrajectoryRequest) -> Fetch {
            Fetch::Ready(
                self.0
                    .clone()
                    .ok_or_else(|| Error::DataFetch("connection refused".to_string())),
            )
        }

        fn describe(&self) -> String {
            "canned".to_string()
        }
    }

    /// Remote-style source: answers after a number of polls, or never
    struct Delayed {
        answer: Option<TrajectoryResponse>,
        polls_left: usize,
    }

    impl TrajectorySource for Delayed {
        fn request(&mut self, _request: &TrajectoryRequest) -> Fetch {
            Fetch::Pending
        }

        fn poll(&mut self) -> Option<Result<TrajectoryResponse>> {
            self.polls_left = self.polls_left.saturating_sub(1);
            if self.polls_left == 0 {
                self.answer.take().map(Ok)
            } else {
                None
            }
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(2)
        }

        fn describe(&self) -> String {
            "delayed".to_string()
        }
    }

    fn line(id: i64, len: usize) -> Trajectory {
        Trajectory {
            id,
            points: (0..len).map(|i| Sample::new(i as f32, 0.0, 0.3)).collect(),
        }
    }

    fn player_with(set: Vec<Trajectory>) -> TrajectoryPlayer<RecordingSurface> {
        let mut player =
            TrajectoryPlayer::new(RecordingSurface::new(720.0, 360.0), Extent::Global, Rng::new(1))
                .unwrap();
        let mut source = Canned(Some(TrajectoryResponse {
            success: true,
            trajectories: set,
            error: None,
        }));
        assert!(player.load(&mut source, &TrajectoryRequest::default(), 0.0));
        player.surface.reset();
        player
    }

    #[test]
    fn test_missing_surface_rejected() {
        let result = TrajectoryPlayer::new(RecordingSurface::new(0.0, 0.0), Extent::Global, Rng::new(1));
        assert!(matches!(result, Err(Error::MissingSurface(_))));
    }

    #[test]
    fn test_failed_fetch_falls_back() {
        let mut player =
            TrajectoryPlayer::new(RecordingSurface::new(640.0, 480.0), Extent::Global, Rng::new(3))
                .unwrap();
        assert_eq!(player.state(), PlayerState::Idle);
        assert!(player.load(&mut Canned(None), &TrajectoryRequest::default(), 0.0));

        assert_eq!(player.state(), PlayerState::Loaded);
        assert!(matches!(player.origin(), Some(DataOrigin::Synthetic(_))));
        assert_eq!(player.trajectories().len(), SYNTHETIC_TRAJECTORIES);
        for t in player.trajectories() {
            assert_eq!(t.points.len(), SYNTHETIC_SAMPLES);
            assert!(t.points.iter().all(|s| s.speed >= 0.2 && s.speed < 0.5));
        }
    }

    #[test]
    fn test_unsuccessful_and_empty_responses_fall_back() {
        for response in [
            TrajectoryResponse {
                success: false,
                trajectories: vec![line(0, 11)],
                error: Some("quota".to_string()),
            },
            TrajectoryResponse {
                success: true,
                trajectories: vec![],
                error: None,
            },
        ] {
            let mut player = TrajectoryPlayer::new(
                RecordingSurface::new(640.0, 480.0),
                Extent::Global,
                Rng::new(8),
            )
            .unwrap();
            player.load(&mut Canned(Some(response)), &TrajectoryRequest::default(), 0.0);
            assert_eq!(player.trajectories().len(), SYNTHETIC_TRAJECTORIES);
        }
    }

    #[test]
    fn test_successful_load_replaces_set() {
        let player = player_with(vec![line(7, 11), line(8, 11)]);
        assert_eq!(player.origin(), Some(&DataOrigin::Fetched));
        assert_eq!(player.trajectories().len(), 2);
        assert_eq!(player.sample_count(), 11);
    }

    #[test]
    fn test_seek_scenario() {
        let mut player = player_with(vec![line(0, 11), line(1, 11), line(2, 4), line(3, 6)]);
        assert!(player.play(0.0));
        player.seek(5);

        assert!(!player.is_playing());
        assert_eq!(player.current_index(), 5);
        let circles = player.surface().circles();
        // Trajectory with 4 samples contributes nothing; 6 samples reaches index 5
        assert_eq!(circles.len(), 3);
        for (x, _, radius, _) in circles {
            assert_eq!(x, (5.0 + 180.0) * 2.0);
            assert_eq!(radius, speed_radius(0.3));
        }
        assert_eq!(player.surface().texts(), vec!["T+120H (5/10)".to_string()]);
    }

    #[test]
    fn test_seek_clamps() {
        let mut player = player_with(vec![line(0, 11)]);
        player.seek(99);
        assert_eq!(player.current_index(), 10);
        player.seek(-4);
        assert_eq!(player.current_index(), 0);
    }

    #[test]
    fn test_play_is_idempotent() {
        let mut player = player_with(vec![line(0, 11)]);
        assert!(player.play(0.0));
        assert!(!player.play(0.2));
        player.frame(0.5);
        assert_eq!(player.current_index(), 1);
        // A second chain would have advanced twice by now
        player.frame(0.7);
        assert_eq!(player.current_index(), 1);
        player.frame(1.0);
        assert_eq!(player.current_index(), 2);
    }

    #[test]
    fn test_ticker_wraps() {
        let mut player = player_with(vec![line(0, 11)]);
        player.seek(10);
        player.play(0.0);
        player.frame(0.5);
        assert_eq!(player.current_index(), 0);
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[test]
    fn test_stop_keeps_index() {
        let mut player = player_with(vec![line(0, 11)]);
        player.play(0.0);
        player.frame(0.5);
        player.frame(1.0);
        player.stop();
        player.frame(1.5);
        player.frame(2.0);
        assert_eq!(player.current_index(), 2);
        assert_eq!(player.state(), PlayerState::Loaded);
    }

    #[test]
    fn test_hide_keeps_set_and_show_replays() {
        let mut player = player_with(vec![line(0, 11), line(1, 11)]);
        player.play(0.0);
        player.hide();

        assert!(!player.is_playing());
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.surface().clear_count(), 1);
        assert!(player.surface().circles().is_empty());
        assert_eq!(player.trajectories().len(), 2);

        player.show();
        assert_eq!(player.state(), PlayerState::Loaded);
        assert_eq!(player.surface().circles().len(), 2);
    }

    #[test]
    fn test_seek_after_hide_shows_the_frame() {
        let mut player = player_with(vec![line(0, 11), line(1, 11)]);
        player.hide();
        player.seek(3);

        assert!(player.is_visible());
        assert_eq!(player.state(), PlayerState::Loaded);
        assert_eq!(player.surface().circles().len(), 2);
        assert_eq!(player.time_label(player.current_index()), "T+72H (3/10)");
    }

    #[test]
    fn test_pending_load_is_collected_later() {
        let mut player =
            TrajectoryPlayer::new(RecordingSurface::new(720.0, 360.0), Extent::Global, Rng::new(4))
                .unwrap();
        let mut source = Delayed {
            answer: Some(TrajectoryResponse {
                success: true,
                trajectories: vec![line(5, 11)],
                error: None,
            }),
            polls_left: 2,
        };
        assert!(!player.load(&mut source, &TrajectoryRequest::default(), 0.0));
        assert!(player.is_loading());
        assert_eq!(player.state(), PlayerState::Idle);

        assert!(!player.poll_load(&mut source, 0.1));
        assert!(player.poll_load(&mut source, 0.2));
        assert!(!player.is_loading());
        assert_eq!(player.origin(), Some(&DataOrigin::Fetched));
        assert_eq!(player.trajectories()[0].id, 5);
        assert_eq!(player.state(), PlayerState::Loaded);
    }

    #[test]
    fn test_unanswered_load_falls_back_at_deadline() {
        let mut player =
            TrajectoryPlayer::new(RecordingSurface::new(720.0, 360.0), Extent::Global, Rng::new(4))
                .unwrap();
        let mut source = Delayed {
            answer: None,
            polls_left: 0,
        };
        assert!(!player.load(&mut source, &TrajectoryRequest::default(), 1.0));
        assert!(!player.poll_load(&mut source, 2.9));
        assert!(player.trajectories().is_empty());

        assert!(player.poll_load(&mut source, 3.0));
        assert_eq!(player.trajectories().len(), SYNTHETIC_TRAJECTORIES);
        match player.origin() {
            Some(DataOrigin::Synthetic(reason)) => assert!(reason.contains("no response"), "{}", reason),
            other => panic!("expected synthetic set, got {:?}", other),
        }
        assert!(!player.poll_load(&mut source, 4.0));
    }

    #[test]
    fn test_play_without_data_is_refused() {
        let mut player =
            TrajectoryPlayer::new(RecordingSurface::new(100.0, 100.0), Extent::Global, Rng::new(1))
                .unwrap();
        assert!(!player.play(0.0));
        assert_eq!(player.state(), PlayerState::Idle);
    }

    #[test]
    fn test_speed_styling() {
        assert_eq!(speed_radius(0.05), 2.0);
        assert_eq!(speed_radius(0.2), 3.0);
        assert_eq!(speed_radius(1.0), 5.0);
        // hue 240 at rest: hsl(240, 100%, 60%)
        let slow = speed_color(0.0);
        assert_eq!((slow.r, slow.g, slow.b), (51, 51, 255));
        assert_eq!(slow.a, ALPHA);
        // saturates at red
        let fast = speed_color(2.0);
        assert_eq!((fast.r, fast.g, fast.b), (255, 51, 51));
    }

    #[test]
    fn test_regional_extent_rerenders() {
        let mut player = player_with(vec![Trajectory {
            id: 0,
            points: vec![Sample::new(0.0, 0.0, 0.3)],
        }]);
        player.set_extent(Extent::Regional);
        let circles = player.surface().circles();
        assert_eq!((circles[0].0, circles[0].1), (360.0, 180.0));
    }
}
