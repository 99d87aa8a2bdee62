//! Host session: owns both subsystems and routes key presses and remote
//! commands to them. Only the active mode's surface is presented.

use crate::config::Mode;
use crate::control::Command;
use crate::field::ParticleField;
use crate::player::{DataOrigin, TrajectoryPlayer};
use crate::surface::RenderSurface;
use crate::trajectory::{TrajectoryRequest, TrajectorySource};

pub struct App<S: RenderSurface> {
    player: TrajectoryPlayer<S>,
    field: ParticleField<S>,
    source: Box<dyn TrajectorySource>,
    request: TrajectoryRequest,
    mode: Mode,
    running: bool,
}

impl<S: RenderSurface> App<S> {
    pub fn new(
        player: TrajectoryPlayer<S>,
        field: ParticleField<S>,
        source: Box<dyn TrajectorySource>,
        request: TrajectoryRequest,
        mode: Mode,
    ) -> Self {
        Self {
            player,
            field,
            source,
            request,
            mode,
            running: true,
        }
    }

    /// Start the field and load then play the trajectory set
    pub fn startup(&mut self, now: f64) {
        self.field.start(Some(now));
        self.load(now);
    }

    /// Issue the request; a remote answer is collected by `frame`
    fn load(&mut self, now: f64) {
        if self.player.load(self.source.as_mut(), &self.request, now) {
            self.loaded(now);
        }
    }

    fn loaded(&mut self, now: f64) {
        self.player.play(now);
        log::info!("{}", self.status());
    }

    pub fn apply(&mut self, command: Command, now: f64) {
        log::debug!("Command {:?}", command);
        match command {
            Command::Start => {
                self.field.start(Some(now));
            },
            Command::Stop => self.field.stop(),
            Command::Play => {
                self.player.play(now);
            },
            Command::Pause => self.player.stop(),
            Command::Seek(index) => self.player.seek(index),
            Command::Load => self.load(now),
            Command::Hide => self.player.hide(),
            Command::Show => self.player.show(),
            Command::Mode(mode) => self.set_mode(mode),
            Command::Extent(extent) => self.player.set_extent(extent),
            Command::Quit => self.running = false,
        }
    }

    /// Space: start/stop the field, or play/pause the trajectories
    pub fn toggle_active(&mut self, now: f64) {
        let command = match self.mode {
            Mode::Field if self.field.is_running() => Command::Stop,
            Mode::Field => Command::Start,
            Mode::Trajectories if self.player.is_playing() => Command::Pause,
            Mode::Trajectories => Command::Play,
        };
        self.apply(command, now);
    }

    /// Left/Right: seek relative to the current index
    pub fn step(&mut self, delta: i64) {
        self.apply(Command::Seek(self.player.current_index() as i64 + delta), 0.0);
    }

    pub fn toggle_visibility(&mut self) {
        let command = if self.player.is_visible() {
            Command::Hide
        } else {
            Command::Show
        };
        self.apply(command, 0.0);
    }

    pub fn toggle_mode(&mut self) {
        let next = match self.mode {
            Mode::Field => Mode::Trajectories,
            Mode::Trajectories => Mode::Field,
        };
        self.set_mode(next);
    }

    pub fn toggle_extent(&mut self) {
        let next = self.player.extent().toggled();
        self.apply(Command::Extent(next), 0.0);
    }

    fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            log::info!("Mode: {:?}", mode);
            self.mode = mode;
        }
    }

    /// Drive both subsystems; each decides whether its schedule fired
    pub fn frame(&mut self, now: f64) {
        if self.player.poll_load(self.source.as_mut(), now) {
            self.loaded(now);
        }
        self.field.frame(now);
        self.player.frame(now);
    }

    /// Surface to present for the active mode
    pub fn active_surface(&self) -> &S {
        match self.mode {
            Mode::Field => self.field.surface(),
            Mode::Trajectories => self.player.surface(),
        }
    }

    /// One-line session summary for logs
    pub fn status(&self) -> String {
        let origin = match self.player.origin() {
            _ if self.player.is_loading() => "loading",
            Some(DataOrigin::Fetched) => "fetched",
            Some(DataOrigin::Synthetic(_)) => "synthetic",
            None => "none",
        };
        format!(
            "mode {:?}, field {} ({} particles), trajectories {:?} ({} {}, index {})",
            self.mode,
            if self.field.is_running() { "running" } else { "stopped" },
            self.field.count(),
            self.player.state(),
            self.player.trajectories().len(),
            origin,
            self.player.current_index()
        )
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn player(&self) -> &TrajectoryPlayer<S> {
        &self.player
    }

    pub fn field(&self) -> &ParticleField<S> {
        &self.field
    }
}
