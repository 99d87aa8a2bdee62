//! Particle field simulator
//!
//! A self-renewing population of short-lived particles drifting over the
//! surface. Each frame ages, moves and bounces every particle, retires the
//! expired ones and tops the population back up.

use crate::color::Rgba;
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::scheduler::FrameSchedule;
use crate::surface::{ensure_usable, Rect, RenderSurface};
use crate::util::Rng;

/// Velocities are in pixels per 1/60 s frame
const FRAME_RATE_SCALE: f32 = 60.0;
/// Velocity kept (and reversed) on hitting an edge
const BOUNCE_DAMPING: f32 = 0.9;
/// Share of `max_particles` seeded by `start()`
const SEED_FRACTION: f32 = 0.3;
/// Population is topped up while below this share of `max_particles`
const REFILL_FRACTION: f32 = 0.8;
const MAX_SPAWN_PER_FRAME: usize = 5;

const CORE_ALPHA: f32 = 0.8;
const HALO_ALPHA: f32 = 0.2;
const HALO_SCALE: f32 = 1.5;
/// Only particles fresher than this get a halo
const HALO_MIN_LIFE: f32 = 0.5;

const OVERLAY_PANEL: Rect = Rect::new(10.0, 10.0, 180.0, 65.0);
const OVERLAY_BACKDROP: Rgba = Rgba::new(0, 0, 0, 0.7);
const OVERLAY_BORDER: Rgba = Rgba::new(120, 200, 255, 0.6);

/// A single particle
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub color: Rgba,
    /// Seconds since spawn
    pub age: f32,
    /// Lifetime in seconds, always > 0
    pub max_age: f32,
    /// 1 at spawn, 0 at retirement
    pub life: f32,
}

impl Particle {
    /// Randomized particle anywhere on a `width` x `height` surface
    pub fn spawn(config: &SimulationConfig, width: f32, height: f32, rng: &mut Rng) -> Self {
        let speed = config.base_speed;
        Self {
            x: rng.range_f32(0.0, width),
            y: rng.range_f32(0.0, height),
            vx: rng.range_f32(-speed, speed),
            vy: rng.range_f32(-speed, speed),
            size: config.particle_size * rng.range_f32(0.8, 1.2),
            color: Rgba::new(
                rng.range_u8(0, 100),
                rng.range_u8(150, 250),
                255,
                rng.range_f32(0.5, 0.8),
            ),
            age: 0.0,
            max_age: config.particle_lifetime_secs * rng.range_f32(0.7, 1.3),
            life: 1.0,
        }
    }

    /// Advance age; returns false once the particle has expired
    #[inline]
    fn age_by(&mut self, dt: f32) -> bool {
        self.age += dt;
        self.life = 1.0 - self.age / self.max_age;
        self.age < self.max_age
    }

    /// Euler step, then reflect off and clamp to the surface edges
    #[inline]
    fn advance(&mut self, dt: f32, width: f32, height: f32) {
        self.x += self.vx * dt * FRAME_RATE_SCALE;
        self.y += self.vy * dt * FRAME_RATE_SCALE;

        if self.x < 0.0 || self.x > width {
            self.vx *= -BOUNCE_DAMPING;
        }
        if self.y < 0.0 || self.y > height {
            self.vy *= -BOUNCE_DAMPING;
        }

        self.x = self.x.clamp(0.0, width);
        self.y = self.y.clamp(0.0, height);
    }
}

/// Particle field manager
pub struct ParticleField<S: RenderSurface> {
    surface: S,
    config: SimulationConfig,
    particles: Vec<Particle>,
    frame_loop: FrameSchedule,
    rng: Rng,
}

impl<S: RenderSurface> ParticleField<S> {
    pub fn new(surface: S, config: SimulationConfig, rng: Rng) -> Result<Self> {
        ensure_usable(&surface)?;
        config.validate()?;
        Ok(Self {
            surface,
            particles: Vec::with_capacity(config.max_particles + MAX_SPAWN_PER_FRAME),
            config,
            frame_loop: FrameSchedule::refresh(),
            rng,
        })
    }

    /// Seed a fresh population and arm the frame loop.
    /// `now` becomes the first frame's baseline. Returns false if already running.
    pub fn start(&mut self, now: Option<f64>) -> bool {
        if self.is_running() {
            log::warn!("Particle field already running");
            return false;
        }

        let seed = (self.config.max_particles as f32 * SEED_FRACTION).ceil() as usize;
        self.particles.clear();
        for _ in 0..seed {
            self.spawn();
        }
        self.frame_loop.start(now);

        log::info!(
            "Particle field started with {} particles on {}x{}",
            self.particles.len(),
            self.surface.width(),
            self.surface.height()
        );
        true
    }

    /// Cancel the frame loop and clear the surface.
    /// The population stays in memory until the next `start()`.
    pub fn stop(&mut self) {
        if self.frame_loop.cancel() {
            log::info!("Particle field stopped ({} particles)", self.particles.len());
        }
        self.surface.clear_all();
    }

    /// Per-frame hook: update then draw when the frame loop is armed
    pub fn frame(&mut self, now: f64) {
        if let Some(dt) = self.frame_loop.poll(now) {
            self.update(dt as f32);
            self.draw();
        }
    }

    /// Age, retire, move and bounce every particle, then top up the population
    pub fn update(&mut self, dt: f32) {
        let (width, height) = (self.surface.width(), self.surface.height());

        self.particles.retain_mut(|p| {
            if !p.age_by(dt) {
                return false;
            }
            p.advance(dt, width, height);
            true
        });

        let target = self.config.max_particles;
        if (self.particles.len() as f32) < target as f32 * REFILL_FRACTION {
            let to_add = MAX_SPAWN_PER_FRAME.min(target - self.particles.len());
            for _ in 0..to_add {
                self.spawn();
            }
        }
    }

    /// Render every particle plus the status overlay
    pub fn draw(&mut self) {
        self.surface.clear_all();

        for p in &self.particles {
            self.surface
                .fill_circle(p.x, p.y, p.size, p.color.with_alpha(p.life * CORE_ALPHA));
            if p.life > HALO_MIN_LIFE {
                self.surface.fill_circle(
                    p.x,
                    p.y,
                    p.size * HALO_SCALE,
                    p.color.with_alpha(p.life * HALO_ALPHA),
                );
            }
        }

        self.draw_stats();
    }

    fn draw_stats(&mut self) {
        let state = if self.is_running() { "RUNNING" } else { "STOPPED" };
        let lines = [
            format!("PARTICLES: {}", self.particles.len()),
            format!("STATE: {}", state),
            format!(
                "CANVAS: {}X{}",
                self.surface.width() as u32,
                self.surface.height() as u32
            ),
        ];

        self.surface.fill_rect(OVERLAY_PANEL, OVERLAY_BACKDROP);
        self.surface.stroke_rect(OVERLAY_PANEL, OVERLAY_BORDER);
        for (i, line) in lines.iter().enumerate() {
            self.surface
                .fill_text(line, 20.0, 30.0 + 20.0 * i as f32, Rgba::WHITE);
        }
    }

    fn spawn(&mut self) {
        let p = Particle::spawn(
            &self.config,
            self.surface.width(),
            self.surface.height(),
            &mut self.rng,
        );
        self.particles.push(p);
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.frame_loop.is_armed()
    }

    pub fn count(&self) -> usize {
        self.particles.len()
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[cfg(test)]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}
