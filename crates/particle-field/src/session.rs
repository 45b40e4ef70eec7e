//! Scene session: the state one experiment window owns between frames
//!
//! The session holds at most one [`ParticleField`]. Regeneration releases the
//! previous field before the next one is allocated, and the host drives the
//! per-frame update through [`SceneSession::tick`].

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use glam::{Quat, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::buffer::ParticleField;
use crate::constants::RESIZE_DEBOUNCE;
use crate::error::{FieldError, FieldResult};
use crate::generator::{GenerationConfig, Viewport};
use crate::params::{AnimationParams, Blending, GalaxyParams, PointStyle, ScreenFieldParams};
use crate::{repulsion, scalar};

/// The experiments a session can run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Experiment {
    #[default]
    Galaxy,
    Animation,
    Field,
}

impl Experiment {
    pub const ALL: [Experiment; 3] = [Experiment::Galaxy, Experiment::Animation, Experiment::Field];

    pub fn name(self) -> &'static str {
        match self {
            Experiment::Galaxy => "galaxy",
            Experiment::Animation => "animation",
            Experiment::Field => "field",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Experiment::Galaxy => "Galaxy Creator",
            Experiment::Animation => "Particle Animations",
            Experiment::Field => "Particle Field",
        }
    }

    /// Galaxy and animation are viewed through an orbiting perspective camera;
    /// the field is drawn in screen space.
    pub fn is_screen_space(self) -> bool {
        matches!(self, Experiment::Field)
    }
}

impl FromStr for Experiment {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "galaxy" | "galaxy-creator" => Ok(Experiment::Galaxy),
            "animation" | "animations" | "particle-animations" => Ok(Experiment::Animation),
            "field" | "particle-field" => Ok(Experiment::Field),
            _ => Err(FieldError::UnknownExperiment(s.to_string())),
        }
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a tick changed, so the renderer uploads only what it must
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameChange {
    Unchanged,
    PositionsUpdated,
    /// A new field was installed; GPU buffers must be recreated
    Rebuilt,
}

/// Trailing-edge debounce for viewport changes. Each `schedule` replaces the
/// pending request, so the last resize wins.
#[derive(Clone, Debug)]
pub struct ResizeDebounce {
    delay: Duration,
    pending: Option<(Viewport, Instant)>,
}

impl ResizeDebounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, viewport: Viewport, now: Instant) {
        self.pending = Some((viewport, now));
    }

    /// Returns the latest viewport once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Viewport> {
        match self.pending {
            Some((viewport, at)) if now.saturating_duration_since(at) >= self.delay => {
                self.pending = None;
                Some(viewport)
            }
            _ => None,
        }
    }
}

impl Default for ResizeDebounce {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE)
    }
}

/// Host-owned state for the running experiment
pub struct SceneSession {
    experiment: Experiment,
    pub galaxy: GalaxyParams,
    pub animation: AnimationParams,
    pub field_params: ScreenFieldParams,
    field: Option<ParticleField>,
    /// Latest pointer in particle space; `None` while outside the window
    pointer: Option<Vec2>,
    viewport: Viewport,
    /// Viewport the installed screen field was laid out for
    field_viewport: Viewport,
    resize: ResizeDebounce,
    rng: StdRng,
    generation: u64,
}

impl SceneSession {
    /// Create a session and build its first field.
    ///
    /// A `seed` makes every generation reproducible; otherwise the RNG is
    /// seeded from the OS.
    pub fn new(experiment: Experiment, viewport: Viewport, seed: Option<u64>) -> FieldResult<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut session = Self {
            experiment,
            galaxy: GalaxyParams::default(),
            animation: AnimationParams::default(),
            field_params: ScreenFieldParams::default(),
            field: None,
            pointer: None,
            viewport,
            field_viewport: viewport,
            resize: ResizeDebounce::default(),
            rng,
            generation: 0,
        };
        session.regenerate()?;
        Ok(session)
    }

    pub fn experiment(&self) -> Experiment {
        self.experiment
    }

    pub fn field(&self) -> Option<&ParticleField> {
        self.field.as_ref()
    }

    pub fn particle_count(&self) -> usize {
        self.field.as_ref().map_or(0, ParticleField::len)
    }

    /// Number of fields built so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.pointer = pointer;
    }

    /// Window pixels (origin top-left, y down) to particle space (origin at
    /// the centre, y up).
    pub fn pointer_from_window(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(
            x - self.viewport.width / 2.0,
            self.viewport.height / 2.0 - y,
        )
    }

    /// Switch experiments; the new experiment's field replaces the old one.
    /// On error the previous experiment stays active.
    pub fn set_experiment(&mut self, experiment: Experiment) -> FieldResult<()> {
        if experiment == self.experiment {
            return Ok(());
        }
        log::info!("switching to {}", experiment.title());
        let previous = std::mem::replace(&mut self.experiment, experiment);
        if let Err(e) = self.regenerate() {
            self.experiment = previous;
            return Err(e);
        }
        self.pointer = None;
        self.resize = ResizeDebounce::default();
        Ok(())
    }

    /// Rebuild the active experiment's field from the current parameters.
    ///
    /// The configuration is validated first; on error the installed field is
    /// kept. Otherwise the old field is released before the new one is
    /// allocated.
    pub fn regenerate(&mut self) -> FieldResult<()> {
        let viewport = self.viewport;
        let config = match self.experiment {
            Experiment::Galaxy => GenerationConfig::Galaxy(&self.galaxy),
            Experiment::Animation => GenerationConfig::Cube(&self.animation.cube),
            Experiment::Field => GenerationConfig::Screen(&self.field_params, viewport),
        };
        config.validate()?;
        if self.experiment == Experiment::Animation {
            self.animation.validate()?;
        }

        if let Some(previous) = self.field.take() {
            log::debug!("releasing field of {} particles", previous.len());
            drop(previous);
        }

        let field = config.generate(&mut self.rng)?;
        self.generation += 1;
        self.field_viewport = viewport;
        log::debug!(
            "{} generation {}: {} particles",
            self.experiment,
            self.generation,
            field.len()
        );
        self.field = Some(field);
        Ok(())
    }

    /// Record a new surface size. The screen field is rebuilt once resizing
    /// has settled; the other experiments only need a new camera aspect.
    pub fn resize(&mut self, viewport: Viewport, now: Instant) {
        self.viewport = viewport;
        if self.experiment.is_screen_space() {
            self.resize.schedule(viewport, now);
        }
    }

    /// Advance one frame.
    ///
    /// `elapsed` is seconds since start; `now` drives the resize debounce.
    /// A failed debounced rebuild is logged and the current field keeps
    /// animating; the next successful regeneration picks up the new viewport.
    pub fn tick(&mut self, elapsed: f32, now: Instant) -> FrameChange {
        let mut rebuilt = false;
        if let Some(viewport) = self.resize.poll(now) {
            if self.experiment.is_screen_space() && viewport != self.field_viewport {
                match self.regenerate() {
                    Ok(()) => rebuilt = true,
                    Err(e) => log::error!("resize rebuild failed, keeping the current field: {e}"),
                }
            }
        }

        let Some(field) = self.field.as_mut() else {
            return FrameChange::Unchanged;
        };

        let moved = match self.experiment {
            Experiment::Galaxy => false,
            Experiment::Animation => {
                scalar::update(
                    &mut field.buffer,
                    &field.base,
                    elapsed,
                    self.animation.function,
                    self.animation.axis,
                );
                true
            }
            Experiment::Field => {
                repulsion::update(
                    &mut field.buffer,
                    &field.base,
                    self.pointer,
                    &self.field_params.repulsion,
                );
                true
            }
        };

        match (rebuilt, moved) {
            (true, _) => FrameChange::Rebuilt,
            (false, true) => FrameChange::PositionsUpdated,
            (false, false) => FrameChange::Unchanged,
        }
    }

    /// Whole-cloud rotation for this frame
    pub fn model_rotation(&self, elapsed: f32) -> Quat {
        match self.experiment {
            Experiment::Galaxy => Quat::from_rotation_y(elapsed * self.galaxy.rotation_speed),
            Experiment::Animation => self.animation.axis.orientation(),
            Experiment::Field => Quat::IDENTITY,
        }
    }

    pub fn point_style(&self) -> PointStyle {
        match self.experiment {
            Experiment::Galaxy => PointStyle {
                size: self.galaxy.size,
                size_attenuation: true,
                blending: Blending::Additive,
                uniform_color: None,
            },
            Experiment::Animation => PointStyle {
                size: self.animation.size,
                size_attenuation: true,
                blending: Blending::Normal,
                uniform_color: self
                    .animation
                    .use_uniform_color
                    .then_some(self.animation.color),
            },
            Experiment::Field => PointStyle {
                size: self.field_params.size,
                size_attenuation: false,
                blending: Blending::Normal,
                uniform_color: None,
            },
        }
    }

    /// Drop the installed field (shutdown).
    pub fn release(&mut self) {
        if self.field.take().is_some() {
            log::debug!("session released");
        }
    }
}
