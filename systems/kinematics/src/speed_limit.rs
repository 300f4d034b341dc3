use glam::Vec3;

/// Ticks shorter than this are treated as zero-length and never clamped.
pub const MIN_TICK_SECONDS: f32 = 1e-6;

/// Caps per-tick displacement so instantaneous speed never exceeds the speed of light.
///
/// The intended speed is a finite difference of the motion function between
/// the previous and the current tick. A clamp is applied when that speed
/// exceeds the speed of light, or when a body still catching up with its path
/// would otherwise cover more than `c·dt`. Either way the step starts from
/// the previously committed position and never exceeds `c·dt`. Curved paths
/// are not re-integrated, so a clamped body chases its motion function rather
/// than following it exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedLimiter {
    speed_of_light: f32,
}

/// Result of running a candidate position through the [`SpeedLimiter`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limited {
    /// Position to commit.
    pub position: Vec3,
    /// Speed implied by the motion function over the tick, in units per second.
    pub intended_speed: f32,
    /// Whether the step was capped.
    pub clamped: bool,
}

impl SpeedLimiter {
    /// Creates a limiter for the provided speed of light.
    #[must_use]
    pub const fn new(speed_of_light: f32) -> Self {
        Self { speed_of_light }
    }

    /// Speed ceiling enforced by the limiter.
    #[must_use]
    pub const fn speed_of_light(&self) -> f32 {
        self.speed_of_light
    }

    /// Limits the step from `previous` towards `candidate` over a tick of `dt` seconds.
    ///
    /// `prior_candidate` is the motion function's output one tick earlier.
    /// Zero-length ticks hold the body at `previous`.
    #[must_use]
    pub fn limit(
        &self,
        previous: Vec3,
        candidate: Vec3,
        prior_candidate: Vec3,
        dt: f32,
    ) -> Limited {
        if dt <= MIN_TICK_SECONDS {
            return Limited {
                position: previous,
                intended_speed: 0.0,
                clamped: false,
            };
        }

        let intended_speed = candidate.distance(prior_candidate) / dt;
        let displacement = candidate - previous;
        let distance = displacement.length();
        let reach = self.speed_of_light * dt;
        if intended_speed <= self.speed_of_light && distance <= reach {
            return Limited {
                position: candidate,
                intended_speed,
                clamped: false,
            };
        }

        let position = if distance > reach {
            previous + displacement / distance * reach
        } else {
            candidate
        };
        Limited {
            position,
            intended_speed,
            clamped: true,
        }
    }
}
