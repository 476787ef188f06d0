use crate::models::population::AgentRowMut;
use nalgebra::Vector3;

pub const DEFAULT_SMOOTH_TIME: f64 = 0.5;

/// Turns a desired heading/speed into actual motion.
///
/// The heading eases toward the target with a critically damped spring
/// instead of snapping, then the agent advances along it by `speed * dt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionIntegrator {
    smooth_time: f64,
}

impl Default for MotionIntegrator {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTH_TIME)
    }
}

impl MotionIntegrator {
    pub fn new(smooth_time: f64) -> Self {
        Self { smooth_time }
    }

    pub fn smooth_time(&self) -> f64 { self.smooth_time }
    pub fn set_smooth_time(&mut self, smooth_time: f64) { self.smooth_time = smooth_time; }

    /// Apply one step to an agent row.
    pub fn integrate(
        &self,
        row: AgentRowMut<'_>,
        desired_heading: Vector3<f64>,
        desired_speed: f64,
        dt: f64,
    ) {
        *row.speed = desired_speed;
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }

        let current = *row.heading;
        let target = desired_heading.try_normalize(1.0e-12).unwrap_or(current);
        let damped = smooth_damp(current, target, row.turn_velocity, self.smooth_time, dt);
        let heading = match damped.try_normalize(1.0e-12) {
            Some(h) if h.iter().all(|c| c.is_finite()) => h,
            _ => current,
        };

        *row.heading = heading;
        *row.position += heading * desired_speed * dt;
    }
}

/// Critically damped approach of `current` toward `target`.
///
/// `velocity` carries the damping state between calls. Never overshoots the
/// target.
pub fn smooth_damp(
    current: Vector3<f64>,
    target: Vector3<f64>,
    velocity: &mut Vector3<f64>,
    smooth_time: f64,
    dt: f64,
) -> Vector3<f64> {
    let smooth_time = smooth_time.max(1.0e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * decay;
    let mut output = target + (change + temp) * decay;

    // Clamp to the target if we passed it.
    if (target - current).dot(&(output - target)) > 0.0 {
        output = target;
        *velocity = Vector3::zeros();
    }
    output
}
