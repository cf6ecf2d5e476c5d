//! Small stateful components shared across crates.

/// Health pool for a damageable entity or damage region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn percentage(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Countdown for temporary things (pooled effects, decals, projectiles).
///
/// Replaces delayed invocation: the owner advances it every tick and acts once
/// it reports expiry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Lifetime {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    /// Count down by `dt`; returns true once the lifetime has run out.
    pub fn update(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_clamps_to_zero() {
        let mut h = Health::new(50.0);
        h.take_damage(80.0);
        assert_eq!(h.current, 0.0);
        assert!(h.is_dead());
        assert_eq!(h.percentage(), 0.0);
    }

    #[test]
    fn lifetime_expires_at_zero() {
        let mut l = Lifetime::new(1.0);
        assert!(!l.update(0.5));
        assert!(l.update(0.5));
    }
}
