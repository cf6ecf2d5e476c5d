//! Per-tick motion numerics: PID control, input ramping and waypoint
//! motion profiles for moving platforms.
//!
//! Everything here is a pure function of its own state plus the delta time
//! handed in by the caller; nothing reads a global clock.

pub mod curve;
pub mod pid;
pub mod profile;
pub mod ramp;

pub use curve::*;
pub use pid::*;
pub use profile::*;
pub use ramp::*;
