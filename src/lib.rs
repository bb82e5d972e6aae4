//! Breathwave - guided 4-6 breathing engine
//!
//! A deterministic phase clock, pure animation curves, and an ambient
//! audio manager that degrades gracefully. Rendering is left to the
//! embedding application; see `session::Frame` for the boundary.

pub mod audio;
pub mod clock;
pub mod curve;
pub mod params;
pub mod session;
