//! Activity window capture.
//!
//! Launches Packet Tracer per activity file and grabs the configured
//! screen zone once it has finished rendering.

pub mod launcher;
pub mod screen;

pub use launcher::{capture_all, find_packet_tracer};
pub use screen::capture_zone;
