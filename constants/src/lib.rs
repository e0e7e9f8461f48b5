pub mod features;
pub mod handoff;
pub mod render_settings;
