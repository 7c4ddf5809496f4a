// THEORY:
// `radial_runner` is the application layer around `colony_radial`. The engine
// only sees typed spot and edge tables; everything about folders, TrackMate
// CSV quirks, unit conversions and persisted results lives here.

pub mod discovery;
pub mod loader;
pub mod output;
pub mod summary;
pub mod tracking_pipeline;
