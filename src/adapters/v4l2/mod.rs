pub mod capture;
pub mod snapshot;
pub mod video_source;
