pub mod data_uri;
pub mod detection;
pub mod errors;
pub mod frame;
pub mod model;
pub mod overlay;
pub mod stream;
