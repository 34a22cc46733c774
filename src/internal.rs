pub mod downloader;
pub mod states;
pub mod transport;
pub mod utils;
