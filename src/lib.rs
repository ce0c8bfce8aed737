pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod generator;
pub mod player;
pub mod tts;
pub mod validation;

pub use error::AppError;
