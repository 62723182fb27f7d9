pub mod app;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod inpaint;
pub mod logging;
pub mod raster;
pub mod region;
pub mod render;
pub mod status;
pub use error::{AppError, AppResult};
