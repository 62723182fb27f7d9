use crate::raster::RasterError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

/// Errors surfaced by the [`crate::app::App`] API. Inpaint failures are
/// reported through status and cycle events instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Raster(#[from] RasterError),
}
