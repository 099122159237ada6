//! Top-level application error.

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::gpu::GpuError;
use crate::sphere::SphereError;

/// Anything that can stop the orrery from starting.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("failed to build sphere mesh: {0}")]
    Sphere(#[from] SphereError),

    #[error("failed to load texture {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orrery::{BodyKind, OrreryError};

    #[test]
    fn config_errors_pass_through() {
        let err: AppError = ConfigError::from(OrreryError::DuplicateBody(BodyKind::Moon)).into();
        assert_eq!(
            err.to_string(),
            "invalid body list: moon is listed more than once"
        );
    }

    #[test]
    fn sphere_errors_convert() {
        let err: AppError = SphereError::InvalidRadius(-1.0).into();
        assert!(matches!(err, AppError::Sphere(_)));
    }
}
