//! # Errors
//!
//! Error types for the planet crate. Each concern gets its own enum so that callers can
//! tell a failed texture fetch apart from a failed GPU init or a teardown step that could
//! not run. None of these are fatal to the hosting page: GPU failures degrade to an inert
//! [`Planet`](crate::Planet), texture failures leave a placeholder texture bound, and
//! teardown failures are collected into a [`TeardownReport`](crate::TeardownReport).

/// Errors raised while creating the `wgpu` surface, adapter, or device.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    /// The window or canvas could not be turned into a rendering surface.
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// No adapter is compatible with the surface.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// The adapter refused to hand out a device.
    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Errors raised while loading one of the planet textures.
#[derive(Debug, thiserror::Error)]
pub enum TextureLoadError {
    /// Reading the image file from disk failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP fetch for the image failed or returned a non-success status.
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// The bytes could not be decoded as an image.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    /// The loader went away before it produced a result.
    #[error("texture load for {0} was canceled")]
    Canceled(String),
}

/// Errors collected by [`Planet::destroy`](crate::Planet::destroy).
///
/// Teardown never stops at the first error; every step runs and every failure ends up
/// in the report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TeardownError {
    /// A listener registration was already gone when teardown tried to remove it.
    #[error("{0} listener was not registered")]
    ListenerMissing(&'static str),

    /// The shared planet state was borrowed (teardown called from inside a frame).
    #[error("planet state is busy; {0} skipped")]
    StateBusy(&'static str),

    /// The renderer reported a failure while releasing GPU objects.
    #[error("failed to release {what}: {message}")]
    Release { what: &'static str, message: String },
}

/// Errors raised while loading a [`PlanetConfig`](crate::PlanetConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse config: {0}")]
    Parse(#[source] ron::error::SpannedError),
}
