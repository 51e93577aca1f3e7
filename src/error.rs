//! Error types for pmorph.
//!
//! Sampling failures are recoverable: the frame loop logs them and keeps the
//! previous target. GPU, window and configuration failures only occur at
//! startup and propagate out of [`App::run`](crate::app::App::run).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors produced while turning an image into a point cloud.
#[derive(Debug, Error)]
pub enum SampleError {
    /// The image could not be decoded.
    #[error("failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The pixel buffer does not match the declared dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    /// The decode worker did not answer within the configured timeout.
    #[error("sampling '{path}' did not complete within {timeout:?}")]
    Timeout { path: PathBuf, timeout: Duration },
    /// The decode thread could not be started.
    #[error("failed to spawn decode thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors that can occur during GPU initialization and presentation.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found (Vulkan, Metal, DX12 or WebGPU required)")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reported no usable formats.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
}

/// Errors raised while loading a [`SceneConfig`](crate::config::SceneConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The shape list must name at least one image.
    #[error("no shape sources configured")]
    NoShapes,
}

/// Errors that can occur when running the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// The initial shape could not be sampled.
    #[error("initial shape: {0}")]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
