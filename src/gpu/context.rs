use std::sync::atomic::{AtomicU32, Ordering};

use crate::gpu::provider::ProxyProvider;
use crate::gpu::texture::{BackendFormat, GpuColorType, Swizzle};
use crate::telemetry::LockTextureStats;

/// Behavior switches for a recording context.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContextOptions {
    /// Skip the GPU YUV conversion stage of the texture cascade.
    pub disable_gpu_yuv_conversion: bool,
}

/// What the backend can do; drives format selection and mipmap fallbacks.
#[derive(Clone, Copy, Debug)]
pub struct Caps {
    pub supports_bgra: bool,
    pub supports_mipmaps: bool,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            supports_bgra: true,
            supports_mipmaps: true,
        }
    }
}

impl Caps {
    /// The backend format textures of this color type are stored in, or
    /// `None` when the backend has no suitable format.
    pub fn default_backend_format(&self, ct: GpuColorType) -> Option<BackendFormat> {
        match ct {
            GpuColorType::Alpha8 | GpuColorType::Gray8 => Some(BackendFormat::R8),
            GpuColorType::Rgba8888 => Some(BackendFormat::Rgba8),
            GpuColorType::Bgra8888 => self.supports_bgra.then_some(BackendFormat::Bgra8),
        }
    }

    /// Channel mapping for reading `ct` content out of `format` storage.
    pub fn read_swizzle(&self, format: BackendFormat, ct: GpuColorType) -> Swizzle {
        match (format, ct) {
            (BackendFormat::R8, GpuColorType::Alpha8) => Swizzle::A_FROM_R,
            (BackendFormat::R8, _) => Swizzle::RRRR,
            (BackendFormat::Bgra8, GpuColorType::Bgra8888) => Swizzle::RGBA,
            (BackendFormat::Bgra8, _) => Swizzle::BGRA,
            (BackendFormat::Rgba8, _) => Swizzle::RGBA,
        }
    }
}

static NEXT_CONTEXT_ID: AtomicU32 = AtomicU32::new(1);

/// One recording stream of GPU work: proxy provider, caps, options, and the
/// texture-lock telemetry for this context.
#[derive(Debug)]
pub struct RecordingContext {
    id: u32,
    options: ContextOptions,
    caps: Caps,
    proxy_provider: ProxyProvider,
    stats: LockTextureStats,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::with_options(ContextOptions::default(), Caps::default())
    }

    pub fn with_options(options: ContextOptions, caps: Caps) -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            options,
            caps,
            proxy_provider: ProxyProvider::default(),
            stats: LockTextureStats::default(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn caps(&self) -> &Caps {
        &self.caps
    }

    pub fn proxy_provider(&self) -> &ProxyProvider {
        &self.proxy_provider
    }

    pub fn stats(&self) -> &LockTextureStats {
        &self.stats
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}
