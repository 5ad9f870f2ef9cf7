use std::sync::{Arc, Mutex, PoisonError};

use crate::cache::key::UniqueKey;
use crate::foundation::geom::ISize;
use crate::pixels::info::ColorType;

/// Whether a texture carries a mip chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mipmapped {
    No,
    Yes,
}

/// Whether a texture counts against the context's memory budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Budgeted {
    No,
    Yes,
}

/// Whether a texture is allocated at the requested size or rounded up for
/// pool reuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackingFit {
    Approx,
    Exact,
}

/// Surface coordinate convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceOrigin {
    TopLeft,
    BottomLeft,
}

/// Caller's caching and budget intent for a texture request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TexGenPolicy {
    /// Cacheable under the image's unique key.
    Draw,
    NewUncachedBudgeted,
    NewUncachedUnbudgeted,
}

/// Color type as the GPU sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpuColorType {
    Alpha8,
    Gray8,
    Rgba8888,
    Bgra8888,
}

pub fn to_gpu_color_type(ct: ColorType) -> GpuColorType {
    match ct {
        ColorType::Alpha8 => GpuColorType::Alpha8,
        ColorType::Gray8 => GpuColorType::Gray8,
        ColorType::Rgba8888 => GpuColorType::Rgba8888,
        ColorType::Bgra8888 => GpuColorType::Bgra8888,
    }
}

/// Texel layout of backing storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendFormat {
    R8,
    Rgba8,
    Bgra8,
}

impl BackendFormat {
    pub fn bytes_per_texel(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }
}

/// Channel remapping applied when a view is sampled.
///
/// Each output channel names a source channel (`r`, `g`, `b`, `a`) or a
/// constant (`0`, `1`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Swizzle([u8; 4]);

impl Swizzle {
    pub const RGBA: Swizzle = Swizzle(*b"rgba");
    pub const BGRA: Swizzle = Swizzle(*b"bgra");
    /// Reading alpha-8 data stored in a red-only format.
    pub const RRRR: Swizzle = Swizzle(*b"rrrr");
    pub const A_FROM_R: Swizzle = Swizzle(*b"000r");

    pub fn apply(self, px: [f32; 4]) -> [f32; 4] {
        let pick = |c: u8| match c {
            b'r' => px[0],
            b'g' => px[1],
            b'b' => px[2],
            b'a' => px[3],
            b'1' => 1.0,
            _ => 0.0,
        };
        [
            pick(self.0[0]),
            pick(self.0[1]),
            pick(self.0[2]),
            pick(self.0[3]),
        ]
    }
}

static NEXT_PROXY_ID: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(1);

/// A realized texture: dimensions, format, and (software) texel storage.
///
/// Stands in for a deferred GPU texture handle; texels are written once at
/// creation and immutable afterwards.
#[derive(Debug)]
pub struct TextureProxy {
    id: u32,
    dimensions: ISize,
    format: BackendFormat,
    mipmapped: Mipmapped,
    budgeted: Budgeted,
    fit: BackingFit,
    texels: Vec<u8>,
    unique_key: Mutex<Option<UniqueKey>>,
}

impl TextureProxy {
    pub(crate) fn new(
        dimensions: ISize,
        format: BackendFormat,
        mipmapped: Mipmapped,
        budgeted: Budgeted,
        fit: BackingFit,
        texels: Vec<u8>,
    ) -> Arc<Self> {
        debug_assert_eq!(
            texels.len(),
            dimensions.width.max(0) as usize
                * dimensions.height.max(0) as usize
                * format.bytes_per_texel()
        );
        Arc::new(Self {
            id: NEXT_PROXY_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
            dimensions,
            format,
            mipmapped,
            budgeted,
            fit,
            texels,
            unique_key: Mutex::new(None),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn dimensions(&self) -> ISize {
        self.dimensions
    }

    /// Allocated dimensions: approximate-fit textures round up to the pool
    /// granularity, exact-fit textures match the requested size.
    pub fn backing_dimensions(&self) -> ISize {
        match self.fit {
            BackingFit::Exact => self.dimensions,
            BackingFit::Approx => ISize::new(
                round_up_pool(self.dimensions.width),
                round_up_pool(self.dimensions.height),
            ),
        }
    }

    pub fn format(&self) -> BackendFormat {
        self.format
    }

    pub fn mipmapped(&self) -> Mipmapped {
        self.mipmapped
    }

    pub fn budgeted(&self) -> Budgeted {
        self.budgeted
    }

    pub fn fit(&self) -> BackingFit {
        self.fit
    }

    pub(crate) fn texels(&self) -> &[u8] {
        &self.texels
    }

    pub(crate) fn unique_key(&self) -> Option<UniqueKey> {
        *self
            .unique_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_unique_key(&self, key: Option<UniqueKey>) {
        *self
            .unique_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = key;
    }

    /// Nearest-sampled texel as normalized RGBA. Single-channel formats
    /// broadcast their value.
    pub(crate) fn texel(&self, x: i32, y: i32) -> [f32; 4] {
        let w = self.dimensions.width;
        let h = self.dimensions.height;
        let x = x.clamp(0, w - 1) as usize;
        let y = y.clamp(0, h - 1) as usize;
        let bpt = self.format.bytes_per_texel();
        let at = (y * w as usize + x) * bpt;
        let norm = |b: u8| f32::from(b) / 255.0;
        match self.format {
            BackendFormat::R8 => {
                let v = norm(self.texels[at]);
                [v, v, v, v]
            }
            BackendFormat::Rgba8 => [
                norm(self.texels[at]),
                norm(self.texels[at + 1]),
                norm(self.texels[at + 2]),
                norm(self.texels[at + 3]),
            ],
            BackendFormat::Bgra8 => [
                norm(self.texels[at + 2]),
                norm(self.texels[at + 1]),
                norm(self.texels[at]),
                norm(self.texels[at + 3]),
            ],
        }
    }
}

fn round_up_pool(v: i32) -> i32 {
    // Pool granularity of 16 keeps approximate-fit textures reusable.
    (v.max(1) + 15) / 16 * 16
}

/// A texture proxy plus origin and swizzle metadata.
#[derive(Clone, Debug)]
pub struct TextureView {
    proxy: Arc<TextureProxy>,
    origin: SurfaceOrigin,
    swizzle: Swizzle,
}

impl TextureView {
    pub fn new(proxy: Arc<TextureProxy>, origin: SurfaceOrigin, swizzle: Swizzle) -> Self {
        Self {
            proxy,
            origin,
            swizzle,
        }
    }

    pub fn proxy(&self) -> &Arc<TextureProxy> {
        &self.proxy
    }

    pub fn origin(&self) -> SurfaceOrigin {
        self.origin
    }

    pub fn swizzle(&self) -> Swizzle {
        self.swizzle
    }

    pub fn dimensions(&self) -> ISize {
        self.proxy.dimensions()
    }

    pub fn mipmapped(&self) -> Mipmapped {
        self.proxy.mipmapped()
    }
}
