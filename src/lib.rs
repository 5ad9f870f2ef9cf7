//! Lumo is a lazy image materialization engine: images whose pixels are not
//! resident in memory but are produced on demand by a pluggable generator,
//! with caches interposed so expensive decoding is amortized across uses.
//!
//! # Pipeline overview
//!
//! 1. **Wrap**: a [`Generator`] goes behind a mutex-guarded
//!    [`SharedGenerator`] envelope that many logical images can share.
//! 2. **Derive**: [`make_from_generator`] (and recolorings of the result)
//!    validate an `(ImageInfo, UniqueId)` pair per image view.
//! 3. **Materialize**: accessors consult the caches keyed on the image's
//!    unique id and only fall back to the generator on a miss:
//!    [`LazyImage::read_only_pixels`] for raster,
//!    [`LazyImage::lock_texture_proxy_view`] for the four-stage texture
//!    cascade (cache hit, native, YUV planes, RGBA upload).
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Serial generators**: every generator call happens behind its shared
//!   mutex; identity reads stay off the lock.
//! - **No globals**: caches are passed explicitly via [`Caches`]; GPU state
//!   lives in a [`RecordingContext`].
//! - **Commit-based caching**: decode failures never publish partial state.

#![forbid(unsafe_code)]

mod cache;
mod foundation;
mod generator;
mod gpu;
mod image;
mod pixels;
mod telemetry;
mod yuv;

pub use cache::bitmap::{BitmapCache, BitmapCacheAlloc};
pub use cache::key::{BitmapDesc, UniqueKey};
pub use cache::resource::{CachedData, ResourceCache};
pub use cache::yuv::YuvPlanesCache;
pub use cache::{CacheLimits, Caches};
pub use foundation::error::{LumoError, LumoResult};
pub use foundation::geom::{Affine, EncodedOrigin, IRect, ISize};
pub use foundation::id::UniqueId;
pub use generator::shared::{ScopedGenerator, SharedGenerator};
pub use generator::{EncodedData, Generator};
pub use gpu::context::{Caps, ContextOptions, RecordingContext};
pub use gpu::effects::{color_space_xform, yuv_to_rgb, Filter, FragmentProcessor};
pub use gpu::maker::bitmap_to_texture;
pub use gpu::provider::{InvalidationListener, ProxyProvider};
pub use gpu::surface::{copy_base_to_mipmap, BlendMode, Paint, RenderTargetContext};
pub use gpu::texture::{
    to_gpu_color_type, BackendFormat, BackingFit, Budgeted, GpuColorType, Mipmapped,
    SurfaceOrigin, Swizzle, TexGenPolicy, TextureProxy, TextureView,
};
pub use image::lazy::{make_from_generator, LazyImage};
pub use image::raster::RasterImage;
pub use image::texture::TextureImage;
pub use image::{CachingHint, Image};
pub use pixels::info::{AlphaType, ColorSpace, ColorType, ImageInfo};
pub use pixels::pixmap::{Bitmap, PixmapMut};
pub use telemetry::{LockTexturePath, LockTextureStats};
pub use yuv::{
    plane_offsets, PlaneDim, YuvColorSpace, YuvPlaneIndices, YuvPlanes, YuvPlanesInfo,
    YuvSizeInfo, MAX_PLANES,
};
