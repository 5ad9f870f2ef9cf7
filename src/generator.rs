pub mod shared;

use std::sync::Arc;

use crate::foundation::error::{LumoError, LumoResult};
use crate::foundation::id::UniqueId;
use crate::gpu::context::RecordingContext;
use crate::gpu::texture::{Mipmapped, TexGenPolicy, TextureView};
use crate::pixels::info::ImageInfo;
use crate::pixels::pixmap::PixmapMut;
use crate::yuv::{YuvPlaneIndices, YuvPlanesInfo, YuvSizeInfo};

/// Original encoded bytes a generator may be wrapping.
pub type EncodedData = Arc<Vec<u8>>;

/// The pluggable pixel producer behind a lazy image.
///
/// A generator is the only source of truth for pixels. It is not required to
/// be thread-safe: every call except the documented-constant `info` and
/// `unique_id` reads happens behind the [`shared::SharedGenerator`] mutex.
///
/// `info` and `unique_id` must stay constant for the generator's lifetime.
pub trait Generator: Send {
    fn info(&self) -> &ImageInfo;

    fn unique_id(&self) -> UniqueId;

    /// Decode into `dst`, converting to the destination's color type and
    /// color space. Failure must leave no partial pixels observable to the
    /// caller's cache (the caches only publish on commit).
    fn get_pixels(&mut self, dst: &mut PixmapMut<'_>) -> LumoResult<()>;

    /// The original encoded bytes, if this generator wraps any.
    fn ref_encoded(&self) -> Option<EncodedData> {
        None
    }

    /// Capability probe: plane dimensions, component mapping, and YUV color
    /// space, or `None` for generators without a planar representation.
    fn query_yuv_planes(&self) -> Option<YuvPlanesInfo> {
        None
    }

    /// Write planar bytes into the caller-supplied plane buffers, whose
    /// sizes follow a prior [`Generator::query_yuv_planes`] answer.
    fn get_yuv_planes(
        &mut self,
        info: &YuvSizeInfo,
        indices: &YuvPlaneIndices,
        planes: [&mut [u8]; 4],
    ) -> LumoResult<()> {
        let _ = (info, indices, planes);
        Err(LumoError::decode("generator has no planar representation"))
    }

    /// Optional native GPU path: produce a texture directly.
    fn generate_texture(
        &mut self,
        ctx: &mut RecordingContext,
        info: &ImageInfo,
        origin: (i32, i32),
        mipmapped: Mipmapped,
        policy: TexGenPolicy,
    ) -> Option<TextureView> {
        let _ = (ctx, info, origin, mipmapped, policy);
        None
    }

    fn is_valid(&self, ctx: Option<&RecordingContext>) -> bool {
        let _ = ctx;
        true
    }
}
