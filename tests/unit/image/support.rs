//! Programmable generator for image tests: counts entries, tracks peak
//! concurrency, and refuses capabilities on demand.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::foundation::error::{LumoError, LumoResult};
use crate::foundation::id::UniqueId;
use crate::generator::{EncodedData, Generator};
use crate::gpu::context::RecordingContext;
use crate::gpu::maker::bitmap_to_texture;
use crate::gpu::texture::{BackingFit, Mipmapped, TexGenPolicy, TextureView};
use crate::pixels::convert;
use crate::pixels::info::{AlphaType, ColorSpace, ColorType, ImageInfo};
use crate::pixels::pixmap::{Bitmap, PixmapMut};
use crate::yuv::{PlaneDim, YuvColorSpace, YuvPlaneIndices, YuvPlanesInfo, YuvSizeInfo};

#[derive(Debug, Default)]
pub struct Counters {
    pub decode_calls: AtomicU32,
    pub yuv_query_calls: AtomicU32,
    pub yuv_fetch_calls: AtomicU32,
    pub texture_calls: AtomicU32,
    active: AtomicI32,
    pub max_active: AtomicI32,
    /// Color space the generator was most recently asked to paint in.
    pub last_requested_space: Mutex<Option<Option<ColorSpace>>>,
}

impl Counters {
    fn enter(self: &Arc<Self>) -> ProbeGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        ProbeGuard {
            counters: self.clone(),
        }
    }
}

pub struct ProbeGuard {
    counters: Arc<Counters>,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct TestGenerator {
    info: ImageInfo,
    unique_id: UniqueId,
    /// Native pixels, tightly packed RGBA8.
    pattern: Vec<u8>,
    encoded: Option<EncodedData>,
    yuv: Option<(YuvPlanesInfo, Vec<Vec<u8>>)>,
    native_texture: bool,
    raster_failures_left: AtomicU32,
    decode_delay: Option<Duration>,
    counters: Arc<Counters>,
}

impl TestGenerator {
    /// RGBA8 sRGB checkerboard of the given size.
    pub fn checkerboard(width: i32, height: i32) -> Self {
        let info = ImageInfo::new(
            width,
            height,
            ColorType::Rgba8888,
            AlphaType::Premul,
            Some(ColorSpace::Srgb),
        );
        let mut pattern = Vec::with_capacity((width * height * 4).max(0) as usize);
        for y in 0..height {
            for x in 0..width {
                let on = (x + y) % 2 == 0;
                let v = if on { 255 } else { 0 };
                pattern.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Self {
            info,
            unique_id: UniqueId::next(),
            pattern,
            encoded: None,
            yuv: None,
            native_texture: false,
            raster_failures_left: AtomicU32::new(0),
            decode_delay: None,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Zero-sized info; construction from this generator must fail.
    pub fn empty() -> Self {
        let mut generator = Self::checkerboard(1, 1);
        generator.info = ImageInfo::new(
            0,
            0,
            ColorType::Rgba8888,
            AlphaType::Premul,
            Some(ColorSpace::Srgb),
        );
        generator.pattern.clear();
        generator
    }

    pub fn with_encoded(mut self, bytes: Vec<u8>) -> Self {
        self.encoded = Some(Arc::new(bytes));
        self
    }

    /// Planar capability: `planes` bytes must match `size_info` exactly.
    pub fn with_yuv(
        mut self,
        size_info: YuvSizeInfo,
        color_space: YuvColorSpace,
        planes: Vec<Vec<u8>>,
    ) -> Self {
        for (i, plane) in planes.iter().enumerate() {
            assert_eq!(plane.len(), size_info.planes[i].byte_size());
        }
        self.yuv = Some((
            YuvPlanesInfo {
                size_info,
                indices: YuvPlaneIndices::planar(),
                color_space,
            },
            planes,
        ));
        self
    }

    pub fn with_native_texture(mut self) -> Self {
        self.native_texture = true;
        self
    }

    /// Fail the next `n` raster decodes.
    pub fn failing_raster(self, n: u32) -> Self {
        self.raster_failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_decode_delay(mut self, delay: Duration) -> Self {
        self.decode_delay = Some(delay);
        self
    }

    pub fn counters(&self) -> Arc<Counters> {
        self.counters.clone()
    }

    fn native_bitmap(&self) -> Bitmap {
        Bitmap::from_vec(self.info, self.info.min_row_bytes(), self.pattern.clone())
            .expect("pattern matches info")
    }
}

/// Standard 16x16 luma with half-size chroma.
pub fn i420_size_info(width: i32, height: i32) -> YuvSizeInfo {
    YuvSizeInfo {
        planes: [
            PlaneDim::new(width, height, width as usize),
            PlaneDim::new(width / 2, height / 2, (width / 2) as usize),
            PlaneDim::new(width / 2, height / 2, (width / 2) as usize),
            PlaneDim::default(),
        ],
        origin: Default::default(),
    }
}

/// Flat gray planes matching `i420_size_info(width, height)`.
pub fn i420_flat_planes(width: i32, height: i32, luma: u8) -> Vec<Vec<u8>> {
    vec![
        vec![luma; (width * height) as usize],
        vec![128; (width * height / 4) as usize],
        vec![128; (width * height / 4) as usize],
        vec![],
    ]
}

impl Generator for TestGenerator {
    fn info(&self) -> &ImageInfo {
        &self.info
    }

    fn unique_id(&self) -> UniqueId {
        self.unique_id
    }

    fn get_pixels(&mut self, dst: &mut PixmapMut<'_>) -> LumoResult<()> {
        let _probe = self.counters.enter();
        self.counters.decode_calls.fetch_add(1, Ordering::SeqCst);
        *self.counters.last_requested_space.lock().unwrap() = Some(dst.info().color_space);
        if let Some(delay) = self.decode_delay {
            std::thread::sleep(delay);
        }
        if self
            .raster_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(LumoError::decode("injected decode failure"));
        }
        let src = self.native_bitmap();
        convert::copy_pixels(src.info(), src.row_bytes(), src.bytes(), dst, 0, 0)
    }

    fn ref_encoded(&self) -> Option<EncodedData> {
        self.encoded.clone()
    }

    fn query_yuv_planes(&self) -> Option<YuvPlanesInfo> {
        self.counters.yuv_query_calls.fetch_add(1, Ordering::SeqCst);
        self.yuv.as_ref().map(|(info, _)| *info)
    }

    fn get_yuv_planes(
        &mut self,
        info: &YuvSizeInfo,
        _indices: &YuvPlaneIndices,
        planes: [&mut [u8]; 4],
    ) -> LumoResult<()> {
        let _probe = self.counters.enter();
        self.counters.yuv_fetch_calls.fetch_add(1, Ordering::SeqCst);
        let Some((stored_info, stored_planes)) = &self.yuv else {
            return Err(LumoError::decode("no planar representation"));
        };
        assert_eq!(*info, stored_info.size_info);
        for (dst, src) in planes.into_iter().zip(stored_planes) {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    fn generate_texture(
        &mut self,
        ctx: &mut RecordingContext,
        _info: &ImageInfo,
        _origin: (i32, i32),
        mipmapped: Mipmapped,
        policy: TexGenPolicy,
    ) -> Option<TextureView> {
        let _probe = self.counters.enter();
        self.counters.texture_calls.fetch_add(1, Ordering::SeqCst);
        if !self.native_texture {
            return None;
        }
        bitmap_to_texture(
            ctx,
            &self.native_bitmap(),
            BackingFit::Exact,
            policy,
            mipmapped,
        )
    }
}
