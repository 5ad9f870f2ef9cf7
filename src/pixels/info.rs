use crate::foundation::error::{LumoError, LumoResult};
use crate::foundation::geom::{IRect, ISize};

/// Pixel memory layout of a single pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorType {
    Alpha8,
    Gray8,
    Rgba8888,
    Bgra8888,
}

impl ColorType {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Alpha8 | Self::Gray8 => 1,
            Self::Rgba8888 | Self::Bgra8888 => 4,
        }
    }
}

/// How the alpha channel relates to the color channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlphaType {
    Opaque,
    Premul,
    Unpremul,
}

/// Color interpretation of the pixel values.
///
/// `Srgb` and `DisplayP3` share the sRGB transfer function and differ in
/// gamut; `LinearSrgb` is the sRGB gamut with a linear transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    Srgb,
    LinearSrgb,
    DisplayP3,
}

/// Dimensions plus pixel interpretation. Two infos are equivalent iff all
/// five fields match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: i32,
    pub height: i32,
    pub color_type: ColorType,
    pub alpha_type: AlphaType,
    pub color_space: Option<ColorSpace>,
}

impl ImageInfo {
    pub fn new(
        width: i32,
        height: i32,
        color_type: ColorType,
        alpha_type: AlphaType,
        color_space: Option<ColorSpace>,
    ) -> Self {
        Self {
            width,
            height,
            color_type,
            alpha_type,
            color_space,
        }
    }

    /// Alpha-8 info used for YUV plane bitmaps.
    pub fn new_a8(width: i32, height: i32) -> Self {
        Self::new(width, height, ColorType::Alpha8, AlphaType::Premul, None)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn dimensions(&self) -> ISize {
        ISize::new(self.width, self.height)
    }

    pub fn bounds(&self) -> IRect {
        IRect::from_size(self.dimensions())
    }

    pub fn with_color_type(&self, color_type: ColorType) -> Self {
        Self { color_type, ..*self }
    }

    pub fn with_color_space(&self, color_space: Option<ColorSpace>) -> Self {
        Self {
            color_space,
            ..*self
        }
    }

    pub fn with_dimensions(&self, size: ISize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            ..*self
        }
    }

    /// Tightly packed row size in bytes.
    pub fn min_row_bytes(&self) -> usize {
        self.width.max(0) as usize * self.color_type.bytes_per_pixel()
    }

    /// Total byte size for the given row stride, validating the stride.
    pub fn compute_byte_size(&self, row_bytes: usize) -> LumoResult<usize> {
        if self.is_empty() {
            return Err(LumoError::validation("image info is empty"));
        }
        if row_bytes < self.min_row_bytes() {
            return Err(LumoError::validation(
                "row_bytes is smaller than a tightly packed row",
            ));
        }
        // The final row only needs the packed width, not the full stride.
        let full_rows = (self.height as usize - 1)
            .checked_mul(row_bytes)
            .ok_or_else(|| LumoError::allocation("pixel byte size overflows"))?;
        full_rows
            .checked_add(self.min_row_bytes())
            .ok_or_else(|| LumoError::allocation("pixel byte size overflows"))
    }
}
