use crate::foundation::error::{LumoError, LumoResult};

pub use kurbo::Affine;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ISize {
    pub width: i32,
    pub height: i32,
}

impl ISize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Integer pixel rectangle with exclusive right/bottom edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl IRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> LumoResult<Self> {
        if left > right || top > bottom {
            return Err(LumoError::validation("IRect edges must not be inverted"));
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn from_size(size: ISize) -> Self {
        Self {
            left: 0,
            top: 0,
            right: size.width,
            bottom: size.height,
        }
    }

    pub fn from_xywh(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            left: x,
            top: y,
            right: x.saturating_add(w),
            bottom: y.saturating_add(h),
        }
    }

    pub fn width(self) -> i32 {
        self.right - self.left
    }

    pub fn height(self) -> i32 {
        self.bottom - self.top
    }

    pub fn size(self) -> ISize {
        ISize::new(self.width(), self.height())
    }

    pub fn is_empty(self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    pub fn contains(self, other: IRect) -> bool {
        !other.is_empty()
            && !self.is_empty()
            && self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }
}

/// Orientation baked into encoded data (the eight EXIF orientations).
///
/// `to_matrix` produces the transform that maps decoded plane coordinates to
/// upright destination coordinates, so oriented sources draw upright without
/// the caller re-deriving per-case math.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncodedOrigin {
    #[default]
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    LeftTop,
    RightTop,
    RightBottom,
    LeftBottom,
}

impl EncodedOrigin {
    /// True for the four origins that transpose width and height.
    pub fn swaps_width_height(self) -> bool {
        matches!(
            self,
            Self::LeftTop | Self::RightTop | Self::RightBottom | Self::LeftBottom
        )
    }

    pub fn to_matrix(self, w: i32, h: i32) -> Affine {
        let w = f64::from(w);
        let h = f64::from(h);
        // kurbo coefficient order: [a, b, c, d, e, f] maps
        // (x, y) -> (a*x + c*y + e, b*x + d*y + f).
        match self {
            Self::TopLeft => Affine::IDENTITY,
            Self::TopRight => Affine::new([-1.0, 0.0, 0.0, 1.0, w, 0.0]),
            Self::BottomRight => Affine::new([-1.0, 0.0, 0.0, -1.0, w, h]),
            Self::BottomLeft => Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, h]),
            Self::LeftTop => Affine::new([0.0, 1.0, 1.0, 0.0, 0.0, 0.0]),
            Self::RightTop => Affine::new([0.0, 1.0, -1.0, 0.0, h, 0.0]),
            Self::RightBottom => Affine::new([0.0, -1.0, -1.0, 0.0, h, w]),
            Self::LeftBottom => Affine::new([0.0, -1.0, 1.0, 0.0, 0.0, w]),
        }
    }
}
