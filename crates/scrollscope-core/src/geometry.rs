//! Geometric primitives used by the tracking engine: Point, Size, Rect, EdgeInsets.

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// An axis-aligned rectangle in viewport coordinates.
///
/// `x`/`y` name the top-left corner; the viewport origin is the top-left of
/// the intersection frame, with `y` growing downward.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width,
            height: self.height,
        }
    }

    /// Grows the rectangle by the given insets (negative insets shrink it).
    ///
    /// Used to apply an observation margin to an intersection frame before
    /// overlap is computed.
    pub fn expand(&self, insets: EdgeInsets) -> Self {
        Self {
            x: self.x - insets.left,
            y: self.y - insets.top,
            width: (self.width + insets.left + insets.right).max(0.0),
            height: (self.height + insets.top + insets.bottom).max(0.0),
        }
    }

    /// Returns the overlapping region of two rectangles, or `None` when they
    /// do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return None;
        }

        Some(Rect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        })
    }

    /// Area of the overlap with `other`, zero when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        self.intersection(other).map_or(0.0, |overlap| overlap.area())
    }

    /// Whether any part of this rectangle lies inside the vertical band
    /// spanned by `other` (top edge above the band's bottom, bottom edge
    /// below the band's top).
    pub fn overlaps_vertical_band(&self, other: &Rect) -> bool {
        self.bottom() > other.y && self.y < other.bottom()
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && y >= self.y && x <= self.right() && y <= self.bottom()
    }
}

/// Margin values for each edge of an intersection frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EdgeInsets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl EdgeInsets {
    pub fn uniform(all: f32) -> Self {
        Self {
            left: all,
            top: all,
            right: all,
            bottom: all,
        }
    }

    pub fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self {
            left: horizontal,
            right: horizontal,
            top: vertical,
            bottom: vertical,
        }
    }

    pub fn vertical(vertical: f32) -> Self {
        Self {
            top: vertical,
            bottom: vertical,
            ..Self::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}
