use geo::{coord, Rect};

/// Grows 2-dimensional extents
///
/// # Examples
///
/// ```rust
/// use geo::{coord, Rect};
/// use geoextent_core::util::extend_rect::ExtendRect;
///
/// let mut extent = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 });
///
/// extent.extend_point(12.5, -3.0);
/// assert_eq!(extent.min(), coord! { x: 0.0, y: -3.0 });
/// assert_eq!(extent.max(), coord! { x: 12.5, y: 10.0 });
///
/// extent.extend_rect(&Rect::new(coord! { x: -1.0, y: 4.0 }, coord! { x: 2.0, y: 20.0 }));
/// assert_eq!(extent.min(), coord! { x: -1.0, y: -3.0 });
/// assert_eq!(extent.max(), coord! { x: 12.5, y: 20.0 });
/// ```
///
/// An `Option<Rect>` is an extent that may still be empty. It becomes a
/// degenerate rectangle when the first point is added.
///
/// ```rust
/// use geo::{coord, Rect};
/// use geoextent_core::util::extend_rect::ExtendRect;
///
/// let mut extent: Option<Rect> = None;
/// extent.extend_point(3.0, 4.0);
/// assert_eq!(extent, Some(Rect::new(coord! { x: 3.0, y: 4.0 }, coord! { x: 3.0, y: 4.0 })));
///
/// extent.extend_rect(&Rect::new(coord! { x: 5.0, y: 1.0 }, coord! { x: 6.0, y: 2.0 }));
/// assert_eq!(extent, Some(Rect::new(coord! { x: 3.0, y: 1.0 }, coord! { x: 6.0, y: 4.0 })));
/// ```
pub trait ExtendRect {
    /// Extends the extent so it covers the given point
    fn extend_point(&mut self, x: f64, y: f64);

    /// Extends the extent so it covers the given rectangle
    fn extend_rect(&mut self, other: &Rect);
}

impl ExtendRect for Rect {
    fn extend_point(&mut self, x: f64, y: f64) {
        let (min, max) = (self.min(), self.max());
        self.set_min((min.x.min(x), min.y.min(y)));
        self.set_max((max.x.max(x), max.y.max(y)));
    }

    fn extend_rect(&mut self, other: &Rect) {
        self.extend_point(other.min().x, other.min().y);
        self.extend_point(other.max().x, other.max().y);
    }
}

impl ExtendRect for Option<Rect> {
    fn extend_point(&mut self, x: f64, y: f64) {
        match self {
            Some(r) => r.extend_point(x, y),
            None => *self = Some(Rect::new(coord! { x: x, y: y }, coord! { x: x, y: y })),
        }
    }

    fn extend_rect(&mut self, other: &Rect) {
        match self {
            Some(r) => r.extend_rect(other),
            None => *self = Some(*other),
        }
    }
}
