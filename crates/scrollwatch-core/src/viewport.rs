//! Viewport geometry helpers
//!
//! Pure functions for "is this element on screen" style checks, meant to be
//! called from notifier subscribers with the host's element and viewport
//! rectangles.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, y grows downwards
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Check if this rect overlaps `other` at any point
    ///
    /// Rects that only share an edge do not overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Overlapping region, or None if the rects don't overlap
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }

        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Same rect moved up by a vertical scroll offset
    pub fn scrolled_by(&self, offset: f64) -> Rect {
        Rect {
            y: self.y - offset,
            ..*self
        }
    }
}

/// Fraction of `element` inside `viewport`, in [0, 1]
///
/// Zero-area elements count as fully visible when they sit inside the viewport.
pub fn visible_ratio(element: &Rect, viewport: &Rect) -> f64 {
    let area = element.area();
    if area == 0.0 {
        let inside = element.x >= viewport.x
            && element.right() <= viewport.right()
            && element.y >= viewport.y
            && element.bottom() <= viewport.bottom();
        return if inside { 1.0 } else { 0.0 };
    }

    element
        .intersection(viewport)
        .map(|overlap| (overlap.area() / area).clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

/// Check visibility against a threshold
///
/// `threshold` 0 means any overlap counts, 1 means fully visible.
pub fn is_in_viewport(element: &Rect, viewport: &Rect, threshold: f64) -> bool {
    let threshold = threshold.clamp(0.0, 1.0);
    let ratio = visible_ratio(element, viewport);
    if threshold == 0.0 {
        ratio > 0.0
    } else {
        ratio >= threshold
    }
}

/// Largest scroll offset for the given content and viewport extents
#[inline]
pub fn max_scroll_offset(content_extent: f64, viewport_extent: f64) -> f64 {
    (content_extent - viewport_extent).max(0.0)
}

/// How far through the content an offset is, clamped to [0, 1]
///
/// Content that fits inside the viewport reports full progress.
pub fn scroll_progress(offset: f64, content_extent: f64, viewport_extent: f64) -> f64 {
    let max = max_scroll_offset(content_extent, viewport_extent);
    if max == 0.0 {
        return 1.0;
    }
    (offset / max).clamp(0.0, 1.0)
}
