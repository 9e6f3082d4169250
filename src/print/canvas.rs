//! Raster surfaces used while composing print pages

use image::{Rgba, RgbaImage};

/// Element id the widget overlay is known by while attached
pub const WIDGET_CONTAINER_ID: &str = "printWidgetContainer";

/// 2D affine transform in canvas-context order: `[a c e; b d f]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Post-multiply by a translation, like `ctx.translate`
    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.e += self.a * tx + self.c * ty;
        self.f += self.b * tx + self.d * ty;
    }

    /// Post-multiply by a clockwise rotation of `turns` quarter turns.
    /// Quarter turns keep the matrix exact, no trig rounding.
    pub fn rotate_quarter_turns(&mut self, turns: u8) {
        let (cos, sin) = match turns % 4 {
            0 => return,
            1 => (0.0, 1.0),
            2 => (-1.0, 0.0),
            _ => (0.0, -1.0),
        };

        let Self { a, b, c, d, .. } = *self;
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
    }

    #[must_use]
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

/// A rasterized page as returned by the document core
#[derive(Clone, Debug)]
pub struct Canvas {
    pub image: RgbaImage,
    /// Transform later drawing calls are subject to
    pub transform: Transform,
}

impl Canvas {
    #[must_use]
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            transform: Transform::identity(),
        }
    }

    /// Blank white canvas
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 255, 255, 255]),
        ))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Alpha-composite `layer` over this canvas at the origin. Transparent
    /// layer pixels leave the page untouched.
    pub fn overlay(&mut self, layer: &WidgetLayer) {
        image::imageops::overlay(&mut self.image, &layer.image, 0, 0);
    }
}

/// Off-screen transparent surface form widgets are drawn into
#[derive(Clone, Debug)]
pub struct WidgetLayer {
    pub id: &'static str,
    pub image: RgbaImage,
}

impl WidgetLayer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: WIDGET_CONTAINER_ID,
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])),
        }
    }

    /// True when nothing has been drawn into the layer
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|px| px.0[3] == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_then_rotate_maps_origin_to_translation() {
        let mut t = Transform::identity();
        t.translate(100.0, 0.0);
        t.rotate_quarter_turns(1);

        assert_eq!(t.apply(0.0, 0.0), (100.0, 0.0));
        assert_eq!(t.apply(0.0, 50.0), (50.0, 0.0));
        assert_eq!(t.apply(10.0, 0.0), (100.0, 10.0));
    }

    #[test]
    fn four_quarter_turns_is_identity() {
        let mut t = Transform::identity();
        for _ in 0..4 {
            t.rotate_quarter_turns(1);
        }
        assert_eq!(t, Transform::identity());
    }

    #[test]
    fn overlay_keeps_page_under_transparent_pixels() {
        let mut canvas = Canvas::blank(4, 4);
        let mut layer = WidgetLayer::new(4, 4);
        assert!(layer.is_blank());

        layer.image.put_pixel(1, 1, Rgba([255, 0, 0, 255]));
        canvas.overlay(&layer);

        assert_eq!(canvas.image.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.image.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }
}
