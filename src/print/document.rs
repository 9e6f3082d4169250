//! Document core collaborator
//!
//! The print pipeline never rasterizes or draws annotations itself. Everything
//! page-related goes through a [`DocumentCore`] injected into the service.

use super::annotations::Annotation;
use super::canvas::{Canvas, WidgetLayer};
use super::rotation::Rotation;
use super::watermark::WatermarkConfig;

/// Opaque handle of an in-flight canvas load, assigned by the document core
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CanvasHandle(pub u64);

impl CanvasHandle {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Unrotated page dimensions in page units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageInfo {
    pub width: f32,
    pub height: f32,
}

impl PageInfo {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Pixel size of an overlay covering the whole page
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.width.ceil().max(1.0) as u32,
            self.height.ceil().max(1.0) as u32,
        )
    }
}

/// Parameters of one asynchronous rasterization
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasRequest {
    /// Page index (0-indexed)
    pub page_index: usize,
    pub zoom: f32,
    pub page_rotation: Rotation,
}

/// Completion callback handed to [`DocumentCore::load_canvas_async`]
pub type DrawComplete = Box<dyn FnOnce(Result<Canvas, CoreError>) + Send + 'static>;

/// Errors reported by the document core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("page index {0} is out of range")]
    PageOutOfRange(usize),

    #[error("annotation drawing failed on page {page}: {detail}")]
    Annotations { page: usize, detail: String },

    #[error("{detail}")]
    Generic { detail: String },
}

impl CoreError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Operations the print pipeline needs from the document engine.
///
/// Page numbers are 1-indexed, page indices 0-indexed, matching the engine
/// conventions. Rotations are quarter turns.
pub trait DocumentCore: Send + Sync {
    fn total_pages(&self) -> usize;

    fn page_info(&self, page_index: usize) -> Result<PageInfo, CoreError>;

    /// Rotation applied by the viewer on top of the document
    fn rotation(&self, page_number: usize) -> i32;

    /// Rotation including both the document and the viewer
    fn complete_rotation(&self, page_number: usize) -> i32;

    /// Start rasterizing a page. `draw_complete` may be called from any
    /// thread, including synchronously from inside this call. It is called at
    /// most once. A load ended by [`cancel_load_canvas`](Self::cancel_load_canvas)
    /// may drop it uncalled; a job whose remaining callbacks are all dropped
    /// without a cancel fails with `PrintError::Disconnected`.
    fn load_canvas_async(&self, request: CanvasRequest, draw_complete: DrawComplete)
    -> CanvasHandle;

    /// Best-effort abandon of an in-flight load
    fn cancel_load_canvas(&self, handle: CanvasHandle);

    /// Draw the page annotations onto `canvas`. When `widgets` is given the
    /// form widgets are drawn into that layer instead of being skipped.
    fn draw_annotations(
        &self,
        page_number: usize,
        canvas: &mut Canvas,
        widgets: Option<&mut WidgetLayer>,
    ) -> Result<(), CoreError>;

    fn annotations(&self) -> Vec<Annotation>;

    fn watermark(&self) -> Option<WatermarkConfig>;

    fn set_watermark(&self, watermark: Option<WatermarkConfig>);

    /// Author name as shown in the UI
    fn display_author(&self, annotation: &Annotation) -> Option<String> {
        if annotation.author.is_empty() {
            None
        } else {
            Some(annotation.author.clone())
        }
    }

    fn set_canvas_multiplier(&self, _multiplier: f32) {}

    fn unset_canvas_multiplier(&self) {}
}
