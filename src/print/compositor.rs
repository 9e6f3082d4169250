//! Annotation and form widget compositing onto rendered pages

use log::debug;

use super::annotations::Annotation;
use super::canvas::{Canvas, WidgetLayer};
use super::document::{CoreError, DocumentCore, PageInfo};
use super::rotation::Rotation;

/// Set up the canvas transform so drawing in page coordinates lands upright
/// on a canvas rasterized with the print rotation
pub fn position_canvas(canvas: &mut Canvas, info: PageInfo, document: Rotation) {
    match document {
        Rotation::None => {}
        Rotation::Quarter => canvas.transform.translate(info.width, 0.0),
        Rotation::Half => canvas.transform.translate(info.width, info.height),
        Rotation::ThreeQuarters => canvas.transform.translate(0.0, info.height),
    }

    canvas
        .transform
        .rotate_quarter_turns(document.quarter_turns());
}

#[must_use]
pub fn page_has_widgets(annotations: &[Annotation], page_number: usize) -> bool {
    annotations
        .iter()
        .any(|a| a.page_number == page_number && a.is_widget())
}

/// Draw the page annotations onto `canvas`.
///
/// The base annotation renderer skips form widgets, so pages that have any
/// get a second pass: widgets go into an off-screen transparent layer the
/// size of the page, which is then composited over the canvas and dropped.
pub fn composite(
    core: &dyn DocumentCore,
    canvas: &mut Canvas,
    page_number: usize,
) -> Result<(), CoreError> {
    if !page_has_widgets(&core.annotations(), page_number) {
        return core.draw_annotations(page_number, canvas, None);
    }

    let info = core.page_info(page_number - 1)?;
    let (width, height) = info.pixel_size();
    let mut layer = WidgetLayer::new(width, height);

    core.draw_annotations(page_number, canvas, Some(&mut layer))?;

    debug!(
        "Compositing {} ({width}x{height}) onto page {page_number}",
        layer.id
    );
    canvas.overlay(&layer);

    Ok(())
}
