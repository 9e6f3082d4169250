//! In-memory document core for exercising the print pipeline without a
//! rendering engine

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{TimeZone, Utc};
use image::Rgba;

use crate::print::{
    AnnotRect, Annotation, AnnotationKind, Canvas, CanvasHandle, CanvasRequest, CoreError,
    DocumentCore, DrawComplete, PageInfo, WatermarkConfig, WidgetLayer,
};

/// Pixel the mock paints at the origin of every widget layer it draws into
pub const WIDGET_MARK: Rgba<u8> = Rgba([12, 34, 200, 255]);

/// Small portrait page so mock canvases stay cheap
const DEFAULT_PAGE_SIZE: (f32, f32) = (8.0, 10.0);

struct PendingLoad {
    handle: CanvasHandle,
    request: CanvasRequest,
    draw_complete: DrawComplete,
}

#[derive(Default)]
struct MockState {
    next_handle: u64,
    page_sizes: HashMap<usize, (f32, f32)>,
    rotations: HashMap<usize, (i32, i32)>,
    annotations: Vec<Annotation>,
    watermark: Option<WatermarkConfig>,
    watermark_history: Vec<Option<WatermarkConfig>>,
    multiplier_history: Vec<Option<f32>>,
    pending: Vec<PendingLoad>,
    requests: Vec<CanvasRequest>,
    canceled: Vec<CanvasHandle>,
    failing_pages: HashSet<usize>,
    draw_calls: Vec<(usize, bool)>,
}

/// Scriptable [`DocumentCore`].
///
/// Canvas loads stay pending until the test completes them, unless the mock
/// is built with [`MockDocumentCore::auto_complete`].
pub struct MockDocumentCore {
    total_pages: usize,
    page_size: (f32, f32),
    auto_complete: bool,
    author: Option<String>,
    state: Mutex<MockState>,
}

impl MockDocumentCore {
    pub fn new(total_pages: usize) -> Self {
        Self {
            total_pages,
            page_size: DEFAULT_PAGE_SIZE,
            auto_complete: false,
            author: None,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Complete canvas loads synchronously inside `load_canvas_async`
    pub fn auto_complete(mut self) -> Self {
        self.auto_complete = true;
        self
    }

    /// Size used for pages without an override
    pub fn with_page_size(mut self, width: f32, height: f32) -> Self {
        self.page_size = (width, height);
        self
    }

    /// Name reported by `display_author` for every annotation
    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_page_size(&self, page_number: usize, width: f32, height: f32) {
        self.state().page_sizes.insert(page_number, (width, height));
    }

    /// Set the complete and viewer rotation of a page in quarter turns
    pub fn set_rotation(&self, page_number: usize, complete: i32, viewer: i32) {
        self.state().rotations.insert(page_number, (complete, viewer));
    }

    pub fn add_annotation(&self, annotation: Annotation) {
        self.state().annotations.push(annotation);
    }

    /// Make loads of `page_number` fail, including one already pending
    pub fn fail_page(&self, page_number: usize) {
        let pending = {
            let mut state = self.state();
            state.failing_pages.insert(page_number);
            take_pending(&mut state, |load| load.request.page_index + 1 == page_number)
        };

        for load in pending {
            (load.draw_complete)(Err(CoreError::generic(format!(
                "page {page_number} failed to render"
            ))));
        }
    }

    /// Complete the pending load with `handle`. Returns false when it is not
    /// pending.
    pub fn complete(&self, handle: CanvasHandle) -> bool {
        let pending = take_pending(&mut self.state(), |load| load.handle == handle);
        let found = !pending.is_empty();
        for load in pending {
            self.finish(load);
        }
        found
    }

    /// Complete the pending load of `page_number`
    pub fn complete_page(&self, page_number: usize) -> bool {
        let pending = take_pending(&mut self.state(), |load| {
            load.request.page_index + 1 == page_number
        });
        let found = !pending.is_empty();
        for load in pending {
            self.finish(load);
        }
        found
    }

    /// Complete every pending load in issue order
    pub fn complete_all(&self) {
        let pending = std::mem::take(&mut self.state().pending);
        for load in pending {
            self.finish(load);
        }
    }

    /// Complete every pending load, last issued first
    pub fn complete_all_reversed(&self) {
        let pending = std::mem::take(&mut self.state().pending);
        for load in pending.into_iter().rev() {
            self.finish(load);
        }
    }

    /// Discard every pending load without calling its callback
    pub fn drop_pending(&self) {
        let pending = std::mem::take(&mut self.state().pending);
        drop(pending);
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    /// Handles of the pending loads, in issue order
    pub fn pending_handles(&self) -> Vec<CanvasHandle> {
        self.state().pending.iter().map(|load| load.handle).collect()
    }

    /// Every canvas request seen so far
    pub fn requests(&self) -> Vec<CanvasRequest> {
        self.state().requests.clone()
    }

    pub fn canceled_handles(&self) -> Vec<CanvasHandle> {
        self.state().canceled.clone()
    }

    /// `(page_number, had_widget_layer)` per `draw_annotations` call
    pub fn draw_calls(&self) -> Vec<(usize, bool)> {
        self.state().draw_calls.clone()
    }

    /// Multiplier values set, `None` marking an unset
    pub fn multiplier_history(&self) -> Vec<Option<f32>> {
        self.state().multiplier_history.clone()
    }

    pub fn watermark_history(&self) -> Vec<Option<WatermarkConfig>> {
        self.state().watermark_history.clone()
    }

    fn size_of(&self, page_number: usize) -> (f32, f32) {
        self.state()
            .page_sizes
            .get(&page_number)
            .copied()
            .unwrap_or(self.page_size)
    }

    fn render(&self, request: &CanvasRequest) -> Result<Canvas, CoreError> {
        let page_number = request.page_index + 1;
        if self.state().failing_pages.contains(&page_number) {
            return Err(CoreError::generic(format!(
                "page {page_number} failed to render"
            )));
        }

        let (width, height) = self.size_of(page_number);
        let (width, height) = if request.page_rotation.is_sideways() {
            (height, width)
        } else {
            (width, height)
        };
        let info = PageInfo::new(width * request.zoom, height * request.zoom);
        let (w, h) = info.pixel_size();
        Ok(Canvas::blank(w, h))
    }

    fn finish(&self, load: PendingLoad) {
        let result = self.render(&load.request);
        (load.draw_complete)(result);
    }
}

fn take_pending(
    state: &mut MockState,
    matches: impl Fn(&PendingLoad) -> bool,
) -> Vec<PendingLoad> {
    let (taken, kept) = std::mem::take(&mut state.pending)
        .into_iter()
        .partition(|load| matches(load));
    state.pending = kept;
    taken
}

impl DocumentCore for MockDocumentCore {
    fn total_pages(&self) -> usize {
        self.total_pages
    }

    fn page_info(&self, page_index: usize) -> Result<PageInfo, CoreError> {
        if page_index >= self.total_pages {
            return Err(CoreError::PageOutOfRange(page_index));
        }
        let (width, height) = self.size_of(page_index + 1);
        Ok(PageInfo::new(width, height))
    }

    fn rotation(&self, page_number: usize) -> i32 {
        self.state()
            .rotations
            .get(&page_number)
            .map_or(0, |(_, viewer)| *viewer)
    }

    fn complete_rotation(&self, page_number: usize) -> i32 {
        self.state()
            .rotations
            .get(&page_number)
            .map_or(0, |(complete, _)| *complete)
    }

    fn load_canvas_async(&self, request: CanvasRequest, draw_complete: DrawComplete) -> CanvasHandle {
        let handle = {
            let mut state = self.state();
            state.next_handle += 1;
            state.requests.push(request);
            CanvasHandle::new(state.next_handle)
        };

        if self.auto_complete {
            draw_complete(self.render(&request));
        } else {
            self.state().pending.push(PendingLoad {
                handle,
                request,
                draw_complete,
            });
        }
        handle
    }

    fn cancel_load_canvas(&self, handle: CanvasHandle) {
        let mut state = self.state();
        state.pending.retain(|load| load.handle != handle);
        state.canceled.push(handle);
    }

    fn draw_annotations(
        &self,
        page_number: usize,
        _canvas: &mut Canvas,
        widgets: Option<&mut WidgetLayer>,
    ) -> Result<(), CoreError> {
        self.state()
            .draw_calls
            .push((page_number, widgets.is_some()));

        if let Some(layer) = widgets {
            layer.image.put_pixel(0, 0, WIDGET_MARK);
        }
        Ok(())
    }

    fn annotations(&self) -> Vec<Annotation> {
        self.state().annotations.clone()
    }

    fn watermark(&self) -> Option<WatermarkConfig> {
        self.state().watermark.clone()
    }

    fn set_watermark(&self, watermark: Option<WatermarkConfig>) {
        let mut state = self.state();
        state.watermark_history.push(watermark.clone());
        state.watermark = watermark;
    }

    fn display_author(&self, annotation: &Annotation) -> Option<String> {
        match &self.author {
            Some(author) => Some(author.clone()),
            None => Some(annotation.author.clone()).filter(|a| !a.is_empty()),
        }
    }

    fn set_canvas_multiplier(&self, multiplier: f32) {
        self.state().multiplier_history.push(Some(multiplier));
    }

    fn unset_canvas_multiplier(&self) {
        self.state().multiplier_history.push(None);
    }
}

/// Listable, printable annotation created 2024-03-07 15:04:05 UTC
pub fn mock_annotation(id: &str, page_number: usize, kind: AnnotationKind) -> Annotation {
    Annotation {
        id: id.to_string(),
        page_number,
        kind,
        listable: true,
        printable: true,
        in_reply_to: None,
        author: "Ada".to_string(),
        subject: format!("{kind:?}"),
        contents: Some(format!("contents of {id}")),
        created: Utc
            .with_ymd_and_hms(2024, 3, 7, 15, 4, 5)
            .single()
            .unwrap_or_default(),
        rect: AnnotRect::default(),
        stroke_color: None,
        fill_color: None,
        text_color: None,
        replies: Vec::new(),
    }
}
