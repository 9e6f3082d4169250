//! Print pipeline: page selection, cancelable page rendering and notes pages

mod annotations;
mod canvas;
mod compositor;
mod document;
mod dialog;
mod notes;
mod range;
mod request;
mod rotation;
mod selection;
mod service;
mod sort;
mod state;
mod types;
mod watermark;

pub use annotations::{AnnotRect, Annotation, AnnotationKind, ColorMap, IconColorSource, Rgb};
pub use canvas::{Canvas, Transform, WIDGET_CONTAINER_ID, WidgetLayer};
pub use compositor::{composite, page_has_widgets, position_canvas};
pub use document::{CanvasHandle, CanvasRequest, CoreError, DocumentCore, DrawComplete, PageInfo};
pub use dialog::{PrintDialog, PrintSurface, ViewState};
pub use notes::{NoteBlock, NoteIcon, NoteReply, NotesContext, NotesPage, build_notes_page, printable_annotations};
pub use range::{PageRangeParser, PageRangeToken, parse_page_ranges};
pub use request::{CancelToken, PrintError, PrintEvent, PrintOutcome, RenderRequest};
pub use rotation::{Rotation, document_rotation, print_rotation, resolve_rotation};
pub use selection::{LayoutMode, PageSelection, PrintMode, compute_page_selection, current_pages};
pub use service::{PrintJobHandle, PrintOptions, PrintService};
pub use sort::{NoteSortStrategy, PositionSort, SortStrategies, TimeSort};
pub use state::{Command, Effect, JobPhase, PrintJobState};
pub use types::{PrintArtifact, RenderedPage};
pub use watermark::{DiagonalWatermark, HeaderWatermark, WatermarkConfig, WatermarkGuard};

/// Zoom used for every print rasterization
pub const PRINT_ZOOM: f32 = 1.0;

/// Default canvas multiplier when no print quality is configured
pub const DEFAULT_PRINT_QUALITY: f32 = 1.0;

/// Sort key used when the configured one is unknown
pub const DEFAULT_SORT_STRATEGY: &str = "position";

/// Date layout of note info lines (`D/MM/YYYY h:mm:ss A`)
pub const DEFAULT_NOTE_DATE_FORMAT: &str = "%-d/%m/%Y %-I:%M:%S %p";
