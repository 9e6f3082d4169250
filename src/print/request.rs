//! Print job messages, events and errors

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::canvas::Canvas;
use super::document::{CanvasHandle, CoreError};
use super::rotation::Rotation;
use super::types::PrintArtifact;

/// Shared cancellation flag of one print job
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One outstanding rasterization
#[derive(Clone, Debug)]
pub struct RenderRequest {
    /// Position in the page selection
    pub slot: usize,
    /// Page number (1-indexed)
    pub page_number: usize,
    pub rotation: Rotation,
    pub zoom: f32,
    pub handle: CanvasHandle,
}

impl RenderRequest {
    /// Page index (0-indexed)
    #[must_use]
    pub fn page_index(&self) -> usize {
        self.page_number - 1
    }
}

/// Messages processed by the job driver
#[derive(Debug)]
pub(crate) enum JobMessage {
    /// A canvas callback fired for the page at `slot`
    CanvasLoaded {
        slot: usize,
        result: Result<Canvas, CoreError>,
    },

    /// Stop the job
    Cancel,
}

/// Events published by a running print job
#[derive(Debug)]
pub enum PrintEvent {
    /// `completed` of `total` pages are rendered
    Progress { completed: usize, total: usize },

    /// Every page rendered; artifacts are in selection order
    Finished(Vec<PrintArtifact>),

    Canceled,

    Failed(PrintError),
}

impl PrintEvent {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PrintEvent::Progress { .. })
    }
}

/// How a print job ended
#[derive(Debug)]
pub enum PrintOutcome {
    Printed(Vec<PrintArtifact>),
    Canceled,
}

/// Errors from the print pipeline
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("nothing to print: the page selection is empty")]
    EmptySelection,

    #[error("a print job is already in progress")]
    JobInProgress,

    #[error("page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    #[error("rendering page {page} failed: {source}")]
    Render {
        page: usize,
        #[source]
        source: CoreError,
    },

    #[error("drawing annotations on page {page} failed: {source}")]
    Composite {
        page: usize,
        #[source]
        source: CoreError,
    },

    #[error("encoding page {page} failed: {detail}")]
    Encode { page: usize, detail: String },

    #[error("print surface failed: {0}")]
    Surface(String),

    #[error("could not start print job: {0}")]
    Spawn(String),

    #[error("print job stopped unexpectedly")]
    Disconnected,
}
