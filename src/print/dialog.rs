//! Print dialog session: page choice, watermark handling and job lifecycle

use std::fmt::Display;
use std::sync::Arc;

use log::{debug, error, info};

use super::document::DocumentCore;
use super::request::{PrintError, PrintOutcome};
use super::selection::{LayoutMode, PageSelection, PrintMode};
use super::service::{PrintJobHandle, PrintOptions, PrintService};
use super::types::PrintArtifact;
use super::watermark::{WatermarkConfig, is_unset};

/// Destination for finished print artifacts, e.g. a printer spooler or a
/// file writer
pub trait PrintSurface {
    type Error: Display;

    fn print(&mut self, artifacts: &[PrintArtifact]) -> Result<(), Self::Error>;
}

/// Viewer state the dialog reads when it opens
#[derive(Clone, Debug, Default)]
pub struct ViewState {
    /// Current page (1-indexed)
    pub current_page: usize,
    pub layout: LayoutMode,
    pub page_labels: Vec<String>,
}

/// One print dialog bound to a document
pub struct PrintDialog<S: PrintSurface> {
    service: PrintService,
    surface: S,
    options: PrintOptions,
    view: ViewState,
    is_open: bool,
    mode: PrintMode,
    custom_input: String,
    pages_to_print: PageSelection,
    /// Watermark the document had when the dialog opened
    existing_watermark: Option<WatermarkConfig>,
    allow_watermark_settings: bool,
    watermark_option: Option<WatermarkConfig>,
    watermark_modal_visible: bool,
    /// `(completed, total)` while a job runs
    progress: Option<(usize, usize)>,
    job: Option<PrintJobHandle>,
}

impl<S: PrintSurface> PrintDialog<S> {
    pub fn new(core: Arc<dyn DocumentCore>, surface: S, options: PrintOptions) -> Self {
        Self {
            service: PrintService::new(core),
            surface,
            options,
            view: ViewState::default(),
            is_open: false,
            mode: PrintMode::All,
            custom_input: String::new(),
            pages_to_print: PageSelection::default(),
            existing_watermark: None,
            allow_watermark_settings: false,
            watermark_option: None,
            watermark_modal_visible: false,
            progress: None,
            job: None,
        }
    }

    fn core(&self) -> &Arc<dyn DocumentCore> {
        self.service.core()
    }

    pub fn open(&mut self, view: ViewState) {
        if self.is_open {
            return;
        }

        self.view = view;
        self.is_open = true;
        self.recompute();

        self.existing_watermark = self.core().watermark();
        self.allow_watermark_settings = is_unset(self.existing_watermark.as_ref());
        info!(
            "Print dialog opened: {} pages selected, watermark settings {}",
            self.pages_to_print.len(),
            if self.allow_watermark_settings {
                "offered"
            } else {
                "hidden"
            }
        );
    }

    /// Close the dialog and put back the watermark it found on open
    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }

        if let Some(job) = self.job.take() {
            job.cancel();
            let _ = job.wait();
        }

        self.watermark_modal_visible = false;
        self.progress = None;
        self.is_open = false;
        self.core().set_watermark(self.existing_watermark.clone());
        debug!("Print dialog closed, watermark restored");
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    #[must_use]
    pub fn mode(&self) -> PrintMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PrintMode) {
        self.mode = mode;
        self.recompute();
    }

    /// Focusing the custom range field selects custom mode
    pub fn focus_custom_input(&mut self) {
        self.set_mode(PrintMode::Custom);
    }

    pub fn set_custom_input(&mut self, input: &str) {
        self.custom_input = input.to_string();
        self.recompute();
    }

    pub fn set_include_comments(&mut self, include: bool) {
        self.options.include_notes = include;
    }

    #[must_use]
    pub fn include_comments(&self) -> bool {
        self.options.include_notes
    }

    #[must_use]
    pub fn pages_to_print(&self) -> &PageSelection {
        &self.pages_to_print
    }

    #[must_use]
    pub fn allow_watermark_settings(&self) -> bool {
        self.allow_watermark_settings
    }

    #[must_use]
    pub fn existing_watermark(&self) -> Option<&WatermarkConfig> {
        self.existing_watermark.as_ref()
    }

    #[must_use]
    pub fn watermark_option(&self) -> Option<&WatermarkConfig> {
        self.watermark_option.as_ref()
    }

    #[must_use]
    pub fn is_watermark_modal_visible(&self) -> bool {
        self.watermark_modal_visible
    }

    /// Show the watermark settings with a preview on the document
    pub fn show_watermark_modal(&mut self) {
        if !self.allow_watermark_settings {
            return;
        }
        self.watermark_modal_visible = true;
        self.core().set_watermark(Some(WatermarkConfig::preview()));
    }

    pub fn hide_watermark_modal(&mut self) {
        if !self.watermark_modal_visible {
            return;
        }
        self.watermark_modal_visible = false;
        self.core().set_watermark(Some(WatermarkConfig::empty()));
    }

    /// Keep `watermark` for the next print and close the modal
    pub fn submit_watermark(&mut self, watermark: WatermarkConfig) {
        self.watermark_option = Some(watermark);
        self.hide_watermark_modal();
    }

    #[must_use]
    pub fn is_printing(&self) -> bool {
        self.progress.is_some()
    }

    #[must_use]
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.progress
    }

    /// Footer text of the dialog
    #[must_use]
    pub fn progress_text(&self) -> String {
        match self.progress {
            Some((completed, total)) => format!("Processing {completed}/{total}"),
            None => match self.pages_to_print.len() {
                1 => "Total: 1 page".to_string(),
                n => format!("Total: {n} pages"),
            },
        }
    }

    /// Start rendering the selected pages
    pub fn start_print(&mut self) -> Result<(), PrintError> {
        if self.job.is_some() {
            return Err(PrintError::JobInProgress);
        }

        let mut options = self.options.clone();
        options.watermark = if self.allow_watermark_settings {
            self.watermark_option.clone()
        } else {
            self.existing_watermark.clone()
        };

        let job = self
            .service
            .start_print_job(self.pages_to_print.clone(), options)?;
        self.progress = Some((0, job.total()));
        self.job = Some(job);
        Ok(())
    }

    /// Wait for the running job, send its artifacts to the surface and close
    pub fn finish_print(&mut self) -> Result<PrintOutcome, PrintError> {
        let Some(job) = self.job.take() else {
            return Ok(PrintOutcome::Canceled);
        };

        let progress = &mut self.progress;
        let outcome = job.wait_with_progress(|completed, total| {
            *progress = Some((completed, total));
        });

        let artifacts = match outcome {
            Ok(PrintOutcome::Printed(artifacts)) => artifacts,
            Ok(PrintOutcome::Canceled) => {
                self.progress = None;
                return Ok(PrintOutcome::Canceled);
            }
            Err(err) => {
                error!("Print failed: {err}");
                self.progress = None;
                return Err(err);
            }
        };

        if let Err(err) = self.surface.print(&artifacts) {
            self.progress = None;
            return Err(PrintError::Surface(err.to_string()));
        }

        info!("Printed {} artifacts", artifacts.len());
        self.close();
        Ok(PrintOutcome::Printed(artifacts))
    }

    /// Start and finish a print in one call
    pub fn print(&mut self) -> Result<PrintOutcome, PrintError> {
        self.start_print()?;
        self.finish_print()
    }

    /// Abandon the running job; the dialog stays open
    pub fn cancel_print(&mut self) {
        if let Some(job) = self.job.take() {
            job.cancel();
            if let Err(err) = job.wait() {
                debug!("Canceled print ended with {err}");
            }
        }
        self.progress = None;
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn recompute(&mut self) {
        self.pages_to_print = self.service.compute_page_selection(
            self.mode,
            self.view.current_page,
            self.view.layout,
            &self.custom_input,
            &self.view.page_labels,
        );
    }
}

impl<S: PrintSurface> Drop for PrintDialog<S> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print::watermark::DiagonalWatermark;
    use crate::test_utils::MockDocumentCore;

    #[derive(Default)]
    struct Collect {
        printed: Vec<Vec<(usize, bool)>>,
    }

    impl PrintSurface for Collect {
        type Error = String;

        fn print(&mut self, artifacts: &[PrintArtifact]) -> Result<(), String> {
            self.printed.push(
                artifacts
                    .iter()
                    .map(|a| (a.page_number(), a.is_notes()))
                    .collect(),
            );
            Ok(())
        }
    }

    fn dialog(core: &Arc<MockDocumentCore>) -> PrintDialog<Collect> {
        PrintDialog::new(
            Arc::clone(core) as Arc<dyn DocumentCore>,
            Collect::default(),
            PrintOptions::default(),
        )
    }

    fn view(current_page: usize, layout: LayoutMode) -> ViewState {
        ViewState {
            current_page,
            layout,
            page_labels: Vec::new(),
        }
    }

    fn draft() -> WatermarkConfig {
        WatermarkConfig {
            diagonal: Some(DiagonalWatermark {
                font_size: 30.0,
                font_family: "serif".to_string(),
                color: "gray".to_string(),
                opacity: 40,
                text: "DRAFT".to_string(),
            }),
            header: None,
        }
    }

    #[test]
    fn selection_follows_mode_and_custom_input() {
        let core = Arc::new(MockDocumentCore::new(10));
        let mut dialog = dialog(&core);
        dialog.open(view(4, LayoutMode::Facing));
        assert_eq!(dialog.pages_to_print().len(), 10);

        dialog.set_mode(PrintMode::Current);
        assert_eq!(dialog.pages_to_print().pages(), &[3, 4]);

        dialog.set_custom_input("2-4, 7");
        dialog.focus_custom_input();
        assert_eq!(dialog.mode(), PrintMode::Custom);
        assert_eq!(dialog.pages_to_print().pages(), &[2, 3, 4, 7]);
        assert_eq!(dialog.progress_text(), "Total: 4 pages");
    }

    #[test]
    fn existing_watermark_hides_settings_and_is_reapplied() {
        let core = Arc::new(MockDocumentCore::new(2).auto_complete());
        core.set_watermark(Some(draft()));

        let mut dialog = dialog(&core);
        dialog.open(view(1, LayoutMode::Single));
        assert!(!dialog.allow_watermark_settings());

        dialog.show_watermark_modal();
        assert!(!dialog.is_watermark_modal_visible());

        dialog.print().unwrap();
        assert!(!dialog.is_open());
        assert!(core.watermark_history().contains(&Some(draft())));
        assert_eq!(core.watermark(), Some(draft()));
    }

    #[test]
    fn dropping_open_dialog_restores_watermark() {
        let core = Arc::new(MockDocumentCore::new(2));
        core.set_watermark(Some(WatermarkConfig::empty()));
        {
            let mut dialog = dialog(&core);
            dialog.open(view(1, LayoutMode::Single));
            dialog.show_watermark_modal();
            assert_eq!(core.watermark(), Some(WatermarkConfig::preview()));
        }
        assert_eq!(core.watermark(), Some(WatermarkConfig::empty()));

        let mut dialog = dialog(&core);
        dialog.open(view(1, LayoutMode::Single));
        dialog.start_print().unwrap();
        drop(dialog);
        assert_eq!(core.watermark(), Some(WatermarkConfig::empty()));
        assert_eq!(core.pending_count(), 0);
    }

    #[test]
    fn watermark_modal_previews_then_clears() {
        let core = Arc::new(MockDocumentCore::new(1));
        let mut dialog = dialog(&core);
        dialog.open(view(1, LayoutMode::Single));
        assert!(dialog.allow_watermark_settings());

        dialog.show_watermark_modal();
        assert_eq!(core.watermark(), Some(WatermarkConfig::preview()));

        dialog.submit_watermark(draft());
        assert_eq!(core.watermark(), Some(WatermarkConfig::empty()));
        assert_eq!(dialog.watermark_option(), Some(&draft()));

        dialog.close();
        assert_eq!(core.watermark(), None);
    }

    #[test]
    fn print_applies_chosen_watermark_then_restores() {
        let core = Arc::new(MockDocumentCore::new(3).auto_complete());
        let mut dialog = dialog(&core);
        dialog.open(view(1, LayoutMode::Single));
        dialog.submit_watermark(draft());

        let outcome = dialog.print().unwrap();
        assert!(matches!(outcome, PrintOutcome::Printed(ref a) if a.len() == 3));
        assert!(core.watermark_history().contains(&Some(draft())));
        assert_eq!(core.watermark(), None);
        assert_eq!(dialog.surface().printed, vec![vec![(1, false), (2, false), (3, false)]]);
    }

    #[test]
    fn empty_custom_selection_is_refused() {
        let core = Arc::new(MockDocumentCore::new(3));
        let mut dialog = dialog(&core);
        dialog.open(view(1, LayoutMode::Single));
        dialog.focus_custom_input();
        dialog.set_custom_input("9-12");

        assert!(matches!(dialog.print(), Err(PrintError::EmptySelection)));
        assert!(!dialog.is_printing());
        assert!(dialog.is_open());
    }

    #[test]
    fn cancel_keeps_dialog_open_and_resets_progress() {
        let core = Arc::new(MockDocumentCore::new(3));
        let mut dialog = dialog(&core);
        dialog.open(view(1, LayoutMode::Single));

        dialog.start_print().unwrap();
        assert_eq!(dialog.progress_text(), "Processing 0/3");
        assert!(matches!(dialog.start_print(), Err(PrintError::JobInProgress)));

        dialog.cancel_print();
        assert!(!dialog.is_printing());
        assert!(dialog.is_open());
        assert!(dialog.surface().printed.is_empty());
        assert_eq!(dialog.progress_text(), "Total: 3 pages");
    }
}
