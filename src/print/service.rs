//! Print service - fans page renders out to the document core and joins them
//! back in selection order

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;

use flume::{Receiver, Sender, WeakSender};
use log::{debug, error, info, warn};

use super::canvas::Canvas;
use super::compositor::{composite, position_canvas};
use super::document::{CanvasRequest, CoreError, DocumentCore};
use super::notes::{NotesContext, NotesPage, build_notes_page};
use super::request::{CancelToken, JobMessage, PrintError, PrintEvent, PrintOutcome, RenderRequest};
use super::rotation::{document_rotation, resolve_rotation};
use super::selection::{LayoutMode, PageSelection, PrintMode, compute_page_selection};
use super::state::{Command, Effect, JobPhase, PrintJobState};
use super::types::{PrintArtifact, RenderedPage};
use super::watermark::{WatermarkConfig, WatermarkGuard};
use super::{DEFAULT_PRINT_QUALITY, PRINT_ZOOM};

/// Per-job options
#[derive(Clone)]
pub struct PrintOptions {
    /// Follow each page with its notes page
    pub include_notes: bool,
    /// Canvas multiplier while the job renders
    pub print_quality: f32,
    /// Watermark active for the duration of the job
    pub watermark: Option<WatermarkConfig>,
    pub notes: NotesContext,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            include_notes: false,
            print_quality: DEFAULT_PRINT_QUALITY,
            watermark: None,
            notes: NotesContext::default(),
        }
    }
}

impl PrintOptions {
    /// Options seeded from the user settings
    #[must_use]
    pub fn from_settings() -> Self {
        let mut options = Self {
            include_notes: crate::settings::is_include_comments(),
            print_quality: crate::settings::get_print_quality(),
            watermark: crate::settings::get_default_watermark(),
            notes: NotesContext::default(),
        };
        options.notes.sort_key = crate::settings::get_sort_strategy();
        options.notes.date_format = crate::settings::get_note_date_format();
        options
    }
}

/// Runs print jobs against one document
pub struct PrintService {
    core: Arc<dyn DocumentCore>,
    busy: Arc<AtomicBool>,
    next_job_id: AtomicU64,
}

impl PrintService {
    #[must_use]
    pub fn new(core: Arc<dyn DocumentCore>) -> Self {
        Self {
            core,
            busy: Arc::new(AtomicBool::new(false)),
            next_job_id: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn core(&self) -> &Arc<dyn DocumentCore> {
        &self.core
    }

    /// True while a job is rendering
    #[must_use]
    pub fn is_printing(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Pages a request covers in the current document
    #[must_use]
    pub fn compute_page_selection(
        &self,
        mode: PrintMode,
        current_page: usize,
        layout: LayoutMode,
        custom_input: &str,
        page_labels: &[String],
    ) -> PageSelection {
        compute_page_selection(
            mode,
            current_page,
            layout,
            custom_input,
            page_labels,
            self.core.total_pages(),
        )
    }

    /// Start rendering `selection`. Returns immediately; progress and the
    /// result arrive on the handle's event channel.
    pub fn start_print_job(
        &self,
        selection: PageSelection,
        options: PrintOptions,
    ) -> Result<PrintJobHandle, PrintError> {
        if selection.is_empty() {
            return Err(PrintError::EmptySelection);
        }

        let total_pages = self.core.total_pages();
        if let Some(page) = selection.iter().find(|p| !(1..=total_pages).contains(p)) {
            return Err(PrintError::PageOutOfRange {
                page,
                total: total_pages,
            });
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Print requested while another job is running");
            return Err(PrintError::JobInProgress);
        }
        let busy = BusyFlag(Arc::clone(&self.busy));

        let id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        let total = selection.len();

        // Canvas callbacks and cancel requests share one queue so the driver
        // sees them in arrival order. Once setup is done only the pending
        // callbacks keep it open.
        let (message_tx, message_rx) = flume::unbounded();
        let control = message_tx.downgrade();
        let (event_tx, event_rx) = flume::unbounded();
        let token = CancelToken::new();

        let driver = JobDriver {
            id,
            core: Arc::clone(&self.core),
            selection,
            options,
            token: token.clone(),
            messages: Some(message_tx),
            events: event_tx,
            state: PrintJobState::new(),
            in_flight: HashMap::new(),
            pages: vec![None; total],
            notes: vec![None; total],
            failure: None,
        };

        let thread = std::thread::Builder::new()
            .name(format!("print-job-{id}"))
            .spawn(move || {
                let _busy = busy;
                driver.run(message_rx);
            })
            .map_err(|e| PrintError::Spawn(e.to_string()))?;

        Ok(PrintJobHandle {
            id,
            total,
            events: event_rx,
            control,
            token,
            thread: Some(thread),
        })
    }
}

/// Caller side of a running print job
pub struct PrintJobHandle {
    id: u64,
    total: usize,
    events: Receiver<PrintEvent>,
    control: WeakSender<JobMessage>,
    token: CancelToken,
    thread: Option<JoinHandle<()>>,
}

impl PrintJobHandle {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of pages being rendered
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Progress and terminal events
    #[must_use]
    pub fn events(&self) -> &Receiver<PrintEvent> {
        &self.events
    }

    /// Abandon the job. Pages still loading are canceled at the core and
    /// nothing rendered so far is delivered.
    pub fn cancel(&self) {
        self.token.cancel();
        if let Some(control) = self.control.upgrade() {
            let _ = control.send(JobMessage::Cancel);
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Block until the job ends
    pub fn wait(self) -> Result<PrintOutcome, PrintError> {
        self.wait_with_progress(|_, _| {})
    }

    /// Block until the job ends, reporting `(completed, total)` along the way
    pub fn wait_with_progress(
        mut self,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<PrintOutcome, PrintError> {
        let outcome = loop {
            match self.events.recv() {
                Ok(PrintEvent::Progress { completed, total }) => on_progress(completed, total),
                Ok(PrintEvent::Finished(artifacts)) => break Ok(PrintOutcome::Printed(artifacts)),
                Ok(PrintEvent::Canceled) => break Ok(PrintOutcome::Canceled),
                Ok(PrintEvent::Failed(err)) => break Err(err),
                Err(_) => break Err(PrintError::Disconnected),
            }
        };

        self.join();
        outcome
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Print job {} thread panicked", self.id);
            }
        }
    }
}

impl Drop for PrintJobHandle {
    fn drop(&mut self) {
        // A handle dropped mid-job has nobody to deliver to
        if self.thread.is_some() {
            self.cancel();
        }
    }
}

/// Clears the service busy flag when the job thread ends
struct BusyFlag(Arc<AtomicBool>);

impl Drop for BusyFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Holds the print canvas multiplier for the duration of a job
struct PrintQualityGuard {
    core: Arc<dyn DocumentCore>,
}

impl PrintQualityGuard {
    fn set(core: Arc<dyn DocumentCore>, quality: f32) -> Self {
        core.set_canvas_multiplier(quality);
        Self { core }
    }
}

impl Drop for PrintQualityGuard {
    fn drop(&mut self) {
        self.core.unset_canvas_multiplier();
    }
}

/// Owns one job: issues the canvas loads, composites pages as they arrive and
/// assembles the result
struct JobDriver {
    id: u64,
    core: Arc<dyn DocumentCore>,
    selection: PageSelection,
    options: PrintOptions,
    token: CancelToken,
    /// Queue sender for canvas callbacks, dropped once every load is issued
    messages: Option<Sender<JobMessage>>,
    events: Sender<PrintEvent>,
    state: PrintJobState,
    /// Outstanding loads keyed by selection slot
    in_flight: HashMap<usize, RenderRequest>,
    pages: Vec<Option<RenderedPage>>,
    notes: Vec<Option<NotesPage>>,
    failure: Option<PrintError>,
}

impl JobDriver {
    fn run(mut self, messages: Receiver<JobMessage>) {
        info!(
            "Print job {} started: {} pages, notes: {}",
            self.id,
            self.selection.len(),
            self.options.include_notes
        );

        let _quality = PrintQualityGuard::set(Arc::clone(&self.core), self.options.print_quality);
        let _watermark = WatermarkGuard::apply(Arc::clone(&self.core), self.options.watermark.take());

        let _ = self.state.apply(Command::Select);
        let effects = self.state.apply(Command::Start {
            total: self.selection.len(),
        });
        self.execute_effects(effects);

        if self.options.include_notes && !self.state.phase().is_terminal() {
            self.build_notes();
        }
        self.messages = None;

        while !self.state.phase().is_terminal() {
            let Ok(message) = messages.recv() else {
                // Every outstanding callback was dropped without being called
                let effects = if self.token.is_cancelled() {
                    self.state.apply(Command::Cancel)
                } else {
                    warn!(
                        "Print job {}: {} canvas loads will never complete",
                        self.id,
                        self.in_flight.len()
                    );
                    self.fail(PrintError::Disconnected)
                };
                self.execute_effects(effects);
                break;
            };

            let effects = match message {
                JobMessage::Cancel => self.state.apply(Command::Cancel),
                JobMessage::CanvasLoaded { slot, result } => self.on_canvas_loaded(slot, result),
            };
            self.execute_effects(effects);
        }

        info!("Print job {} ended: {:?}", self.id, self.state.phase());
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::IssueRenders => {
                    if let Err(err) = self.issue_renders() {
                        let effects = self.fail(err);
                        self.execute_effects(effects);
                    }
                }

                Effect::EmitProgress { completed, total } => {
                    if matches!(self.state.phase(), JobPhase::Rendering | JobPhase::Done) {
                        let _ = self.events.send(PrintEvent::Progress { completed, total });
                    }
                }

                Effect::CancelInFlight => self.cancel_in_flight(),

                Effect::Deliver => {
                    let artifacts = self.assemble();
                    let _ = self.events.send(PrintEvent::Finished(artifacts));
                }

                Effect::ReportCanceled => {
                    info!("Print job {} canceled", self.id);
                    self.pages.iter_mut().for_each(|page| *page = None);
                    let _ = self.events.send(PrintEvent::Canceled);
                }

                Effect::ReportFailure => {
                    let err = self.failure.take().unwrap_or(PrintError::Disconnected);
                    let _ = self.events.send(PrintEvent::Failed(err));
                }
            }
        }
    }

    /// Request every page at once; completion order is irrelevant since
    /// results are slotted by selection position
    fn issue_renders(&mut self) -> Result<(), PrintError> {
        let Some(messages) = self.messages.clone() else {
            return Err(PrintError::Disconnected);
        };
        let pages: Vec<usize> = self.selection.iter().collect();

        for (slot, page_number) in pages.into_iter().enumerate() {
            if self.token.is_cancelled() {
                debug!("Print job {} canceled while issuing renders", self.id);
                break;
            }

            let page_index = page_number - 1;
            let rotation = resolve_rotation(self.core.as_ref(), page_index).map_err(|source| {
                PrintError::Render {
                    page: page_number,
                    source,
                }
            })?;

            let request = CanvasRequest {
                page_index,
                zoom: PRINT_ZOOM,
                page_rotation: rotation,
            };
            let messages = messages.clone();
            let handle = self.core.load_canvas_async(
                request,
                Box::new(move |result| {
                    let _ = messages.send(JobMessage::CanvasLoaded { slot, result });
                }),
            );

            debug!(
                "Print job {}: requested page {page_number} rotated {}°",
                self.id,
                rotation.degrees()
            );
            self.in_flight.insert(
                slot,
                RenderRequest {
                    slot,
                    page_number,
                    rotation,
                    zoom: PRINT_ZOOM,
                    handle,
                },
            );
        }

        Ok(())
    }

    fn build_notes(&mut self) {
        let annotations = self.core.annotations();
        let pages: Vec<usize> = self.selection.iter().collect();

        for (slot, page_number) in pages.into_iter().enumerate() {
            self.notes[slot] = build_notes_page(
                self.core.as_ref(),
                &annotations,
                page_number,
                &self.options.notes,
            );
        }

        let count = self.notes.iter().filter(|n| n.is_some()).count();
        debug!("Print job {}: {count} notes pages", self.id);
    }

    fn on_canvas_loaded(&mut self, slot: usize, result: Result<Canvas, CoreError>) -> Vec<Effect> {
        if self.token.is_cancelled() {
            return self.state.apply(Command::Cancel);
        }

        let Some(request) = self.in_flight.remove(&slot) else {
            debug!("Print job {}: ignoring canvas for slot {slot}", self.id);
            return vec![];
        };

        match self.finish_page(&request, result) {
            Ok(page) => {
                if self.token.is_cancelled() {
                    return self.state.apply(Command::Cancel);
                }
                self.pages[slot] = Some(page);
                self.state.apply(Command::PageRendered)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Orient, composite and encode one loaded canvas
    fn finish_page(
        &self,
        request: &RenderRequest,
        result: Result<Canvas, CoreError>,
    ) -> Result<RenderedPage, PrintError> {
        let page = request.page_number;
        let render_err = |source| PrintError::Render { page, source };

        let mut canvas = result.map_err(render_err)?;
        let info = self
            .core
            .page_info(request.page_index())
            .map_err(render_err)?;
        position_canvas(
            &mut canvas,
            info,
            document_rotation(self.core.as_ref(), request.page_index()),
        );

        composite(self.core.as_ref(), &mut canvas, page)
            .map_err(|source| PrintError::Composite { page, source })?;

        RenderedPage::from_canvas(page, &canvas).map_err(|detail| PrintError::Encode { page, detail })
    }

    fn fail(&mut self, err: PrintError) -> Vec<Effect> {
        error!("Print job {} failed: {err}", self.id);
        self.failure = Some(err);
        self.state.apply(Command::Fail)
    }

    fn cancel_in_flight(&mut self) {
        if self.in_flight.is_empty() {
            return;
        }

        debug!(
            "Print job {}: canceling {} pending canvas loads",
            self.id,
            self.in_flight.len()
        );
        for (_, request) in self.in_flight.drain() {
            self.core.cancel_load_canvas(request.handle);
        }
    }

    /// Pages in selection order, each followed by its notes page
    fn assemble(&mut self) -> Vec<PrintArtifact> {
        let mut artifacts = Vec::with_capacity(self.pages.len() * 2);
        for (page, notes) in self.pages.iter_mut().zip(self.notes.iter_mut()) {
            if let Some(page) = page.take() {
                artifacts.push(PrintArtifact::Page(page));
            }
            if let Some(notes) = notes.take() {
                artifacts.push(PrintArtifact::Notes(notes));
            }
        }
        artifacts
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::print::annotations::AnnotationKind;
    use crate::test_utils::{MockDocumentCore, mock_annotation};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn service(core: &Arc<MockDocumentCore>) -> PrintService {
        PrintService::new(Arc::clone(core) as Arc<dyn DocumentCore>)
    }

    fn next_event(handle: &PrintJobHandle) -> PrintEvent {
        handle.events().recv_timeout(TIMEOUT).expect("print event")
    }

    fn page_numbers(artifacts: &[PrintArtifact]) -> Vec<(usize, bool)> {
        artifacts
            .iter()
            .map(|a| (a.page_number(), a.is_notes()))
            .collect()
    }

    #[test]
    fn refuses_empty_selection() {
        let core = Arc::new(MockDocumentCore::new(3));
        let result = service(&core).start_print_job(PageSelection::default(), PrintOptions::default());
        assert!(matches!(result, Err(PrintError::EmptySelection)));
    }

    #[test]
    fn refuses_out_of_range_pages() {
        let core = Arc::new(MockDocumentCore::new(3));
        let result = service(&core)
            .start_print_job(PageSelection::from_pages([2, 4]), PrintOptions::default());
        assert!(matches!(
            result,
            Err(PrintError::PageOutOfRange { page: 4, total: 3 })
        ));
    }

    #[test]
    fn renders_pages_in_selection_order() {
        let core = Arc::new(MockDocumentCore::new(5).auto_complete());
        let handle = service(&core)
            .start_print_job(PageSelection::from_pages([4, 1, 3]), PrintOptions::default())
            .unwrap();

        let PrintOutcome::Printed(artifacts) = handle.wait().unwrap() else {
            panic!("job should print");
        };
        assert_eq!(
            page_numbers(&artifacts),
            vec![(4, false), (1, false), (3, false)]
        );
    }

    #[test]
    fn second_job_is_refused_while_first_runs() {
        let core = Arc::new(MockDocumentCore::new(3));
        let service = service(&core);
        let handle = service
            .start_print_job(PageSelection::from_pages([1]), PrintOptions::default())
            .unwrap();
        assert!(service.is_printing());

        let second = service.start_print_job(PageSelection::from_pages([2]), PrintOptions::default());
        assert!(matches!(second, Err(PrintError::JobInProgress)));

        assert!(matches!(
            next_event(&handle),
            PrintEvent::Progress { completed: 0, total: 1 }
        ));
        core.complete_all();
        assert!(matches!(handle.wait(), Ok(PrintOutcome::Printed(_))));
        assert!(!service.is_printing());
    }

    #[test]
    fn notes_follow_their_page() {
        let core = Arc::new(MockDocumentCore::new(3).auto_complete());
        core.add_annotation(mock_annotation("a", 2, AnnotationKind::StickyNote));

        let options = PrintOptions {
            include_notes: true,
            ..PrintOptions::default()
        };
        let handle = service(&core)
            .start_print_job(PageSelection::from_pages([1, 2, 3]), options)
            .unwrap();

        let PrintOutcome::Printed(artifacts) = handle.wait().unwrap() else {
            panic!("job should print");
        };
        assert_eq!(
            page_numbers(&artifacts),
            vec![(1, false), (2, false), (2, true), (3, false)]
        );
    }

    #[test]
    fn render_failure_aborts_job_and_cancels_rest() {
        let core = Arc::new(MockDocumentCore::new(3));
        let handle = service(&core)
            .start_print_job(PageSelection::from_pages([1, 2, 3]), PrintOptions::default())
            .unwrap();
        assert!(matches!(next_event(&handle), PrintEvent::Progress { .. }));

        core.fail_page(2);

        let result = handle.wait();
        assert!(matches!(result, Err(PrintError::Render { page: 2, .. })));
        assert_eq!(core.canceled_handles().len(), 2);
    }

    #[test]
    fn quality_and_watermark_are_scoped_to_job() {
        let core = Arc::new(MockDocumentCore::new(1).auto_complete());
        let options = PrintOptions {
            print_quality: 2.0,
            watermark: Some(WatermarkConfig::preview()),
            ..PrintOptions::default()
        };

        let handle = service(&core)
            .start_print_job(PageSelection::from_pages([1]), options)
            .unwrap();
        let _ = handle.wait().unwrap();

        assert_eq!(core.multiplier_history(), vec![Some(2.0), None]);
        assert_eq!(core.watermark_history(), vec![Some(WatermarkConfig::preview()), None]);
        assert_eq!(core.watermark(), None);
    }

    #[test]
    fn dropped_callbacks_fail_the_job() {
        let core = Arc::new(MockDocumentCore::new(2));
        let options = PrintOptions {
            print_quality: 2.0,
            ..PrintOptions::default()
        };
        let service = service(&core);
        let handle = service
            .start_print_job(PageSelection::from_pages([1, 2]), options)
            .unwrap();
        assert!(matches!(
            next_event(&handle),
            PrintEvent::Progress { completed: 0, total: 2 }
        ));

        core.drop_pending();

        assert!(matches!(handle.wait(), Err(PrintError::Disconnected)));
        assert!(!service.is_printing());
        assert_eq!(core.multiplier_history(), vec![Some(2.0), None]);
    }
}
