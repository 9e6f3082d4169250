use std::sync::Arc;
use std::time::Duration;

use printdeck::print::{
    AnnotationKind, DocumentCore, LayoutMode, NotesContext, PageSelection, PrintArtifact,
    PrintError, PrintEvent, PrintMode, PrintOptions, PrintOutcome, PrintService, Rotation,
    WatermarkConfig,
};
use printdeck::test_utils::{MockDocumentCore, mock_annotation};

const TIMEOUT: Duration = Duration::from_secs(5);

fn service(core: &Arc<MockDocumentCore>) -> PrintService {
    PrintService::new(Arc::clone(core) as Arc<dyn DocumentCore>)
}

fn layout(artifacts: &[PrintArtifact]) -> Vec<(usize, bool)> {
    artifacts
        .iter()
        .map(|a| (a.page_number(), a.is_notes()))
        .collect()
}

fn printed(outcome: Result<PrintOutcome, PrintError>) -> Vec<PrintArtifact> {
    match outcome {
        Ok(PrintOutcome::Printed(artifacts)) => artifacts,
        other => panic!("expected printed outcome, got {other:?}"),
    }
}

#[test]
fn test_custom_range_prints_selected_pages_in_order() {
    let core = Arc::new(MockDocumentCore::new(10).auto_complete());
    core.add_annotation(mock_annotation("n1", 3, AnnotationKind::StickyNote));
    let service = service(&core);

    let selection =
        service.compute_page_selection(PrintMode::Custom, 1, LayoutMode::Single, "2-4,7", &[]);
    assert_eq!(selection.pages(), &[2, 3, 4, 7]);

    let artifacts = printed(
        service
            .start_print_job(selection, PrintOptions::default())
            .unwrap()
            .wait(),
    );

    assert_eq!(
        layout(&artifacts),
        vec![(2, false), (3, false), (4, false), (7, false)]
    );
    assert_eq!(artifacts.iter().filter(|a| a.is_notes()).count(), 0);
}

#[test]
fn test_reverse_completion_keeps_selection_order() {
    let core = Arc::new(MockDocumentCore::new(5));
    let handle = service(&core)
        .start_print_job(PageSelection::from_pages(1..=5), PrintOptions::default())
        .unwrap();

    assert!(matches!(
        handle.events().recv_timeout(TIMEOUT).unwrap(),
        PrintEvent::Progress {
            completed: 0,
            total: 5
        }
    ));
    assert_eq!(core.pending_count(), 5);

    core.complete_all_reversed();

    let mut progress = Vec::new();
    let artifacts = printed(handle.wait_with_progress(|completed, _| progress.push(completed)));

    assert_eq!(progress, vec![1, 2, 3, 4, 5]);
    assert_eq!(
        layout(&artifacts),
        (1..=5).map(|p| (p, false)).collect::<Vec<_>>()
    );
}

#[test]
fn test_cancel_stops_progress_and_cancels_pending_loads() {
    let core = Arc::new(MockDocumentCore::new(3));
    let handle = service(&core)
        .start_print_job(PageSelection::from_pages([1, 2, 3]), PrintOptions::default())
        .unwrap();

    assert!(matches!(
        handle.events().recv_timeout(TIMEOUT).unwrap(),
        PrintEvent::Progress { completed: 0, .. }
    ));
    assert!(core.complete_page(1));
    assert!(matches!(
        handle.events().recv_timeout(TIMEOUT).unwrap(),
        PrintEvent::Progress { completed: 1, .. }
    ));

    handle.cancel();
    // Late callbacks must not count
    core.complete_all();

    let mut after_cancel = Vec::new();
    loop {
        let event = handle.events().recv_timeout(TIMEOUT).unwrap();
        let terminal = event.is_terminal();
        after_cancel.push(event);
        if terminal {
            break;
        }
    }

    assert_eq!(after_cancel.len(), 1);
    assert!(matches!(after_cancel[0], PrintEvent::Canceled));
    assert_eq!(core.canceled_handles().len(), 2);
}

#[test]
fn test_notes_pages_follow_their_page_sorted_by_time() {
    let core = Arc::new(MockDocumentCore::new(4).auto_complete());
    let mut newer = mock_annotation("newer", 2, AnnotationKind::FreeText);
    newer.created = newer.created + chrono::Duration::hours(1);
    core.add_annotation(newer);
    core.add_annotation(mock_annotation("older", 2, AnnotationKind::Highlight));
    let mut widget = mock_annotation("widget", 4, AnnotationKind::Widget);
    widget.listable = false;
    core.add_annotation(widget);

    let mut notes = NotesContext::default();
    notes.sort_key = "time".to_string();
    let options = PrintOptions {
        include_notes: true,
        notes,
        ..PrintOptions::default()
    };

    let artifacts = printed(
        service(&core)
            .start_print_job(PageSelection::from_pages([1, 2, 4]), options)
            .unwrap()
            .wait(),
    );

    assert_eq!(
        layout(&artifacts),
        vec![(1, false), (2, false), (2, true), (4, false)]
    );

    let PrintArtifact::Notes(page) = &artifacts[2] else {
        panic!("expected notes page");
    };
    assert_eq!(page.header, "Page 2");
    let ids: Vec<&str> = page
        .notes
        .iter()
        .map(|n| n.annotation_id.as_str())
        .collect();
    assert_eq!(ids, vec!["older", "newer"]);

    // Widget on page 4 went through the second compositing pass
    assert!(core.draw_calls().contains(&(4, true)));
}

#[test]
fn test_pages_are_rasterized_with_print_rotation() {
    let core = Arc::new(MockDocumentCore::new(2).auto_complete());
    core.set_page_size(1, 20.0, 10.0);
    core.set_rotation(2, 1, 0);

    let artifacts = printed(
        service(&core)
            .start_print_job(PageSelection::from_pages([1, 2]), PrintOptions::default())
            .unwrap()
            .wait(),
    );

    let rotations: Vec<Rotation> = core.requests().iter().map(|r| r.page_rotation).collect();
    assert_eq!(rotations, vec![Rotation::Quarter, Rotation::Half]);

    let PrintArtifact::Page(landscape) = &artifacts[0] else {
        panic!("expected page");
    };
    assert_eq!((landscape.width_px, landscape.height_px), (10, 20));
}

#[test]
fn test_failure_restores_watermark_and_quality() {
    let core = Arc::new(MockDocumentCore::new(3).auto_complete());
    core.fail_page(3);
    let options = PrintOptions {
        print_quality: 1.5,
        watermark: Some(WatermarkConfig::preview()),
        ..PrintOptions::default()
    };

    let result = service(&core)
        .start_print_job(PageSelection::from_pages([1, 2, 3]), options)
        .unwrap()
        .wait();

    assert!(matches!(result, Err(PrintError::Render { page: 3, .. })));
    assert_eq!(core.watermark(), None);
    assert_eq!(core.multiplier_history(), vec![Some(1.5), None]);
}

#[test]
fn test_service_accepts_new_job_after_previous_finished() {
    let core = Arc::new(MockDocumentCore::new(2).auto_complete());
    let service = service(&core);

    for _ in 0..2 {
        let artifacts = printed(
            service
                .start_print_job(PageSelection::from_pages([2]), PrintOptions::default())
                .unwrap()
                .wait(),
        );
        assert_eq!(layout(&artifacts), vec![(2, false)]);
    }
    assert!(!service.is_printing());
}
