pub mod panic_handler;
pub mod print;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the print entry points
pub use print::{
    DocumentCore, PageSelection, PrintDialog, PrintError, PrintEvent, PrintJobHandle,
    PrintOptions, PrintOutcome, PrintService, PrintSurface, compute_page_selection,
};
