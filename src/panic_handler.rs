use log::error;
use std::panic;

/// Pretty backtraces on the terminal, plus a line in the log so a crash in a
/// print job thread is not lost when stderr is not watched
pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let thread = std::thread::current();
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        error!(
            "Thread '{}' panicked at {location}: {}",
            thread.name().unwrap_or("<unnamed>"),
            panic_message(panic_info)
        );
        log::logger().flush();

        default_hook(panic_info);
    }));
}

fn panic_message(info: &panic::PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
