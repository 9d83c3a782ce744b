use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

/// Writes log lines to stdout, or to stderr when `to_stderr` is set so that
/// subcommands printing their own output keep stdout clean.
#[derive(Clone, Copy)]
pub(crate) struct ConsoleMakeWriter {
    pub to_stderr: bool,
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = Box<dyn std::io::Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        if self.to_stderr {
            Box::new(std::io::stderr())
        } else {
            Box::new(std::io::stdout())
        }
    }
}

/// Installs the global subscriber and routes panics through it.
///
/// Safe to call more than once; later calls keep the first subscriber.
pub(crate) fn init(level: Level, to_stderr: bool) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(ConsoleMakeWriter { to_stderr })
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return;
    }

    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!("[panic] {} at {}", payload, location);
    }));
}
