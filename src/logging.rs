use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

/// Handle on the installed subscriber's level filter
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    /// Set by RUST_LOG or -v; the configured level is then ignored
    pinned: bool,
}

/// Filter directive in effect before the config file is read, and whether it is final.
///
/// A non-empty RUST_LOG wins, then `-v`, otherwise `info` until the config says otherwise.
pub fn startup_directive(verbose: bool, rust_log: Option<&str>) -> (String, bool) {
    match rust_log {
        Some(directive) if !directive.trim().is_empty() => (directive.to_string(), true),
        _ if verbose => ("debug".to_string(), true),
        _ => ("info".to_string(), false),
    }
}

/// Install the stderr subscriber. Call once, before anything logs.
pub fn init(verbose: bool) -> LogControl {
    let rust_log = std::env::var("RUST_LOG").ok();
    let (directive, pinned) = startup_directive(verbose, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    LogControl { handle, pinned }
}

impl LogControl {
    /// Switch to the configured level unless RUST_LOG or -v pinned one
    pub fn apply_level(&self, level: &str) -> Result<()> {
        if self.pinned {
            return Ok(());
        }
        self.handle.reload(EnvFilter::try_new(level)?)?;
        Ok(())
    }
}
