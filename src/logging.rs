//! Subscriber setup for the injector's `tracing` events
//!
//! The container emits events under the `field_injector` target: debug for
//! container creation, registrations, misses and init start/finish, trace for
//! every resolved field. This module installs a `tracing-subscriber` to print
//! them when the application does not install its own.
//!
//! | feature          | output                                     |
//! |------------------|--------------------------------------------|
//! | `logging`        | events only, no subscriber (default)       |
//! | `logging-pretty` | multi-line human-readable output           |
//! | `logging-json`   | one JSON object per event                  |
//!
//! ```rust,ignore
//! use field_injector::logging;
//!
//! // JSON if `logging-json` is on, pretty otherwise
//! logging::init();
//!
//! // Only the injector, at trace level, with source locations
//! logging::builder()
//!     .trace()
//!     .injector_only()
//!     .with_source_location()
//!     .init();
//! ```
//!
//! `RUST_LOG`, when set, overrides the builder's level and target filter.

use tracing::Level;

/// Target used by every event the crate emits.
pub const TARGET: &str = "field_injector";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line; falls back to compact without `logging-json`.
    Json,
    /// Multi-line, colored.
    #[default]
    Pretty,
    /// Single line per event.
    Compact,
}

/// Subscriber configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    targets: Vec<&'static str>,
    source_location: bool,
    thread_info: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: if cfg!(feature = "logging-json") {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
            targets: Vec::new(),
            source_location: false,
            thread_info: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum level shown
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Only show events from `target` (repeatable). Without any target
    /// filter, events from every crate pass.
    pub fn with_target(mut self, target: &'static str) -> Self {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
        self
    }

    /// Only show the injector's own events.
    pub fn injector_only(self) -> Self {
        self.with_target(TARGET)
    }

    /// Include file and line of each event.
    pub fn with_source_location(mut self) -> Self {
        self.source_location = true;
        self
    }

    /// Include thread ids and names.
    pub fn with_thread_info(mut self) -> Self {
        self.thread_info = true;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn json(self) -> Self {
        self.format(LogFormat::Json)
    }

    pub fn pretty(self) -> Self {
        self.format(LogFormat::Pretty)
    }

    pub fn compact(self) -> Self {
        self.format(LogFormat::Compact)
    }

    /// Filter directives for `EnvFilter`, e.g. `field_injector=debug`.
    pub fn directives(&self) -> String {
        if self.targets.is_empty() {
            return self.level.to_string().to_lowercase();
        }
        let level = self.level.to_string().to_lowercase();
        self.targets
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Install the subscriber globally.
    ///
    /// Returns `false` if a global subscriber was already set; the existing
    /// one is kept. Without `logging-pretty` or `logging-json` no subscriber
    /// is available and this always returns `false`.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) -> bool {
        use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives()));

        let layer = fmt::layer()
            .with_target(true)
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_thread_ids(self.thread_info)
            .with_thread_names(self.thread_info);

        let layer = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => layer.json().boxed(),
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => layer.compact().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        };

        tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init()
            .is_ok()
    }

    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) -> bool {
        false
    }
}

/// Start configuring a subscriber.
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Install the default subscriber: debug level, JSON with `logging-json`,
/// pretty otherwise.
pub fn init() -> bool {
    builder().init()
}

/// Install a JSON subscriber at debug level.
pub fn init_json() -> bool {
    builder().json().init()
}

/// Install a pretty subscriber at debug level.
pub fn init_pretty() -> bool {
    builder().pretty().init()
}

/// Install a pretty subscriber showing only the injector's events, down to
/// individual field resolutions.
pub fn init_injector_only() -> bool {
    builder().pretty().trace().injector_only().init()
}
