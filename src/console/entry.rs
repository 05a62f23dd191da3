use std::fmt;
use std::num::NonZeroUsize;

/// Longest label the overlay draws in one piece; longer messages are cut for display only.
pub const MAX_DISPLAY_CHARS: NonZeroUsize = match NonZeroUsize::new(16_382) {
    Some(limit) => limit,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogSeverity {
    Error,
    Assert,
    Warning,
    Log,
    Exception,
}

impl LogSeverity {
    pub const COUNT: usize = 5;
    pub const ALL: [LogSeverity; Self::COUNT] =
        [LogSeverity::Error, LogSeverity::Assert, LogSeverity::Warning, LogSeverity::Log, LogSeverity::Exception];

    pub const fn index(self) -> usize {
        match self {
            LogSeverity::Error => 0,
            LogSeverity::Assert => 1,
            LogSeverity::Warning => 2,
            LogSeverity::Log => 3,
            LogSeverity::Exception => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Error => "Error",
            LogSeverity::Assert => "Assert",
            LogSeverity::Warning => "Warning",
            LogSeverity::Log => "Log",
            LogSeverity::Exception => "Exception",
        }
    }

    /// Text colour as RGBA8.
    pub fn color(self) -> [u8; 4] {
        match self {
            LogSeverity::Error | LogSeverity::Exception => [255, 0, 0, 255],
            LogSeverity::Warning => [255, 235, 4, 255],
            LogSeverity::Assert | LogSeverity::Log => [255, 255, 255, 255],
        }
    }

    pub fn from_level(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogSeverity::Error,
            log::Level::Warn => LogSeverity::Warning,
            log::Level::Info | log::Level::Debug | log::Level::Trace => LogSeverity::Log,
        }
    }
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One log callback as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub message: String,
    pub stack_trace: String,
    pub severity: LogSeverity,
}

impl LogEvent {
    pub fn new(message: impl Into<String>, stack_trace: impl Into<String>, severity: LogSeverity) -> Self {
        Self { message: message.into(), stack_trace: stack_trace.into(), severity }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub message: String,
    pub stack_trace: String,
    pub severity: LogSeverity,
    pub count: u32,
}

impl LogEntry {
    pub fn is_same_event(&self, event: &LogEvent) -> bool {
        self.message == event.message && self.stack_trace == event.stack_trace && self.severity == event.severity
    }

    pub fn truncated_message(&self) -> &str {
        truncate_chars(&self.message, MAX_DISPLAY_CHARS)
    }
}

impl From<LogEvent> for LogEntry {
    fn from(event: LogEvent) -> Self {
        Self { message: event.message, stack_trace: event.stack_trace, severity: event.severity, count: 1 }
    }
}

pub fn truncate_chars(text: &str, limit: NonZeroUsize) -> &str {
    match text.char_indices().nth(limit.get()) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
