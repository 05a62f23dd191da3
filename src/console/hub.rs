use super::entry::{LogEvent, LogSeverity};
use anyhow::{anyhow, Result};
use std::backtrace::Backtrace;
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, Weak};

/// Thread-safe log stream. Producers call [`LogHub::emit`] from any thread; every live
/// [`LogSubscription`] receives its own copy of each event.
#[derive(Clone, Default)]
pub struct LogHub {
    inner: Arc<HubInner>,
}

#[derive(Default)]
struct HubInner {
    subscribers: Mutex<Vec<(u64, Sender<LogEvent>)>>,
    next_id: AtomicU64,
}

impl HubInner {
    fn remove(&self, id: u64) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|(existing, _)| *existing != id);
        }
    }
}

impl LogHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: LogEvent) {
        let Ok(mut subscribers) = self.inner.subscribers.lock() else {
            return;
        };
        // A failed send means the receiver is gone; drop that subscriber.
        subscribers.retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }

    pub fn log(&self, message: impl Into<String>, stack_trace: impl Into<String>, severity: LogSeverity) {
        self.emit(LogEvent::new(message, stack_trace, severity));
    }

    pub fn subscribe(&self) -> LogSubscription {
        let (sender, receiver) = channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.push((id, sender));
        }
        LogSubscription { id, receiver, hub: Arc::downgrade(&self.inner) }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().map(|subscribers| subscribers.len()).unwrap_or(0)
    }

    /// Routes the `log` facade into this hub. Only one global logger can exist per process.
    pub fn install_global(&self, max_level: log::LevelFilter) -> Result<()> {
        log::set_boxed_logger(Box::new(HubLogger { hub: self.clone() }))
            .map_err(|err| anyhow!("Failed to install console logger: {err}"))?;
        log::set_max_level(max_level);
        Ok(())
    }

    /// Forwards panics as `Exception` events before running the previously installed hook.
    pub fn install_panic_hook(&self) {
        let hub = self.clone();
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let payload = info.payload();
            let message = if let Some(text) = payload.downcast_ref::<&str>() {
                (*text).to_string()
            } else if let Some(text) = payload.downcast_ref::<String>() {
                text.clone()
            } else {
                "panic with non-string payload".to_string()
            };
            let location = info.location().map(|loc| format!("{}:{}", loc.file(), loc.line())).unwrap_or_default();
            let trace = format!("{location}\n{}", Backtrace::force_capture());
            hub.emit(LogEvent::new(message, trace, LogSeverity::Exception));
            previous(info);
        }));
    }
}

pub struct LogSubscription {
    id: u64,
    receiver: Receiver<LogEvent>,
    hub: Weak<HubInner>,
}

impl LogSubscription {
    /// Pops every queued event; stops as soon as the queue reports empty.
    pub fn drain(&self) -> impl Iterator<Item = LogEvent> + '_ {
        self.receiver.try_iter()
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}

struct HubLogger {
    hub: LogHub,
}

impl log::Log for HubLogger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let trace = match (record.file(), record.line()) {
            (Some(file), Some(line)) => format!("{} ({file}:{line})", record.target()),
            _ => record.target().to_string(),
        };
        self.hub.log(record.args().to_string(), trace, LogSeverity::from_level(record.level()));
    }

    fn flush(&self) {}
}
