use super::entry::{LogEntry, LogEvent, LogSeverity};
use std::collections::VecDeque;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Merged { count: u32 },
    Appended { trimmed: usize },
}

/// Per-severity visibility, indexed by `LogSeverity::index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityFilter {
    visible: [bool; LogSeverity::COUNT],
}

impl SeverityFilter {
    pub fn is_visible(&self, severity: LogSeverity) -> bool {
        self.visible[severity.index()]
    }

    pub fn set(&mut self, severity: LogSeverity, visible: bool) {
        self.visible[severity.index()] = visible;
    }

    pub fn toggle(&mut self, severity: LogSeverity) -> bool {
        let slot = &mut self.visible[severity.index()];
        *slot = !*slot;
        *slot
    }
}

impl Default for SeverityFilter {
    fn default() -> Self {
        Self { visible: [true; LogSeverity::COUNT] }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    limit: Option<NonZeroUsize>,
    pub filter: SeverityFilter,
    pub collapsed: bool,
}

impl LogBuffer {
    pub fn new(limit: Option<NonZeroUsize>) -> Self {
        Self { limit, ..Self::default() }
    }

    pub fn limit(&self) -> Option<NonZeroUsize> {
        self.limit
    }

    pub fn set_limit(&mut self, limit: Option<NonZeroUsize>) {
        self.limit = limit;
        self.trim_excess();
    }

    pub fn push(&mut self, event: LogEvent) -> PushOutcome {
        if let Some(last) = self.entries.back_mut() {
            if last.is_same_event(&event) {
                let count = last.count.saturating_add(1);
                *last = LogEntry { count, ..LogEntry::from(event) };
                return PushOutcome::Merged { count };
            }
        }
        self.entries.push_back(LogEntry::from(event));
        PushOutcome::Appended { trimmed: self.trim_excess() }
    }

    fn trim_excess(&mut self) -> usize {
        let Some(limit) = self.limit else {
            return 0;
        };
        let excess = self.entries.len().saturating_sub(limit.get());
        self.entries.drain(..excess);
        excess
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn visible_entries(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        self.entries.iter().filter(|entry| self.filter.is_visible(entry.severity))
    }

    /// Number of lines the current filter and collapse mode produce.
    pub fn visible_line_count(&self) -> usize {
        if self.collapsed {
            self.visible_entries().count()
        } else {
            self.visible_entries().map(|entry| entry.count as usize).sum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(message: &str, severity: LogSeverity) -> LogEvent {
        LogEvent::new(message, "trace", severity)
    }

    #[test]
    fn consecutive_duplicates_merge() {
        let mut buffer = LogBuffer::default();
        assert_eq!(buffer.push(event("a", LogSeverity::Log)), PushOutcome::Appended { trimmed: 0 });
        assert_eq!(buffer.push(event("a", LogSeverity::Log)), PushOutcome::Merged { count: 2 });
        assert_eq!(buffer.push(event("a", LogSeverity::Log)), PushOutcome::Merged { count: 3 });
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.last().map(|entry| entry.count), Some(3));
    }

    #[test]
    fn severity_and_trace_are_part_of_identity() {
        let mut buffer = LogBuffer::default();
        buffer.push(event("a", LogSeverity::Log));
        buffer.push(event("a", LogSeverity::Warning));
        buffer.push(LogEvent::new("a", "other trace", LogSeverity::Warning));
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn filter_hides_lines() {
        let mut buffer = LogBuffer::default();
        buffer.push(event("warn", LogSeverity::Warning));
        buffer.push(event("warn", LogSeverity::Warning));
        buffer.push(event("info", LogSeverity::Log));
        assert_eq!(buffer.visible_line_count(), 3);
        buffer.collapsed = true;
        assert_eq!(buffer.visible_line_count(), 2);
        assert!(!buffer.filter.toggle(LogSeverity::Warning));
        assert_eq!(buffer.visible_line_count(), 1);
        assert_eq!(buffer.visible_entries().next().map(|entry| entry.message.as_str()), Some("info"));
    }

    #[test]
    fn lowering_limit_trims_oldest() {
        let mut buffer = LogBuffer::default();
        for i in 0..4 {
            buffer.push(event(&format!("m{i}"), LogSeverity::Log));
        }
        buffer.set_limit(NonZeroUsize::new(2));
        let messages: Vec<_> = buffer.entries().map(|entry| entry.message.clone()).collect();
        assert_eq!(messages, vec!["m2", "m3"]);
    }
}
