use super::buffer::LogBuffer;
use super::entry::LogSeverity;

const SCROLL_EPSILON: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    Clear,
    ToggleCollapse,
    ToggleSeverity(LogSeverity),
}

impl ConsoleAction {
    pub fn apply(self, buffer: &mut LogBuffer) {
        match self {
            ConsoleAction::Clear => buffer.clear(),
            ConsoleAction::ToggleCollapse => buffer.collapsed = !buffer.collapsed,
            ConsoleAction::ToggleSeverity(severity) => {
                buffer.filter.toggle(severity);
            }
        }
    }
}

/// A single rendered row of the log list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine<'a> {
    pub text: &'a str,
    pub severity: LogSeverity,
    /// Repeat badge, only present in collapsed mode.
    pub repeat: Option<u32>,
}

pub fn visible_lines(buffer: &LogBuffer) -> Vec<ConsoleLine<'_>> {
    let mut lines = Vec::with_capacity(buffer.visible_line_count());
    for entry in buffer.visible_entries() {
        let text = entry.truncated_message();
        if buffer.collapsed {
            lines.push(ConsoleLine { text, severity: entry.severity, repeat: Some(entry.count) });
        } else {
            for _ in 0..entry.count {
                lines.push(ConsoleLine { text, severity: entry.severity, repeat: None });
            }
        }
    }
    lines
}

/// Vertical scroll position of the log list, in pixels from the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    pub offset: f32,
    pub line_height: f32,
    pub viewport_height: f32,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self { offset: 0.0, line_height: 18.0, viewport_height: 400.0 }
    }
}

impl ScrollState {
    pub fn content_height(&self, line_count: usize) -> f32 {
        line_count as f32 * self.line_height
    }

    fn max_offset(&self, line_count: usize) -> f32 {
        (self.content_height(line_count) - self.viewport_height).max(0.0)
    }

    /// Content that fits inside the viewport counts as scrolled to the bottom.
    pub fn is_at_bottom(&self, line_count: usize) -> bool {
        let content = self.content_height(line_count);
        if self.viewport_height >= content {
            return true;
        }
        (content - (self.offset + self.viewport_height)).abs() <= SCROLL_EPSILON
    }

    pub fn scroll_to_bottom(&mut self, line_count: usize) {
        self.offset = self.max_offset(line_count);
    }

    pub fn scroll_by(&mut self, delta: f32, line_count: usize) {
        self.offset = (self.offset + delta).clamp(0.0, self.max_offset(line_count));
    }

    pub fn set_viewport(&mut self, line_height: f32, viewport_height: f32, line_count: usize) {
        self.line_height = line_height.max(0.0);
        self.viewport_height = viewport_height.max(0.0);
        self.clamp(line_count);
    }

    pub fn clamp(&mut self, line_count: usize) {
        self.offset = self.offset.clamp(0.0, self.max_offset(line_count));
    }

    /// Index range of the lines that intersect the viewport.
    pub fn visible_range(&self, line_count: usize) -> std::ops::Range<usize> {
        if self.line_height <= 0.0 || line_count == 0 {
            return 0..0;
        }
        let first = (self.offset / self.line_height).floor() as usize;
        let last = ((self.offset + self.viewport_height) / self.line_height).ceil() as usize;
        first.min(line_count)..last.min(line_count)
    }
}
