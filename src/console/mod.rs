//! In-game log console.
//!
//! Log events arrive on a [`LogHub`] from any thread and queue up in the console's
//! subscription. The owning thread calls [`RuntimeConsole::tick`] once per frame to drain
//! the queue into the [`LogBuffer`] and to react to the toggle key or a device shake.

pub mod buffer;
pub mod entry;
pub mod hub;
pub mod view;

pub use buffer::{LogBuffer, PushOutcome, SeverityFilter};
pub use entry::{LogEntry, LogEvent, LogSeverity, MAX_DISPLAY_CHARS};
pub use hub::{LogHub, LogSubscription};
pub use view::{visible_lines, ConsoleAction, ConsoleLine, ScrollState};

use crate::config::ConsoleConfig;
use crate::input::{ConsoleHostInput, ToggleKey};
use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleVisibility {
    Hidden,
    Visible,
}

pub struct RuntimeConsole {
    toggle_key: ToggleKey,
    open_on_start: bool,
    shake_to_open: bool,
    shake_acceleration: f32,
    visibility: ConsoleVisibility,
    buffer: LogBuffer,
    scroll: ScrollState,
    subscription: Option<LogSubscription>,
}

impl RuntimeConsole {
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        config.validate().context("Invalid console config")?;
        let toggle_key = ToggleKey::from_config_value(&config.toggle_key)?;
        Ok(Self {
            toggle_key,
            open_on_start: config.open_on_start,
            shake_to_open: config.shake_to_open,
            shake_acceleration: config.shake_acceleration,
            visibility: ConsoleVisibility::Hidden,
            buffer: LogBuffer::new(config.log_limit()),
            scroll: ScrollState::default(),
            subscription: None,
        })
    }

    /// Subscribes to `hub`. Starting an already running console re-subscribes.
    pub fn start(&mut self, hub: &LogHub) {
        self.subscription = Some(hub.subscribe());
        if self.open_on_start {
            self.visibility = ConsoleVisibility::Visible;
        }
    }

    /// Unsubscribes. Events emitted after this point are never seen by this console.
    pub fn stop(&mut self) {
        self.subscription = None;
    }

    pub fn is_running(&self) -> bool {
        self.subscription.is_some()
    }

    /// Per-frame update: drain queued logs, then apply the toggle key and shake gesture.
    /// Returns the number of events applied.
    pub fn tick(&mut self, input: &dyn ConsoleHostInput) -> usize {
        let applied = self.drain_queued();
        if input.key_pressed(&self.toggle_key) {
            self.toggle();
        }
        if self.shake_to_open && input.acceleration().length_squared() > self.shake_acceleration {
            self.visibility = ConsoleVisibility::Visible;
        }
        applied
    }

    pub fn drain_queued(&mut self) -> usize {
        let Some(subscription) = self.subscription.as_ref() else {
            return 0;
        };
        let was_at_bottom = self.scroll.is_at_bottom(self.buffer.visible_line_count());
        let mut applied = 0;
        for event in subscription.drain() {
            self.buffer.push(event);
            applied += 1;
        }
        if applied > 0 {
            self.follow_or_clamp(was_at_bottom);
        }
        applied
    }

    /// Applies one event directly on the owning thread, bypassing the queue.
    pub fn ingest(&mut self, event: LogEvent) -> PushOutcome {
        let was_at_bottom = self.scroll.is_at_bottom(self.buffer.visible_line_count());
        let outcome = self.buffer.push(event);
        self.follow_or_clamp(was_at_bottom);
        outcome
    }

    /// Keeps a bottom-anchored view on the newest line; otherwise pulls the offset back
    /// inside content that the cap may have shortened.
    fn follow_or_clamp(&mut self, was_at_bottom: bool) {
        let line_count = self.buffer.visible_line_count();
        if was_at_bottom {
            self.scroll.scroll_to_bottom(line_count);
        } else {
            self.scroll.clamp(line_count);
        }
    }

    pub fn apply(&mut self, action: ConsoleAction) {
        action.apply(&mut self.buffer);
        self.scroll.clamp(self.buffer.visible_line_count());
    }

    pub fn toggle(&mut self) {
        self.visibility = match self.visibility {
            ConsoleVisibility::Hidden => ConsoleVisibility::Visible,
            ConsoleVisibility::Visible => ConsoleVisibility::Hidden,
        };
    }

    pub fn visibility(&self) -> ConsoleVisibility {
        self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == ConsoleVisibility::Visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visibility = if visible { ConsoleVisibility::Visible } else { ConsoleVisibility::Hidden };
    }

    pub fn toggle_key(&self) -> &ToggleKey {
        &self.toggle_key
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll.scroll_by(delta, self.buffer.visible_line_count());
    }

    /// Stores an offset reported by the renderer, e.g. after the user dragged the list.
    pub fn scroll_to(&mut self, offset: f32) {
        self.scroll.offset = offset;
        self.scroll.clamp(self.buffer.visible_line_count());
    }

    pub fn set_viewport(&mut self, line_height: f32, viewport_height: f32) {
        self.scroll.set_viewport(line_height, viewport_height, self.buffer.visible_line_count());
    }

    pub fn lines(&self) -> Vec<ConsoleLine<'_>> {
        visible_lines(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ConsoleInput, InputEvent};
    use glam::Vec3;
    use winit::keyboard::Key;

    fn console(config: ConsoleConfig) -> (RuntimeConsole, LogHub) {
        let hub = LogHub::new();
        let mut console = RuntimeConsole::new(&config).expect("console");
        console.start(&hub);
        (console, hub)
    }

    fn press(input: &mut ConsoleInput, key: &str) {
        input.push(InputEvent::Key { key: Key::Character(key.into()), pressed: true });
        input.push(InputEvent::Key { key: Key::Character(key.into()), pressed: false });
    }

    #[test]
    fn toggle_key_flips_visibility() {
        let (mut console, _hub) = console(ConsoleConfig::default());
        let mut input = ConsoleInput::new();
        assert!(!console.is_visible());
        press(&mut input, "`");
        console.tick(&input);
        assert!(console.is_visible());
        input.clear_frame();
        console.tick(&input);
        assert!(console.is_visible(), "no press, no change");
        press(&mut input, "`");
        console.tick(&input);
        assert!(!console.is_visible());
    }

    #[test]
    fn shake_only_opens() {
        let (mut console, _hub) = console(ConsoleConfig::default());
        let mut input = ConsoleInput::new();
        input.push(InputEvent::Acceleration(Vec3::new(1.0, 1.0, 1.0)));
        console.tick(&input);
        assert!(!console.is_visible(), "squared magnitude 3.0 is not above the threshold");
        input.push(InputEvent::Acceleration(Vec3::new(2.0, 0.0, 0.0)));
        console.tick(&input);
        assert!(console.is_visible());
        console.tick(&input);
        assert!(console.is_visible(), "shaking never hides the console");
    }

    #[test]
    fn shake_disabled_is_ignored() {
        let config = ConsoleConfig { shake_to_open: false, ..ConsoleConfig::default() };
        let (mut console, _hub) = console(config);
        let mut input = ConsoleInput::new();
        input.push(InputEvent::Acceleration(Vec3::splat(10.0)));
        console.tick(&input);
        assert!(!console.is_visible());
    }

    #[test]
    fn open_on_start_shows_immediately() {
        let config = ConsoleConfig { open_on_start: true, ..ConsoleConfig::default() };
        let (console, _hub) = console(config);
        assert!(console.is_visible());
    }

    #[test]
    fn stop_ignores_later_events() {
        let (mut console, hub) = console(ConsoleConfig::default());
        hub.log("before", "", LogSeverity::Log);
        console.stop();
        hub.log("after", "", LogSeverity::Log);
        assert_eq!(console.tick(&ConsoleInput::new()), 0);
        assert!(console.buffer().is_empty());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn follows_bottom_only_when_already_there() {
        let (mut console, hub) = console(ConsoleConfig::default());
        console.set_viewport(10.0, 50.0);
        for i in 0..10 {
            hub.log(format!("line {i}"), "", LogSeverity::Log);
        }
        console.tick(&ConsoleInput::new());
        assert_eq!(console.scroll().offset, 50.0);

        console.scroll_by(-30.0);
        hub.log("line 10", "", LogSeverity::Log);
        console.tick(&ConsoleInput::new());
        assert_eq!(console.scroll().offset, 20.0, "scrolled-up view stays put");
    }

    #[test]
    fn trimmed_history_pulls_scrolled_up_view_back_in_range() {
        let config = ConsoleConfig { restrict_log_count: true, max_log_count: 10, ..ConsoleConfig::default() };
        let (mut console, hub) = console(config);
        console.set_viewport(10.0, 50.0);
        for _ in 0..5 {
            hub.log("repeated", "", LogSeverity::Log);
        }
        for i in 0..9 {
            hub.log(format!("line {i}"), "", LogSeverity::Log);
        }
        console.tick(&ConsoleInput::new());
        assert_eq!(console.buffer().visible_line_count(), 14);
        console.scroll_to(80.0);
        assert!(!console.scroll().is_at_bottom(14));

        hub.log("line 9", "", LogSeverity::Log);
        console.tick(&ConsoleInput::new());
        assert_eq!(console.buffer().visible_line_count(), 10, "the five-line entry was trimmed");
        assert_eq!(console.scroll().offset, 50.0);
    }

    #[test]
    fn scroll_to_is_clamped_to_content() {
        let (mut console, hub) = console(ConsoleConfig::default());
        console.set_viewport(10.0, 50.0);
        for i in 0..8 {
            hub.log(format!("line {i}"), "", LogSeverity::Log);
        }
        console.tick(&ConsoleInput::new());
        console.scroll_to(500.0);
        assert_eq!(console.scroll().offset, 30.0);
        console.scroll_to(-5.0);
        assert_eq!(console.scroll().offset, 0.0);
    }
}
