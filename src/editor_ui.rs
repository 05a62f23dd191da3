use crate::console::{ConsoleAction, LogSeverity, RuntimeConsole};
use crate::missing_scripts::{ScanMode, ScanReport};

const CONSOLE_TITLE: &str = "Console";
const CONSOLE_MARGIN: f32 = 20.0;
const TOOLBAR_HEIGHT: f32 = 32.0;

fn severity_color(severity: LogSeverity) -> egui::Color32 {
    let [r, g, b, a] = severity.color();
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// Draws the console as a draggable window. Toolbar clicks are applied after the frame.
/// The list offset comes from the console's `ScrollState`, which follows the newest line
/// while it is already at the bottom; wheel and drag input is written back each frame.
pub fn draw_console_window(ctx: &egui::Context, console: &mut RuntimeConsole, screen_size: egui::Vec2) {
    if !console.is_visible() {
        return;
    }
    let mut actions: Vec<ConsoleAction> = Vec::new();
    let default_size = egui::vec2(
        (screen_size.x - CONSOLE_MARGIN * 2.0).max(240.0),
        (screen_size.y - CONSOLE_MARGIN * 2.0).max(160.0),
    );
    egui::Window::new(CONSOLE_TITLE)
        .default_pos(egui::pos2(CONSOLE_MARGIN, CONSOLE_MARGIN))
        .default_size(default_size)
        .resizable(true)
        .show(ctx, |ui| {
            let list_height = (ui.available_height() - TOOLBAR_HEIGHT).max(TOOLBAR_HEIGHT);
            let row_height = ui.text_style_height(&egui::TextStyle::Body);
            console.set_viewport(row_height + ui.spacing().item_spacing.y, list_height);
            let lines = console.lines();
            let output = egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .max_height(list_height)
                .vertical_scroll_offset(console.scroll().offset)
                .show_rows(ui, row_height, lines.len(), |ui, rows| {
                    for line in &lines[rows] {
                        let color = severity_color(line.severity);
                        match line.repeat {
                            Some(count) => {
                                ui.horizontal(|ui| {
                                    ui.colored_label(color, line.text);
                                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                        ui.label(egui::RichText::new(count.to_string()).strong());
                                    });
                                });
                            }
                            None => {
                                ui.colored_label(color, line.text);
                            }
                        }
                    }
                });
            console.scroll_to(output.state.offset.y);
            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Clear").on_hover_text("Clear the contents of the console.").clicked() {
                    actions.push(ConsoleAction::Clear);
                }
                for severity in LogSeverity::ALL {
                    let mut visible = console.buffer().filter.is_visible(severity);
                    if ui.checkbox(&mut visible, severity.label()).changed() {
                        actions.push(ConsoleAction::ToggleSeverity(severity));
                    }
                    ui.add_space(20.0);
                }
                let mut collapsed = console.buffer().collapsed;
                if ui.checkbox(&mut collapsed, "Collapse").on_hover_text("Hide repeated messages.").changed() {
                    actions.push(ConsoleAction::ToggleCollapse);
                }
            });
        });
    for action in actions {
        console.apply(action);
    }
}

/// Menu window for the two missing-script commands. Returns the command clicked this frame.
pub fn draw_missing_scripts_window(
    ctx: &egui::Context,
    open: &mut bool,
    last_report: Option<&ScanReport>,
) -> Option<ScanMode> {
    let mut requested = None;
    egui::Window::new("Missing Scripts").open(open).resizable(true).default_width(420.0).show(ctx, |ui| {
        for mode in [ScanMode::Selection, ScanMode::Recursive] {
            if ui.button(mode.label()).clicked() {
                requested = Some(mode);
            }
        }
        if let Some(report) = last_report {
            ui.separator();
            ui.label(report.summary());
            egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                for slot in &report.missing {
                    ui.colored_label(egui::Color32::YELLOW, slot.to_string());
                }
            });
        }
    });
    requested
}
