pub mod cli;
pub mod config;
pub mod console;
#[cfg(feature = "editor")]
pub mod editor_ui;
pub mod hierarchy;
pub mod input;
pub mod missing_scripts;
pub mod tile_grid;
pub mod tile_sheet;
pub mod time;

pub use console::{LogHub, RuntimeConsole};
pub use missing_scripts::{MissingScriptFinder, ScanMode, ScanReport};
pub use tile_grid::{GridCell, TileCoord, TileGridMesh, TileGridSettings};
