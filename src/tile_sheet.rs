use crate::tile_grid::TileGridSettings;
use anyhow::{Context, Result};
use std::path::Path;

/// Decoded tile sheet, RGBA8 row-major.
#[derive(Clone, Debug)]
pub struct TileSheetTexture {
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl TileSheetTexture {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("Reading tile sheet {}", path.display()))?;
        Self::from_encoded(path.display().to_string(), &bytes)
            .with_context(|| format!("Decoding tile sheet {}", path.display()))
    }

    pub fn from_encoded(key: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self { key: key.into(), width, height, data: img.into_raw() })
    }

    pub fn expected_size(settings: &TileGridSettings) -> (u64, u64) {
        (
            u64::from(settings.tile_width) * u64::from(settings.sheet_columns),
            u64::from(settings.tile_height) * u64::from(settings.sheet_rows),
        )
    }

    /// Differences between the decoded image and the sheet layout the grid expects.
    pub fn layout_warnings(&self, settings: &TileGridSettings) -> Vec<String> {
        let (expected_w, expected_h) = Self::expected_size(settings);
        let mut warnings = Vec::new();
        if u64::from(self.width) != expected_w {
            warnings.push(format!(
                "tile sheet '{}' is {} px wide, expected {} ({} columns of {} px)",
                self.key, self.width, expected_w, settings.sheet_columns, settings.tile_width
            ));
        }
        if u64::from(self.height) != expected_h {
            warnings.push(format!(
                "tile sheet '{}' is {} px tall, expected {} ({} rows of {} px)",
                self.key, self.height, expected_h, settings.sheet_rows, settings.tile_height
            ));
        }
        warnings
    }

    pub fn check_layout(&self, settings: &TileGridSettings) -> bool {
        let warnings = self.layout_warnings(settings);
        for warning in &warnings {
            log::warn!(target: "tile_sheet", "{warning}");
        }
        warnings.is_empty()
    }
}
