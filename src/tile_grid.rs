use anyhow::{bail, ensure, Result};
use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

const QUAD_VERTICES: usize = 4;
const QUAD_INDICES: usize = 6;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TileVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl TileVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { position: position.to_array(), normal: normal.to_array(), uv: uv.to_array() }
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<TileVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
                wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
                wgpu::VertexAttribute { offset: 24, shader_location: 2, format: wgpu::VertexFormat::Float32x2 },
            ],
        }
    }
}

/// Position of a quad in the grid. `row` runs along X inside a band of `grid_width` quads,
/// `col` selects the band along Y.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub col: u32,
    pub row: u32,
}

impl GridCell {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

/// Tile of the source sheet, addressed by sheet column (U) and row (V).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub column: u32,
    pub row: u32,
}

impl TileCoord {
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGridSettings {
    #[serde(default = "TileGridSettings::default_tile_size")]
    pub tile_width: u32,
    #[serde(default = "TileGridSettings::default_tile_size")]
    pub tile_height: u32,
    #[serde(default = "TileGridSettings::default_sheet_tiles")]
    pub sheet_columns: u32,
    #[serde(default = "TileGridSettings::default_sheet_tiles")]
    pub sheet_rows: u32,
    #[serde(default = "TileGridSettings::default_grid_size")]
    pub grid_width: u32,
    #[serde(default = "TileGridSettings::default_grid_size")]
    pub grid_height: u32,
    #[serde(default)]
    pub default_tile: TileCoord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
}

impl TileGridSettings {
    const fn default_tile_size() -> u32 {
        16
    }

    const fn default_sheet_tiles() -> u32 {
        16
    }

    const fn default_grid_size() -> u32 {
        100
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.tile_width > 0 && self.tile_height > 0, "tile size must be non-zero");
        ensure!(self.sheet_columns > 0 && self.sheet_rows > 0, "tile sheet must have at least one tile");
        ensure!(self.grid_width > 0 && self.grid_height > 0, "grid must contain at least one quad");
        ensure!(
            self.default_tile.column < self.sheet_columns && self.default_tile.row < self.sheet_rows,
            "default tile ({}, {}) is outside the {}x{} sheet",
            self.default_tile.column,
            self.default_tile.row,
            self.sheet_columns,
            self.sheet_rows
        );
        let vertex_count = u64::from(self.grid_width) * u64::from(self.grid_height) * QUAD_VERTICES as u64;
        ensure!(
            vertex_count <= u64::from(u32::MAX),
            "{}x{} grid needs {vertex_count} vertices, more than 32-bit indices can address",
            self.grid_width,
            self.grid_height
        );
        Ok(())
    }
}

impl Default for TileGridSettings {
    fn default() -> Self {
        Self {
            tile_width: Self::default_tile_size(),
            tile_height: Self::default_tile_size(),
            sheet_columns: Self::default_sheet_tiles(),
            sheet_rows: Self::default_sheet_tiles(),
            grid_width: Self::default_grid_size(),
            grid_height: Self::default_grid_size(),
            default_tile: TileCoord::default(),
            texture: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileGridMaterial {
    /// Primary texture sampled by the grid, usually the tile sheet.
    pub base_color_texture: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridBounds {
    pub min: Vec3,
    pub max: Vec3,
}

#[derive(Clone, Debug)]
pub struct TileGridMesh {
    grid_width: u32,
    grid_height: u32,
    tile_width: u32,
    tile_height: u32,
    sheet_columns: u32,
    sheet_rows: u32,
    vertices: Vec<TileVertex>,
    indices: Vec<u32>,
    tiles: Vec<TileCoord>,
    material: TileGridMaterial,
    dirty: Option<Range<usize>>,
}

impl TileGridMesh {
    pub fn build(settings: &TileGridSettings) -> Result<Self> {
        settings.validate()?;
        let quad_count = settings.grid_width as usize * settings.grid_height as usize;
        let mut mesh = Self {
            grid_width: settings.grid_width,
            grid_height: settings.grid_height,
            tile_width: settings.tile_width,
            tile_height: settings.tile_height,
            sheet_columns: settings.sheet_columns,
            sheet_rows: settings.sheet_rows,
            vertices: Vec::with_capacity(quad_count * QUAD_VERTICES),
            indices: Vec::with_capacity(quad_count * QUAD_INDICES),
            tiles: vec![settings.default_tile; quad_count],
            material: TileGridMaterial { base_color_texture: settings.texture.clone() },
            dirty: None,
        };

        let uvs = mesh.tile_uvs(settings.default_tile)?;
        let size = Vec3::new(settings.tile_width as f32, settings.tile_height as f32, 0.0);
        let corners = [Vec3::ZERO, Vec3::new(size.x, 0.0, 0.0), size, Vec3::new(0.0, size.y, 0.0)];
        for col in 0..settings.grid_height {
            for row in 0..settings.grid_width {
                let origin = Vec3::new(row as f32 * size.x, col as f32 * size.y, 0.0);
                let base = mesh.vertices.len() as u32;
                for (corner, uv) in corners.iter().zip(uvs) {
                    mesh.vertices.push(TileVertex::new(origin + *corner, Vec3::Z, uv));
                }
                // Authored winding: (2, 1, 0) then (0, 3, 2).
                mesh.indices.extend_from_slice(&[base + 2, base + 1, base, base, base + 3, base + 2]);
            }
        }
        Ok(mesh)
    }

    pub fn grid_size(&self) -> (u32, u32) {
        (self.grid_width, self.grid_height)
    }

    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn sheet_size(&self) -> (u32, u32) {
        (self.sheet_columns, self.sheet_rows)
    }

    pub fn quad_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn vertices(&self) -> &[TileVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.iter().map(|v| Vec3::from_array(v.position))
    }

    pub fn uvs(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.vertices.iter().map(|v| Vec2::from_array(v.uv))
    }

    pub fn material(&self) -> &TileGridMaterial {
        &self.material
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn quad_offset(&self, cell: GridCell) -> Result<usize> {
        if cell.row >= self.grid_width || cell.col >= self.grid_height {
            bail!(
                "grid cell (col {}, row {}) is outside the {}x{} grid",
                cell.col,
                cell.row,
                self.grid_width,
                self.grid_height
            );
        }
        Ok(self.grid_width as usize * cell.col as usize + cell.row as usize)
    }

    pub fn tile_uvs(&self, tile: TileCoord) -> Result<[Vec2; 4]> {
        if tile.column >= self.sheet_columns || tile.row >= self.sheet_rows {
            bail!(
                "tile ({}, {}) is outside the {}x{} sheet",
                tile.column,
                tile.row,
                self.sheet_columns,
                self.sheet_rows
            );
        }
        let cell = Vec2::new(1.0 / self.sheet_columns as f32, 1.0 / self.sheet_rows as f32);
        let u0 = tile.column as f32 * cell.x;
        let u1 = (tile.column + 1) as f32 * cell.x;
        let v0 = tile.row as f32 * cell.y;
        let v1 = (tile.row + 1) as f32 * cell.y;
        Ok([Vec2::new(u0, v0), Vec2::new(u1, v0), Vec2::new(u1, v1), Vec2::new(u0, v1)])
    }

    pub fn tile_at(&self, cell: GridCell) -> Option<TileCoord> {
        let offset = self.quad_offset(cell).ok()?;
        self.tiles.get(offset).copied()
    }

    /// Rewrites the UVs of a single quad. Fails without touching the mesh when either
    /// coordinate is out of range.
    pub fn set_tile(&mut self, cell: GridCell, tile: TileCoord) -> Result<()> {
        let offset = self.quad_offset(cell)?;
        let uvs = self.tile_uvs(tile)?;
        let start = offset * QUAD_VERTICES;
        for (vertex, uv) in self.vertices[start..start + QUAD_VERTICES].iter_mut().zip(uvs) {
            vertex.uv = uv.to_array();
        }
        self.tiles[offset] = tile;
        self.mark_dirty(start..start + QUAD_VERTICES);
        Ok(())
    }

    pub fn randomize_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(GridCell, TileCoord)> {
        let tile = TileCoord::new(rng.gen_range(0..self.sheet_columns), rng.gen_range(0..self.sheet_rows));
        let cell = GridCell::new(rng.gen_range(0..self.grid_height), rng.gen_range(0..self.grid_width));
        self.set_tile(cell, tile)?;
        Ok((cell, tile))
    }

    /// Vertex range touched since the last call, for partial buffer uploads.
    pub fn take_dirty_vertices(&mut self) -> Option<Range<usize>> {
        self.dirty.take()
    }

    fn mark_dirty(&mut self, range: Range<usize>) {
        self.dirty = Some(match self.dirty.take() {
            Some(existing) => existing.start.min(range.start)..existing.end.max(range.end),
            None => range,
        });
    }

    pub fn bounds(&self) -> GridBounds {
        let max = Vec3::new(
            self.grid_width as f32 * self.tile_width as f32,
            self.grid_height as f32 * self.tile_height as f32,
            0.0,
        );
        GridBounds { min: Vec3::ZERO, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_settings() -> TileGridSettings {
        TileGridSettings {
            tile_width: 8,
            tile_height: 4,
            sheet_columns: 4,
            sheet_rows: 4,
            grid_width: 3,
            grid_height: 2,
            ..TileGridSettings::default()
        }
    }

    #[test]
    fn first_quad_winding_and_corners() {
        let mesh = TileGridMesh::build(&small_settings()).expect("build grid");
        assert_eq!(&mesh.indices()[..6], &[2, 1, 0, 0, 3, 2]);
        let positions: Vec<Vec3> = mesh.positions().take(4).collect();
        assert_eq!(
            positions,
            vec![Vec3::ZERO, Vec3::new(8.0, 0.0, 0.0), Vec3::new(8.0, 4.0, 0.0), Vec3::new(0.0, 4.0, 0.0)]
        );
        assert!(mesh.vertices().iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn quads_are_laid_out_by_offset() {
        let mesh = TileGridMesh::build(&small_settings()).expect("build grid");
        let offset = mesh.quad_offset(GridCell::new(1, 2)).expect("offset");
        assert_eq!(offset, 5);
        let origin = Vec3::from_array(mesh.vertices()[offset * 4].position);
        assert_eq!(origin, Vec3::new(16.0, 4.0, 0.0));
        assert_eq!(mesh.bounds().max, Vec3::new(24.0, 8.0, 0.0));
    }

    #[test]
    fn zero_sized_settings_are_rejected() {
        let settings = TileGridSettings { sheet_columns: 0, ..small_settings() };
        assert!(TileGridMesh::build(&settings).is_err());
        let settings = TileGridSettings { default_tile: TileCoord::new(4, 0), ..small_settings() };
        let err = TileGridMesh::build(&settings).unwrap_err();
        assert!(err.to_string().contains("default tile"), "unexpected error: {err}");
    }

    #[test]
    fn dirty_range_merges_updates() {
        let mut mesh = TileGridMesh::build(&small_settings()).expect("build grid");
        assert!(mesh.take_dirty_vertices().is_none());
        mesh.set_tile(GridCell::new(0, 1), TileCoord::new(1, 1)).expect("update");
        mesh.set_tile(GridCell::new(1, 0), TileCoord::new(2, 2)).expect("update");
        assert_eq!(mesh.take_dirty_vertices(), Some(4..16));
        assert!(mesh.take_dirty_vertices().is_none());
    }

    #[test]
    fn randomize_stays_in_range() {
        let mut mesh = TileGridMesh::build(&small_settings()).expect("build grid");
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            let (cell, tile) = mesh.randomize_tile(&mut rng).expect("random tile");
            assert_eq!(mesh.tile_at(cell), Some(tile));
        }
        assert!(mesh.uvs().all(|uv| (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)));
    }

    #[test]
    fn vertex_layout_matches_struct() {
        let layout = TileVertex::layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes.len(), 3);
        let mesh = TileGridMesh::build(&small_settings()).expect("build grid");
        assert_eq!(mesh.vertex_bytes().len(), mesh.vertex_count() * 32);
        assert_eq!(mesh.index_bytes().len(), mesh.index_count() * 4);
    }
}
