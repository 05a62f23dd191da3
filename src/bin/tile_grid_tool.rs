use anyhow::{anyhow, bail, Context, Result};
use kestrel_toolkit::config::ToolkitConfig;
use kestrel_toolkit::tile_grid::{GridCell, TileCoord, TileGridMesh};
use kestrel_toolkit::tile_sheet::TileSheetTexture;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::process;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };
    match command.as_str() {
        "info" => {
            let config = args
                .next()
                .ok_or_else(|| anyhow!("info requires a config path: tile_grid_tool info <config>"))?;
            cmd_info(&config)
        }
        "set" => {
            let config = args.next().ok_or_else(|| anyhow!("set requires a config path"))?;
            let numbers = args
                .map(|raw| raw.parse::<u32>().with_context(|| format!("Invalid number '{raw}'")))
                .collect::<Result<Vec<_>>>()?;
            let [col, row, column, tile_row] = numbers[..] else {
                bail!(
                    "set expects four numbers: tile_grid_tool set <config> <col> <row> <tile_column> <tile_row>"
                );
            };
            cmd_set(&config, GridCell::new(col, row), TileCoord::new(column, tile_row))
        }
        "scramble" => {
            let config = args.next().ok_or_else(|| anyhow!("scramble requires a config path"))?;
            let count = parse_or(args.next(), 10, "count")?;
            let seed = parse_or(args.next(), 0, "seed")?;
            cmd_scramble(&config, count, seed)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => Err(anyhow!("unknown command '{other}'")),
    }
}

fn print_usage() {
    eprintln!(
        "Tile Grid Tool

Usage:
  tile_grid_tool info <config>                               Build the grid and print its layout
  tile_grid_tool set <config> <col> <row> <column> <row>     Assign one sheet tile and print its UVs
  tile_grid_tool scramble <config> [count] [seed]            Assign random tiles, printing each change
  tile_grid_tool help                                        Show this message
"
    );
}

fn parse_or(raw: Option<String>, default: u64, name: &str) -> Result<u64> {
    match raw {
        Some(value) => value.parse::<u64>().with_context(|| format!("Invalid {name} '{value}'")),
        None => Ok(default),
    }
}

fn build(config_path: &str) -> Result<TileGridMesh> {
    let config = ToolkitConfig::load(config_path)?;
    if let Some(texture) = config.tile_grid.texture.as_deref() {
        match TileSheetTexture::load(texture) {
            Ok(sheet) => {
                for warning in sheet.layout_warnings(&config.tile_grid) {
                    eprintln!("[tile_grid] {warning}");
                }
            }
            Err(err) => eprintln!("[tile_grid] Tile sheet unavailable: {err:?}"),
        }
    }
    TileGridMesh::build(&config.tile_grid)
}

fn cmd_info(config_path: &str) -> Result<()> {
    let mesh = build(config_path)?;
    let (grid_w, grid_h) = mesh.grid_size();
    let (tile_w, tile_h) = mesh.tile_size();
    let (sheet_cols, sheet_rows) = mesh.sheet_size();
    let bounds = mesh.bounds();
    println!("Grid {grid_w}x{grid_h} quads of {tile_w}x{tile_h} px, sheet {sheet_cols}x{sheet_rows} tiles");
    println!(
        "Vertices: {}  Indices: {}  Vertex bytes: {}  Bounds: {:?} .. {:?}",
        mesh.vertex_count(),
        mesh.index_count(),
        mesh.vertex_bytes().len(),
        bounds.min,
        bounds.max
    );
    if let Some(texture) = mesh.material().base_color_texture.as_deref() {
        println!("Texture: {texture}");
    }
    Ok(())
}

fn cmd_set(config_path: &str, cell: GridCell, tile: TileCoord) -> Result<()> {
    let mut mesh = build(config_path)?;
    mesh.set_tile(cell, tile)?;
    let uvs = mesh.tile_uvs(tile)?;
    println!("Quad (col {}, row {}) -> tile ({}, {}) uvs {:?}", cell.col, cell.row, tile.column, tile.row, uvs);
    Ok(())
}

fn cmd_scramble(config_path: &str, count: u64, seed: u64) -> Result<()> {
    let mut mesh = build(config_path)?;
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..count {
        let (cell, tile) = mesh.randomize_tile(&mut rng)?;
        println!("Quad (col {}, row {}) -> tile ({}, {})", cell.col, cell.row, tile.column, tile.row);
    }
    if let Some(range) = mesh.take_dirty_vertices() {
        println!("Dirty vertices: {}..{}", range.start, range.end);
    }
    Ok(())
}
