use anyhow::{anyhow, bail, Context, Result};
use kestrel_toolkit::config::ScanConfig;
use kestrel_toolkit::hierarchy::{ComponentRegistry, SceneHierarchy};
use kestrel_toolkit::missing_scripts::{MissingScriptFinder, ScanMode};
use std::env;
use std::path::Path;
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
        "scan" => {
            let path = args
                .next()
                .ok_or_else(|| anyhow!("scan requires a path: find_missing_scripts scan <hierarchy>"))?;
            cmd_scan(&path, args.collect())
        }
        "list" => {
            let path = args
                .next()
                .ok_or_else(|| anyhow!("list requires a path: find_missing_scripts list <hierarchy>"))?;
            cmd_list(&path)
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
        "Find Missing Scripts

Usage:
  find_missing_scripts scan <hierarchy> [options]   Report component slots with no backing type
  find_missing_scripts list <hierarchy>             List node paths and component counts
  find_missing_scripts help                         Show this message

Scan options:
  --recursive           Also visit every descendant of the selection
  --select <path>       Select a node by path (repeatable, defaults to every root)
  --separator <text>    Path separator used for selection and output (default '/')
  --register <type>     Treat an extra component type as resolvable (repeatable)
"
    );
}

fn cmd_scan(path: &str, options: Vec<String>) -> Result<()> {
    let mut mode = ScanMode::Selection;
    let mut selected_paths = Vec::new();
    let mut config = ScanConfig::default();
    let mut registry = ComponentRegistry::with_builtin();
    let mut iter = options.into_iter();
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--recursive" => mode = ScanMode::Recursive,
            "--select" => {
                selected_paths.push(iter.next().ok_or_else(|| anyhow!("Expected a path after '--select'"))?)
            }
            "--separator" => {
                config.path_separator =
                    iter.next().ok_or_else(|| anyhow!("Expected a value after '--separator'"))?;
                if config.path_separator.is_empty() {
                    bail!("--separator must not be empty");
                }
            }
            "--register" => {
                registry.register(iter.next().ok_or_else(|| anyhow!("Expected a type after '--register'"))?)
            }
            other => bail!("unknown scan option '{other}'"),
        }
    }

    let hierarchy = load_hierarchy(path, &registry)?;
    let selection = if selected_paths.is_empty() {
        hierarchy.roots().to_vec()
    } else {
        selected_paths
            .iter()
            .map(|node_path| {
                hierarchy
                    .find_by_path(node_path, &config.path_separator)
                    .ok_or_else(|| anyhow!("no node at path '{node_path}' in '{path}'"))
            })
            .collect::<Result<Vec<_>>>()?
    };

    let report = MissingScriptFinder::new(&config).scan(&hierarchy, &selection, mode);
    for line in report.lines() {
        println!("{line}");
    }
    Ok(())
}

fn cmd_list(path: &str) -> Result<()> {
    let hierarchy = load_hierarchy(path, &ComponentRegistry::with_builtin())?;
    println!("{:<5} {:<10} {:<8} {}", "Idx", "Slots", "Missing", "Path");
    println!("{}", "-".repeat(80));
    for (index, entity) in hierarchy.nodes().iter().enumerate() {
        let slots = hierarchy.slots(*entity);
        let missing = slots.iter().filter(|slot| slot.is_missing()).count();
        let node_path = hierarchy.path_of(*entity, "/").unwrap_or_else(|| "-".to_string());
        println!("{:<5} {:<10} {:<8} {}", index, slots.len(), missing, node_path);
    }
    Ok(())
}

fn load_hierarchy(path: &str, registry: &ComponentRegistry) -> Result<SceneHierarchy> {
    let normalized = Path::new(path).canonicalize().unwrap_or_else(|_| Path::new(path).to_path_buf());
    SceneHierarchy::load_from_path(&normalized, registry)
        .with_context(|| format!("loading hierarchy '{}'", normalized.display()))
}
