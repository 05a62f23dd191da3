use anyhow::{Context, Result};
use kestrel_toolkit::cli::CliOverrides;
use kestrel_toolkit::config::ToolkitConfig;
use kestrel_toolkit::input::{ConsoleInput, InputEvent};
use kestrel_toolkit::time::Time;
use kestrel_toolkit::{LogHub, RuntimeConsole};
use std::thread;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/toolkit.json";
const FRAME_COUNT: u64 = 30;
const FRAME_TIME: Duration = Duration::from_millis(16);
const PRODUCERS: usize = 3;

fn main() {
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(cli) {
        eprintln!("Application error: {err:?}");
        std::process::exit(1);
    }
}

fn run(cli: CliOverrides) -> Result<()> {
    let mut config = ToolkitConfig::load_explicit_or_default(cli.config_path(), DEFAULT_CONFIG_PATH)?;
    let overrides = cli.into_config_overrides();
    if !overrides.is_empty() {
        eprintln!("[config] CLI overrides: {}", overrides.applied_fields().join(", "));
    }
    config.apply_overrides(&overrides);
    config.validate().context("Invalid configuration after CLI overrides")?;

    let hub = LogHub::new();
    hub.install_global(log::LevelFilter::Trace)?;
    hub.install_panic_hook();

    let mut console = RuntimeConsole::new(&config.console)?;
    console.start(&hub);

    let producers = (0..PRODUCERS)
        .map(|worker| {
            thread::Builder::new()
                .name(format!("producer-{worker}"))
                .spawn(move || {
                    for step in 0..4 {
                        log::info!("worker {worker} heartbeat");
                        if step == 2 {
                            log::warn!("worker {worker} is running behind");
                        }
                    }
                    if worker == 0 {
                        log::error!("worker {worker} lost its connection");
                    }
                })
                .context("Failed to spawn log producer")
        })
        .collect::<Result<Vec<_>>>()?;

    let mut time = Time::new();
    let mut input = ConsoleInput::new();
    let mut applied = 0;
    for _ in 0..FRAME_COUNT {
        time.tick();
        if time.frame() == 1 && !console.is_visible() {
            let key = console.toggle_key().to_event_key();
            input.push(InputEvent::Key { key: key.clone(), pressed: true });
            input.push(InputEvent::Key { key, pressed: false });
        }
        applied += console.tick(&input);
        input.clear_frame();
        thread::sleep(FRAME_TIME);
    }
    let failed_producers = join_producers(producers);
    if failed_producers > 0 {
        eprintln!("[console] {failed_producers} log producer(s) panicked");
    }
    applied += console.drain_queued();

    println!(
        "Console {} after {} frames ({:.2}s), {} events applied, {} entries kept",
        if console.is_visible() { "open" } else { "closed" },
        time.frame(),
        time.elapsed_seconds(),
        applied,
        console.buffer().len()
    );
    for line in console.lines() {
        match line.repeat {
            Some(count) => println!("[{}] {} ({count})", line.severity, line.text),
            None => println!("[{}] {}", line.severity, line.text),
        }
    }
    console.stop();
    Ok(())
}

/// Waits for every producer and returns how many of them panicked.
fn join_producers(producers: Vec<thread::JoinHandle<()>>) -> usize {
    producers.into_iter().map(|producer| producer.join()).filter(Result::is_err).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panicked_producers_are_counted() {
        let producers = vec![thread::spawn(|| {}), thread::spawn(|| panic!("producer failed")), thread::spawn(|| {})];
        assert_eq!(join_producers(producers), 1);
    }
}
