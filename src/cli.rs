use crate::config::ToolkitConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    config_path: Option<String>,
    max_logs: Option<usize>,
    open: Option<bool>,
    shake: Option<bool>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Use --config/--max-logs/--open/--shake with values.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config_path = Some(value),
                "max-logs" => {
                    let parsed = value.parse::<usize>().with_context(|| format!("Invalid max-logs '{value}'"))?;
                    if parsed == 0 {
                        bail!("Invalid max-logs '0'. Keep at least one log entry.");
                    }
                    overrides.max_logs = Some(parsed);
                }
                "open" => overrides.open = Some(parse_bool_flag("open", &value)?),
                "shake" => overrides.shake = Some(parse_bool_flag("shake", &value)?),
                _ => bail!("Unknown flag '{flag}'. Supported flags: --config, --max-logs, --open, --shake."),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    pub fn into_config_overrides(self) -> ToolkitConfigOverrides {
        ToolkitConfigOverrides { max_logs: self.max_logs, open_on_start: self.open, shake_to_open: self.shake }
    }

    #[cfg(test)]
    pub fn as_tuple(&self) -> (Option<usize>, Option<bool>, Option<bool>) {
        (self.max_logs, self.open, self.shake)
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}
