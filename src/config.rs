use crate::cli::CliArgs;
use crate::item::Tone;
use anyhow::{Context, Result, anyhow, bail};
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_REFRESH_MS: u64 = 2_000;
pub const MIN_REFRESH_MS: u64 = 500;
pub const DEFAULT_SHELL: &str = "/bin/sh";
pub const DEFAULT_LOG_TAIL: u64 = 200;
pub const DEFAULT_NOTIFICATION_SECS: u64 = 4;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct BerthConfigFile {
    no_nerd_fonts: Option<bool>,
    refresh_ms: Option<u64>,
    shell: Option<String>,
    log_tail: Option<u64>,
    notification_secs: Option<u64>,
    theme: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Theme {
    pub primary: Color,
    pub border: Color,
    pub text: Color,
    pub muted: Color,
    pub selected: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Rgb(52, 211, 153),
            border: Color::Rgb(71, 85, 105),
            text: Color::Rgb(226, 232, 240),
            muted: Color::Rgb(140, 156, 178),
            selected: Color::Rgb(96, 165, 250),
            success: Color::Rgb(74, 222, 128),
            warning: Color::Rgb(251, 191, 36),
            error: Color::Rgb(248, 113, 113),
        }
    }
}

impl Theme {
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let color = Color::from_str(value.trim())
            .map_err(|_| anyhow!("invalid color '{value}' for theme key '{key}'"))?;
        let slot = match key.trim().to_ascii_lowercase().as_str() {
            "primary" => &mut self.primary,
            "border" => &mut self.border,
            "text" => &mut self.text,
            "muted" => &mut self.muted,
            "selected" => &mut self.selected,
            "success" => &mut self.success,
            "warning" => &mut self.warning,
            "error" => &mut self.error,
            other => bail!("unknown theme key '{other}'"),
        };
        *slot = color;
        Ok(())
    }

    pub fn tone(&self, tone: Tone) -> Color {
        match tone {
            Tone::Primary => self.primary,
            Tone::Text => self.text,
            Tone::Muted => self.muted,
            Tone::Selected => self.selected,
            Tone::Success => self.success,
            Tone::Warning => self.warning,
            Tone::Error => self.error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: Option<PathBuf>,
    pub no_nerd_fonts: bool,
    pub refresh_ms: u64,
    pub shell: String,
    pub log_tail: u64,
    pub notification_secs: u64,
    pub theme: Theme,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: None,
            no_nerd_fonts: false,
            refresh_ms: DEFAULT_REFRESH_MS,
            shell: DEFAULT_SHELL.to_string(),
            log_tail: DEFAULT_LOG_TAIL,
            notification_secs: DEFAULT_NOTIFICATION_SECS,
            theme: Theme::default(),
        }
    }
}

impl AppConfig {
    pub fn load(args: &CliArgs) -> Result<Self> {
        let path = match &args.config {
            Some(path) => Some(path.clone()),
            None => discover_config_path(),
        };
        let file = match &path {
            Some(path) => read_config_file(path)?,
            None => BerthConfigFile::default(),
        };

        let mut config = Self::from_file(file)?;
        config.source = path;
        config.apply_cli(args)?;
        Ok(config)
    }

    fn from_file(file: BerthConfigFile) -> Result<Self> {
        let mut config = Self::default();
        if let Some(no_nerd_fonts) = file.no_nerd_fonts {
            config.no_nerd_fonts = no_nerd_fonts;
        }
        if let Some(refresh_ms) = file.refresh_ms {
            config.refresh_ms = refresh_ms;
        }
        if let Some(shell) = file.shell.filter(|shell| !shell.trim().is_empty()) {
            config.shell = shell;
        }
        if let Some(log_tail) = file.log_tail {
            config.log_tail = log_tail;
        }
        if let Some(secs) = file.notification_secs {
            config.notification_secs = secs.max(1);
        }
        for (key, value) in &file.theme {
            config
                .theme
                .set(key, value)
                .context("invalid theme in config file")?;
        }
        config.refresh_ms = config.refresh_ms.max(MIN_REFRESH_MS);
        Ok(config)
    }

    fn apply_cli(&mut self, args: &CliArgs) -> Result<()> {
        if args.no_nerd_fonts {
            self.no_nerd_fonts = true;
        }
        if let Some(refresh_ms) = args.refresh_ms {
            self.refresh_ms = refresh_ms.max(MIN_REFRESH_MS);
        }
        for spec in args.theme.iter().filter(|spec| !spec.trim().is_empty()) {
            let (key, value) = spec
                .split_once('=')
                .with_context(|| format!("invalid --theme entry '{spec}', expected key=color"))?;
            self.theme.set(key, value)?;
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<BerthConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn parse_config(raw: &str) -> Result<BerthConfigFile> {
    if raw.trim().is_empty() {
        return Ok(BerthConfigFile::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("BERTH_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("berth.yaml"),
        PathBuf::from("berth.yml"),
        PathBuf::from(".berth.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/berth/config.yaml"),
            PathBuf::from(&home).join(".config/berth/config.yml"),
            PathBuf::from(&home).join(".berth.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}
