use crate::model::Rules;
use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "pixelpup")]
#[command(about = "A terminal puppy that needs feeding, play, baths and naps")]
pub(crate) struct Cli {
    /// Whose puppy to load. Defaults to the settings file, then $USER.
    #[arg(long)]
    pub(crate) owner: Option<String>,

    /// Directory for settings, pets and the log file
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,

    /// Keep the pet in memory only (nothing is saved)
    #[arg(long, default_value_t = false)]
    pub(crate) memory: bool,

    /// Never call the text model; always use the built-in lines
    #[arg(long, default_value_t = false)]
    pub(crate) offline: bool,

    /// Seed for cosmetic randomness
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// How often the pet's needs are brought up to date (milliseconds)
    #[arg(long)]
    pub(crate) tick_ms: Option<u64>,

    /// Force monochrome (no colors)
    #[arg(long, default_value_t = false)]
    pub(crate) mono: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum StorageBackend {
    File,
    Memory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct GeminiSettings {
    pub(crate) enabled: bool,
    pub(crate) api_base: String,
    pub(crate) model: String,
    pub(crate) timeout_ms: u64,
    /// Environment variables tried in order for the API key.
    pub(crate) api_key_env: Vec<String>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            timeout_ms: 8_000,
            api_key_env: vec!["GEMINI_API_KEY".to_string(), "API_KEY".to_string()],
        }
    }
}

impl GeminiSettings {
    pub(crate) fn api_key(&self) -> Option<String> {
        self.api_key_env
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) owner: Option<String>,
    pub(crate) storage: StorageBackend,
    pub(crate) tick_ms: u64,
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
    pub(crate) seed: u64,
    pub(crate) gemini: GeminiSettings,
    pub(crate) rules: Rules,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            owner: None,
            storage: StorageBackend::File,
            tick_ms: 1_000,
            fps_cap: 30,
            enable_color: true,
            seed: 0xC0FFEE_u64,
            gemini: GeminiSettings::default(),
            rules: Rules::default(),
        }
    }
}

impl Settings {
    /// Command-line flags win over the settings file.
    pub(crate) fn apply_cli(&mut self, cli: &Cli) {
        if let Some(owner) = &cli.owner {
            self.owner = Some(owner.clone());
        }
        if cli.memory {
            self.storage = StorageBackend::Memory;
        }
        if cli.offline {
            self.gemini.enabled = false;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(ms) = cli.tick_ms {
            self.tick_ms = ms;
        }
        if cli.mono {
            self.enable_color = false;
        }
        self.tick_ms = self.tick_ms.clamp(100, 60_000);
        self.fps_cap = self.fps_cap.clamp(5, 120);
    }

    pub(crate) fn owner_id(&self) -> String {
        self.owner
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "default".to_string())
    }
}

pub(crate) struct Paths {
    pub(crate) data_dir: PathBuf,
    pub(crate) settings_path: PathBuf,
    pub(crate) pets_dir: PathBuf,
    pub(crate) log_path: PathBuf,
}

impl Paths {
    pub(crate) fn under(dir: &Path) -> Self {
        Self {
            data_dir: dir.to_path_buf(),
            settings_path: dir.join("settings.json"),
            pets_dir: dir.join("pets"),
            log_path: dir.join("pixelpup.log"),
        }
    }
}

pub(crate) fn project_paths(override_dir: Option<&Path>) -> Result<Paths> {
    let dir = match override_dir {
        Some(d) => d.to_path_buf(),
        None => ProjectDirs::from("com", "pixelpup", "PixelPup")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create data directory {}", dir.display()))?;
    Ok(Paths::under(&dir))
}

/// Missing file means defaults. A broken file also means defaults, with a warning.
pub(crate) fn load_settings(path: &Path) -> Settings {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return Settings::default(),
    };
    match serde_json::from_str::<Settings>(&raw) {
        Ok(s) => s,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
            Settings::default()
        }
    }
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// Best-effort atomic replace on the same filesystem.
pub(crate) fn atomic_rename(from: &Path, to: &Path) -> std::io::Result<()> {
    // Windows refuses to rename over an existing file.
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
}
