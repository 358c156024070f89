//! Trimmer configuration.
//!
//! Built once at startup from, in increasing precedence: defaults, an
//! optional JSON file, then `STRIM_*` environment variables. The validated
//! value is shared read-only by every worker.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strim_media::silence_removal::{
    TrimPolicy, DEFAULT_MIN_SILENCE_SECONDS, DEFAULT_NOISE_FLOOR_DB, DEFAULT_PADDING_FRAMES,
};
use thiserror::Error;
use tracing::warn;

/// Environment variable naming the JSON config file.
pub const CONFIG_FILE_ENV: &str = "STRIM_CONFIG";

/// Fatal configuration problems, reported before any file is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Root folder does not exist or is not a directory: {}", .0.display())]
    RootFolderMissing(PathBuf),

    #[error("destination_folder is required when replace_files is false")]
    DestinationRequired,

    #[error("worker_count must be between 1 and {available} (available parallelism), got {requested}")]
    WorkerCount { requested: u32, available: usize },

    #[error("noise_floor_db must be a negative finite number, got {0}")]
    InvalidNoiseFloor(f64),

    #[error("min_silence_seconds must be a non-negative finite number, got {0}")]
    InvalidMinSilence(f64),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    ParseFile {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// What to do when two sources map to the same output path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Recreate the source subdirectory layout under the destination folder
    #[default]
    Mirror,
    /// Flatten, suffixing duplicate names with ` (1)`, ` (2)`, ...
    Rename,
    /// Flatten, failing every duplicate after the first
    Error,
}

impl CollisionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionPolicy::Mirror => "mirror",
            CollisionPolicy::Rename => "rename",
            CollisionPolicy::Error => "error",
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mirror" => Ok(CollisionPolicy::Mirror),
            "rename" => Ok(CollisionPolicy::Rename),
            "error" => Ok(CollisionPolicy::Error),
            other => Err(format!("expected mirror, rename or error, got {other:?}")),
        }
    }
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated, immutable trimmer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimConfig {
    /// Folder scanned for audio files
    #[serde(default = "default_root_folder")]
    pub root_folder: PathBuf,
    /// Descend into subdirectories
    #[serde(default = "default_true")]
    pub scan_subdirectories: bool,
    /// Overwrite sources in place instead of writing copies
    #[serde(default)]
    pub replace_files: bool,
    /// Output folder, required unless `replace_files`
    #[serde(default = "default_destination_folder")]
    pub destination_folder: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub trim_start: bool,
    #[serde(default = "default_true")]
    pub trim_end: bool,
    /// Edge silence shorter than this is kept
    #[serde(default = "default_min_silence_seconds")]
    pub min_silence_seconds: f64,
    /// Frames kept around the detected audio
    #[serde(default = "default_padding_frames")]
    pub padding_frames: u32,
    /// Silence threshold in dB
    #[serde(default = "default_noise_floor_db")]
    pub noise_floor_db: f64,
    /// Files processed in parallel
    #[serde(default = "default_worker_count")]
    pub worker_count: u32,
    /// Copy tags from the source onto the output
    #[serde(default = "default_true")]
    pub save_metadata: bool,
    /// Output name clash handling when writing copies
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
    /// Detect and report only, write nothing
    #[serde(default)]
    pub dry_run: bool,
}

fn default_root_folder() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_destination_folder() -> Option<PathBuf> {
    Some(default_root_folder().join("trimmed"))
}

fn default_true() -> bool {
    true
}

fn default_min_silence_seconds() -> f64 {
    DEFAULT_MIN_SILENCE_SECONDS
}

fn default_padding_frames() -> u32 {
    DEFAULT_PADDING_FRAMES
}

fn default_noise_floor_db() -> f64 {
    DEFAULT_NOISE_FLOOR_DB
}

fn default_worker_count() -> u32 {
    1
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            root_folder: default_root_folder(),
            scan_subdirectories: true,
            replace_files: false,
            destination_folder: default_destination_folder(),
            trim_start: true,
            trim_end: true,
            min_silence_seconds: default_min_silence_seconds(),
            padding_frames: default_padding_frames(),
            noise_floor_db: default_noise_floor_db(),
            worker_count: default_worker_count(),
            save_metadata: true,
            collision_policy: CollisionPolicy::default(),
            dry_run: false,
        }
    }
}

impl TrimConfig {
    /// Load, merge and validate the configuration.
    ///
    /// `config_file` takes precedence over `STRIM_CONFIG`. `.env` files are
    /// expected to be loaded by the caller.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from));

        let base = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        let config = base.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `STRIM_*` overrides fetched through `lookup`.
    ///
    /// Flags keep the legacy prompt semantics: a flag that defaults to true
    /// only turns off for an explicit no (`n`, `no`, `false`, `0`, `off`), a
    /// flag that defaults to false only turns on for an explicit yes. An
    /// empty value leaves the setting as it was.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("STRIM_ROOT_FOLDER").filter(|v| !v.trim().is_empty()) {
            self.root_folder = PathBuf::from(v.trim());
        }
        if let Some(v) = lookup("STRIM_DESTINATION_FOLDER") {
            let v = v.trim();
            // Present but empty clears the destination
            self.destination_folder = (!v.is_empty()).then(|| PathBuf::from(v));
        }

        apply_flag(&lookup, "STRIM_SCAN_SUBDIRECTORIES", true, &mut self.scan_subdirectories);
        apply_flag(&lookup, "STRIM_REPLACE_FILES", false, &mut self.replace_files);
        apply_flag(&lookup, "STRIM_TRIM_START", true, &mut self.trim_start);
        apply_flag(&lookup, "STRIM_TRIM_END", true, &mut self.trim_end);
        apply_flag(&lookup, "STRIM_SAVE_METADATA", true, &mut self.save_metadata);
        apply_flag(&lookup, "STRIM_DRY_RUN", false, &mut self.dry_run);

        apply_parsed(&lookup, "STRIM_MIN_SILENCE_SECONDS", &mut self.min_silence_seconds)?;
        apply_parsed(&lookup, "STRIM_PADDING_FRAMES", &mut self.padding_frames)?;
        apply_parsed(&lookup, "STRIM_NOISE_FLOOR_DB", &mut self.noise_floor_db)?;
        apply_parsed(&lookup, "STRIM_WORKER_COUNT", &mut self.worker_count)?;
        apply_parsed(&lookup, "STRIM_COLLISION_POLICY", &mut self.collision_policy)?;

        Ok(self)
    }

    /// Validate against the machine's available parallelism.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.validate_with(available)
    }

    /// Validate with an explicit parallelism limit.
    pub fn validate_with(&self, available_parallelism: usize) -> Result<(), ConfigError> {
        if !self.root_folder.is_dir() {
            return Err(ConfigError::RootFolderMissing(self.root_folder.clone()));
        }

        if !self.replace_files {
            let destination = self
                .destination_folder
                .as_ref()
                .ok_or(ConfigError::DestinationRequired)?;
            if same_path(destination, &self.root_folder) {
                warn!(
                    destination = %destination.display(),
                    "Destination folder is the root folder, outputs may overwrite sources"
                );
            }
        }

        if self.worker_count == 0 || self.worker_count as usize > available_parallelism {
            return Err(ConfigError::WorkerCount {
                requested: self.worker_count,
                available: available_parallelism,
            });
        }

        if !self.noise_floor_db.is_finite() || self.noise_floor_db >= 0.0 {
            return Err(ConfigError::InvalidNoiseFloor(self.noise_floor_db));
        }

        if !self.min_silence_seconds.is_finite() || self.min_silence_seconds < 0.0 {
            return Err(ConfigError::InvalidMinSilence(self.min_silence_seconds));
        }

        Ok(())
    }

    /// Folder outputs are written under, `None` when replacing in place.
    pub fn output_root(&self) -> Option<&Path> {
        if self.replace_files {
            None
        } else {
            self.destination_folder.as_deref()
        }
    }

    /// Detector/planner settings.
    pub fn policy(&self) -> TrimPolicy {
        TrimPolicy::default()
            .with_noise_floor_db(self.noise_floor_db)
            .with_padding_frames(self.padding_frames)
            .with_min_silence_seconds(self.min_silence_seconds)
            .with_edges(self.trim_start, self.trim_end)
    }
}

/// Interpret a prompt-style yes/no answer.
pub fn parse_flag(value: &str, default: bool) -> Option<bool> {
    let value = value.trim().to_ascii_lowercase();
    if value.is_empty() {
        return None;
    }
    Some(if default {
        !matches!(value.as_str(), "n" | "no" | "false" | "0" | "off")
    } else {
        matches!(value.as_str(), "y" | "yes" | "true" | "1" | "on")
    })
}

fn apply_flag<G>(get: &G, key: &str, default: bool, target: &mut bool)
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(flag) = get(key).and_then(|v| parse_flag(&v, default)) {
        *target = flag;
    }
}

fn apply_parsed<G, T>(get: &G, key: &str, target: &mut T) -> Result<(), ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = get(key) else {
        return Ok(());
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    *target = trimmed.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
