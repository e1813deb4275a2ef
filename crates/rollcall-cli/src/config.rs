use rollcall_core::PresencePolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Runtime configuration: defaults, then an optional TOML file, then
/// `ROLLCALL_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// V4L2 device path of the webcam.
    pub camera_device: String,
    /// Requested capture size; the driver may pick another.
    pub frame_width: u32,
    pub frame_height: u32,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Cosine similarity needed for a face to match a registered employee.
    pub similarity_threshold: f32,
    /// Frames discarded after opening the camera (auto-exposure settling).
    pub warmup_frames: usize,
    /// Frames captured when registering a face.
    pub frames_per_enroll: usize,
    /// Delay between monitor ticks.
    pub tick_ms: u64,
    /// Check-in suppression after a check-out.
    pub cooldown_secs: i64,
    /// Zone presence needed for a check-out.
    pub dwell_secs: i64,
    /// Dwell timers for faces unseen this long are dropped.
    pub lost_after_ms: i64,
    /// Size of the centered check-out zone in pixels.
    pub zone_width: u32,
    pub zone_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_device: "/dev/video0".to_string(),
            frame_width: 640,
            frame_height: 480,
            model_dir: rollcall_core::default_model_dir(),
            db_path: data_dir().join("attendance.db"),
            similarity_threshold: 0.40,
            warmup_frames: 4,
            frames_per_enroll: 5,
            tick_ms: 15,
            cooldown_secs: 60,
            dwell_secs: 2,
            lost_after_ms: 1000,
            zone_width: 180,
            zone_height: 180,
        }
    }
}

fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    std::env::var(var).map(PathBuf::from).unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(fallback)
    })
}

fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share").join("rollcall")
}

/// `$XDG_CONFIG_HOME/rollcall/config.toml`
pub fn default_config_path() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config").join("rollcall/config.toml")
}

impl Config {
    /// Load configuration. An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let p = default_config_path();
                if p.exists() {
                    Self::from_file(&p)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display.clone(),
            source,
        })?;
        tracing::debug!(path = %display, "loaded config file");
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("ROLLCALL_CAMERA_DEVICE") {
            self.camera_device = v;
        }
        if let Ok(v) = std::env::var("ROLLCALL_MODEL_DIR") {
            self.model_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ROLLCALL_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        self.frame_width = env_or("ROLLCALL_FRAME_WIDTH", self.frame_width);
        self.frame_height = env_or("ROLLCALL_FRAME_HEIGHT", self.frame_height);
        self.similarity_threshold = env_or("ROLLCALL_SIMILARITY_THRESHOLD", self.similarity_threshold);
        self.warmup_frames = env_or("ROLLCALL_WARMUP_FRAMES", self.warmup_frames);
        self.frames_per_enroll = env_or("ROLLCALL_FRAMES_PER_ENROLL", self.frames_per_enroll);
        self.tick_ms = env_or("ROLLCALL_TICK_MS", self.tick_ms);
        self.cooldown_secs = env_or("ROLLCALL_COOLDOWN_SECS", self.cooldown_secs);
        self.dwell_secs = env_or("ROLLCALL_DWELL_SECS", self.dwell_secs);
        self.lost_after_ms = env_or("ROLLCALL_LOST_AFTER_MS", self.lost_after_ms);
        self.zone_width = env_or("ROLLCALL_ZONE_WIDTH", self.zone_width);
        self.zone_height = env_or("ROLLCALL_ZONE_HEIGHT", self.zone_height);
    }

    /// Path to the SCRFD detection model.
    pub fn scrfd_model_path(&self) -> String {
        self.model_dir
            .join("det_10g.onnx")
            .to_string_lossy()
            .into_owned()
    }

    /// Path to the ArcFace recognition model.
    pub fn arcface_model_path(&self) -> String {
        self.model_dir
            .join("w600k_r50.onnx")
            .to_string_lossy()
            .into_owned()
    }

    pub fn presence_policy(&self) -> PresencePolicy {
        PresencePolicy {
            cooldown: chrono::Duration::seconds(self.cooldown_secs),
            dwell: chrono::Duration::seconds(self.dwell_secs),
            lost_after: chrono::Duration::milliseconds(self.lost_after_ms),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    parse_or(std::env::var(key).ok(), default)
}

/// Parse `raw`, keeping `default` when it is absent or unparsable.
fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.camera_device, "/dev/video0");
        assert_eq!((c.zone_width, c.zone_height), (180, 180));
        let p = c.presence_policy();
        assert_eq!(p.cooldown, chrono::Duration::seconds(60));
        assert_eq!(p.dwell, chrono::Duration::seconds(2));
        assert!(c.arcface_model_path().ends_with("w600k_r50.onnx"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cooldown_secs = 90\ncamera_device = \"/dev/video4\"\n").unwrap();

        let c = Config::from_file(&path).unwrap();

        assert_eq!(c.cooldown_secs, 90);
        assert_eq!(c.camera_device, "/dev/video4");
        assert_eq!(c.dwell_secs, 2);
        assert_eq!(c.tick_ms, 15);
    }

    #[test]
    fn test_bad_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "tick_ms = \"fast\"\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        match err {
            ConfigError::Parse { path: p, .. } => assert!(p.ends_with("bad.toml")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/rollcall.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_env_or_unset_keeps_default() {
        assert_eq!(env_or("ROLLCALL_TEST_UNSET_KEY_XYZ", 7u64), 7);
    }

    #[test]
    fn test_parse_or_ignores_garbage() {
        assert_eq!(parse_or(Some("fast".into()), 15u64), 15);
        assert_eq!(parse_or(Some("-3".into()), 180u32), 180);
        assert_eq!(parse_or(Some(" 0.55 ".into()), 0.40f32), 0.55);
        assert_eq!(parse_or(None, 60i64), 60);
    }
}
