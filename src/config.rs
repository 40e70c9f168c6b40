use carousel::Tuning;
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::path::{Path, PathBuf};
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    #[default]
    Windowed,
    Maximized,
    Fullscreen,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Directory of `<slug>.json` case files.
    pub cases_dir: PathBuf,
    pub base_path: String,
    pub site_url: String,
    pub image_root: PathBuf,
    /// Newest published cases shown on the carousel.
    pub max_items: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            cases_dir: PathBuf::from("data/cases"),
            base_path: String::new(),
            site_url: "http://localhost:3000".to_string(),
            image_root: PathBuf::from("public"),
            max_items: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub mode: WindowMode,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Folio".to_string(),
            width: 1280,
            height: 800,
            mode: WindowMode::Windowed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    pub content: ContentConfig,
    pub window: WindowConfig,
    pub carousel: Tuning,
}

/// Command-line values that win over the file on every (re)load.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cases_dir: Option<PathBuf>,
    pub site_url: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.cases_dir {
            config.content.cases_dir = dir.clone();
        }
        if let Some(url) = &self.site_url {
            config.content.site_url = url.clone();
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "bugrov", "folio").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("FOLIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_or_default(path: &Path) -> Config {
    match load_config(path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Falling back to default config: {}", e);
            Config::default()
        }
    }
}

pub fn write_default_config(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(path, DEFAULT_CONFIG)?;
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

use crate::events::AppEvent;
use async_channel::Sender;

fn classify(event: &notify::Event, config_path: &Path, cases_dir: &Path) -> Option<AppEvent> {
    if !matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) {
        return None;
    }

    if event.paths.iter().any(|p| p == config_path) {
        Some(AppEvent::ConfigReload)
    } else if event.paths.iter().any(|p| {
        p.starts_with(cases_dir) && p.extension().and_then(|e| e.to_str()) == Some("json")
    }) {
        Some(AppEvent::ContentReload)
    } else {
        None
    }
}

/// Absolute config file path and the directory to watch for it. A bare
/// file name lives in the working directory.
fn config_watch_paths(config_path: &Path) -> (PathBuf, PathBuf) {
    let dir = match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let dir = fs_err::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    let file = match config_path.file_name() {
        Some(name) => dir.join(name),
        None => config_path.to_path_buf(),
    };
    (file, dir)
}

/// Watches the config file's directory and the cases directory, forwarding
/// reload events until the receiver goes away.
pub async fn run_async_watcher(config_path: PathBuf, cases_dir: PathBuf, tx: Sender<AppEvent>) {
    if let Some(parent) = config_path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = fs_err::create_dir_all(parent)
    {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }
    let (config_path, config_dir) = config_watch_paths(&config_path);

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    // Events carry whatever form of the path was registered.
    let cases_dir = fs_err::canonicalize(&cases_dir).unwrap_or(cases_dir);
    match watcher.watch(&cases_dir, RecursiveMode::NonRecursive) {
        Ok(()) => log::debug!("Watching cases in {}", cases_dir.display()),
        Err(e) => log::warn!("Not watching cases directory {}: {}", cases_dir.display(), e),
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                if let Some(app_event) = classify(&event, &config_path, &cases_dir)
                    && tx.send(app_event).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind};
    use std::time::Duration;

    fn from_toml(s: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(s, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config_file_matches_defaults() {
        assert_eq!(from_toml(DEFAULT_CONFIG), Config::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = from_toml(
            r#"
            [content]
            site_url = "https://bugrov.space"

            [carousel]
            duplication = 5
            hide_delay_ms = 300
            "#,
        );

        assert_eq!(config.content.site_url, "https://bugrov.space");
        assert_eq!(config.content.cases_dir, PathBuf::from("data/cases"));
        assert_eq!(config.content.max_items, 5);
        assert_eq!(config.carousel.duplication, 5);
        assert_eq!(config.carousel.hide_delay, Duration::from_millis(300));
        assert_eq!(config.carousel.mobile_breakpoint, 768.0);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config = from_toml("[content]\nsite_url = \"https://a.example\"\n");
        let overrides = Overrides {
            cases_dir: Some(PathBuf::from("/srv/cases")),
            site_url: None,
        };
        overrides.apply(&mut config);

        assert_eq!(config.content.cases_dir, PathBuf::from("/srv/cases"));
        assert_eq!(config.content.site_url, "https://a.example");
    }

    #[test]
    fn test_window_mode_deserialization() {
        let cases = vec![
            ("\"windowed\"", WindowMode::Windowed),
            ("\"Maximized\"", WindowMode::Maximized),
            ("\"FULLSCREEN\"", WindowMode::Fullscreen),
        ];

        for (json, expected) in cases {
            let deserialized: WindowMode = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
        assert!(serde_json::from_str::<WindowMode>("\"kiosk\"").is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs_err::write(&path, "[window]\nmode = \"maximized\"\nwidth = 1600\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.window.mode, WindowMode::Maximized);
        assert_eq!(config.window.width, 1600);
        assert_eq!(config.window.height, 800);
    }

    #[test]
    fn test_missing_file_and_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert_eq!(load_config(&missing).unwrap().window, WindowConfig::default());

        let broken = dir.path().join("config.toml");
        fs_err::write(&broken, "[carousel]\nduplication = \"many\"\n").unwrap();
        assert!(load_config(&broken).is_err());
        assert_eq!(load_or_default(&broken).carousel, Tuning::default());
    }

    #[test]
    fn test_write_default_config_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default_config(&path).unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), DEFAULT_CONFIG);

        fs_err::write(&path, "# mine\n").unwrap();
        write_default_config(&path).unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "# mine\n");
    }

    #[test]
    fn test_config_watch_paths() {
        let cwd = fs_err::canonicalize(".").unwrap();
        assert_eq!(
            config_watch_paths(Path::new("config.toml")),
            (cwd.join("config.toml"), cwd.clone())
        );

        let dir = tempfile::tempdir().unwrap();
        let root = fs_err::canonicalize(dir.path()).unwrap();
        assert_eq!(
            config_watch_paths(&dir.path().join("config.toml")),
            (root.join("config.toml"), root)
        );
    }

    #[test]
    fn test_classify_watch_events() {
        let config_path = PathBuf::from("/cfg/folio/config.toml");
        let cases_dir = PathBuf::from("/site/data/cases");
        let event = |kind, path: &str| notify::Event::new(kind).add_path(PathBuf::from(path));
        let create = EventKind::Create(CreateKind::File);

        assert!(matches!(
            classify(&event(create, "/cfg/folio/config.toml"), &config_path, &cases_dir),
            Some(AppEvent::ConfigReload)
        ));
        assert!(matches!(
            classify(&event(create, "/site/data/cases/alpha.json"), &config_path, &cases_dir),
            Some(AppEvent::ContentReload)
        ));
        assert!(
            classify(&event(create, "/site/data/cases/.alpha.json.swp"), &config_path, &cases_dir)
                .is_none()
        );
        assert!(
            classify(
                &event(EventKind::Access(AccessKind::Any), "/site/data/cases/alpha.json"),
                &config_path,
                &cases_dir
            )
            .is_none()
        );
    }
}
