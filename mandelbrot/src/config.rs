//! Viewer configuration, loaded from TOML. Every field is optional.

use backend::input::Key;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Frames per second cap, `None` to present as fast as the driver allows.
    pub frame_limit: Option<u32>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Mandelbrot".to_string(),
            frame_limit: Some(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Pan distance per frame at the default zoom.
    pub pan_step: f32,
    /// Multiplier applied to the zoom per frame; must be greater than 1.
    pub zoom_factor: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            pan_step: 0.01,
            zoom_factor: 1.05,
        }
    }
}

/// Shader file names, relative to the shader directory given on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderFiles {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for ShaderFiles {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("shader.vert"),
            fragment: PathBuf::from("shader.frag"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bindings {
    pub pan_left: Key,
    pub pan_right: Key,
    pub pan_down: Key,
    pub pan_up: Key,
    pub zoom_out: Key,
    pub zoom_in: Key,
    pub reset: Key,
    pub quit: Key,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            pan_left: Key::H,
            pan_right: Key::L,
            pan_down: Key::J,
            pan_up: Key::K,
            zoom_out: Key::M,
            zoom_in: Key::N,
            reset: Key::C,
            quit: Key::Escape,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optional palette image sampled by the fragment shader.
    pub color_map: Option<PathBuf>,
    pub window: WindowConfig,
    pub navigation: NavigationConfig,
    pub shaders: ShaderFiles,
    pub bindings: Bindings,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config = Self::from_toml(&contents)?;
        log::debug!("configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Config, ConfigError> {
        let config: Config =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be positive, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if !self.navigation.zoom_factor.is_finite() || self.navigation.zoom_factor <= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "zoom_factor must be greater than 1, got {}",
                self.navigation.zoom_factor
            )));
        }
        if !self.navigation.pan_step.is_finite() || self.navigation.pan_step <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "pan_step must be positive, got {}",
                self.navigation.pan_step
            )));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_viewer() {
        let config = Config::default();
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.window.title, "Mandelbrot");
        assert_eq!(config.bindings.zoom_in, Key::N);
        assert_eq!(config.bindings.quit, Key::Escape);
        assert_eq!(config.shaders.vertex, PathBuf::from("shader.vert"));
        assert!(config.color_map.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            color_map = "palette.png"

            [navigation]
            zoom_factor = 1.5

            [bindings]
            zoom_in = "Equals"
            zoom_out = "Minus"
            "#,
        )
        .unwrap();

        assert_eq!(config.navigation.zoom_factor, 1.5);
        assert_eq!(config.navigation.pan_step, NavigationConfig::default().pan_step);
        assert_eq!(config.bindings.zoom_in, Key::Equals);
        assert_eq!(config.bindings.pan_left, Key::H);
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.color_map, Some(PathBuf::from("palette.png")));
    }

    #[test]
    fn zoom_factor_must_grow() {
        let err = Config::from_toml("[navigation]\nzoom_factor = 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zoom_factor_must_be_finite() {
        let err = Config::from_toml("[navigation]\nzoom_factor = inf\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_key_name_is_a_parse_error() {
        let err = Config::from_toml("[bindings]\nquit = \"F13\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn dumped_config_loads_back() {
        let mut config = Config::default();
        config.window.frame_limit = Some(30);
        config.bindings.reset = Key::R;
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::load(Path::new("/nonexistent/mandelbrot.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
