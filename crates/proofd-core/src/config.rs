use crate::error::ConfigError;
use crate::position::Position;
use crate::time_format::TimeFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Merchant-facing popup configuration, as stored by the server and served
/// to the popup client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub text: TextConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingConfig {
    /// Time between popups.
    #[serde(default = "TimingConfig::default_interval", with = "millis")]
    pub interval: Duration,
    /// How long a popup stays fully visible.
    #[serde(default = "TimingConfig::default_display", with = "millis")]
    pub display_duration: Duration,
    /// Length of each slide animation (in and out).
    #[serde(default = "TimingConfig::default_animation", with = "millis")]
    pub animation_duration: Duration,
}

impl TimingConfig {
    fn default_interval() -> Duration { Duration::from_millis(15_000) }
    fn default_display() -> Duration { Duration::from_millis(5_000) }
    fn default_animation() -> Duration { Duration::from_millis(500) }

    /// Total time one popup occupies the screen.
    pub fn cycle_length(&self) -> Duration {
        self.display_duration + self.animation_duration * 2
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            interval: Self::default_interval(),
            display_duration: Self::default_display(),
            animation_duration: Self::default_animation(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Square,
    #[default]
    Rounded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub show_image: bool,
    #[serde(default = "default_true")]
    pub show_time_ago: bool,
    #[serde(default = "default_true")]
    pub show_price: bool,
    #[serde(default = "DisplayConfig::default_max_width")]
    pub max_width: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default = "DisplayConfig::default_image_size")]
    pub image_size: String,
    #[serde(default)]
    pub image_shape: Shape,
    #[serde(default = "default_true")]
    pub image_border: bool,
    #[serde(default = "default_true")]
    pub allow_close: bool,
    #[serde(default)]
    pub popup_shape: Shape,
}

impl DisplayConfig {
    fn default_max_width() -> String { "300px".into() }
    fn default_image_size() -> String { "50px".into() }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_image: true,
            show_time_ago: true,
            show_price: true,
            max_width: Self::default_max_width(),
            position: Position::default(),
            image_size: Self::default_image_size(),
            image_shape: Shape::Rounded,
            image_border: true,
            allow_close: true,
            popup_shape: Shape::Rounded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleConfig {
    #[serde(default = "StyleConfig::default_font_family")]
    pub font_family: String,
    #[serde(default = "StyleConfig::default_font_size")]
    pub font_size: String,
    #[serde(default = "Color::white")]
    pub background_color: Color,
    #[serde(default = "Color::black")]
    pub text_color: Color,
    #[serde(default = "StyleConfig::default_border_radius")]
    pub border_radius: String,
    #[serde(default = "StyleConfig::default_shadow")]
    pub shadow: String,
}

impl StyleConfig {
    fn default_font_family() -> String { "Arial, sans-serif".into() }
    fn default_font_size() -> String { "14px".into() }
    fn default_border_radius() -> String { "8px".into() }
    fn default_shadow() -> String { "0 2px 10px rgba(0,0,0,0.1)".into() }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_family: Self::default_font_family(),
            font_size: Self::default_font_size(),
            background_color: Color::white(),
            text_color: Color::black(),
            border_radius: Self::default_border_radius(),
            shadow: Self::default_shadow(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextConfig {
    #[serde(default = "TextConfig::default_template")]
    pub template: String,
    #[serde(default)]
    pub time_ago_format: TimeFormat,
}

impl TextConfig {
    fn default_template() -> String {
        "{customer} from {location} just purchased {product}".into()
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            template: Self::default_template(),
            time_ago_format: TimeFormat::default(),
        }
    }
}

fn default_true() -> bool { true }

/// HSLA color. `brightness` is the HSL lightness component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub hue: f64,
    pub saturation: f64,
    pub brightness: f64,
    pub alpha: f64,
}

impl Color {
    pub fn white() -> Self {
        Self { hue: 0.0, saturation: 0.0, brightness: 1.0, alpha: 1.0 }
    }

    pub fn black() -> Self {
        Self { hue: 0.0, saturation: 0.0, brightness: 0.0, alpha: 1.0 }
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    /// CSS `hsla()` paint string.
    pub fn to_paint_string(&self) -> String {
        format!(
            "hsla({}, {}%, {}%, {})",
            self.hue,
            self.saturation * 100.0,
            self.brightness * 100.0,
            self.alpha
        )
    }

    /// Check every component is finite and inside its range.
    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        let checks = [
            ("hue", self.hue, 360.0),
            ("saturation", self.saturation, 1.0),
            ("brightness", self.brightness, 1.0),
            ("alpha", self.alpha, 1.0),
        ];
        for (name, value, max) in checks {
            if !value.is_finite() || !(0.0..=max).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{field}.{name} must be between 0 and {max}, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_paint_string())
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("proofd")
    }

    /// Settings document location. `PROOFD_SETTINGS` overrides for testing.
    pub fn settings_path() -> PathBuf {
        if let Ok(path) = std::env::var("PROOFD_SETTINGS") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("settings.json")
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::from_json(&contents).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| ConfigError::Validation(format!("invalid settings JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Validation(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.style.background_color.validate("style.backgroundColor")?;
        self.style.text_color.validate("style.textColor")?;

        let timing = &self.timing;
        for (name, value) in [
            ("timing.interval", timing.interval),
            ("timing.displayDuration", timing.display_duration),
            ("timing.animationDuration", timing.animation_duration),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Validation(format!("{name} must be greater than 0")));
            }
        }
        Ok(())
    }

    /// Whether consecutive popups can overlap with these timings.
    pub fn cycles_overlap(&self) -> bool {
        self.timing.interval <= self.timing.cycle_length()
    }
}

/// Durations as integer milliseconds on the wire.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
