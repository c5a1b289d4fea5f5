//! Settings Models
//!
//! The two independently persisted settings partitions (AI provider and
//! appearance), the partial update request, the sampling profile derived
//! from the sampling parameters, and the app's own config.json.

use serde::{Deserialize, Serialize};

use crate::utils::debounce::DEFAULT_DEBOUNCE_MS;

/// Default Gemini model id
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_FONT_SIZE: u32 = 14;

/// AI provider settings (stored under `promptBuilderSettings`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }
}

impl AiSettings {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn apply_update(&mut self, update: &SettingsUpdate) {
        if let Some(api_key) = &update.api_key {
            self.api_key = api_key.trim().to_string();
        }
        if let Some(model) = &update.model {
            self.model = model.clone();
        }
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
        if let Some(top_p) = update.top_p {
            self.top_p = top_p;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model id cannot be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(format!(
                "Invalid temperature: {}. Must be between 0 and 1",
                self.temperature
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(format!(
                "Invalid top_p: {}. Must be between 0 and 1",
                self.top_p
            ));
        }
        Ok(())
    }

    pub fn sampling_profile(&self) -> SamplingProfile {
        SamplingProfile::from_params(self.temperature, self.top_p)
    }
}

/// UI theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Appearance settings (stored under `promptBuilderUIState`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppearanceSettings {
    pub theme: Theme,
    pub font_size: u32,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl AppearanceSettings {
    pub fn apply_update(&mut self, update: &SettingsUpdate) {
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
        if let Some(font_size) = update.font_size {
            self.font_size = font_size;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(10..=24).contains(&self.font_size) {
            return Err(format!(
                "Invalid font size: {}. Must be between 10 and 24",
                self.font_size
            ));
        }
        Ok(())
    }
}

/// Both settings partitions, as returned to the UI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub ai: AiSettings,
    pub appearance: AppearanceSettings,
}

impl Settings {
    /// Apply a partial update to a copy and validate it; `self` is left
    /// untouched on error.
    pub fn updated(&self, update: &SettingsUpdate) -> Result<Settings, String> {
        let mut next = self.clone();
        next.ai.apply_update(update);
        next.appearance.apply_update(update);
        next.ai.validate()?;
        next.appearance.validate()?;
        Ok(next)
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub theme: Option<Theme>,
    pub font_size: Option<u32>,
}

impl SettingsUpdate {
    pub fn touches_ai(&self) -> bool {
        self.api_key.is_some()
            || self.model.is_some()
            || self.temperature.is_some()
            || self.top_p.is_some()
    }

    pub fn touches_appearance(&self) -> bool {
        self.theme.is_some() || self.font_size.is_some()
    }
}

/// Scores (0 to 10) describing how a temperature / top-p pair behaves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingProfile {
    pub creativity: f32,
    pub coherence: f32,
    pub consistency: f32,
    pub precision: f32,
    pub exploration: f32,
}

impl SamplingProfile {
    pub fn from_params(temperature: f32, top_p: f32) -> Self {
        let t = temperature;
        let p = top_p;
        let score = |v: f32| (v * 10.0).clamp(0.0, 10.0);
        Self {
            creativity: score(t * 0.6 + p * 0.4),
            coherence: score(1.0 - t * 0.7 - (1.0 - p) * 0.3),
            consistency: score(1.0 - t),
            precision: score(1.0 - p * 0.8 - t * 0.2),
            exploration: score(p),
        }
    }
}

/// A selectable Gemini model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// The static Gemini model catalogue
pub fn available_models() -> Vec<ModelInfo> {
    const MODELS: [(&str, &str, &str); 6] = [
        (
            "gemini-3-pro-preview",
            "Gemini 3 Pro Preview",
            "Google's most powerful agentic and coding model. A thinking model that reasons before responding, with a 1M token context window.",
        ),
        (
            "gemini-2.5-pro",
            "Gemini 2.5 Pro",
            "Advanced reasoning model for complex problems in coding, math and STEM, with long-context multimodal understanding.",
        ),
        (
            "gemini-2.5-flash",
            "Gemini 2.5 Flash",
            "Optimized for price-performance with adaptive thinking; suited to large-scale, low-latency, high-volume use.",
        ),
        (
            "gemini-2.5-flash-lite",
            "Gemini 2.5 Flash-Lite",
            "The fastest and most cost-efficient Gemini 2.5 model, designed for high-throughput tasks.",
        ),
        (
            "gemini-2.0-flash",
            "Gemini 2.0 Flash",
            "Next-generation features, improved speed and real-time streaming.",
        ),
        (
            "gemini-2.0-flash-lite",
            "Gemini 2.0 Flash-Lite",
            "A cost-efficient and low-latency version of Gemini 2.0 Flash.",
        ),
    ];

    MODELS
        .iter()
        .map(|(id, name, description)| ModelInfo {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        })
        .collect()
}

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Quiet period before a mutation is written to storage
    pub persist_debounce_ms: u64,
    /// Override for the Generative Language API base URL
    pub gemini_base_url: Option<String>,
    /// tracing filter used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            persist_debounce_ms: DEFAULT_DEBOUNCE_MS,
            gemini_base_url: None,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.persist_debounce_ms > 60_000 {
            return Err("persistDebounceMs cannot exceed 60000".to_string());
        }
        if let Some(url) = &self.gemini_base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("Invalid geminiBaseUrl: {}", url));
            }
        }
        if self.log_filter.trim().is_empty() {
            return Err("logFilter cannot be empty".to_string());
        }
        Ok(())
    }
}
