use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

use crate::types::Score;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub map: MapConfig,
    #[serde(default)]
    pub table: TableConfig,
    pub navigation: NavigationConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub geojson: PathBuf,
    pub results_csv: Option<PathBuf>,
    #[serde(default = "default_join_column")]
    pub join_column: String,
    // Feature property names carrying the display name, score code and site URL.
    pub name_property: String,
    pub score_property: String,
    pub url_property: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    pub width: f64,
    pub height: f64,
    // Projection tuning: rotation angles in degrees, screen translation, scale factor.
    pub rotate: [f64; 3],
    pub translate: [f64; 2],
    pub scale: f64,
    #[serde(default = "default_stroke")]
    pub stroke: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default = "default_highlight")]
    pub highlight: String,
    #[serde(default)]
    pub colors: ColorScale,
}

/// Score-to-color table. Total: every score has exactly one color and
/// unknown scores get the fallback.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ColorScale {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
    pub e: String,
    pub unknown: String,
}

impl Default for ColorScale {
    fn default() -> Self {
        ColorScale {
            a: "#1ac81a".to_string(),
            b: "#aec919".to_string(),
            c: "#c8b119".to_string(),
            d: "#c98119".to_string(),
            e: "#c95719".to_string(),
            unknown: "#8f8f8f".to_string(),
        }
    }
}

impl ColorScale {
    pub fn fill(&self, score: Option<Score>) -> &str {
        match score {
            Some(Score::A) => &self.a,
            Some(Score::B) => &self.b,
            Some(Score::C) => &self.c,
            Some(Score::D) => &self.d,
            Some(Score::E) => &self.e,
            None => &self.unknown,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableConfig {
    #[serde(default = "default_page_length")]
    pub page_length: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig { page_length: default_page_length() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NavigationConfig {
    // Base URL of the per-municipality detail pages, without trailing slash.
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

fn default_join_column() -> String {
    "kommun".to_string()
}

fn default_stroke() -> String {
    "black".to_string()
}

fn default_stroke_width() -> f64 {
    1.0
}

fn default_highlight() -> String {
    "orange".to_string()
}

fn default_page_length() -> usize {
    25
}
