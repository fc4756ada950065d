use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::density::ZoneDensityTable;
use crate::error::LeadError;
use crate::merger::DEFAULT_THRESHOLD;
use crate::script::DEFAULT_REP_NAME;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LeadConfig {
    pub name: String,
    /// Path of the taxonomy document, relative to the config file.
    pub taxonomy: String,
    #[serde(default = "default_rep_name")]
    pub rep_name: String,
    /// Zone used for leads that carry no postal code.
    #[serde(default)]
    pub postal_prefix: Option<String>,
    pub sources: HashMap<String, SourceConfig>,
    pub merge: MergeConfig,
    #[serde(default)]
    pub density: ZoneDensityTable,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_rep_name() -> String {
    DEFAULT_REP_NAME.into()
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub file: String,
    /// Defaults from the file extension (`.json` → json, otherwise csv).
    #[serde(default)]
    pub format: Option<SourceFormat>,
    /// Drop exact (business name, address) duplicates within this source.
    #[serde(default)]
    pub dedupe: bool,
    #[serde(default)]
    pub columns: ColumnMapping,
}

impl SourceConfig {
    pub fn resolved_format(&self) -> SourceFormat {
        self.format.unwrap_or_else(|| SourceFormat::from_path(&self.file))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Places,
    Registry,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Places => write!(f, "places"),
            Self::Registry => write!(f, "registry"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    pub fn from_path(file: &str) -> Self {
        match Path::new(file).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping (CSV sources)
// ---------------------------------------------------------------------------

/// CSV header for each record field.
///
/// `business_name` is always required. Optional fields left unset are read
/// from a header of the same name when present; optional fields set
/// explicitly must exist in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMapping {
    #[serde(default = "default_business_name_column")]
    pub business_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub maps_link: Option<String>,
    #[serde(default)]
    pub license_description: Option<String>,
}

fn default_business_name_column() -> String {
    "business_name".into()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            business_name: default_business_name_column(),
            address: None,
            postal_code: None,
            latitude: None,
            longitude: None,
            maps_link: None,
            license_description: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Merge + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    /// Source whose records are matched first.
    pub left: String,
    /// Source whose values win on merged fields.
    pub right: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl LeadConfig {
    pub fn from_toml(input: &str) -> Result<Self, LeadError> {
        let config: LeadConfig =
            toml::from_str(input).map_err(|e| LeadError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LeadError> {
        if self.sources.len() != 2 {
            return Err(LeadError::ConfigValidation(format!(
                "exactly 2 sources are required, found {}",
                self.sources.len()
            )));
        }

        if !self.sources.contains_key(&self.merge.left) {
            return Err(LeadError::UnknownSource(format!(
                "merge: left source '{}' not found",
                self.merge.left
            )));
        }
        if !self.sources.contains_key(&self.merge.right) {
            return Err(LeadError::UnknownSource(format!(
                "merge: right source '{}' not found",
                self.merge.right
            )));
        }
        if self.merge.left == self.merge.right {
            return Err(LeadError::ConfigValidation(
                "merge: left and right must be different sources".into(),
            ));
        }

        let t = self.merge.threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(LeadError::ConfigValidation(format!(
                "merge threshold must be in (0, 1], got {t}"
            )));
        }

        for (name, source) in &self.sources {
            if source.columns.business_name.trim().is_empty() {
                return Err(LeadError::ConfigValidation(format!(
                    "source '{name}': business_name column must not be empty"
                )));
            }
        }

        for zone in &self.density.zones {
            if zone.postal_prefix.trim().is_empty() || zone.naics_code.trim().is_empty() {
                return Err(LeadError::ConfigValidation(
                    "density zones need a postal_prefix and a naics_code".into(),
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
