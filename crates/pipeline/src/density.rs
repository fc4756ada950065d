use serde::Deserialize;

/// Density returned when no zone entry matches (postal prefix, industry code).
pub const DEFAULT_DENSITY_SCORE: u32 = 2;

/// Concentration of an industry within a postal zone.
///
/// Implemented by [`ZoneDensityTable`] and by any
/// `Fn(&str, Option<&str>) -> u32`, so callers can plug in their own source.
pub trait DensityLookup {
    fn density_score(&self, postal_prefix: &str, naics_code: Option<&str>) -> u32;
}

impl<F> DensityLookup for F
where
    F: Fn(&str, Option<&str>) -> u32,
{
    fn density_score(&self, postal_prefix: &str, naics_code: Option<&str>) -> u32 {
        self(postal_prefix, naics_code)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneDensity {
    pub postal_prefix: String,
    pub naics_code: String,
    pub score: u32,
}

/// Static zone table with a fixed fallback score.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneDensityTable {
    #[serde(default = "default_score")]
    pub default_score: u32,
    #[serde(default)]
    pub zones: Vec<ZoneDensity>,
}

fn default_score() -> u32 {
    DEFAULT_DENSITY_SCORE
}

impl Default for ZoneDensityTable {
    fn default() -> Self {
        Self {
            default_score: DEFAULT_DENSITY_SCORE,
            zones: Vec::new(),
        }
    }
}

impl ZoneDensityTable {
    pub fn with_zone(mut self, postal_prefix: &str, naics_code: &str, score: u32) -> Self {
        self.zones.push(ZoneDensity {
            postal_prefix: postal_prefix.into(),
            naics_code: naics_code.into(),
            score,
        });
        self
    }
}

impl DensityLookup for ZoneDensityTable {
    fn density_score(&self, postal_prefix: &str, naics_code: Option<&str>) -> u32 {
        let Some(code) = naics_code else {
            return self.default_score;
        };
        self.zones
            .iter()
            .find(|z| z.naics_code == code && z.postal_prefix.eq_ignore_ascii_case(postal_prefix))
            .map(|z| z.score)
            .unwrap_or(self.default_score)
    }
}

/// Three-character zone key (upper-cased) from a postal code, else from `fallback`.
pub fn postal_prefix(postal_code: Option<&str>, fallback: Option<&str>) -> String {
    let prefix = |s: &str| -> String { s.trim().chars().take(3).collect::<String>().to_uppercase() };
    match postal_code.map(str::trim).filter(|s| !s.is_empty()) {
        Some(code) => prefix(code),
        None => fallback.map(prefix).unwrap_or_default(),
    }
}
