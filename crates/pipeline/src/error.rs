use std::fmt;

#[derive(Debug)]
pub enum LeadError {
    /// TOML parse / deserialization error in the run config.
    ConfigParse(String),
    /// Config validation error (bad threshold, merge role mismatch, etc.).
    ConfigValidation(String),
    /// A merge role references a source that is not configured.
    UnknownSource(String),
    /// Taxonomy document could not be parsed.
    TaxonomyParse(String),
    /// Taxonomy violates an invariant (duplicate code, empty keyword list, ...).
    TaxonomyValidation(String),
    /// Missing required column in a CSV source.
    MissingColumn { source: String, column: String },
    /// Latitude / longitude cell that is not a number.
    CoordinateParse { source: String, row: usize, value: String },
    /// Malformed record payload (JSON source, bad CSV row).
    RecordParse { source: String, message: String },
    /// Record without a usable business name.
    MissingBusinessName { source: String, index: usize },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for LeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownSource(source) => write!(f, "unknown source: {source}"),
            Self::TaxonomyParse(msg) => write!(f, "taxonomy parse error: {msg}"),
            Self::TaxonomyValidation(msg) => write!(f, "taxonomy validation error: {msg}"),
            Self::MissingColumn { source, column } => {
                write!(f, "source '{source}': missing column '{column}'")
            }
            Self::CoordinateParse { source, row, value } => {
                write!(f, "source '{source}', row {row}: cannot parse coordinate '{value}'")
            }
            Self::RecordParse { source, message } => {
                write!(f, "source '{source}': {message}")
            }
            Self::MissingBusinessName { source, index } => {
                write!(f, "source '{source}', record {index}: missing business_name")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for LeadError {}
