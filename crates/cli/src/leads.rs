//! `leadgen run` / `validate` / `classify` / `similarity`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use log::debug;

use leadgen_pipeline::load::load_source;
use leadgen_pipeline::model::{LeadInput, LeadReport, RawRecord};
use leadgen_pipeline::{Classifier, LeadConfig, Taxonomy};

use crate::exit_codes::{EXIT_LEADS_INVALID_CONFIG, EXIT_LEADS_REJECTED, EXIT_LEADS_RUNTIME};
use crate::CliError;

#[derive(Subcommand)]
pub enum LeadCommands {
    /// Merge both sources, classify, score and script every lead
    #[command(after_help = "\
Examples:
  leadgen run leadgen.toml
  leadgen run leadgen.toml --json
  leadgen run leadgen.toml --output leads.json --rep-name Alex
  leadgen run leadgen.toml --strict")]
    Run {
        /// Path to the run config (.toml)
        config: PathBuf,

        /// Output JSON to stdout instead of the lead list
        #[arg(long)]
        json: bool,

        /// Write JSON output to file (overrides [output] json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Sales rep named in the scripts (overrides rep_name)
        #[arg(long, env = "LEADGEN_REP_NAME")]
        rep_name: Option<String>,

        /// Fail if any record was rejected
        #[arg(long)]
        strict: bool,
    },

    /// Validate a run config and its taxonomy without running
    #[command(after_help = "\
Examples:
  leadgen validate leadgen.toml")]
    Validate {
        /// Path to the run config (.toml)
        config: PathBuf,
    },

    /// Classify free text against a taxonomy
    #[command(after_help = "\
Examples:
  leadgen classify 'ABC Food Processing Inc, HACCP certified plant' --taxonomy naics.toml
  leadgen classify 'Bow Valley Welding' --taxonomy naics.json --json")]
    Classify {
        /// Text to classify (name, address, license description)
        text: String,

        /// Taxonomy document (.toml or .json)
        #[arg(long)]
        taxonomy: PathBuf,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the name similarity score of two business names
    #[command(after_help = "\
Examples:
  leadgen similarity \"Joe's Electric Ltd\" 'Joes Electric'")]
    Similarity {
        a: String,
        b: String,
    },
}

pub fn cmd_leads(cmd: LeadCommands) -> Result<(), CliError> {
    match cmd {
        LeadCommands::Run { config, json, output, rep_name, strict } => {
            cmd_run(config, json, output, rep_name, strict)
        }
        LeadCommands::Validate { config } => cmd_validate(config),
        LeadCommands::Classify { text, taxonomy, json } => cmd_classify(text, taxonomy, json),
        LeadCommands::Similarity { a, b } => cmd_similarity(a, b),
    }
}

fn leads_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError::new(code, msg)
}

fn read_config(config_path: &Path) -> Result<LeadConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| leads_err(EXIT_LEADS_RUNTIME, format!("cannot read config: {e}")))?;
    LeadConfig::from_toml(&config_str)
        .map_err(|e| leads_err(EXIT_LEADS_INVALID_CONFIG, e.to_string()))
}

/// Load a taxonomy, picking the parser from the file extension.
fn read_taxonomy(path: &Path) -> Result<Taxonomy, CliError> {
    let data = std::fs::read_to_string(path).map_err(|e| {
        leads_err(EXIT_LEADS_RUNTIME, format!("cannot read {}: {e}", path.display()))
    })?;
    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Taxonomy::from_json(&data),
        Some(ext) if ext.eq_ignore_ascii_case("toml") => Taxonomy::from_toml(&data),
        _ => {
            return Err(CliError::args(format!(
                "unsupported taxonomy file: {}",
                path.display()
            ))
            .with_hint("use a .toml or .json taxonomy document"))
        }
    };
    parsed.map_err(|e| leads_err(EXIT_LEADS_INVALID_CONFIG, e.to_string()))
}

fn base_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    rep_name: Option<String>,
    strict: bool,
) -> Result<(), CliError> {
    let mut config = read_config(&config_path)?;
    if let Some(name) = rep_name {
        config.rep_name = name;
    }

    // Resolve file paths relative to config file's directory
    let base_dir = base_dir(&config_path);
    let taxonomy = read_taxonomy(&base_dir.join(&config.taxonomy))?;

    let mut records: HashMap<String, Vec<RawRecord>> = HashMap::new();
    for (source_name, source_config) in &config.sources {
        let path = base_dir.join(&source_config.file);
        let data = std::fs::read_to_string(&path).map_err(|e| {
            leads_err(EXIT_LEADS_RUNTIME, format!("cannot read {}: {e}", path.display()))
        })?;
        let rows = load_source(source_name, &data, source_config)
            .map_err(|e| leads_err(EXIT_LEADS_RUNTIME, e.to_string()))?;
        debug!("loaded {} record(s) from {}", rows.len(), path.display());
        records.insert(source_name.clone(), rows);
    }

    let input = LeadInput { records };
    let report = leadgen_pipeline::run(&config, &taxonomy, &config.density, &input)
        .map_err(|e| leads_err(EXIT_LEADS_RUNTIME, e.to_string()))?;

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

    let output_file = output_file.or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p)));
    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| leads_err(EXIT_LEADS_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    } else {
        print_leads(&report);
    }

    // Human summary to stderr
    let s = &report.summary;
    eprintln!(
        "{}: {} leads ({} merged, {} single-source), {} classified, {} rejected, avg score {:.1}",
        report.meta.run_name,
        s.total_leads,
        s.merged,
        s.single_source,
        s.classified,
        s.rejected,
        s.average_score,
    );

    if strict && s.rejected > 0 {
        return Err(leads_err(
            EXIT_LEADS_REJECTED,
            format!("{} record(s) rejected", s.rejected),
        )
        .with_hint("every record needs a non-blank business_name"));
    }

    Ok(())
}

fn print_leads(report: &LeadReport) {
    for lead in &report.leads {
        let row = lead.row();
        println!(
            "{:>3}  {:<6}  {}  [{}]  {}",
            row.score,
            row.awrv_tier.to_string(),
            row.business_name,
            row.industry,
            row.postal_code.as_deref().unwrap_or("-"),
        );
    }
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let taxonomy = read_taxonomy(&base_dir(&config_path).join(&config.taxonomy))?;
    eprintln!(
        "valid: '{}' merging {} into {} at {}, {} industr{}, {} density zone(s)",
        config.name,
        config.merge.left,
        config.merge.right,
        config.merge.threshold,
        taxonomy.len(),
        if taxonomy.len() == 1 { "y" } else { "ies" },
        config.density.zones.len(),
    );
    Ok(())
}

fn cmd_classify(text: String, taxonomy_path: PathBuf, json_output: bool) -> Result<(), CliError> {
    let taxonomy = read_taxonomy(&taxonomy_path)?;
    let classifier = Classifier::new(&taxonomy);
    let classification = classifier.classify(&text);
    let hit = classifier.best_hit(&text);

    if json_output {
        let value = serde_json::json!({
            "naics_code": classification.naics_code,
            "industry": classification.industry,
            "compliance": classification.compliance,
            "keyword": hit.as_ref().map(|h| h.keyword.as_str()),
            "whole_word": hit.as_ref().map(|h| h.whole_word),
        });
        let json_str = serde_json::to_string_pretty(&value)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    match (&classification.naics_code, &hit) {
        (Some(code), Some(hit)) => println!(
            "{code}  {}  [{}]  (keyword '{}')",
            classification.industry,
            classification.compliance_label(),
            hit.keyword
        ),
        _ => println!("{}", classification.industry),
    }
    Ok(())
}

fn cmd_similarity(a: String, b: String) -> Result<(), CliError> {
    println!("{:.4}", leadgen_pipeline::similarity(&a, &b));
    Ok(())
}
