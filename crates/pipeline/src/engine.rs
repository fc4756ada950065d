use log::{info, warn};

use crate::classify::Classifier;
use crate::config::LeadConfig;
use crate::density::{postal_prefix, DensityLookup};
use crate::error::LeadError;
use crate::merger::{merge, DEFAULT_THRESHOLD};
use crate::model::{Lead, LeadInput, LeadMeta, LeadReport, MergedLead, RawRecord, RejectedRecord};
use crate::score::Scorer;
use crate::script::{self, DEFAULT_REP_NAME};
use crate::summary::compute_summary;
use crate::taxonomy::Taxonomy;

/// Finished leads plus the records rejected before merging.
#[derive(Debug)]
pub struct PipelineOutput {
    pub leads: Vec<Lead>,
    pub rejected: Vec<RejectedRecord>,
}

/// Merge → classify → score → script, over a borrowed taxonomy and density source.
pub struct Pipeline<'a> {
    classifier: Classifier<'a>,
    scorer: Scorer<'a>,
    density: &'a dyn DensityLookup,
    threshold: f64,
    rep_name: String,
    postal_prefix: Option<String>,
}

impl<'a> Pipeline<'a> {
    pub fn new(taxonomy: &'a Taxonomy, density: &'a dyn DensityLookup) -> Self {
        Self {
            classifier: Classifier::new(taxonomy),
            scorer: Scorer::new(taxonomy),
            density,
            threshold: DEFAULT_THRESHOLD,
            rep_name: DEFAULT_REP_NAME.into(),
            postal_prefix: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_rep_name(mut self, rep_name: impl Into<String>) -> Self {
        self.rep_name = rep_name.into();
        self
    }

    /// Zone used for leads without a postal code.
    pub fn with_postal_prefix(mut self, postal_prefix: Option<String>) -> Self {
        self.postal_prefix = postal_prefix;
        self
    }

    /// Reject blank-named records, then run every stage over the rest.
    /// Lead order is the merge order.
    pub fn process(
        &self,
        left_source: &str,
        left: &[RawRecord],
        right_source: &str,
        right: &[RawRecord],
    ) -> PipelineOutput {
        let (left, mut rejected) = validate_records(left_source, left);
        let (right, right_rejected) = validate_records(right_source, right);
        rejected.extend(right_rejected);

        let leads = merge(&left, &right, self.threshold)
            .into_iter()
            .map(|lead| self.finish(lead))
            .collect();
        PipelineOutput { leads, rejected }
    }

    /// Classify, score and script one merged entity.
    pub fn finish(&self, lead: MergedLead) -> Lead {
        let classified = self.classifier.classify_lead(lead);
        let zone = postal_prefix(
            classified.merged.record.postal_code.as_deref(),
            self.postal_prefix.as_deref(),
        );
        let density = self
            .density
            .density_score(&zone, classified.classification.naics_code.as_deref());
        let scored = self.scorer.score(classified, density);
        let script = script::generate(&scored.classified.classification, &self.rep_name);
        Lead { scored, script }
    }
}

/// Split records into usable ones and rejections (blank business name).
pub fn validate_records(source: &str, records: &[RawRecord]) -> (Vec<RawRecord>, Vec<RejectedRecord>) {
    let mut accepted = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for (index, record) in records.iter().enumerate() {
        if record.has_business_name() {
            accepted.push(record.clone());
            continue;
        }
        let reason = LeadError::MissingBusinessName {
            source: source.into(),
            index,
        }
        .to_string();
        warn!("{reason}");
        rejected.push(RejectedRecord {
            source: source.into(),
            index,
            reason,
        });
    }

    (accepted, rejected)
}

/// Run the lead pipeline per config. Returns the finished leads + summary.
pub fn run(
    config: &LeadConfig,
    taxonomy: &Taxonomy,
    density: &dyn DensityLookup,
    input: &LeadInput,
) -> Result<LeadReport, LeadError> {
    let left_name = &config.merge.left;
    let right_name = &config.merge.right;

    let left_raw = input.records.get(left_name).ok_or_else(|| {
        LeadError::UnknownSource(format!("merge: left source '{left_name}' has no data"))
    })?;
    let right_raw = input.records.get(right_name).ok_or_else(|| {
        LeadError::UnknownSource(format!("merge: right source '{right_name}' has no data"))
    })?;

    let PipelineOutput { leads, rejected } = Pipeline::new(taxonomy, density)
        .with_threshold(config.merge.threshold)
        .with_rep_name(config.rep_name.as_str())
        .with_postal_prefix(config.postal_prefix.clone())
        .process(left_name, left_raw, right_name, right_raw);

    let summary = compute_summary(&leads, &rejected);
    info!(
        "{}: {} lead(s), {} merged, {} classified, {} rejected",
        config.name, summary.total_leads, summary.merged, summary.classified, summary.rejected
    );

    Ok(LeadReport {
        meta: LeadMeta {
            run_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            threshold: config.merge.threshold,
            left_source: left_name.clone(),
            right_source: right_name.clone(),
        },
        summary,
        leads,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::ZoneDensityTable;
    use crate::model::Tier;
    use crate::taxonomy::TaxonomyEntry;

    fn taxonomy() -> Taxonomy {
        Taxonomy::from_entries(vec![
            TaxonomyEntry {
                code: "238210".into(),
                name: "Electrical Contractor".into(),
                keywords: vec!["electric".into(), "electrical".into()],
                compliance: ["CSA Z96".to_string(), "NFPA 70E".to_string()].into_iter().collect(),
                tier: Tier::High,
            },
            TaxonomyEntry {
                code: "311611".into(),
                name: "Food Processor".into(),
                keywords: vec!["food processing".into(), "meats".into()],
                compliance: ["HACCP".to_string(), "CFIA".to_string()].into_iter().collect(),
                tier: Tier::Medium,
            },
        ])
        .unwrap()
    }

    fn places() -> Vec<RawRecord> {
        let mut joes = RawRecord::new("places", "Joe's Electric Ltd");
        joes.latitude = Some(51.08);
        joes.longitude = Some(-113.98);
        let bakery = RawRecord::new("places", "Sunrise Bakery");
        vec![joes, bakery]
    }

    fn registry() -> Vec<RawRecord> {
        let mut joes = RawRecord::new("registry", "Joes Electric");
        joes.postal_code = Some("t1y 4p2".into());
        let mut meats = RawRecord::new("registry", "Prairie Meats");
        meats.license_description = Some("Food Processing".into());
        vec![joes, meats]
    }

    const CONFIG: &str = r#"
name = "test run"
taxonomy = "naics.toml"
rep_name = "Alex"
postal_prefix = "T2A"

[sources.places]
kind = "places"
file = "places.csv"

[sources.registry]
kind = "registry"
file = "registry.json"

[merge]
left = "places"
right = "registry"
"#;

    #[test]
    fn pipeline_end_to_end() {
        let tax = taxonomy();
        let density = ZoneDensityTable::default().with_zone("T1Y", "238210", 5);
        let output = Pipeline::new(&tax, &density)
            .with_rep_name("Alex")
            .process("places", &places(), "registry", &registry());

        assert!(output.rejected.is_empty());
        let leads = output.leads;
        assert_eq!(leads.len(), 3);

        let joes = &leads[0];
        assert_eq!(joes.record().business_name, "Joes Electric");
        assert_eq!(joes.merged().source_count(), 2);
        assert_eq!(joes.classification().naics_code.as_deref(), Some("238210"));
        assert_eq!(joes.score().compliance_score, 5);
        assert_eq!(joes.score().zone_density_score, 5);
        assert_eq!(joes.score().score, 5 * 2 + 2 + 5);
        assert_eq!(joes.score().awrv_tier, Tier::High);
        assert!(joes.script.contains("Alex"));
        assert!(joes.script.contains("CSA"));
        assert_eq!(
            joes.row().maps_link.as_deref(),
            Some("https://www.google.com/maps?q=51.08,-113.98")
        );

        let bakery = &leads[1];
        assert!(!bakery.classification().is_classified());
        // No postal code, no fallback: default density
        assert_eq!(bakery.score().score, 1 + 2);
        assert!(bakery.script.contains("your field"));

        let meats = &leads[2];
        assert_eq!(meats.classification().industry, "Food Processor");
        assert_eq!(meats.score().compliance_score, 4);
    }

    #[test]
    fn postal_prefix_fallback_feeds_density() {
        let tax = taxonomy();
        let density = ZoneDensityTable::default().with_zone("T2A", "311611", 4);
        let pipeline = Pipeline::new(&tax, &density).with_postal_prefix(Some("t2a".into()));
        let lead = pipeline.finish(MergedLead::single(registry().remove(1)));
        assert_eq!(lead.score().zone_density_score, 4);
    }

    #[test]
    fn validate_rejects_blank_names() {
        let records = vec![
            RawRecord::new("places", "Acme"),
            RawRecord::new("places", "  "),
            RawRecord::new("places", "Bolt Co"),
        ];
        let (accepted, rejected) = validate_records("places", &records);
        assert_eq!(accepted.len(), 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].index, 1);
        assert_eq!(rejected[0].reason, "source 'places', record 1: missing business_name");
    }

    #[test]
    fn process_rejects_blank_names_instead_of_merging_them() {
        let tax = taxonomy();
        let density = ZoneDensityTable::default();
        // Two empty names would otherwise match with a perfect ratio
        let output = Pipeline::new(&tax, &density).process(
            "a",
            &[RawRecord::new("a", "")],
            "b",
            &[RawRecord::new("b", "  ")],
        );
        assert!(output.leads.is_empty());
        assert_eq!(output.rejected.len(), 2);
        assert_eq!(output.rejected[0].source, "a");
        assert_eq!(output.rejected[1].source, "b");
        assert_eq!(output.rejected[1].index, 0);
    }

    #[test]
    fn process_keeps_valid_records_beside_rejections() {
        let tax = taxonomy();
        let density = ZoneDensityTable::default();
        let mut left = places();
        left.insert(1, RawRecord::new("places", ""));
        let output = Pipeline::new(&tax, &density).process("places", &left, "registry", &registry());
        assert_eq!(output.leads.len(), 3);
        assert_eq!(output.rejected.len(), 1);
        assert_eq!(output.rejected[0].index, 1);
    }

    #[test]
    fn run_builds_report() {
        let config = LeadConfig::from_toml(CONFIG).unwrap();
        let tax = taxonomy();
        let mut input = LeadInput::default();
        let mut left = places();
        left.push(RawRecord::new("places", ""));
        input.records.insert("places".into(), left);
        input.records.insert("registry".into(), registry());

        let report = run(&config, &tax, &config.density, &input).unwrap();
        assert_eq!(report.meta.run_name, "test run");
        assert_eq!(report.meta.left_source, "places");
        assert_eq!(report.meta.threshold, DEFAULT_THRESHOLD);
        assert_eq!(report.leads.len(), 3);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.summary.total_leads, 3);
        assert_eq!(report.summary.merged, 1);
        assert_eq!(report.summary.rejected, 1);
        assert!(report.leads.iter().all(|l| l.script.contains("Alex")));

        let json = serde_json::to_value(&report).unwrap();
        let row = &json["leads"][0];
        assert_eq!(row["business_name"], "Joes Electric");
        assert_eq!(row["awrv_tier"], "High");
        assert_eq!(row["compliance"], "CSA Z96, NFPA 70E");
    }

    #[test]
    fn run_missing_source_data() {
        let config = LeadConfig::from_toml(CONFIG).unwrap();
        let tax = taxonomy();
        let mut input = LeadInput::default();
        input.records.insert("places".into(), places());

        let err = run(&config, &tax, &config.density, &input).unwrap_err();
        assert!(matches!(err, LeadError::UnknownSource(_)));
    }
}
