use crate::model::{Classification, UNKNOWN_INDUSTRY};

pub const DEFAULT_REP_NAME: &str = "Your Name";

/// Industry text used when a lead has no known industry.
pub const INDUSTRY_PLACEHOLDER: &str = "your field";

pub const CSA_TEMPLATE: &str = "Hi, this is {rep_name} with Canadian Linen—we help teams like yours stay CSA-compliant with certified workwear and safety-first service. Who handles your safety uniforms?";

pub const FOOD_SAFETY_TEMPLATE: &str = "Hi, this is {rep_name} with Canadian Linen—I specialize in HACCP-aligned uniform and towel services for food processors. Can I ask who oversees your sanitation compliance?";

pub const INDUSTRIAL_PPE_TEMPLATE: &str = "Hi, this is {rep_name} with Canadian Linen—we support industrial crews with FR gear that meets NFPA 70E and 2112. Who manages your PPE contracts right now?";

pub const GENERIC_TEMPLATE: &str = "Hi, this is {rep_name} with Canadian Linen—we help businesses in {industry} improve safety, appearance, and compliance with weekly uniform service. Who would I speak to about that?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptTemplate {
    Csa,
    FoodSafety,
    IndustrialPpe,
    Generic,
}

impl ScriptTemplate {
    /// First match wins: CSA, then HACCP/CFIA, then NFPA, else generic.
    pub fn select(classification: &Classification) -> Self {
        let tags = classification.compliance_label().to_uppercase();
        if tags.contains("CSA") {
            Self::Csa
        } else if tags.contains("HACCP") || tags.contains("CFIA") {
            Self::FoodSafety
        } else if tags.contains("NFPA") {
            Self::IndustrialPpe
        } else {
            Self::Generic
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Csa => CSA_TEMPLATE,
            Self::FoodSafety => FOOD_SAFETY_TEMPLATE,
            Self::IndustrialPpe => INDUSTRIAL_PPE_TEMPLATE,
            Self::Generic => GENERIC_TEMPLATE,
        }
    }
}

/// Render the outreach script for a classified lead.
pub fn generate(classification: &Classification, rep_name: &str) -> String {
    let industry = industry_text(&classification.industry);
    ScriptTemplate::select(classification)
        .text()
        .replace("{rep_name}", rep_name)
        .replace("{industry}", &industry)
}

fn industry_text(industry: &str) -> String {
    let industry = industry.trim();
    if industry.is_empty() || industry.eq_ignore_ascii_case(UNKNOWN_INDUSTRY) {
        INDUSTRY_PLACEHOLDER.to_string()
    } else {
        industry.to_lowercase()
    }
}
