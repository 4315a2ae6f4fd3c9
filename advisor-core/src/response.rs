//! Parsing of the backend's two-line answer.
//!
//! Lines that start with `Recommendation:` or `Icon:` are picked up; everything
//! else is ignored. When a label repeats, the last occurrence wins.

use crate::model::{DEFAULT_ICON, Recommendation};

pub const RECOMMENDATION_LABEL: &str = "Recommendation:";
pub const ICON_LABEL: &str = "Icon:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    pub recommendation: Option<String>,
    pub icon: Option<String>,
}

pub fn parse_response(text: &str) -> ParsedResponse {
    let mut parsed = ParsedResponse::default();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(RECOMMENDATION_LABEL) {
            parsed.recommendation = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(ICON_LABEL) {
            let icon = rest.trim().to_lowercase();
            // an empty icon line counts as no icon line
            parsed.icon = (!icon.is_empty()).then_some(icon);
        }
    }

    parsed
}

impl ParsedResponse {
    /// `None` when no non-empty recommendation line was found.
    pub fn into_recommendation(self) -> Option<Recommendation> {
        let text = self.recommendation.filter(|text| !text.is_empty())?;
        let icon = self.icon.unwrap_or_else(|| DEFAULT_ICON.to_string());
        Some(Recommendation::new(text, icon))
    }
}
