//! `PageSpeed` Insights v5 response types.
//!
//! Only the parts of `lighthouseResult` the batch stores are modelled. Every
//! level is optional: a missing or `null` key deserializes to `None` rather
//! than failing, so a sparse report still yields a partially filled
//! [`PageSpeedResult`].

use std::collections::HashMap;

use pagespeed_core::{Audit, Category, PageSpeedResult, Strategy, Target};
use serde::Deserialize;

/// Top-level `runPagespeed` response body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpeedResponse {
    #[serde(default)]
    pub lighthouse_result: Option<LighthouseResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LighthouseResult {
    #[serde(default)]
    pub categories: Option<HashMap<String, CategoryResult>>,
    #[serde(default)]
    pub audits: Option<HashMap<String, AuditResult>>,
}

/// One entry under `lighthouseResult.categories`.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryResult {
    /// Fractional score in `[0, 1]`; `null` when Lighthouse could not compute it.
    #[serde(default)]
    pub score: Option<f64>,
}

/// One entry under `lighthouseResult.audits`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    #[serde(default)]
    pub display_value: Option<String>,
}

impl LighthouseResult {
    #[must_use]
    pub fn score(&self, category: Category) -> Option<f64> {
        self.categories
            .as_ref()?
            .get(category.api_name())
            .and_then(|c| c.score)
    }

    #[must_use]
    pub fn display_value(&self, audit: Audit) -> Option<String> {
        self.audits
            .as_ref()?
            .get(audit.api_name())
            .and_then(|a| a.display_value.clone())
    }
}

impl PageSpeedResponse {
    /// Flatten the nested report into a result record for `target`.
    #[must_use]
    pub fn into_result(self, target: &Target, strategy: Strategy) -> PageSpeedResult {
        let Some(lh) = self.lighthouse_result else {
            return PageSpeedResult::empty(target, strategy);
        };

        PageSpeedResult {
            target_id: target.id,
            url: target.url.clone(),
            strategy,
            performance: lh.score(Category::Performance),
            accessibility: lh.score(Category::Accessibility),
            best_practices: lh.score(Category::BestPractices),
            seo: lh.score(Category::Seo),
            first_contentful_paint: lh.display_value(Audit::FirstContentfulPaint),
            speed_index: lh.display_value(Audit::SpeedIndex),
            interactive: lh.display_value(Audit::Interactive),
            first_meaningful_paint: lh.display_value(Audit::FirstMeaningfulPaint),
            cumulative_layout_shift: lh.display_value(Audit::CumulativeLayoutShift),
        }
    }
}
