//! Domain types shared by the client, storage, and orchestration crates.

use serde::Deserialize;

/// One URL to audit, identified by a caller-assigned id that is unique
/// within a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Target {
    pub id: i64,
    pub url: String,
}

impl Target {
    #[must_use]
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }
}

/// Device profile the measurement API simulates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    #[default]
    Mobile,
    Desktop,
}

impl Strategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(Strategy::Mobile),
            "desktop" => Ok(Strategy::Desktop),
            other => Err(format!(
                "unknown strategy '{other}'; expected 'mobile' or 'desktop'"
            )),
        }
    }
}

/// Lighthouse report category requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Performance,
    Accessibility,
    BestPractices,
    Seo,
}

impl Category {
    /// Every category, in the order they are sent as `category` query params.
    pub const ALL: [Category; 4] = [
        Category::Performance,
        Category::Accessibility,
        Category::Seo,
        Category::BestPractices,
    ];

    /// Name used both in the query string and as the key under
    /// `lighthouseResult.categories`.
    #[must_use]
    pub fn api_name(self) -> &'static str {
        match self {
            Category::Performance => "performance",
            Category::Accessibility => "accessibility",
            Category::BestPractices => "best-practices",
            Category::Seo => "seo",
        }
    }
}

/// Lighthouse audit whose `displayValue` is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audit {
    FirstContentfulPaint,
    SpeedIndex,
    Interactive,
    FirstMeaningfulPaint,
    CumulativeLayoutShift,
}

impl Audit {
    /// Key under `lighthouseResult.audits`.
    #[must_use]
    pub fn api_name(self) -> &'static str {
        match self {
            Audit::FirstContentfulPaint => "first-contentful-paint",
            Audit::SpeedIndex => "speed-index",
            Audit::Interactive => "interactive",
            Audit::FirstMeaningfulPaint => "first-meaningful-paint",
            Audit::CumulativeLayoutShift => "cumulative-layout-shift",
        }
    }
}

/// Scores and audit display values fetched for one target.
///
/// Every metric is independently optional: a field the API omitted, or a
/// request that did not return `200 OK`, leaves it `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSpeedResult {
    pub target_id: i64,
    pub url: String,
    pub strategy: Strategy,
    pub performance: Option<f64>,
    pub accessibility: Option<f64>,
    pub best_practices: Option<f64>,
    pub seo: Option<f64>,
    pub first_contentful_paint: Option<String>,
    pub speed_index: Option<String>,
    pub interactive: Option<String>,
    pub first_meaningful_paint: Option<String>,
    pub cumulative_layout_shift: Option<String>,
}

impl PageSpeedResult {
    /// A result with every metric absent, keeping the target identity so the
    /// caller can still account for it.
    #[must_use]
    pub fn empty(target: &Target, strategy: Strategy) -> Self {
        Self {
            target_id: target.id,
            url: target.url.clone(),
            strategy,
            performance: None,
            accessibility: None,
            best_practices: None,
            seo: None,
            first_contentful_paint: None,
            speed_index: None,
            interactive: None,
            first_meaningful_paint: None,
            cumulative_layout_shift: None,
        }
    }

    /// Only results carrying a performance score are persisted.
    #[must_use]
    pub fn has_performance(&self) -> bool {
        self.performance.is_some()
    }
}
