use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_PAGE: u64 = 0;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Raw query-string parameters as the transport hands them over. Every field is optional
/// text; interpretation happens in [`FilterCriteria::from_params`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductParams {
    pub search: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub sort_price: Option<String>,
    pub sort_date: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSort {
    LowToHigh,
    HighToLow,
}

impl PriceSort {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Low to High" => Some(PriceSort::LowToHigh),
            "High to Low" => Some(PriceSort::HighToLow),
            _ => None,
        }
    }

    pub fn direction(self) -> SortDirection {
        match self {
            PriceSort::LowToHigh => SortDirection::Ascending,
            PriceSort::HighToLow => SortDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateSort {
    Newest,
    Older,
}

impl DateSort {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Newest" => Some(DateSort::Newest),
            "Older" => Some(DateSort::Older),
            _ => None,
        }
    }

    /// "Newest" sorts `addedTime` ascending and "Older" descending. This is the
    /// established client contract even though it reads backwards.
    pub fn direction(self) -> SortDirection {
        match self {
            DateSort::Newest => SortDirection::Ascending,
            DateSort::Older => SortDirection::Descending,
        }
    }
}

/// Parses an optional raw parameter. Absent, blank, malformed, or rejected input
/// yields `None`, which callers treat as "no constraint" or fall back to a default.
pub fn parse_lenient<T, F>(raw: Option<&str>, accept: F) -> Option<T>
where
    T: FromStr,
    F: FnOnce(&T) -> bool,
{
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<T>().ok())
        .filter(accept)
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Validated, request-scoped search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price_ceiling: Option<f64>,
    pub price_sort: Option<PriceSort>,
    pub date_sort: Option<DateSort>,
    pub page: u64,
    pub size: u64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search: None,
            brand: None,
            category: None,
            price_ceiling: None,
            price_sort: None,
            date_sort: None,
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterCriteria {
    pub fn from_params(p: &ProductParams) -> Self {
        Self {
            search: non_empty(p.search.as_deref()),
            brand: non_empty(p.brand.as_deref()),
            category: non_empty(p.category.as_deref()),
            price_ceiling: parse_lenient(p.price.as_deref(), |v: &f64| v.is_finite()),
            price_sort: p.sort_price.as_deref().and_then(PriceSort::from_token),
            date_sort: p.sort_date.as_deref().and_then(DateSort::from_token),
            page: parse_lenient(p.page.as_deref(), |_: &u64| true).unwrap_or(DEFAULT_PAGE),
            size: parse_lenient(p.size.as_deref(), |v: &u64| *v > 0).unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Store-agnostic filter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Matches every record.
    All,
    And { terms: Vec<Predicate> },
    Or { terms: Vec<Predicate> },
    /// Exact match; a list-valued field matches when any element is equal.
    Eq { field: String, value: String },
    Regex {
        field: String,
        pattern: String,
        case_insensitive: bool,
    },
    /// Field converted to a double, strictly below `bound`.
    NumericLt { field: String, bound: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    ToDouble { field: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Match { predicate: Predicate },
    DeriveField { name: String, expr: Expr },
    Sort { key: String, direction: SortDirection },
    Skip { n: u64 },
    Limit { n: u64 },
}

/// Ordered stage list. Only the planner builds one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub(crate) fn from_stages(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn skip(&self) -> u64 {
        self.stages
            .iter()
            .find_map(|s| match s {
                Stage::Skip { n } => Some(*n),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn limit(&self) -> Option<u64> {
        self.stages.iter().find_map(|s| match s {
            Stage::Limit { n } => Some(*n),
            _ => None,
        })
    }

    /// blake3 hex of the serialized stages; equal pipelines share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(&self.stages).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }
}
