//! Translates [`FilterCriteria`] into an ordered [`Pipeline`].
//!
//! Stage order is fixed: match, derived price, price sort, date sort, skip, limit.
//! Planning is pure and never fails; anything the criteria leave unset simply
//! contributes no stage (or no predicate term).

use crate::model::{
    ADDED_TIME_FIELD, BRAND_FIELD, CATEGORIES_FIELD, CONVERTED_PRICE_FIELD, NAME_FIELD,
    PRICE_FIELD,
};
use crate::query::{Expr, FilterCriteria, Pipeline, Predicate, Stage};

/// Fields the free-text search looks at. `regularPrice` is matched as text.
pub const SEARCH_FIELDS: [&str; 4] = [NAME_FIELD, PRICE_FIELD, CATEGORIES_FIELD, BRAND_FIELD];

pub fn build_pipeline(criteria: &FilterCriteria) -> Pipeline {
    let mut stages = Vec::with_capacity(6);
    stages.push(Stage::Match {
        predicate: build_predicate(criteria),
    });
    stages.push(Stage::DeriveField {
        name: CONVERTED_PRICE_FIELD.to_string(),
        expr: Expr::ToDouble {
            field: PRICE_FIELD.to_string(),
        },
    });
    if let Some(order) = criteria.price_sort {
        stages.push(Stage::Sort {
            key: CONVERTED_PRICE_FIELD.to_string(),
            direction: order.direction(),
        });
    }
    if let Some(order) = criteria.date_sort {
        stages.push(Stage::Sort {
            key: ADDED_TIME_FIELD.to_string(),
            direction: order.direction(),
        });
    }
    stages.push(Stage::Skip {
        n: criteria.page.saturating_mul(criteria.size),
    });
    stages.push(Stage::Limit { n: criteria.size });
    Pipeline::from_stages(stages)
}

pub fn build_predicate(criteria: &FilterCriteria) -> Predicate {
    let mut terms = Vec::new();
    if let Some(text) = &criteria.search {
        terms.push(search_predicate(text));
    }
    if let Some(brand) = &criteria.brand {
        terms.push(Predicate::Eq {
            field: BRAND_FIELD.to_string(),
            value: brand.clone(),
        });
    }
    if let Some(category) = &criteria.category {
        terms.push(Predicate::Eq {
            field: CATEGORIES_FIELD.to_string(),
            value: category.clone(),
        });
    }
    if let Some(bound) = criteria.price_ceiling {
        terms.push(Predicate::NumericLt {
            field: PRICE_FIELD.to_string(),
            bound,
        });
    }
    match terms.len() {
        0 => Predicate::All,
        1 => terms.remove(0),
        _ => Predicate::And { terms },
    }
}

/// Case-insensitive literal substring match over [`SEARCH_FIELDS`], disjoined.
pub fn search_predicate(text: &str) -> Predicate {
    let pattern = regex::escape(text);
    Predicate::Or {
        terms: SEARCH_FIELDS
            .iter()
            .map(|field| Predicate::Regex {
                field: field.to_string(),
                pattern: pattern.clone(),
                case_insensitive: true,
            })
            .collect(),
    }
}
