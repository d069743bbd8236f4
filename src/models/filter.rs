use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Browse filter. `FilterSpec::default()` is the "no filter" value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterSpec {
    pub categories: Vec<String>,
    /// Transaction type (sell / buy / rent).
    pub kind: Option<String>,
    pub groups: Vec<String>,
    pub subgroups: Vec<String>,
    pub items: Vec<String>,
    pub regions: Vec<String>,
    pub villages: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.kind.is_none()
            && self.groups.is_empty()
            && self.subgroups.is_empty()
            && self.items.is_empty()
            && self.regions.is_empty()
            && self.villages.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.price_min.is_none()
            && self.price_max.is_none()
    }

    pub fn validate(&self) -> StoreResult<()> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(StoreError::validation("date_from is after date_to"));
            }
        }
        for price in [self.price_min, self.price_max].into_iter().flatten() {
            if !price.is_finite() || price < 0.0 {
                return Err(StoreError::validation("price bounds must be non-negative"));
            }
        }
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                return Err(StoreError::validation("price_min is greater than price_max"));
            }
        }
        Ok(())
    }

    /// Query pairs for the wire. Array filters repeat their key once per value.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let repeated: [(&'static str, &Vec<String>); 6] = [
            ("region", &self.regions),
            ("village", &self.villages),
            ("category", &self.categories),
            ("group", &self.groups),
            ("subgroup", &self.subgroups),
            ("item", &self.items),
        ];
        for (key, values) in repeated {
            pairs.extend(values.iter().map(|v| (key, v.clone())));
        }
        if let Some(kind) = &self.kind {
            pairs.push(("type", kind.clone()));
        }
        if let Some(d) = self.date_from {
            pairs.push(("date_from", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(d) = self.date_to {
            pairs.push(("date_to", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(p) = self.price_min {
            pairs.push(("price_min", p.to_string()));
        }
        if let Some(p) = self.price_max {
            pairs.push(("price_max", p.to_string()));
        }
        pairs
    }
}
