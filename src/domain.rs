//! Canonical panel shapes handed to the downstream model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Unique key of a panel row. Field order gives the `(region, date)` sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PanelKey {
    pub region: String,
    pub date: NaiveDate,
}

impl PanelKey {
    pub fn new(region: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            region: region.into(),
            date,
        }
    }
}

/// Daily figures for one region on one date
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub positive: f64,
    /// Testing volume, or a placeholder constant when the feed has none
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deaths: Option<f64>,
}

impl Observation {
    pub fn new(positive: f64, total: f64, deaths: Option<f64>) -> Self {
        Self { positive, total, deaths }
    }
}

/// Flat row form used for export and for building panels in tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    pub region: String,
    pub date: NaiveDate,
    pub positive: f64,
    pub total: f64,
    pub deaths: Option<f64>,
}

/// Normalized `(region, date) -> Observation` table, always sorted by key.
///
/// Only the normalizers in this crate insert into a panel; everything handed
/// out afterwards is read-only or produces a new panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalPanel {
    rows: BTreeMap<PanelKey, Observation>,
}

impl CanonicalPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, returning the observation it replaced if the key already existed
    pub(crate) fn insert(
        &mut self,
        key: PanelKey,
        observation: Observation,
    ) -> Option<Observation> {
        self.rows.insert(key, observation)
    }

    pub fn get(&self, region: &str, date: NaiveDate) -> Option<&Observation> {
        self.rows.get(&PanelKey::new(region, date))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PanelKey, &Observation)> {
        self.rows.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PanelKey> {
        self.rows.keys()
    }

    /// Rows of a single region in date order
    pub fn region<'a>(
        &'a self,
        region: &str,
    ) -> impl Iterator<Item = (NaiveDate, &'a Observation)> + 'a {
        let start = PanelKey::new(region, NaiveDate::MIN);
        let end = PanelKey::new(region, NaiveDate::MAX);
        self.rows.range(start..=end).map(|(k, v)| (k.date, v))
    }

    pub fn regions(&self) -> BTreeSet<&str> {
        self.rows.keys().map(|k| k.region.as_str()).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.keys().map(|k| k.date).min()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.keys().map(|k| k.date).max()
    }

    /// New panel with only the rows accepted by `keep`
    pub fn filter<F>(&self, mut keep: F) -> CanonicalPanel
    where
        F: FnMut(&PanelKey, &Observation) -> bool,
    {
        self.rows
            .iter()
            .filter(|(k, v)| keep(k, v))
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    /// New panel with every observation rewritten by `f`
    pub fn map_observations<F>(&self, mut f: F) -> CanonicalPanel
    where
        F: FnMut(&PanelKey, Observation) -> Observation,
    {
        self.rows
            .iter()
            .map(|(k, v)| (k.clone(), f(k, *v)))
            .collect()
    }

    pub fn to_rows(&self) -> Vec<PanelRow> {
        self.rows
            .iter()
            .map(|(k, v)| PanelRow {
                region: k.region.clone(),
                date: k.date,
                positive: v.positive,
                total: v.total,
                deaths: v.deaths,
            })
            .collect()
    }
}

/// Later entries win on duplicate keys
impl FromIterator<(PanelKey, Observation)> for CanonicalPanel {
    fn from_iter<I: IntoIterator<Item = (PanelKey, Observation)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<PanelRow> for CanonicalPanel {
    fn from_iter<I: IntoIterator<Item = PanelRow>>(iter: I) -> Self {
        iter.into_iter()
            .map(|r| {
                (
                    PanelKey::new(r.region, r.date),
                    Observation::new(r.positive, r.total, r.deaths),
                )
            })
            .collect()
    }
}
