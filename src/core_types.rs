use crate::error::{KoResult, OptimizerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// Micro-units per nominal currency unit.
pub const MICRO_UNITS: i64 = 1_000_000;

const PLACEHOLDER_NULL: &str = "       ---";

/// A currency amount held as integer micro-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    pub micro_amount: i64,
}

pub fn create_money(micro_amount: i64) -> Money {
    Money { micro_amount }
}

impl Money {
    /// Nominal currency units, e.g. 1_500_000 micros -> 1.5.
    pub fn as_units(&self) -> f64 {
        self.micro_amount as f64 / MICRO_UNITS as f64
    }

    /// Floored mean of two amounts, computed without overflow.
    pub fn mean(self, other: Money) -> Money {
        let a = self.micro_amount;
        let b = other.micro_amount;
        let halves = a.div_euclid(2) + b.div_euclid(2);
        let carry = (a.rem_euclid(2) + b.rem_euclid(2)) / 2;
        create_money(halves + carry)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:10.2}", self.as_units())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum MatchType {
    Broad,
    Phrase,
    Exact,
}

/// A keyword is identified by its text together with its match type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Keyword {
    text: String,
    match_type: MatchType,
}

impl Keyword {
    pub fn new(text: impl AsRef<str>, match_type: MatchType) -> KoResult<Self> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(OptimizerError::InvalidKeyword(
                "keyword text must not be empty".to_string(),
            ));
        }
        Ok(Self {
            text: text.to_string(),
            match_type,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    /// Same text under a different match type.
    pub fn with_match_type(&self, match_type: MatchType) -> Self {
        Self {
            text: self.text.clone(),
            match_type,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.text, self.match_type)
    }
}

/// Estimated traffic statistics for a keyword. Every field may be missing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsEstimate {
    pub avg_cpc: Option<Money>,
    pub avg_position: Option<f64>,
    pub clicks_per_day: Option<f64>,
    pub impressions_per_day: Option<f64>,
    pub click_through_rate: Option<f64>,
    pub total_cost: Option<Money>,
}

impl StatsEstimate {
    /// Field-wise mean of a low and a high estimate.
    /// A field is absent in the result if it is absent on either side.
    pub fn mean(min: &StatsEstimate, max: &StatsEstimate) -> StatsEstimate {
        StatsEstimate {
            avg_cpc: mean_money(min.avg_cpc, max.avg_cpc),
            avg_position: mean_f64(min.avg_position, max.avg_position),
            clicks_per_day: mean_f64(min.clicks_per_day, max.clicks_per_day),
            impressions_per_day: mean_f64(min.impressions_per_day, max.impressions_per_day),
            click_through_rate: mean_f64(min.click_through_rate, max.click_through_rate),
            total_cost: mean_money(min.total_cost, max.total_cost),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == StatsEstimate::default()
    }
}

fn mean_money(a: Option<Money>, b: Option<Money>) -> Option<Money> {
    Some(a?.mean(b?))
}

fn mean_f64(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some((a? + b?) / 2.0)
}

fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:10.3}", v),
        None => PLACEHOLDER_NULL.to_string(),
    }
}

fn format_money(value: Option<Money>) -> String {
    match value {
        Some(m) => m.to_string(),
        None => PLACEHOLDER_NULL.to_string(),
    }
}

impl fmt::Display for StatsEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Imp: {} Cli: {} Ctr: {} Pos: {} Cpc: {} Cos: {}",
            format_number(self.impressions_per_day),
            format_number(self.clicks_per_day),
            format_number(self.click_through_rate),
            format_number(self.avg_position),
            format_money(self.avg_cpc),
            format_money(self.total_cost),
        )
    }
}
