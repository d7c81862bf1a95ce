use crate::core_types::{MatchType, Money};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use typed_builder::TypedBuilder;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum NetworkSetting {
    #[default]
    Search,
    SearchAndPartners,
    Display,
}

/// Campaign-level settings that shape estimate retrieval and scoring.
/// Built once per run and shared read-only by every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct CampaignConfiguration {
    /// Location criterion ids (e.g. 2840 = United States).
    #[builder(default)]
    pub locations: Vec<i64>,
    /// Language criterion ids (e.g. 1000 = English).
    #[builder(default)]
    pub languages: Vec<i64>,
    #[builder(default)]
    pub network: NetworkSetting,
    #[builder(default = "USD".to_string(), setter(into))]
    pub currency: String,
    #[builder(default, setter(strip_option))]
    pub max_cpc: Option<Money>,
    #[builder(default = MatchType::iter().collect())]
    pub match_types: BTreeSet<MatchType>,
}

impl Default for CampaignConfiguration {
    fn default() -> Self {
        Self::builder().build()
    }
}
