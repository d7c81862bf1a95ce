use crate::campaign::{CampaignConfiguration, NetworkSetting};
use crate::core_types::{create_money, MatchType};
use crate::error::{KoResult, OptimizerError};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub rounds: RoundParams,
    #[command(flatten)]
    pub scoring: ScoringParams,
    #[command(flatten)]
    pub campaign: CampaignParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundParams {
    /// Hard cap on the number of refinement rounds.
    #[arg(long, default_value_t = 10)]
    pub max_steps: usize,
    /// Stop once the best score improves by less than this between rounds.
    #[arg(long, default_value_t = 0.0)]
    pub min_improvement: f64,
    /// Number of top performers used to seed related-idea queries.
    #[arg(long, default_value_t = 10)]
    pub max_population_size: usize,
    /// Stop once the pool grows beyond this many keywords.
    #[arg(long, default_value_t = 1000)]
    pub max_alternatives: usize,
    /// Drop candidates scoring below this value after each round.
    #[arg(long)]
    pub min_score: Option<f64>,
    #[arg(long, default_value_t = 25)]
    pub result_size: usize,
}

impl Default for RoundParams {
    fn default() -> Self {
        Self {
            max_steps: 10,
            min_improvement: 0.0,
            max_population_size: 10,
            max_alternatives: 1000,
            min_score: None,
            result_size: 25,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScoringParams {
    /// Score formula, e.g. "clicksPerDay * 2 - avgCpc". Default scorer if unset.
    #[arg(long)]
    pub formula: Option<String>,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignParams {
    /// Comma-separated location criterion ids.
    #[arg(long, default_value = "")]
    pub locations: String,
    /// Comma-separated language criterion ids.
    #[arg(long, default_value = "")]
    pub languages: String,
    #[arg(long, default_value = "BROAD,PHRASE,EXACT")]
    pub match_types: String,
    #[arg(long, default_value = "search")]
    pub network: String,
    #[arg(long, default_value = "USD")]
    pub currency: String,
    #[arg(long)]
    pub max_cpc_micros: Option<i64>,
}

impl Default for CampaignParams {
    fn default() -> Self {
        Self {
            locations: String::new(),
            languages: String::new(),
            match_types: "BROAD,PHRASE,EXACT".to_string(),
            network: "search".to_string(),
            currency: "USD".to_string(),
            max_cpc_micros: None,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> KoResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn validate(&self) -> KoResult<()> {
        let r = &self.rounds;
        if r.result_size == 0 {
            return Err(OptimizerError::Config(
                "--result-size must be at least 1".to_string(),
            ));
        }
        if !r.min_improvement.is_finite() {
            return Err(OptimizerError::Config(
                "--min-improvement must be a finite number".to_string(),
            ));
        }
        if r.min_score.is_some_and(|s| !s.is_finite()) {
            return Err(OptimizerError::Config(
                "--min-score must be a finite number".to_string(),
            ));
        }
        self.campaign.to_campaign().map(|_| ())
    }

    /// Overwrites fields with values the user typed on the command line,
    /// leaving file-provided values in place for everything else.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($section:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$section.$field = cli.$section.$field.clone();
                }
            };
        }

        update_if_present!(rounds.max_steps);
        update_if_present!(rounds.min_improvement);
        update_if_present!(rounds.max_population_size);
        update_if_present!(rounds.max_alternatives);
        update_if_present!(rounds.min_score);
        update_if_present!(rounds.result_size);

        update_if_present!(scoring.formula);

        update_if_present!(campaign.locations);
        update_if_present!(campaign.languages);
        update_if_present!(campaign.match_types);
        update_if_present!(campaign.network);
        update_if_present!(campaign.currency);
        update_if_present!(campaign.max_cpc_micros);
    }
}

impl CampaignParams {
    pub fn to_campaign(&self) -> KoResult<CampaignConfiguration> {
        let network = NetworkSetting::from_str(self.network.trim()).map_err(|_| {
            OptimizerError::Config(format!("Unknown network setting '{}'", self.network))
        })?;

        let currency = self.currency.trim();
        if currency.is_empty() {
            return Err(OptimizerError::Config(
                "--currency must not be empty".to_string(),
            ));
        }

        let campaign = CampaignConfiguration::builder()
            .locations(parse_id_list(&self.locations, "locations")?)
            .languages(parse_id_list(&self.languages, "languages")?)
            .network(network)
            .currency(currency)
            .match_types(self.get_match_types()?)
            .build();

        Ok(match self.max_cpc_micros {
            Some(micros) => CampaignConfiguration {
                max_cpc: Some(create_money(micros)),
                ..campaign
            },
            None => campaign,
        })
    }

    pub fn get_match_types(&self) -> KoResult<BTreeSet<MatchType>> {
        let types = split_list(&self.match_types)
            .map(|s| {
                MatchType::from_str(s).map_err(|_| {
                    OptimizerError::Config(format!("Invalid match type '{}' in match_types", s))
                })
            })
            .collect::<KoResult<BTreeSet<_>>>()?;

        if types.is_empty() {
            return Err(OptimizerError::Config(
                "--match-types requires at least one value".to_string(),
            ));
        }
        Ok(types)
    }
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|p| !p.is_empty())
}

fn parse_id_list(s: &str, name: &str) -> KoResult<Vec<i64>> {
    split_list(s)
        .map(|p| {
            p.parse()
                .map_err(|_| OptimizerError::Config(format!("Invalid id '{}' in {}", p, name)))
        })
        .collect()
}
