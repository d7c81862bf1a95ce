use crate::reports;
use clap::Args;
use keyword_optimizer::config::Config;
use keyword_optimizer::core_types::Keyword;
use keyword_optimizer::error::KoResult;
use keyword_optimizer::pool::CandidatePool;
use keyword_optimizer::scorer::Scorer;
use keyword_optimizer::seed::{MemorySeedSource, SearchCriteria, SeedSource};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub config: Config,
}

pub fn run(_args: ScoreArgs, config: Config, source: Arc<MemorySeedSource>) -> KoResult<()> {
    let scorer = Scorer::new(config.scoring.formula.as_deref())?;
    let campaign = Arc::new(config.campaign.to_campaign()?);
    info!("🧮 Scoring seed table with {}", scorer.describe());

    let mut estimates = BTreeMap::new();
    for mt in &campaign.match_types {
        let rows = source.fetch_estimates(&SearchCriteria::ideas(*mt, &campaign))?;
        for (text, estimate) in rows {
            estimates.insert(Keyword::new(text, *mt)?, estimate);
        }
    }

    let pool = CandidatePool::from_entries(Arc::clone(&campaign), scorer.score_all(estimates)?);
    let pool = match config.rounds.min_score {
        Some(threshold) => pool.filter_by_minimum_score(threshold),
        None => pool,
    };

    reports::print_score_table(&pool.top_n(config.rounds.result_size), pool.average_score());
    Ok(())
}
