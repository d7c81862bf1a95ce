use crate::reports;
use clap::Args;
use keyword_optimizer::config::Config;
use keyword_optimizer::error::KoResult;
use keyword_optimizer::optimizer::{OptimizationOptions, Optimizer, ProgressCallback, RoundReport};
use keyword_optimizer::scorer::Scorer;
use keyword_optimizer::seed::MemorySeedSource;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub config: Config,

    /// Print the result as JSON instead of a table.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

struct CliLogger;
impl ProgressCallback for CliLogger {
    fn on_round(&self, report: &RoundReport) {
        info!(
            "Round {:3} | Pool: {:5} | New: {:5} | Rejected: {:5} | Best: {}",
            report.round,
            report.pool_size,
            report.alternatives,
            report.rejected,
            report
                .best_score
                .map(|s| format!("{:.3}", s))
                .unwrap_or_else(|| "---".to_string())
        );
    }
}

pub fn run(args: OptimizeArgs, config: Config, source: Arc<MemorySeedSource>) -> KoResult<()> {
    let scorer = Scorer::new(config.scoring.formula.as_deref())?;
    let campaign = config.campaign.to_campaign()?;
    let options = OptimizationOptions::from(&config);

    let mut optimizer = Optimizer::new(source, scorer, campaign, options);
    let result = optimizer.run(CliLogger)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        reports::print_optimization_report(&result);
    }
    Ok(())
}
