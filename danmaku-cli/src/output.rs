use colored::*;
use danmaku::{AggregateResult, DanmakuStatistics, ProviderOutcome, ProviderRegistry};
use playback_stats::StatisticsSnapshot;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::error::Result;

/// Render the outcome of one fetch.
pub fn format_fetch(
    result: &AggregateResult,
    statistics: &DanmakuStatistics,
    playback: &StatisticsSnapshot,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Pretty => Ok(format_fetch_pretty(result, statistics, playback)),
        OutputFormat::Json => {
            let value = json!({
                "status": "success",
                "results": result,
                "source_count": statistics.source_count(),
                "total_count": statistics.total_count(),
                "playback": playback,
            });
            Ok(serde_json::to_string_pretty(&value)?)
        }
    }
}

fn format_fetch_pretty(
    result: &AggregateResult,
    statistics: &DanmakuStatistics,
    playback: &StatisticsSnapshot,
) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", "Danmaku Sources:".green().bold()));

    if result.is_empty() {
        output.push_str(&format!("  {}\n", "No providers configured".yellow()));
    }

    for entry in result {
        let status = match &entry.outcome {
            ProviderOutcome::Success { matched } => format!(
                "{} ({:?})",
                matched.count().to_string().cyan(),
                matched.match_info.method
            ),
            ProviderOutcome::Failure { cause } => format!("{} {}", "failed:".red(), cause),
            ProviderOutcome::TimedOut => "timed out".red().to_string(),
        };
        output.push_str(&format!(
            "  {}: {}\n",
            entry.provider_id.yellow(),
            status
        ));
    }

    output.push_str(&format!(
        "{} {}\n",
        "Summary:".green(),
        statistics.summary().cyan()
    ));

    if let Some(filename) = &playback.playing_filename {
        output.push_str(&format!("{} {}\n", "Playing:".green(), filename.cyan()));
    }
    if let Some(info) = playback.source_info() {
        output.push_str(&format!(
            "{} {}\n",
            "Source:".green(),
            info.display_name.cyan()
        ));
    }

    output
}

/// Render the configured providers.
pub fn format_providers(registry: &ProviderRegistry) -> String {
    if registry.is_empty() {
        return format!(
            "{}\n",
            "No providers configured. Add [[providers]] entries to the config file.".yellow()
        );
    }

    let mut output = format!("{}\n", "Providers:".green().bold());
    for (i, id) in registry.ids().into_iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, id.cyan()));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use danmaku::{
        DanmakuError, DanmakuLoadingState, DanmakuMatch, DanmakuMatchMethod, ProviderFetchResult,
    };

    fn sample() -> (AggregateResult, DanmakuStatistics) {
        let result = AggregateResult::new(vec![
            ProviderFetchResult {
                provider_id: "dandanplay".to_string(),
                outcome: ProviderOutcome::Success {
                    matched: DanmakuMatch::new("dandanplay", DanmakuMatchMethod::Exact, vec![]),
                },
            },
            ProviderFetchResult {
                provider_id: "animeko".to_string(),
                outcome: ProviderOutcome::Failure {
                    cause: DanmakuError::transport("HTTP 503"),
                },
            },
        ]);
        let statistics =
            DanmakuStatistics::new(true, DanmakuLoadingState::Success(result.clone()));
        (result, statistics)
    }

    #[test]
    fn test_pretty_lists_every_provider() {
        colored::control::set_override(false);
        let (result, statistics) = sample();
        let output = format_fetch(
            &result,
            &statistics,
            &StatisticsSnapshot::PLACEHOLDER,
            OutputFormat::Pretty,
        )
        .unwrap();

        assert!(output.contains("dandanplay: 0 (Exact)"));
        assert!(output.contains("animeko: failed:"));
        assert!(output.contains("HTTP 503"));
        assert!(output.contains("1 sources, 0 danmaku in total"));
    }

    #[test]
    fn test_json_output() {
        let (result, statistics) = sample();
        let output = format_fetch(
            &result,
            &statistics,
            &StatisticsSnapshot::PLACEHOLDER,
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["source_count"], 1);
        assert_eq!(value["results"]["results"][1]["outcome"]["status"], "failure");
        assert_eq!(value["playback"]["is_placeholder"], true);
    }
}
