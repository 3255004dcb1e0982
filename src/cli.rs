//! CLI argument parsing for Volcan

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "volcan")]
#[command(version)]
#[command(about = "Computes volcano plots for A/B performance test results", long_about = None)]
pub struct Cli {
    /// Path to the ndjson file containing the A/B testing EMF logs
    pub emf_logs: PathBuf,

    /// Re-run the permutation tests with this many resamples instead of
    /// trusting the logged p-values. High counts give more accurate
    /// p-values at the cost of (significant) delays when computing plots
    #[arg(long = "resample-count", value_name = "N")]
    pub resample_count: Option<i64>,

    /// Seed for Monte-Carlo resampling, for reproducible p-values
    /// (only meaningful together with --resample-count)
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Only ingest metrics whose name matches this regular expression
    #[arg(long = "filter", value_name = "REGEX")]
    pub metric_filter: Option<String>,

    /// Enable debug tracing to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_log_path() {
        let cli = Cli::parse_from(["volcan", "test_results.ndjson"]);
        assert_eq!(cli.emf_logs, PathBuf::from("test_results.ndjson"));
        assert_eq!(cli.resample_count, None);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_parses_resample_count_and_seed() {
        let cli = Cli::parse_from([
            "volcan",
            "logs.ndjson",
            "--resample-count",
            "9999",
            "--seed",
            "7",
        ]);
        assert_eq!(cli.resample_count, Some(9999));
        assert_eq!(cli.seed, Some(7));
    }

    #[test]
    fn test_cli_accepts_negative_resample_count() {
        // Validation is the statistic layer's job; the CLI just carries it
        let cli = Cli::parse_from(["volcan", "logs.ndjson", "--resample-count=-1"]);
        assert_eq!(cli.resample_count, Some(-1));
    }

    #[test]
    fn test_cli_parses_metric_filter() {
        let cli = Cli::parse_from(["volcan", "logs.ndjson", "--filter", "^boot"]);
        assert_eq!(cli.metric_filter.as_deref(), Some("^boot"));
    }

    #[test]
    fn test_cli_requires_log_path() {
        assert!(Cli::try_parse_from(["volcan"]).is_err());
    }
}
