// CLI integration tests
//
// These run the real binary. Interactive stdin is simulated with canned
// input; EOF at any prompt is an abort, which ends the session cleanly.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn record_line(metric: &str, instance: &str, build: u64) -> String {
    format!(
        r#"{{"_aws":{{"CloudWatchMetrics":[{{"Namespace":"PerfTests","Dimensions":[["instance"]],"Metrics":[{{"Name":"mean_difference","Unit":"Milliseconds"}}]}}]}},"metric":"{metric}","instance":"{instance}","data_a":[1.0,2.0,3.0],"data_b":[1.5,2.5,3.5],"p_value":0.2,"mean_difference":0.5,"buildkite_build_number":{build}}}"#
    )
}

fn write_log(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

#[test]
fn test_help_mentions_volcano_plots() {
    Command::cargo_bin("volcan")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("volcano plots"));
}

#[test]
fn test_missing_log_path_fails() {
    Command::cargo_bin("volcan").unwrap().assert().failure();
}

#[test]
fn test_nonexistent_log_file_reports_ingest_error() {
    Command::cargo_bin("volcan")
        .unwrap()
        .arg("/nonexistent/results.ndjson")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ingesting A/B test results"));
}

#[test]
fn test_log_without_ab_records_fails() {
    let log = write_log(&[r#"{"msg":"just a log line"}"#.to_string()]);

    Command::cargo_bin("volcan")
        .unwrap()
        .arg(log.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no A/B test records"));
}

#[test]
fn test_single_slice_log_auto_resolves_without_prompting() {
    let log = write_log(&[record_line("boot_time", "m5d.metal", 1)]);

    // EOF right away: the investigation prompt aborts, session exits cleanly
    Command::cargo_bin("volcan")
        .unwrap()
        .arg(log.path())
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("pre-determined"));
}

#[test]
fn test_multi_value_dimension_is_prompted() {
    let log = write_log(&[
        record_line("boot_time", "m5d.metal", 1),
        record_line("boot_time", "m6i.metal", 2),
    ]);

    Command::cargo_bin("volcan")
        .unwrap()
        .arg(log.path())
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "pick from the below values for dimension",
        ));
}

#[test]
fn test_invalid_filter_regex_is_rejected() {
    let log = write_log(&[record_line("boot_time", "m5d.metal", 1)]);

    Command::cargo_bin("volcan")
        .unwrap()
        .arg(log.path())
        .args(["--filter", "("])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --filter expression"));
}
