// End-to-end session tests over scripted collaborators
//
// The session is driven exactly like production, except the prompt answers
// come from a queue and the renderer records the series it was handed
// instead of drawing them.

use std::collections::VecDeque;

use volcan::engine::{AggregateAction, EnginePhase, Investigation, MetricAction};
use volcan::ingest::Ingested;
use volcan::prompt::Prompt;
use volcan::render::Renderer;
use volcan::report::{HistogramSeries, RunSeries, VolcanoSeries};
use volcan::sample::SamplePair;
use volcan::session::Session;
use volcan::table::{DimValue, Row};

#[derive(Default)]
struct ScriptedPrompt {
    selections: VecDeque<Option<Vec<String>>>,
    builds: VecDeque<Option<u64>>,
    investigation: Option<Investigation>,
    metric_actions: VecDeque<MetricAction>,
    aggregate_actions: VecDeque<AggregateAction>,
    asked_dimensions: Vec<String>,
}

impl Prompt for ScriptedPrompt {
    fn select_values(&mut self, dimension: &str, _candidates: &[String]) -> Option<Vec<String>> {
        self.asked_dimensions.push(dimension.to_string());
        self.selections.pop_front().unwrap_or(None)
    }

    fn build_number(&mut self, _message: &str) -> Option<u64> {
        self.builds.pop_front().unwrap_or(None)
    }

    fn investigation(&mut self) -> Option<Investigation> {
        self.investigation
    }

    fn metric_action(&mut self) -> MetricAction {
        self.metric_actions.pop_front().unwrap_or(MetricAction::Exit)
    }

    fn aggregate_action(&mut self) -> AggregateAction {
        self.aggregate_actions
            .pop_front()
            .unwrap_or(AggregateAction::Exit)
    }
}

#[derive(Default)]
struct CollectingRenderer {
    volcanoes: Vec<VolcanoSeries>,
    histograms: Vec<HistogramSeries>,
    overlays: Vec<RunSeries>,
}

impl Renderer for CollectingRenderer {
    fn volcano(&mut self, series: &VolcanoSeries) {
        self.volcanoes.push(series.clone());
    }

    fn histogram(&mut self, series: &HistogramSeries) {
        self.histograms.push(series.clone());
    }

    fn run_overlay(&mut self, series: &RunSeries) {
        self.overlays.push(series.clone());
    }
}

fn result(p_value: f64, mean_difference: f64, build: u64) -> SamplePair {
    SamplePair::new(
        vec![10.0, 12.0, 11.0],
        vec![11.0, 13.0, 12.0],
        p_value,
        mean_difference,
        build,
        "Milliseconds".to_string(),
        "boot_time".to_string(),
        None,
    )
}

fn row(values: &[(&str, &str)], pair: SamplePair) -> Row {
    Row {
        dimensions: values
            .iter()
            .map(|(name, value)| (name.to_string(), DimValue::Present(value.to_string())))
            .collect(),
        result: pair,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn ingested(rows: Vec<Row>, dimensions: &[&str]) -> Ingested {
    Ingested {
        dimensions: strings(dimensions),
        rows,
    }
}

#[test]
fn test_full_reduction_then_per_metric_volcano() {
    let rows = vec![
        row(&[("io_engine", "Sync"), ("vcpus", "2")], result(0.02, 1.0, 1)),
        row(&[("io_engine", "Async"), ("vcpus", "2")], result(0.50, 0.1, 2)),
        row(&[("io_engine", "Sync"), ("vcpus", "4")], result(0.90, 0.0, 3)),
    ];

    let mut prompt = ScriptedPrompt {
        // Two questions: whichever dimension comes first, then the other
        selections: VecDeque::from([Some(strings(&["Sync"])), Some(strings(&["2"]))]),
        investigation: Some(Investigation::PerMetric),
        metric_actions: VecDeque::from([MetricAction::Volcano, MetricAction::Exit]),
        ..Default::default()
    };
    let mut renderer = CollectingRenderer::default();

    let state = Session::new(&mut prompt, &mut renderer)
        .run(ingested(rows, &["io_engine", "vcpus"]))
        .unwrap();

    assert_eq!(state.phase(), EnginePhase::Resolved);
    assert_eq!(state.table().groups.len(), 1);
    assert_eq!(renderer.volcanoes.len(), 1);
    assert_eq!(renderer.volcanoes[0].run_count(), 1);
    assert_eq!(renderer.volcanoes[0].inverse_p, vec![50.0]);
}

#[test]
fn test_ask_first_dimension_goes_before_higher_entropy_ones() {
    // "instance" is an ask-first dimension; "io_engine" splits the table
    // more evenly but must still come second.
    let rows = vec![
        row(&[("instance", "m5d"), ("io_engine", "Sync")], result(0.1, 1.0, 1)),
        row(&[("instance", "m5d"), ("io_engine", "Async")], result(0.2, 1.0, 2)),
        row(&[("instance", "m5d"), ("io_engine", "Sync")], result(0.3, 1.0, 3)),
        row(&[("instance", "m6i"), ("io_engine", "Async")], result(0.4, 1.0, 4)),
    ];

    let mut prompt = ScriptedPrompt {
        selections: VecDeque::from([
            Some(strings(&["m5d", "m6i"])),
            Some(strings(&["Sync", "Async"])),
        ]),
        ..Default::default()
    };
    let mut renderer = CollectingRenderer::default();

    Session::new(&mut prompt, &mut renderer)
        .run(ingested(rows, &["instance", "io_engine"]))
        .unwrap();

    assert_eq!(prompt.asked_dimensions, strings(&["instance", "io_engine"]));
}

#[test]
fn test_single_value_dimension_is_auto_resolved_without_prompt() {
    let rows = vec![
        row(&[("host_kernel", "4.14"), ("io_engine", "Sync")], result(0.1, 1.0, 1)),
        row(&[("host_kernel", "4.14"), ("io_engine", "Async")], result(0.2, 1.0, 2)),
    ];

    let mut prompt = ScriptedPrompt {
        selections: VecDeque::from([Some(strings(&["Sync"]))]),
        ..Default::default()
    };
    let mut renderer = CollectingRenderer::default();

    let state = Session::new(&mut prompt, &mut renderer)
        .run(ingested(rows, &["host_kernel", "io_engine"]))
        .unwrap();

    // host_kernel was resolved, but only io_engine was ever asked about
    assert_eq!(prompt.asked_dimensions, strings(&["io_engine"]));
    assert_eq!(
        state.resolved().get("host_kernel"),
        Some(&strings(&["4.14"]))
    );
}

#[test]
fn test_abort_during_reduction_keeps_last_state() {
    let rows = vec![
        row(&[("io_engine", "Sync"), ("vcpus", "2")], result(0.1, 1.0, 1)),
        row(&[("io_engine", "Async"), ("vcpus", "4")], result(0.2, 1.0, 2)),
    ];

    // First answer aborts; nothing else must be consumed
    let mut prompt = ScriptedPrompt {
        selections: VecDeque::from([None]),
        investigation: Some(Investigation::PerMetric),
        ..Default::default()
    };
    let mut renderer = CollectingRenderer::default();

    let state = Session::new(&mut prompt, &mut renderer)
        .run(ingested(rows, &["io_engine", "vcpus"]))
        .unwrap();

    // Table kept as last resolved: nothing was eliminated
    assert_eq!(state.table().groups.len(), 2);
    assert_eq!(prompt.asked_dimensions.len(), 1);
    assert!(renderer.volcanoes.is_empty());
}

#[test]
fn test_rows_missing_a_dimension_survive_elimination_on_it() {
    let rows = vec![
        row(&[("io_engine", "Sync")], result(0.1, 1.0, 1)),
        row(&[("io_engine", "Async")], result(0.2, 1.0, 2)),
        // This run predates io_engine logging entirely
        row(&[], result(0.3, 1.0, 3)),
    ];

    let mut prompt = ScriptedPrompt {
        selections: VecDeque::from([Some(strings(&["Sync"]))]),
        ..Default::default()
    };
    let mut renderer = CollectingRenderer::default();

    let state = Session::new(&mut prompt, &mut renderer)
        .run(ingested(rows, &["io_engine"]))
        .unwrap();

    let builds: Vec<u64> = state
        .table()
        .all_runs()
        .map(|run| run.build_number)
        .collect();
    assert_eq!(builds, vec![1, 3]);
}

#[test]
fn test_holistic_view_with_build_restriction() {
    let rows = vec![
        row(&[("io_engine", "Sync")], result(0.10, 1.0, 101)),
        row(&[("io_engine", "Sync")], result(0.20, 1.0, 102)),
    ];

    let mut prompt = ScriptedPrompt {
        investigation: Some(Investigation::Holistic),
        builds: VecDeque::from([Some(101)]),
        aggregate_actions: VecDeque::from([
            AggregateAction::PValueHistogram,
            AggregateAction::Volcano,
            AggregateAction::Exit,
        ]),
        ..Default::default()
    };
    let mut renderer = CollectingRenderer::default();

    Session::new(&mut prompt, &mut renderer)
        .run(ingested(rows, &["io_engine"]))
        .unwrap();

    // io_engine was single-valued, so no selection prompt ran at all
    assert!(prompt.asked_dimensions.is_empty());
    assert_eq!(renderer.histograms.len(), 1);
    assert_eq!(renderer.histograms[0].values, vec![0.10]);
    assert_eq!(renderer.volcanoes.len(), 1);
    assert!(renderer.volcanoes[0].relative);
    assert_eq!(renderer.volcanoes[0].run_count(), 1);
}

#[test]
fn test_build_detail_renders_overlay_for_matching_run() {
    let rows = vec![row(&[("io_engine", "Sync")], result(0.05, 2.0, 777))];

    let mut prompt = ScriptedPrompt {
        investigation: Some(Investigation::PerMetric),
        builds: VecDeque::from([Some(999), Some(777)]),
        metric_actions: VecDeque::from([
            MetricAction::BuildDetail, // build 999: no data, prints a notice
            MetricAction::BuildDetail, // build 777: renders the overlay
            MetricAction::Exit,
        ]),
        ..Default::default()
    };
    let mut renderer = CollectingRenderer::default();

    Session::new(&mut prompt, &mut renderer)
        .run(ingested(rows, &["io_engine"]))
        .unwrap();

    assert_eq!(renderer.overlays.len(), 1);
    assert_eq!(renderer.overlays[0].build_number, 777);
    assert_eq!(renderer.overlays[0].p_value, 0.05);
}
