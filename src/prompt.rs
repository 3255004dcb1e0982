//! The selection collaborator: everything the session needs to ask a human.
//!
//! The engine only ever sees the trait, so tests drive it with scripted
//! implementations and the terminal never appears outside [`TerminalPrompt`].
//! Menu answers are closed enums from [`crate::engine`]; aborting is a
//! `None`, never an error.

use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::engine::{AggregateAction, Investigation, MetricAction};

/// Interactive question interface consumed by the session driver.
pub trait Prompt {
    /// Checkbox-style selection over candidate values of a dimension.
    /// Returns the chosen subset; `None` (or, per contract, an empty
    /// selection mapped to `None` by implementations) aborts the session.
    fn select_values(&mut self, dimension: &str, candidates: &[String]) -> Option<Vec<String>>;

    /// Free-form build-number entry. `None` means "no restriction" or abort.
    fn build_number(&mut self, message: &str) -> Option<u64>;

    /// Which investigation to run once the table is reduced.
    fn investigation(&mut self) -> Option<Investigation>;

    /// Next action in the per-metric deep dive.
    fn metric_action(&mut self) -> MetricAction;

    /// Next action in the holistic aggregate view.
    fn aggregate_action(&mut self) -> AggregateAction;
}

/// Line-oriented terminal implementation over any buffered reader (stdin in
/// production, a cursor in tests).
pub struct TerminalPrompt<R: BufRead> {
    input: R,
}

impl TerminalPrompt<io::BufReader<io::Stdin>> {
    pub fn stdin() -> Self {
        Self {
            input: io::BufReader::new(io::stdin()),
        }
    }
}

impl<R: BufRead> TerminalPrompt<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// One trimmed line; `None` on EOF.
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }

    fn flush_stdout() {
        let _ = io::stdout().flush();
    }
}

impl<R: BufRead> Prompt for TerminalPrompt<R> {
    fn select_values(&mut self, dimension: &str, candidates: &[String]) -> Option<Vec<String>> {
        println!(
            "\nPlease pick from the below values for dimension '{}':",
            dimension.bold()
        );
        for (i, candidate) in candidates.iter().enumerate() {
            println!("  {}) {candidate}", i + 1);
        }
        loop {
            print!("Selection (comma-separated numbers, 'all', empty aborts): ");
            Self::flush_stdout();
            let line = self.read_line()?;
            if line.is_empty() {
                return None;
            }
            if line.eq_ignore_ascii_case("all") {
                return Some(candidates.to_vec());
            }

            let indices: Option<Vec<usize>> = line
                .split(',')
                .map(|part| part.trim().parse::<usize>().ok())
                .collect();
            let chosen: Option<Vec<String>> = indices.and_then(|indices| {
                indices
                    .iter()
                    .map(|&i| (1..=candidates.len()).contains(&i).then(|| candidates[i - 1].clone()))
                    .collect()
            });
            match chosen {
                Some(values) if !values.is_empty() => return Some(values),
                _ => println!("Please enter numbers between 1 and {}", candidates.len()),
            }
        }
    }

    fn build_number(&mut self, message: &str) -> Option<u64> {
        loop {
            print!("{message} ");
            Self::flush_stdout();
            let line = self.read_line()?;
            if line.is_empty() {
                return None;
            }
            match line.parse::<u64>() {
                Ok(number) => return Some(number),
                Err(_) => println!("Please enter a valid integer"),
            }
        }
    }

    fn investigation(&mut self) -> Option<Investigation> {
        println!("\nWhat kind of investigation do you want to perform?");
        println!("  1) Holistic view of p-values distribution of selected metrics");
        println!("  2) One-by-one deep dive into each metric");
        loop {
            print!("Selection: ");
            Self::flush_stdout();
            match self.read_line()?.as_str() {
                "1" => return Some(Investigation::Holistic),
                "2" => return Some(Investigation::PerMetric),
                "" => return None,
                _ => println!("Please enter 1 or 2"),
            }
        }
    }

    fn metric_action(&mut self) -> MetricAction {
        println!("\nWhat do you want to do with this metric?");
        println!("  1) Display volcano plot of historical A/B-Tests");
        println!("  2) Display data for specific build");
        println!("  3) Nothing, take me to next metric (default)");
        println!("  4) Exit");
        loop {
            print!("Selection: ");
            Self::flush_stdout();
            match self.read_line().as_deref() {
                Some("1") => return MetricAction::Volcano,
                Some("2") => return MetricAction::BuildDetail,
                Some("3") | Some("") => return MetricAction::NextMetric,
                Some("4") | None => return MetricAction::Exit,
                Some(_) => println!("Please enter a number between 1 and 4"),
            }
        }
    }

    fn aggregate_action(&mut self) -> AggregateAction {
        println!("\nWhat type of aggregate plot are you interested in?");
        println!("  1) Volcano plot of relative regressions");
        println!("  2) Histogram of p-values");
        println!("  3) Histogram of relative regressions");
        println!("  4) Exit (default)");
        loop {
            print!("Selection: ");
            Self::flush_stdout();
            match self.read_line().as_deref() {
                Some("1") => return AggregateAction::Volcano,
                Some("2") => return AggregateAction::PValueHistogram,
                Some("3") => return AggregateAction::RegressionHistogram,
                Some("4") | Some("") | None => return AggregateAction::Exit,
                Some(_) => println!("Please enter a number between 1 and 4"),
            }
        }
    }
}
