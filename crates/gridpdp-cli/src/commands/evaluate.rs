//! Evaluate a request document against policy documents.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use gridpdp::{
    Axis, EvaluationContext, EvaluationMode, PolicyDecisionPoint, Request, RequestTuple, Response,
    TupleOutcome,
};
use gridpdp_config::ConfigLoader;
use serde::Serialize;
use tracing::info;

use crate::OutputFormat;
use crate::style::{
    self, colors::SemanticStyle, print_error, print_grid_table, print_hint, print_success,
    print_warn,
};

/// Exit status when no tuple is permitted.
const DENIED: u8 = 2;

pub struct EvaluateArgs {
    pub request: PathBuf,
    pub policies: Vec<PathBuf>,
    pub project: PathBuf,
    pub format: OutputFormat,
    pub mode: Option<EvaluationMode>,
    pub algorithm: Option<String>,
    pub explain: bool,
}

#[derive(Serialize)]
struct TraceEntry<'a> {
    tuple: &'a RequestTuple,
    #[serde(flatten)]
    outcome: TupleOutcome,
}

#[derive(Serialize)]
struct ExplainedResponse<'a> {
    #[serde(flatten)]
    response: &'a Response,
    trace: Vec<TraceEntry<'a>>,
}

pub fn run(args: &EvaluateArgs) -> Result<ExitCode> {
    let mut config = ConfigLoader::new()
        .with_project_dir(&args.project)
        .load()
        .context("Failed to load configuration")?;

    // Command-line arguments win over every configuration layer
    if !args.policies.is_empty() {
        config.evaluator.policy_sources.clone_from(&args.policies);
    }
    if let Some(mode) = args.mode {
        config.evaluator.mode = mode;
    }
    if let Some(algorithm) = &args.algorithm {
        config.evaluator.combining_algorithm.clone_from(algorithm);
    }
    if config.evaluator.policy_sources.is_empty() {
        anyhow::bail!(
            "No policy sources. Pass --policy or set evaluator.policy_sources in {}",
            gridpdp_config::Paths::project_config_file(&args.project).display()
        );
    }

    let pdp = PolicyDecisionPoint::new(config.evaluator)
        .context("Failed to build the policy decision point")?;
    let request = Request::load(pdp.registry(), &args.request)
        .with_context(|| format!("Failed to load request {}", args.request.display()))?;

    let response = pdp.evaluate(&request);
    info!(
        request = %args.request.display(),
        tuples = request.tuple_count(),
        permitted = response.len(),
        "evaluated request"
    );

    let context = EvaluationContext::new(&request);
    let trace: Vec<TraceEntry<'_>> = if args.explain {
        let evaluator = pdp.evaluator();
        context
            .tuples()
            .iter()
            .map(|tuple| TraceEntry {
                tuple,
                outcome: evaluator.decide(tuple),
            })
            .collect()
    } else {
        Vec::new()
    };

    match args.format {
        OutputFormat::Json => {
            let json = if args.explain {
                serde_json::to_string_pretty(&ExplainedResponse {
                    response: &response,
                    trace,
                })?
            } else {
                serde_json::to_string_pretty(&response)?
            };
            println!("{json}");
        }
        OutputFormat::Text => {
            print_text(&response, request.tuple_count());
            if args.explain {
                print_trace(&trace);
            }
        }
    }

    Ok(if response.is_permitted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(DENIED)
    })
}

fn group_cell(tuple: &RequestTuple, axis: Axis) -> String {
    let group = tuple.group(axis);
    if group.is_empty() {
        "-".to_string()
    } else {
        group.to_string()
    }
}

fn print_text(response: &Response, tuple_count: usize) {
    if response.is_empty() {
        print_error(&format!("Denied: no tuple permitted ({tuple_count} evaluated)"));
        return;
    }

    print_success(&format!(
        "{} of {tuple_count} tuples permitted",
        response.len()
    ));
    let rows: Vec<Vec<String>> = response
        .items()
        .iter()
        .map(|item| {
            let mut row: Vec<String> = Axis::ALL
                .iter()
                .map(|axis| group_cell(&item.tuple, *axis))
                .collect();
            row.push(item.decision.to_string());
            row.push(item.policy_ids.join(", "));
            row
        })
        .collect();
    print_grid_table(
        &["Subject", "Resource", "Action", "Context", "Decision", "Policies"],
        &rows,
    );
    if response.len() < tuple_count {
        print_hint("Tuples not listed are denied");
    }
}

fn print_trace(trace: &[TraceEntry<'_>]) {
    style::print_spacer();
    println!("{}", "Decision trace".header());
    for (index, entry) in trace.iter().enumerate() {
        println!("  {} {}", format!("#{index}").muted(), entry.tuple);
        if entry.outcome.candidates.is_empty() {
            print_warn("no applicable policy");
            continue;
        }
        for candidate in &entry.outcome.candidates {
            style::print_labeled(&candidate.policy_id, &candidate.decision.to_string());
        }
        style::print_labeled("aggregate", &entry.outcome.decision.to_string().code());
    }
}
