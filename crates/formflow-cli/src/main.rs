//! Formflow command line
//!
//! - `funnel`: funnel report for a form document
//! - `reconcile`: run a form save against a set of submissions offline and
//!   print the stored form and rewritten submissions

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use formflow_analytics::FunnelReport;
use formflow_core::{FormService, FormServiceConfig};
use formflow_model::{Form, Submission};
use formflow_store::MemoryStore;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("formflow")
        .version(formflow_core::VERSION)
        .about("Form field lifecycle and funnel analytics")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("funnel")
                .about("Compute the funnel report of a form document")
                .arg(
                    Arg::new("form")
                        .long("form")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Form JSON document"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("reconcile")
                .about("Save a new form version, tombstoning removed fields that submissions reference")
                .arg(
                    Arg::new("previous")
                        .long("previous")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Persisted form JSON document"),
                )
                .arg(
                    Arg::new("next")
                        .long("next")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Edited form JSON document"),
                )
                .arg(
                    Arg::new("submissions")
                        .long("submissions")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of the form's submissions"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Service configuration (TOML)"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> Option<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
}

fn required_path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    path_arg(args, name).with_context(|| format!("--{name} is required"))
}

fn print_funnel(report: &FunnelReport) {
    println!("Funnel Report");
    println!("=============");
    println!("Views: {}", report.views);
    println!("Submissions: {}", report.submissions);
    println!("Conversion: {:.1}%", report.conversion_rate);
    println!();
    for field in &report.fields {
        let rate = |r: Option<u32>| r.map_or_else(|| "-".to_string(), |r| format!("{r}%"));
        println!(
            "  [{}] {}: {} continued ({}), {} dropped ({})",
            field.index,
            field.title,
            field.continue_views,
            rate(field.continue_rate),
            field.dropoff_views,
            rate(field.dropoff_rate),
        );
    }
}

fn funnel(args: &ArgMatches) -> Result<()> {
    let form: Form = read_json(required_path(args, "form")?)?;
    let report = formflow_analytics::for_form(&form);
    tracing::debug!(form = %form.id, fields = report.fields.len(), "funnel computed");

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_funnel(&report);
    }
    Ok(())
}

/// Run the save pipeline over JSON snapshots and describe the result
async fn reconcile(args: &ArgMatches) -> Result<serde_json::Value> {
    let previous: Form = read_json(required_path(args, "previous")?)?;
    let mut next: Form = read_json(required_path(args, "next")?)?;
    let submissions: Vec<Submission> = match path_arg(args, "submissions") {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let config = match path_arg(args, "config") {
        Some(path) => FormServiceConfig::load(path)?,
        None => FormServiceConfig::default(),
    };

    if previous.id != next.id {
        bail!("--previous is form {} but --next is form {}", previous.id, next.id);
    }
    // the edit is applied on top of the given persisted revision
    next.revision = previous.revision;

    let store = Arc::new(MemoryStore::with_documents([previous], submissions));
    let service = FormService::new(Arc::clone(&store), config);
    let saved = service.save_form(next).await?;

    let rewritten: Vec<Submission> = saved
        .lifecycle
        .rewritten
        .iter()
        .filter_map(|id| store.submission(*id))
        .collect();

    Ok(serde_json::json!({
        "form": saved.form,
        "preserved": saved.lifecycle.preserved,
        "dropped": saved.lifecycle.dropped,
        "rewrittenSubmissions": rewritten,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("funnel", args)) => funnel(args),
        Some(("reconcile", args)) => {
            let output = reconcile(args).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        _ => Ok(()),
    }
}
