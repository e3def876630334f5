//! `flowgate`: evaluate and validate flow rule sets from the command line.
//!
//! The CLI is a thin shell over flowgate-core: it loads rule sets and
//! value maps from disk, runs one evaluation pass, and prints the
//! snapshot. Useful for CI checks on stored rule sets and for debugging
//! rule behavior without a UI.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use flowgate_core::{
    evaluate_rule_set, ruleset::ruleset_schema_json, validate_ruleset_schema, EvaluationContext,
    FlowStep, RuleSet, ValueMap,
};
use flowgate_runtime::{FlowOrchestrator, Intent};

#[derive(Parser)]
#[command(name = "flowgate", version, about = "Flow progression rule engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a rule set file against the schema and rule model
    Validate {
        /// Path to a rule set file (.json or .yaml)
        path: PathBuf,
    },

    /// Evaluate a rule set and print the resulting snapshot
    Evaluate {
        /// Path to a rule set file (.json or .yaml)
        #[arg(long)]
        rules: PathBuf,

        /// Path to a JSON/YAML file with the collected field values
        #[arg(long)]
        values: Option<PathBuf>,

        /// Step ids, in flow order
        #[arg(long, value_delimiter = ',')]
        steps: Vec<String>,

        /// Element ids
        #[arg(long, value_delimiter = ',')]
        elements: Vec<String>,

        /// Pretty-print the snapshot
        #[arg(long)]
        pretty: bool,
    },

    /// Replay a script of intents through an orchestrator
    Simulate {
        /// Path to a rule set file (.json or .yaml)
        #[arg(long)]
        rules: PathBuf,

        /// Path to a JSON/YAML file with the step list
        #[arg(long)]
        steps: PathBuf,

        /// Path to a JSON/YAML file with an array of intents
        #[arg(long)]
        intents: PathBuf,

        /// Path to a JSON/YAML file with initial field values
        #[arg(long)]
        values: Option<PathBuf>,

        /// Run in authoring mode instead of end-user mode
        #[arg(long)]
        edit_mode: bool,
    },

    /// Print the embedded rule set JSON Schema
    Schema,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { path } => validate(&path),
        Command::Evaluate {
            rules,
            values,
            steps,
            elements,
            pretty,
        } => evaluate(&rules, values.as_deref(), steps, elements, pretty),
        Command::Simulate {
            rules,
            steps,
            intents,
            values,
            edit_mode,
        } => simulate(&rules, &steps, &intents, values.as_deref(), edit_mode),
        Command::Schema => {
            println!("{}", ruleset_schema_json());
            Ok(())
        }
    }
}

fn validate(path: &Path) -> Result<()> {
    let document = load_document(path)?;
    if let Err(errors) = validate_ruleset_schema(&document) {
        for error in &errors {
            eprintln!("schema: {}", error);
        }
        bail!("{}: {} schema violation(s)", path.display(), errors.len());
    }

    let rule_set: RuleSet = serde_json::from_value(document)
        .with_context(|| format!("{}: rule model rejected the document", path.display()))?;

    println!(
        "{}: ok ({} rules, version {})",
        rule_set.id,
        rule_set.rules.len(),
        rule_set.version
    );
    Ok(())
}

fn evaluate(
    rules_path: &Path,
    values_path: Option<&Path>,
    steps: Vec<String>,
    elements: Vec<String>,
    pretty: bool,
) -> Result<()> {
    let rule_set = load_rule_set(rules_path)?;

    let values: ValueMap = match values_path {
        Some(path) => serde_json::from_value(load_document(path)?)
            .with_context(|| format!("{}: expected a flat key/value object", path.display()))?,
        None => ValueMap::new(),
    };

    let ctx = EvaluationContext::new(values, steps, elements);
    let snapshot = evaluate_rule_set(&rule_set, &ctx);

    let output = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{}", output);
    Ok(())
}

fn simulate(
    rules_path: &Path,
    steps_path: &Path,
    intents_path: &Path,
    values_path: Option<&Path>,
    edit_mode: bool,
) -> Result<()> {
    let rule_set = load_rule_set(rules_path)?;
    let steps: Vec<FlowStep> = serde_json::from_value(load_document(steps_path)?)
        .with_context(|| format!("{}: expected an array of steps", steps_path.display()))?;
    let intents: Vec<Intent> = serde_json::from_value(load_document(intents_path)?)
        .with_context(|| format!("{}: expected an array of intents", intents_path.display()))?;

    let mut flow = FlowOrchestrator::builder()
        .steps(steps)
        .rule_set(rule_set)
        .interactive(!edit_mode)
        .on_submit(|values| {
            println!(
                "submit: {}",
                serde_json::to_string(values).unwrap_or_default()
            );
        })
        .on_step_change(|step_id, index| {
            println!("step: {} (visible index {})", step_id, index);
        })
        .build();

    if let Some(path) = values_path {
        let values: ValueMap = serde_json::from_value(load_document(path)?)
            .with_context(|| format!("{}: expected a flat key/value object", path.display()))?;
        flow.set_values(values);
    }

    for intent in intents {
        let outcome = flow.emit_intent(intent);
        if outcome.executed {
            println!("executed: {}", outcome.intent.label());
        } else {
            println!(
                "blocked: {} ({})",
                outcome.intent.label(),
                outcome.blocked_reason.as_deref().unwrap_or("no reason")
            );
        }
    }

    println!(
        "final step: {}",
        flow.current_step_id().unwrap_or("<none>")
    );
    Ok(())
}

fn load_rule_set(path: &Path) -> Result<RuleSet> {
    let rule_set = if is_yaml(path) {
        RuleSet::from_yaml_file(path)
    } else {
        RuleSet::from_json_file(path)
    };
    rule_set.with_context(|| format!("failed to load rule set from {}", path.display()))
}

/// Load a JSON or YAML file as a JSON value.
fn load_document(path: &Path) -> Result<serde_json::Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value = if is_yaml(path) {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("{} is not valid YAML", path.display()))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("{} is not valid JSON", path.display()))?
    };
    Ok(value)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
