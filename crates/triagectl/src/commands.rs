//! Command implementations

use crate::cli::Commands;
use crate::host::{DryRunFixer, SysinfoSource};
use anyhow::{bail, Context as _, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::{info, warn};
use triage_common::actions::{self, ASK_AI_CATEGORY};
use triage_common::config::TrainingSettings;
use triage_common::corpus;
use triage_common::engine::{self, TrainingSummary};
use triage_common::evaluation::{self, EvaluationReport};
use triage_common::priority::{self, Priority};
use triage_common::ticket::{self, FixRunner, SystemInfoSource, TicketDraft, TriageTicket};
use triage_common::{TierVerdict, TriageConfig, TriageEngine};

const SEPARATOR: &str = "==========================================";

/// Loaded configuration plus where it came from
#[derive(Debug, Clone)]
pub struct Context {
    pub config: TriageConfig,
    /// Explicit `--config` path, if any
    pub config_path: Option<PathBuf>,
}

impl Context {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config = TriageConfig::load(config_path.as_deref()).with_context(|| match &config_path {
            Some(path) => format!("Failed to load config {}", path.display()),
            None => "Failed to load config".to_string(),
        })?;
        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn engine(&self) -> TriageEngine {
        TriageEngine::new(self.config.artifacts.clone())
    }

    /// Training settings with command-line overrides applied
    pub fn training(
        &self,
        samples: Option<usize>,
        trees: Option<usize>,
        seed: Option<u64>,
        fraction: Option<f64>,
    ) -> TrainingSettings {
        let mut settings = self.config.training.clone();
        if let Some(n) = samples {
            settings.samples = n;
        }
        if let Some(n) = trees {
            settings.tree_count = n;
        }
        if let Some(s) = seed {
            settings.seed = s;
        }
        if let Some(f) = fraction {
            settings.train_fraction = f;
        }
        if settings.train_fraction_was_clamped() {
            warn!(
                "train_fraction {} out of range, using {}",
                settings.train_fraction,
                settings.effective_train_fraction()
            );
        }
        settings
    }
}

/// Dispatch a parsed subcommand
pub fn run(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Train { samples, trees, seed } => train(ctx, samples, trees, seed),
        Commands::Evaluate {
            samples,
            fraction,
            seed,
            trees,
        } => evaluate(ctx, samples, fraction, seed, trees),
        Commands::Classify { description } => classify(ctx, &description.join(" ")),
        Commands::Priority { urgency, impact } => {
            println!("{}", priority_label(urgency, impact));
            Ok(())
        }
        Commands::Resolve { issue } => {
            println!("{}", resolve_label(&issue.join(" ")));
            Ok(())
        }
        Commands::Issues { category } => {
            print!("{}", issue_listing(category.as_deref())?);
            Ok(())
        }
        Commands::Ticket {
            description,
            urgency,
            impact,
            issue,
        } => {
            let engine = ctx.engine();
            let ticket = build_ticket(
                &engine,
                &description,
                &urgency,
                &impact,
                issue.as_deref(),
                &DryRunFixer,
                &SysinfoSource,
            )?;
            print!("{}", ticket.render());
            Ok(())
        }
        Commands::Config { show, set } => config(ctx, show, set.as_deref()),
    }
}

fn print_header(title: &str) {
    println!("{}", SEPARATOR.dimmed());
    println!("{}", title.bold());
    println!("{}", SEPARATOR.dimmed());
}

fn print_report(report: &EvaluationReport) {
    println!();
    print!("{}", report.render());
    println!();
}

fn print_sanity(summary: &TrainingSummary) {
    println!("[SANITY CHECK]");
    for result in &summary.sanity {
        let mark = if result.passed() {
            "[OK]".bright_green().to_string()
        } else {
            "[MISS]".bright_red().to_string()
        };
        println!(
            "  {} '{}' -> {} (expected {})",
            mark, result.phrase, result.predicted, result.expected
        );
    }
}

pub fn train(
    ctx: &Context,
    samples: Option<usize>,
    trees: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let settings = ctx.training(samples, trees, seed, None);
    print_header(&format!(
        "Training: {} samples, {} trees, seed {}",
        settings.samples,
        settings.effective_tree_count(),
        settings.seed
    ));

    let summary = engine::train_pipeline(&settings, &ctx.config.artifacts)
        .context("Training pipeline failed")?;

    print_report(&summary.report);
    print_sanity(&summary);
    println!();
    println!("Model saved to {}", summary.model_path.display().cyan());
    println!("Vectorizer saved to {}", summary.vocab_path.display().cyan());
    Ok(())
}

pub fn evaluate(
    ctx: &Context,
    samples: Option<usize>,
    fraction: Option<f64>,
    seed: Option<u64>,
    trees: Option<usize>,
) -> Result<()> {
    let settings = ctx.training(samples, trees, seed, fraction);
    let report = evaluate_report(&settings)?;
    print_header(&format!(
        "Evaluation: {} samples, fraction {:.2}, seed {}",
        settings.samples,
        settings.effective_train_fraction(),
        settings.seed
    ));
    print_report(&report);
    Ok(())
}

/// Held-out scores for the given settings; no artifacts are written
pub fn evaluate_report(settings: &TrainingSettings) -> Result<EvaluationReport> {
    let examples = corpus::generate(settings.samples, settings.seed);
    let evaluation = evaluation::evaluate_with_model(
        &examples,
        settings.effective_train_fraction(),
        settings.effective_max_features(),
        &settings.forest_params(),
    )
    .context("Evaluation failed")?;
    Ok(evaluation.report)
}

pub fn classify(ctx: &Context, description: &str) -> Result<()> {
    let verdict = ctx.engine().classify(description);
    match verdict {
        TierVerdict::Classified(tier) => {
            println!("{} ({})", tier.bold(), tier.description());
        }
        TierVerdict::Unavailable => {
            println!("{}", verdict.yellow());
            println!(
                "{}",
                "No trained model found. Run 'triagectl train' first.".dimmed()
            );
        }
    }
    Ok(())
}

/// Label printed by `priority`
pub fn priority_label(urgency: u8, impact: u8) -> Priority {
    priority::priority(urgency, impact)
}

/// Line printed by `resolve`
pub fn resolve_label(issue: &str) -> String {
    match actions::resolve_action(issue) {
        Some(action) => action.to_string(),
        None => "no automated fix".to_string(),
    }
}

/// Catalog listing, optionally one category
pub fn issue_listing(category: Option<&str>) -> Result<String> {
    let selected: Vec<&str> = match category {
        Some(c) => {
            if actions::issues_for(c).is_empty() {
                bail!(
                    "Unknown category '{}'. Available: {}",
                    c,
                    actions::categories().collect::<Vec<_>>().join(", ")
                );
            }
            vec![c]
        }
        None => actions::categories().collect(),
    };

    let mut out = String::new();
    for category in selected {
        out.push_str(&format!("[{}]\n", category));
        for issue in actions::issues_for(category) {
            let fix = match actions::resolve_action(issue) {
                Some(action) => action.to_string(),
                None if category == ASK_AI_CATEGORY => "assistant".to_string(),
                None => "-".to_string(),
            };
            out.push_str(&format!("  {:<32} {}\n", issue, fix));
        }
    }
    Ok(out)
}

/// Run the fix for the picked issue, then classify and prioritise
pub fn build_ticket(
    engine: &TriageEngine,
    description: &str,
    urgency: &str,
    impact: &str,
    issue: Option<&str>,
    runner: &dyn FixRunner,
    info: &dyn SystemInfoSource,
) -> Result<TriageTicket> {
    if description.trim().is_empty() {
        bail!("Ticket description must not be empty");
    }

    let mut draft = TicketDraft::new(
        description,
        priority::parse_level(urgency),
        priority::parse_level(impact),
    );
    if let Some(issue) = issue {
        draft = draft.with_issue(issue);
        let outcome = ticket::attempt_fix(issue, runner);
        draft.record(outcome.log_line());
    }

    let ticket = draft.assemble(engine, info);
    info!(
        "Ticket assembled: tier {}, priority {}",
        ticket.tier, ticket.priority
    );
    Ok(ticket)
}

/// Apply a `key=value` assignment
pub fn apply_setting(config: &mut TriageConfig, assignment: &str) -> Result<()> {
    let Some((key, value)) = assignment.split_once('=') else {
        bail!("Expected key=value, got '{}'", assignment);
    };
    config.set(key.trim(), value)?;
    Ok(())
}

pub fn config(ctx: &Context, show: bool, set: Option<&str>) -> Result<()> {
    let mut config = ctx.config.clone();

    if let Some(assignment) = set {
        apply_setting(&mut config, assignment)?;
        let path = match &ctx.config_path {
            Some(path) => {
                config.save_to(path)?;
                path.clone()
            }
            None => config.save()?,
        };
        println!("{} {}", "[OK]".bright_green(), assignment);
        println!("Saved to {}", path.display());
    }

    if show || set.is_none() {
        let rendered =
            toml::to_string_pretty(&config).context("Failed to render configuration")?;
        print!("{}", rendered);
    }
    Ok(())
}
