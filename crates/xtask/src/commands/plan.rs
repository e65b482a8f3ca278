//! Print the plan an item builds
//!
//! Evaluates one of the built-in flows for an item from the catalog and shows
//! the resulting steps, the pre-roll options and the plan fingerprint.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use skirmish_core::{ApplicationType, BuiltPlan, DefaultFlow, StepArg, build_plan};

use crate::utils;

/// Print the plan an item builds for an application phase
#[derive(Parser, Debug)]
pub struct PlanItem {
    /// Item id or name (e.g., 2, "Fireball")
    #[arg(value_name = "ITEM")]
    item: String,

    /// Application phase the plan is built for
    #[arg(short, long, value_enum, default_value = "immediate")]
    application: Phase,

    /// Built-in flow to evaluate
    #[arg(short, long, value_enum, default_value = "item-roll")]
    flow: FlowKind,

    /// Content directory (defaults to the bundled data)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Phase {
    Immediate,
    Delayed,
    Overtime,
}

impl From<Phase> for ApplicationType {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Immediate => Self::Immediate,
            Phase::Delayed => Self::Delayed,
            Phase::Overtime => Self::Overtime,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum FlowKind {
    ItemRoll,
    EffectsOnly,
    EndEffect,
    EndEffectOnSave,
    Splash,
}

impl From<FlowKind> for DefaultFlow {
    fn from(kind: FlowKind) -> Self {
        match kind {
            FlowKind::ItemRoll => Self::ItemRoll,
            FlowKind::EffectsOnly => Self::EffectsOnly,
            FlowKind::EndEffect => Self::EndEffect,
            FlowKind::EndEffectOnSave => Self::EndEffectOnSave,
            FlowKind::Splash => Self::Splash,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    /// Numbered step list with fingerprint
    Summary,
    /// Plan as JSON
    Json,
}

impl PlanItem {
    pub fn execute(self) -> Result<()> {
        let content = utils::content(self.data_dir)?;
        let rules = content.load_rules()?;
        let items = content.load_items()?;
        let item = utils::find_item(&items, &self.item)?;

        let application = ApplicationType::from(self.application);
        let flow = DefaultFlow::from(self.flow);
        let built: BuiltPlan<()> = build_plan(item, application, &flow, None, &rules)
            .with_context(|| format!("Failed to build plan for `{}`", item.name))?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&built.plan)?);
            }
            OutputFormat::Summary => {
                println!(
                    "{} {} ({})",
                    style("Item:").bold().cyan(),
                    item.name,
                    item.id
                );
                println!("{} {}", style("Phase:").bold().cyan(), application);
                println!("{} {:?}", style("Flow:").bold().cyan(), flow);
                println!("{} {:?}", style("Source:").bold().cyan(), built.source);
                println!();
                print_summary(&built);
            }
        }
        Ok(())
    }
}

fn print_summary(built: &BuiltPlan<()>) {
    if built.plan.is_empty() {
        println!("{}", style("(empty plan)").dim());
    }
    for (index, step) in built.plan.iter().enumerate() {
        let args: Vec<_> = step.args.iter().map(render_arg).collect();
        if args.is_empty() {
            println!("  {:>2}. {}", index, style(&step.name).bold());
        } else {
            println!(
                "  {:>2}. {} {}",
                index,
                style(&step.name).bold(),
                style(args.join(", ")).dim()
            );
        }
    }
    println!();

    let pre_roll = &built.pre_roll;
    if pre_roll.skip_configuration_dialog
        || pre_roll.custom_configuration.is_some()
        || !pre_roll.variant_options.is_empty()
    {
        println!("{}", style("Pre-roll:").bold().yellow());
        println!("  Skip dialog: {}", pre_roll.skip_configuration_dialog);
        if let Some(custom) = &pre_roll.custom_configuration {
            println!("  Custom configuration: {}", custom);
        }
        if !pre_roll.variant_options.is_empty() {
            println!("  Variants: {}", pre_roll.variant_options.join(", "));
        }
        println!();
    }

    println!(
        "{} {}",
        style("Fingerprint:").bold().cyan(),
        hex::encode(built.plan.fingerprint())
    );
}

fn render_arg(arg: &StepArg) -> String {
    match arg {
        StepArg::Bool(value) => value.to_string(),
        StepArg::Int(value) => value.to_string(),
        StepArg::Text(value) => format!("{:?}", value),
        StepArg::List(values) => {
            let inner: Vec<_> = values.iter().map(render_arg).collect();
            format!("[{}]", inner.join(", "))
        }
    }
}
