//! Show the trigger matrix
//!
//! Lists the condition events offered for a condition list stored on an item
//! or an effect, with the update actions each event may fire.

use anyhow::{Result, bail};
use clap::Parser;
use console::style;

use skirmish_core::{ConditionScope, TriggerMatrix};

/// List condition events and the update actions they may fire
#[derive(Parser, Debug)]
pub struct Matrix {
    /// Where the condition list lives
    #[arg(short, long, value_enum, default_value = "effect")]
    scope: Scope,

    /// Show a single event
    #[arg(short, long, value_name = "EVENT")]
    event: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Scope {
    Item,
    Effect,
}

impl From<Scope> for ConditionScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Item => Self::Item,
            Scope::Effect => Self::Effect,
        }
    }
}

impl Matrix {
    pub fn execute(self) -> Result<()> {
        let matrix = TriggerMatrix::STANDARD;
        let scope = ConditionScope::from(self.scope);

        if let Some(event) = &self.event {
            if let Err(error) = matrix.check_scope(event, scope) {
                bail!("{}", error);
            }
            print_event(&matrix, event);
            return Ok(());
        }

        println!(
            "{}",
            style(format!("=== Condition events ({} scope) ===", scope.as_str()))
                .bold()
                .green()
        );
        println!();
        for spec in matrix.events_for(scope) {
            print_event(&matrix, spec.name);
        }
        Ok(())
    }
}

fn print_event(matrix: &TriggerMatrix, event: &str) {
    let actions: Vec<_> = matrix.actions_for(event).map(|spec| spec.name()).collect();
    println!("{}", style(event).bold().yellow());
    for action in actions {
        println!("  {} {}", style("→").cyan(), action);
    }
}
