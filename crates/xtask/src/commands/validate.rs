//! Validate an item catalog
//!
//! Loads `items.ron` (or any catalog file) through the content loader, which
//! rejects condition entries the trigger matrix does not allow, then reports
//! what each item listens to.

use anyhow::Result;
use clap::Parser;
use console::style;
use std::path::PathBuf;

use skirmish_content::ItemLoader;
use skirmish_core::ItemTraits;

use crate::utils;

/// Load an item catalog and check every condition against the trigger matrix
#[derive(Parser, Debug)]
pub struct Validate {
    /// Catalog file (defaults to the bundled items.ron)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Also list each item's conditions
    #[arg(short, long)]
    verbose: bool,
}

impl Validate {
    pub fn execute(self) -> Result<()> {
        let file = self
            .file
            .unwrap_or_else(|| utils::bundled_data_dir().join("items.ron"));

        let items = match ItemLoader::load(&file) {
            Ok(items) => items,
            Err(error) => {
                eprintln!(
                    "{} {}",
                    style("✗").red().bold(),
                    style(file.display()).cyan()
                );
                return Err(error);
            }
        };

        println!(
            "{} {} ({} items)",
            style("✓").green().bold(),
            style(file.display()).cyan(),
            items.len()
        );
        for item in &items {
            print_item(item, self.verbose);
        }
        Ok(())
    }
}

fn print_item(item: &ItemTraits, verbose: bool) {
    let effect_conditions: usize = item
        .effects
        .iter()
        .map(|effect| effect.conditions.len())
        .sum();
    println!(
        "  {} {} {}",
        style("→").cyan(),
        style(&item.name).bold(),
        style(format!(
            "item conditions: {}, effect conditions: {}{}",
            item.conditions.len(),
            effect_conditions,
            if item.macro_source.is_some() { ", macro" } else { "" }
        ))
        .dim()
    );

    if !verbose {
        return;
    }
    for condition in &item.conditions {
        println!("      {} → {}", condition.condition, condition.update);
    }
    for effect in &item.effects {
        for condition in &effect.conditions {
            println!(
                "      [{}] {} → {}",
                effect.label, condition.condition, condition.update
            );
        }
    }
}
