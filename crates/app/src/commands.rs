use anyhow::{Context, Result};
use sift_classify::{Categorizer, CategoryRuleSet, RuleStore};
use sift_core::{MemoryStore, Transaction};
use sift_import::{import_csv, write_csv, CsvReadOptions, CSV_TEMPLATE};
use sift_storage::{flush_settings, load_settings, DbPool};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::Config;

pub fn read_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    import_csv(BufReader::new(file), &CsvReadOptions::default())
        .with_context(|| format!("parse {}", path.display()))
}

/// Rows with a date cell that matches none of the known date formats.
fn unreadable_dates(rows: &[Transaction]) -> usize {
    rows.iter()
        .filter(|tx| !tx.date.trim().is_empty() && tx.parsed_date().is_none())
        .count()
}

async fn load_rules(db: &DbPool, cfg: &Config) -> Result<CategoryRuleSet> {
    let settings = load_settings(db).await?;
    Ok(RuleStore::with_key(settings, &cfg.rules_key).load()?)
}

/// Runs `f` against a snapshot of the settings and writes changes back.
async fn with_rule_store<T>(
    db: &DbPool,
    cfg: &Config,
    f: impl FnOnce(&mut RuleStore<&mut MemoryStore>) -> Result<T>,
) -> Result<T> {
    let mut settings = load_settings(db).await?;
    let out = f(&mut RuleStore::with_key(&mut settings, &cfg.rules_key))?;
    flush_settings(db, &settings).await?;
    Ok(out)
}

pub async fn categorize(
    db: &DbPool,
    cfg: &Config,
    input: &Path,
    output: Option<&Path>,
    seed: Option<&Path>,
) -> Result<()> {
    let rows = read_transactions(input)?;
    let unreadable = unreadable_dates(&rows);
    if unreadable > 0 {
        tracing::warn!(
            path = %input.display(),
            rows = unreadable,
            "dates in an unrecognized format are passed through as-is"
        );
    }
    let seed = match seed.or(cfg.seed_csv.as_deref()) {
        Some(path) => read_transactions(path)?,
        None => Vec::new(),
    };
    let rules = load_rules(db, cfg).await?;

    let outcome = Categorizer::new().apply_hybrid_with_seed(&rows, &seed, &rules);

    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            write_csv(&outcome.transactions, BufWriter::new(file))?;
            eprintln!(
                "Wrote {} transactions to {} ({} by rules, {} by model, {} uncategorized)",
                outcome.transactions.len(),
                path.display(),
                outcome.by_rules,
                outcome.by_model,
                outcome.uncategorized
            );
        }
        None => write_csv(&outcome.transactions, io::stdout().lock())?,
    }
    Ok(())
}

pub async fn rules_list(db: &DbPool, cfg: &Config) -> Result<()> {
    let rules = load_rules(db, cfg).await?;
    let mut out = io::stdout().lock();
    for (category, patterns) in rules.iter() {
        writeln!(out, "{category}")?;
        for pattern in patterns {
            let marker = if pattern.is_valid() { "" } else { "  (disabled)" };
            writeln!(out, "  {}{marker}", pattern.to_portable())?;
        }
    }
    Ok(())
}

pub async fn rules_add(db: &DbPool, cfg: &Config, category: &str, pattern: &str) -> Result<()> {
    let added = with_rule_store(db, cfg, |store| {
        let mut rules = store.load()?;
        Ok(store.add_rule(&mut rules, category, pattern)?)
    })
    .await?;

    if added {
        println!("Added rule to {}: {}", category.trim(), pattern.trim());
    } else {
        println!("Rule already present in {}", category.trim());
    }
    Ok(())
}

pub async fn rules_reset(db: &DbPool, cfg: &Config) -> Result<()> {
    let rules = with_rule_store(db, cfg, |store| Ok(store.reset()?)).await?;
    println!("Restored {} default categories", rules.len());
    Ok(())
}

pub async fn classify(db: &DbPool, cfg: &Config, text: &str, train: Option<&Path>) -> Result<()> {
    let rules = load_rules(db, cfg).await?;
    let mut categorizer = Categorizer::new();
    if let Some(path) = train.or(cfg.seed_csv.as_deref()) {
        let labeled = read_transactions(path)?;
        categorizer.apply_hybrid_with_seed(&[], &labeled, &rules);
        if categorizer.model().is_none() {
            tracing::warn!(path = %path.display(), "training data has fewer than two categories");
        }
    }

    match categorizer.classify_text(text, &rules) {
        Some(category) => println!("{category}"),
        None => println!("Uncategorized"),
    }
    Ok(())
}

pub fn template() -> Result<()> {
    io::stdout().lock().write_all(CSV_TEMPLATE.as_bytes())?;
    Ok(())
}
