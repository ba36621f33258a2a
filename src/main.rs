// SPDX-License-Identifier: PMPL-1.0-or-later

//! triplog: query a deductive triple store from the command line
//!
//! Loads an entity document (and optionally a rule catalog), then runs a
//! JSON goal list against it or projects an entity through a pull pattern.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use triplog::kanren::{parse_query, RuleCatalog, StderrTracer};
use triplog::types::term_to_json;
use triplog::{Config, Database, PullKey, Term};

#[derive(Parser)]
#[command(name = "triplog")]
#[command(version)]
#[command(about = "In-process deductive triple store with backtracking rule resolution")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a conjunctive query
    Query {
        /// Entity document: { "id": { "attribute": value } }
        #[arg(short, long)]
        data: PathBuf,

        /// Rule catalog (JSON)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Configuration file (json/yaml/yml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print every resolution step to stderr
        #[arg(long)]
        trace: bool,

        /// Stop after this many rows
        #[arg(short, long)]
        limit: Option<usize>,

        /// Emit rows as JSON
        #[arg(long)]
        json: bool,

        /// Goal list, e.g. '[["?p", "name", "Adam"], ["?p", "father_of", "?c"]]'
        #[arg(value_name = "GOALS")]
        goals: String,
    },

    /// Project an entity into a nested record
    Pull {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long)]
        rules: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Entity id
        #[arg(value_name = "ID")]
        id: String,

        /// Pull pattern, e.g. '["name", {"father_of": ["name"]}]'
        #[arg(value_name = "KEYS")]
        keys: String,
    },

    /// Summarise the loaded store
    Stats {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long)]
        rules: Option<PathBuf>,
    },
}

fn load_database(data: &Path, rules: Option<&Path>, config: &Config) -> Result<Database> {
    let content =
        fs::read_to_string(data).with_context(|| format!("reading data {}", data.display()))?;
    let document: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", data.display()))?;

    let mut db = config.build_database();
    db.load_entities(&document)
        .with_context(|| format!("loading {}", data.display()))?;
    if let Some(path) = rules {
        RuleCatalog::from_file(path)?.apply_to(&mut db);
    }
    Ok(db)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            data,
            rules,
            config,
            trace,
            limit,
            json,
            goals,
        } => {
            let config = load_config(config.as_deref())?;
            let mut db = load_database(&data, rules.as_deref(), &config)?;
            if trace {
                db.set_tracer(Box::new(StderrTracer::new()));
            }
            let query = parse_query(&goals)?;
            let limit = limit.or(config.limit).unwrap_or(usize::MAX);

            let mut count = 0;
            for row in db.run(query).take(limit) {
                let row = row?;
                count += 1;
                if json {
                    let record: serde_json::Map<String, serde_json::Value> = row
                        .iter()
                        .map(|(name, value)| (name.clone(), term_to_json(value)))
                        .collect();
                    println!("{}", serde_json::Value::Object(record));
                } else {
                    let fields: Vec<String> = row
                        .iter()
                        .map(|(name, value)| format!("{}={}", name.bold(), value))
                        .collect();
                    println!("{}", fields.join("  "));
                }
            }
            if !json {
                let summary = format!("{} row(s)", count);
                if count == 0 {
                    println!("{}", summary.yellow());
                } else {
                    println!("{}", summary.green());
                }
            }
        }

        Commands::Pull {
            data,
            rules,
            config,
            id,
            keys,
        } => {
            let config = load_config(config.as_deref())?;
            let db = load_database(&data, rules.as_deref(), &config)?;
            let keys: Vec<PullKey> =
                serde_json::from_str(&keys).context("parsing pull pattern")?;
            let record = db.pull(&Term::from(id), &keys)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Stats { data, rules } => {
            let db = load_database(&data, rules.as_deref(), &Config::default())?;
            let store = db.store();
            println!("{}", "STORE SUMMARY".bold().yellow());
            println!("  Facts:      {}", store.fact_count());
            println!("  Rules:      {}", store.rule_count());
            println!("  Entities:   {}", store.entities().len());
            let attributes: Vec<String> = store
                .attributes()
                .iter()
                .map(|attr| attr.as_str().map(str::to_string).unwrap_or_else(|| attr.to_string()))
                .collect();
            println!("  Attributes: {}", attributes.join(", "));
        }
    }

    Ok(())
}
