//! Fixture runner: resolves every `fixtures/<name>.graph.json` and diffs the
//! result against `fixtures/<name>.expected.json`.
//!
//! ```bash
//! cargo run -p dev-test-runner
//! cargo run -p dev-test-runner -- --filter '^button$' --bless
//! ```
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use type_docs::oracle::SnapshotOracle;

static FIXTURE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<stem>.+)\.graph\.json$").unwrap());

#[derive(Parser, Debug)]
struct Settings {
    /// fixture directory
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"))]
    fixtures: PathBuf,

    /// only run fixtures whose stem matches this regex
    #[arg(long)]
    filter: Option<String>,

    /// overwrite expected outputs with the current results
    #[arg(long)]
    bless: bool,
}

enum Outcome {
    Passed,
    Blessed,
    Failed(String),
}

fn main() -> Result<()> {
    let settings = Settings::parse();
    let filter = settings.filter.as_deref().map(Regex::new).transpose().context("invalid --filter")?;

    let mut fixtures = Vec::new();
    for entry in std::fs::read_dir(&settings.fixtures)
        .with_context(|| format!("failed to read {}", settings.fixtures.display()))?
    {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else { continue };
        let Some(caps) = FIXTURE_NAME.captures(file_name) else { continue };
        let stem = caps["stem"].to_string();
        if filter.as_ref().is_some_and(|f| !f.is_match(&stem)) {
            continue;
        }
        fixtures.push((stem, path));
    }
    fixtures.sort();

    let mut failures = 0usize;
    for (stem, graph_path) in &fixtures {
        let expected_path = settings.fixtures.join(format!("{stem}.expected.json"));
        match run_fixture(graph_path, &expected_path, settings.bless) {
            Ok(Outcome::Passed) => println!("{} {stem}", "ok".green()),
            Ok(Outcome::Blessed) => println!("{} {stem}", "blessed".yellow()),
            Ok(Outcome::Failed(diff)) => {
                failures += 1;
                println!("{} {stem}\n{diff}", "FAILED".red().bold());
            }
            Err(error) => {
                failures += 1;
                println!("{} {stem}: {error:#}", "ERROR".red().bold());
            }
        }
    }

    println!("{} fixtures, {} failed", fixtures.len(), failures);
    if failures > 0 {
        bail!("{failures} fixture(s) failed");
    }
    Ok(())
}

fn run_fixture(graph_path: &Path, expected_path: &Path, bless: bool) -> Result<Outcome> {
    let oracle = SnapshotOracle::from_path(graph_path)?;
    let resolved = type_docs::resolve_exports(&oracle)?;
    let actual = serde_json::to_value(&resolved)?;

    if bless || !expected_path.exists() {
        std::fs::write(expected_path, serde_json::to_string_pretty(&actual)? + "\n")?;
        return Ok(Outcome::Blessed);
    }

    let source = std::fs::read_to_string(expected_path)?;
    let expected: Value = type_docs::path_de::from_str_with_path(&source)
        .with_context(|| format!("malformed {}", expected_path.display()))?;

    if actual == expected {
        return Ok(Outcome::Passed);
    }
    let mut diff = Vec::new();
    diff_values("$", &expected, &actual, &mut diff);
    Ok(Outcome::Failed(diff.join("\n")))
}

fn diff_values(path: &str, expected: &Value, actual: &Value, out: &mut Vec<String>) {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => {
            for (key, ev) in e {
                match a.get(key) {
                    Some(av) => diff_values(&format!("{path}.{key}"), ev, av, out),
                    None => out.push(format!("  {path}.{key}: {}", "missing".red())),
                }
            }
            for key in a.keys().filter(|k| !e.contains_key(*k)) {
                out.push(format!("  {path}.{key}: {}", "unexpected".red()));
            }
        }
        (Value::Array(e), Value::Array(a)) if e.len() == a.len() => {
            for (ix, (ev, av)) in e.iter().zip(a).enumerate() {
                diff_values(&format!("{path}[{ix}]"), ev, av, out);
            }
        }
        _ if expected != actual => {
            out.push(format!("  {path}: expected {} got {}", expected.to_string().green(), actual.to_string().red()));
        }
        _ => {}
    }
}
