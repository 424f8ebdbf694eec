//! CLI: type snapshot → (documentation trees | property tables | export list)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde_json::Value;

use type_docs::ir::TypeNode;
use type_docs::oracle::{SnapshotOracle, TypeOracle};
use type_docs::resolve::{
    CallableClassifier, DEFAULT_MAX_DEPTH, ExpandAll, ExpandNamed, FilterPredicate, NamedComponents, PropsConvention,
    ResolveOptions, TypeResolver,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// resolve type-checker snapshots into documentation trees (prop tables, API references)
#[derive(Parser, Debug)]
#[command(name = "type-docs")]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve exports and print their documentation trees as JSON
    Resolve(ResolveOut),
    /// print the property table of one export
    Properties(PropertiesOut),
    /// list exports with their type text
    Exports(ExportsOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more snapshot files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct FilterSettings {
    /// expand declarations from node_modules and lib files too
    #[arg(long, default_value_t = false)]
    include_external: bool,

    /// expand this external symbol anyway (repeatable)
    #[arg(long)]
    expand: Vec<String>,

    /// nesting limit before falling back to references
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: u32,

    /// parameterless callables are components only when PascalCase named
    #[arg(long, default_value_t = false)]
    named_components: bool,
}

#[derive(clap::Parser, Debug)]
struct ResolveOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    filter_settings: FilterSettings,

    /// only resolve these exports (repeatable; all exports if omitted)
    #[arg(long)]
    export: Vec<String>,

    /// JQ post-process filter for each resolved tree
    #[arg(long)]
    jq_expr: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct PropertiesOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    filter_settings: FilterSettings,

    /// export whose properties are listed
    #[arg(long)]
    export: String,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ExportsOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_snapshots(&self) -> Result<Vec<(PathBuf, SnapshotOracle)>> {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        source_paths
            .into_par_iter()
            .map(|path| -> Result<(PathBuf, SnapshotOracle)> {
                let oracle = SnapshotOracle::from_path(&path)
                    .with_context(|| format!("failed to load snapshot {}", path.display()))?;
                Ok((path, oracle))
            })
            .collect()
    }
}

impl FilterSettings {
    fn predicate(&self) -> Box<dyn FilterPredicate> {
        if self.include_external {
            Box::new(ExpandAll)
        } else {
            Box::new(ExpandNamed::new(self.expand.iter().cloned()))
        }
    }

    fn classifier(&self) -> &'static dyn CallableClassifier {
        if self.named_components { &NamedComponents } else { &PropsConvention }
    }

    fn options(&self) -> ResolveOptions {
        ResolveOptions { max_depth: self.max_depth }
    }

    fn resolver<'a>(&self, predicate: &'a dyn FilterPredicate) -> TypeResolver<'a> {
        TypeResolver::new()
            .with_filter(predicate)
            .with_classifier(self.classifier())
            .with_options(self.options())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Resolve(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let predicate = target.filter_settings.predicate();
                let resolver = target.filter_settings.resolver(predicate.as_ref());

                let mut per_file = IndexMap::new();
                for (path, oracle) in target.input_settings.load_snapshots()? {
                    let trees = resolve_selected(&resolver, &oracle, &target.export)
                        .with_context(|| format!("failed to resolve {}", path.display()))?;
                    let mut rendered = serde_json::Map::new();
                    for (name, tree) in trees {
                        let value = serde_json::to_value(&tree)?;
                        let value = match (&target.jq_expr, tree) {
                            (Some(jq_expr), Some(_)) => apply_jq(jq_expr, &value)
                                .with_context(|| format!("jq failed on export `{name}` of {}", path.display()))?,
                            _ => value,
                        };
                        rendered.insert(name, value);
                    }
                    per_file.insert(path.display().to_string(), Value::Object(rendered));
                }
                write_json(target.out.as_deref(), &single_or_keyed(per_file))
            }
            Command::Properties(target) => {
                let predicate = target.filter_settings.predicate();
                let resolver = target.filter_settings.resolver(predicate.as_ref());

                let mut per_file = IndexMap::new();
                for (path, oracle) in target.input_settings.load_snapshots()? {
                    let export = oracle
                        .export(&target.export)
                        .ok_or_else(|| anyhow!("{} has no export named `{}`", path.display(), target.export))?;
                    let properties = resolver.resolve_properties(&oracle, export.ty)?;
                    per_file.insert(path.display().to_string(), serde_json::to_value(&properties)?);
                }
                write_json(target.out.as_deref(), &single_or_keyed(per_file))
            }
            Command::Exports(target) => {
                for (path, oracle) in target.input_settings.load_snapshots()? {
                    println!("{}", path.display().to_string().bold());
                    for (name, export) in oracle.exports() {
                        let text = oracle.type_to_text(export.ty)?;
                        println!("  {} {}", name.green(), text.dimmed());
                    }
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_selected(
    resolver: &TypeResolver<'_>,
    oracle: &SnapshotOracle,
    names: &[String],
) -> Result<IndexMap<String, Option<TypeNode>>> {
    if names.is_empty() {
        return Ok(resolver.resolve_exports(oracle)?);
    }
    let mut out = IndexMap::new();
    for name in names {
        let Some(export) = oracle.export(name) else {
            bail!("no export named `{name}`");
        };
        out.insert(name.clone(), resolver.resolve(oracle, export.ty, export.declaration)?);
    }
    Ok(out)
}

/// One output passes through as is; several become an array.
fn apply_jq(jq_expr: &str, tree: &Value) -> Result<Value> {
    let mut outputs = type_docs::jq_exec::run_jaq(jq_expr, tree)?;
    if outputs.len() == 1 {
        return Ok(outputs.remove(0));
    }
    Ok(Value::Array(outputs))
}

/// A single input prints its value directly; several are keyed by path.
fn single_or_keyed(mut per_file: IndexMap<String, Value>) -> Value {
    if per_file.len() == 1 {
        if let Some((_, value)) = per_file.pop() {
            return value;
        }
    }
    Value::Object(per_file.into_iter().collect())
}

fn write_json(out: Option<&Path>, value: &Value) -> Result<()> {
    let source = serde_json::to_string_pretty(value)?;
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, &source).with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => println!("{source}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched_any = false;
        for entry in glob::glob(pattern)? {
            out.push(entry?);
            matched_any = true;
        }
        if !matched_any {
            // An explicit glob that matches nothing is almost certainly a typo.
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn literal_paths_pass_through_and_globs_expand() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.graph.json"), "{}").unwrap();
        fs::write(dir.path().join("b.graph.json"), "{}").unwrap();

        let pattern = format!("{}/*.graph.json", dir.path().display());
        let mut found = resolve_file_path_patterns([pattern.as_str()]).unwrap();
        found.sort();
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("a.graph.json"));

        let literal = resolve_file_path_patterns(["does/not/exist.json"]).unwrap();
        assert_eq!(literal, vec![PathBuf::from("does/not/exist.json")]);

        let empty = format!("{}/*.nothing", dir.path().display());
        assert!(resolve_file_path_patterns([empty.as_str()]).is_err());
    }

    #[test]
    fn single_input_is_not_keyed() {
        let mut one = IndexMap::new();
        one.insert("a.json".to_string(), serde_json::json!({ "Props": null }));
        assert_eq!(single_or_keyed(one), serde_json::json!({ "Props": null }));

        let mut two = IndexMap::new();
        two.insert("a.json".to_string(), serde_json::json!(1));
        two.insert("b.json".to_string(), serde_json::json!(2));
        assert_eq!(single_or_keyed(two), serde_json::json!({ "a.json": 1, "b.json": 2 }));
    }

    #[test]
    fn filter_settings_configure_the_resolver() {
        let cli = CommandLineInterface::try_parse_from([
            "type-docs",
            "resolve",
            "-i",
            "snapshot.json",
            "--max-depth",
            "3",
            "--named-components",
        ])
        .unwrap();
        let Command::Resolve(target) = &cli.cmd else { panic!("expected resolve") };
        assert_eq!(target.filter_settings.options(), ResolveOptions { max_depth: 3 });
        assert!(target.filter_settings.named_components);
        assert_eq!(target.input_settings.input, ["snapshot.json"]);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        CommandLineInterface::command().debug_assert();
    }
}
