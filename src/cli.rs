//! Minimal CLI: template + JSON inputs → verdicts
use std::path::PathBuf;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, Args};
use colored::Colorize;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use json_duck::{Config, TemplateSet, ValidationError, Validator, Value};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// check JSON/NDJSON documents against a declarative shape template
#[derive(Parser, Debug)]
#[command(name = "json-duck", version, about)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate every input document against the template
    Check(CheckOut),
    /// load the template and report definition errors
    Lint(LintOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is validated
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// template file (JSON notation)
    #[arg(short, long)]
    template: PathBuf,

    /// label of the root segment in error paths
    #[arg(long, default_value = "$")]
    root: String,

    /// skip validation entirely (every document passes)
    #[arg(long)]
    disabled: bool,

    /// only print failing documents
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Parser, Debug)]
struct LintOut {
    /// template file (JSON notation)
    #[arg(short, long)]
    template: PathBuf,
}

/// One decoded input, labelled by where it came from.
#[derive(Debug)]
struct Document {
    source: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            debug!(path = %source_path_str, bytes = source.len(), "loaded input");

            if self.ndjson {
                for (line_no, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let json_value = serde_json::from_str::<serde_json::Value>(line).with_context(|| {
                        format!("failed to parse NDJSON line ({source_path_str}:{})", line_no + 1)
                    })?;
                    self.select(json_value, format!("{source_path_str}:{}", line_no + 1), &mut out)?;
                }
            } else {
                let json_value = serde_json::from_str::<serde_json::Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                self.select(json_value, source_path_str, &mut out)?;
            }
        }
        Ok(out)
    }

    /// Apply `--json-pointer` then `--jq-expr` to one decoded document.
    fn select(&self, json_value: serde_json::Value, source: String, out: &mut Vec<Document>) -> Result<()> {
        let json_value = match self.json_pointer.as_deref() {
            None => json_value,
            Some(pointer) => match json_value.pointer(pointer) {
                Some(node) => node.clone(),
                None => bail!("JSON pointer {pointer} selects nothing in {source}"),
            },
        };
        match self.jq_expr.as_ref() {
            None => out.push(Document { source, value: Value::from(json_value) }),
            Some(jq_expr) => {
                let results = crate::jq_exec::run_jq(jq_expr, &json_value)
                    .with_context(|| format!("failed to apply jq expression to {source}"))?;
                for (i, json_value) in results.into_iter().enumerate() {
                    out.push(Document { source: format!("{source}#{i}"), value: Value::from(json_value) });
                }
            }
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns `Ok(false)` when at least one document failed validation.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Check(target) => {
                let templates = TemplateSet::from_path(&target.template)?;
                let config = Config { enabled: !target.disabled, root: target.root.clone() };
                let validator = Validator::new(config);
                let documents = target.input_settings.load_documents()?;

                let verdicts: Vec<(&Document, Result<(), ValidationError>)> = documents
                    .par_iter()
                    .map(|doc| (doc, validator.validate(&doc.value, templates.root())))
                    .collect();

                let mut failed = 0usize;
                for (doc, verdict) in &verdicts {
                    match verdict {
                        Ok(()) => {
                            if !target.quiet {
                                println!("{} {}", "✅".green(), doc.source);
                            }
                        }
                        Err(error) => {
                            failed += 1;
                            warn!(source = %doc.source, kind = ?error.kind(), "document failed validation");
                            println!("{} {}: {}", "❌".red(), doc.source.bold(), error.to_string().red());
                        }
                    }
                }
                info!(documents = verdicts.len(), failed, "check finished");
                Ok(failed == 0)
            }
            Command::Lint(target) => {
                let templates = TemplateSet::from_path(&target.template)?;
                templates.root().verify().context("root template")?;
                let mut count = 0usize;
                for (name, template) in templates.definitions() {
                    template.verify().with_context(|| format!("definition {name}"))?;
                    count += 1;
                }
                println!("{} {} ({count} definitions)", "✅".green(), target.template.display());
                Ok(true)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through_untouched() {
        let paths = resolve_file_path_patterns(["a.json", "dir/b.json"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.json"), PathBuf::from("dir/b.json")]);
    }

    #[test]
    fn empty_globs_are_an_error() {
        assert!(resolve_file_path_patterns(["/definitely/not/here/*.json"]).is_err());
    }

    #[test]
    fn pointer_and_jq_select_documents() {
        let settings = InputSettings {
            ndjson: false,
            json_pointer: Some("/data".into()),
            jq_expr: Some(".[]".into()),
            input: Vec::new(),
        };
        let mut out = Vec::new();
        settings
            .select(serde_json::json!({"data": [1, "a"]}), "mem".into(), &mut out)
            .unwrap();
        let sources: Vec<_> = out.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, ["mem#0", "mem#1"]);
        assert_eq!(out[1].value, Value::from("a"));

        let missing = InputSettings { jq_expr: None, ..settings };
        assert!(missing.select(serde_json::json!({}), "mem".into(), &mut out).is_err());
    }

    #[test]
    fn cli_parses_check_arguments() {
        let cli = CommandLineInterface::try_parse_from([
            "json-duck", "check", "-t", "t.json", "-i", "a.json", "b.json", "--ndjson", "--quiet",
        ])
        .unwrap();
        let Command::Check(check) = cli.cmd else { panic!("expected check") };
        assert_eq!(check.input_settings.input, ["a.json", "b.json"]);
        assert!(check.input_settings.ndjson);
        assert!(check.quiet);
        assert_eq!(check.root, "$");
    }
}
