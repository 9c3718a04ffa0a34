//! SiteGate CLI
//!
//! CLI tool for checking URLs against a ruleset and inspecting rulesets.

use std::fs;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Serialize;

use sg_compiler::{lint_ruleset, parse_ruleset, Severity};
use sg_core::{MatchProps, MatchResult, Matcher, Rule, Ruleset};

#[derive(Parser)]
#[command(name = "sg-cli")]
#[command(about = "SiteGate ruleset checker and tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide what the ruleset does with one or more URLs
    Check {
        /// Ruleset file
        #[arg(short, long)]
        rules: String,

        /// Page title made available to conditions as `title`
        #[arg(short, long)]
        title: Option<String>,

        /// Extra condition property, as key=value (repeatable)
        #[arg(short, long = "prop", value_parser = parse_prop)]
        props: Vec<(String, String)>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// URLs to check
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Report rules that will not behave as written
    Lint {
        /// Ruleset file
        #[arg(short, long)]
        rules: String,
    },

    /// Print the parsed ruleset as JSON
    Dump {
        /// Ruleset file
        #[arg(short, long)]
        rules: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            rules,
            title,
            props,
            json,
            verbose,
            urls,
        } => cmd_check(&rules, title.as_deref(), &props, json, verbose, &urls),
        Commands::Lint { rules } => cmd_lint(&rules),
        Commands::Dump { rules } => cmd_dump(&rules),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn parse_prop(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{arg}'")),
    }
}

fn load_ruleset(path: &str) -> Result<Ruleset, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    Ok(parse_ruleset(&content))
}

// =============================================================================
// JSON Output
// =============================================================================

#[derive(Serialize)]
struct RuleReport<'a> {
    action: &'static str,
    pattern: &'a str,
    line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    highlight_color: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
}

impl<'a> From<&'a Rule> for RuleReport<'a> {
    fn from(rule: &'a Rule) -> Self {
        Self {
            action: rule.action.as_str(),
            pattern: &rule.pattern,
            line: rule.line_number,
            highlight_color: rule.highlight_color,
            condition: rule.condition.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Serialize)]
struct CheckReport<'a> {
    url: &'a str,
    blocked: bool,
    action: Option<&'static str>,
    rule: Option<RuleReport<'a>>,
}

impl<'a> CheckReport<'a> {
    fn new(url: &'a str, result: Option<MatchResult<'a>>) -> Self {
        Self {
            url,
            blocked: result.is_some_and(|m| m.is_blocked()),
            action: result.map(|m| m.action.as_str()),
            rule: result.map(|m| RuleReport::from(m.rule)),
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

fn cmd_check(
    rules_path: &str,
    title: Option<&str>,
    extra: &[(String, String)],
    json: bool,
    verbose: bool,
    urls: &[String],
) -> Result<(), String> {
    let start = Instant::now();
    let ruleset = load_ruleset(rules_path)?;
    let matcher = Matcher::new(&ruleset);

    if verbose {
        println!(
            "Loaded '{}': {} lines, {} rules ({:.1}ms)",
            rules_path,
            ruleset.lines().len(),
            ruleset.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
    }

    let mut reports = Vec::with_capacity(urls.len());
    for url in urls {
        let mut props = MatchProps::new(url.as_str());
        if let Some(title) = title {
            props.insert(MatchProps::TITLE, title);
        }
        for (key, value) in extra {
            props.insert(key.as_str(), value.as_str());
        }

        reports.push(CheckReport::new(url, matcher.find_match(props)));
    }

    if json {
        let out = serde_json::to_string_pretty(&reports)
            .map_err(|e| format!("Failed to serialize results: {}", e))?;
        println!("{out}");
        return Ok(());
    }

    for report in &reports {
        match &report.rule {
            Some(rule) => {
                print!("{}  {}  (line {}: {}", report.url, rule.action, rule.line, rule.pattern);
                if let Some(color) = rule.highlight_color {
                    print!(", color {color}");
                }
                if let Some(condition) = &rule.condition {
                    print!(" @if ({condition})");
                }
                println!(")");
            }
            None => println!("{}  no match", report.url),
        }
    }

    Ok(())
}

fn cmd_lint(rules_path: &str) -> Result<(), String> {
    let ruleset = load_ruleset(rules_path)?;
    let report = lint_ruleset(&ruleset);

    for diagnostic in &report.diagnostics {
        println!("{}: {}", rules_path, diagnostic);
    }
    if !report.diagnostics.is_empty() {
        println!();
    }

    println!("Ruleset '{}'", rules_path);
    println!("  Rules:       {}", report.total_rules);
    println!("  Block:       {}", report.block_rules);
    println!("  Allow:       {}", report.allow_rules);
    println!("  Highlight:   {}", report.highlight_rules);
    println!("  Errors:      {}", report.count(Severity::Error));
    println!("  Warnings:    {}", report.count(Severity::Warning));

    if report.has_errors() {
        return Err(format!("{} has lint errors", rules_path));
    }
    Ok(())
}

fn cmd_dump(rules_path: &str) -> Result<(), String> {
    let ruleset = load_ruleset(rules_path)?;
    let rules: Vec<RuleReport<'_>> = ruleset.rules().iter().map(RuleReport::from).collect();

    let out = serde_json::to_string_pretty(&rules)
        .map_err(|e| format!("Failed to serialize rules: {}", e))?;
    println!("{out}");

    Ok(())
}
