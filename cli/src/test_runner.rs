use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use blocks::{BlockError, ProcedureBlock};

use crate::{Append, Variant, workspace};

const FIXTURE_SUFFIX: &str = ".test.xml";

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Block the mutation is loaded into. Defaults to "caller".
    #[serde(default)]
    pub variant: Variant,

    /// Seed for generated ids.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Editor commands applied after the load, in order.
    #[serde(default)]
    pub append: Vec<Append>,

    /// A second <mutation> loaded after the edits, exercising reconciliation.
    #[serde(default)]
    pub reload: Option<String>,

    /// Expected layout text (trimmed comparison).
    #[serde(default)]
    pub expect_layout: Option<String>,

    /// Expected proc-code after all steps (exact comparison).
    #[serde(default)]
    pub expect_proccode: Option<String>,

    /// Expected error: its Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,
}

fn default_seed() -> u64 {
    1
}

/// Split a fixture into its TOML frontmatter and the <mutation> body.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let rest = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let rest = rest.trim_start_matches(['\r', '\n']);

    let (frontmatter, body) = rest
        .split_once("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let config: TestConfig = toml::from_str(frontmatter.trim_end_matches('\r'))
        .map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, body.trim()))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

/// What a fixture produced: (layout, proc-code) or the first error.
fn execute(config: &TestConfig, body: &str) -> Result<(String, String), BlockError> {
    let mut ws = workspace(Some(config.seed));
    let mut block = ProcedureBlock::new(config.variant.config(), &mut ws);

    block.load_mutation_xml(&mut ws, body)?;
    for append in &config.append {
        append.apply(&mut block, &mut ws)?;
    }
    if let Some(reload) = &config.reload {
        block.load_mutation_xml(&mut ws, reload)?;
    }

    Ok((block.layout(&ws).to_string(), block.proc_code().to_string()))
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, body) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    let reason = match (&config.expect_error, execute(&config, body)) {
        (Some(expected), Err(error)) => {
            let message = error.to_string();
            (!message.contains(expected.as_str()))
                .then(|| format!("expected error containing \"{}\", got: {}", expected, message))
        }
        (Some(expected), Ok(_)) => Some(format!(
            "expected error containing \"{}\", but loading succeeded",
            expected
        )),
        (None, Err(error)) => Some(format!("unexpected error: {}", error)),
        (None, Ok((layout, proc_code))) => check_output(&config, &layout, &proc_code),
    };

    match reason {
        Some(reason) => fail(description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Compare against the expectations. Returns `Some(reason)` on mismatch.
fn check_output(config: &TestConfig, layout: &str, proc_code: &str) -> Option<String> {
    if let Some(expected) = &config.expect_layout {
        if layout.trim() != expected.trim() {
            return Some(format!(
                "layout mismatch\n  expected: {}\n  actual:   {}",
                expected.trim(),
                layout.trim()
            ));
        }
    }
    if let Some(expected) = &config.expect_proccode {
        if proc_code != expected {
            return Some(format!(
                "proc-code mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, proc_code
            ));
        }
    }
    None
}

/// Discover fixture files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_fixture = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(FIXTURE_SUFFIX));
        if is_fixture {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

fn label_for(result: &TestResult) -> String {
    result.description.clone().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .map(|s| s.trim_end_matches(FIXTURE_SUFFIX).to_string())
            .unwrap_or_else(|| "?".to_string())
    })
}

/// Select the categories to run. Unknown requests are reported and skipped.
fn filter_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut filtered = BTreeMap::new();
    for requested in requested {
        let req = requested.trim_matches('/');
        let before = filtered.len();
        for (cat, files) in all {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                filtered.insert(cat.as_str(), files);
            }
        }
        if filtered.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}

/// Run every fixture under `path` (or a single file). A non-empty
/// `categories` restricts the run to those subfolders.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let run_categories: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
            return 1;
        }
        filter_categories(&all, categories)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    };

    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        if !path.is_file() {
            let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
            eprintln!();
            eprintln!("{}", paint(header, "1", no_color));
        }

        for file in files {
            let result = run_single_test(file);
            let label = label_for(&result);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), label);
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), label);
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}
