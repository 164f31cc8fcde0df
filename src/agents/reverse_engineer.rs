//! Codebase Analyzer - reconstructs a specification from a local codebase.
//!
//! Walks the source tree, counts code files and lines per extension and
//! guesses the primary language by file count. Vendored and hidden
//! directories are skipped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::utils::{timestamp_id, title_case};

use super::collaborators::ReverseEngineer;
use super::error::{AgentError, AgentResult};
use super::types::{FileMetrics, ReconstructedSpec, ReverseEngineerSummary};

/// Code file extensions and the language each one indicates.
const CODE_EXTENSIONS: &[(&str, &str)] = &[
    ("rs", "Rust"),
    ("py", "Python"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("go", "Go"),
    ("java", "Java"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("swift", "Swift"),
    ("kt", "Kotlin"),
];

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "venv", "__pycache__", "target", "dist"];

const COMMENT_PREFIXES: &[&str] = &["#", "//", "/*", "*"];

/// Reverse engineer working on local directories.
#[derive(Debug, Default, Clone)]
pub struct CodebaseAnalyzer;

impl CodebaseAnalyzer {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "reverse_engineer";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReverseEngineer for CodebaseAnalyzer {
    async fn analyze(&self, source: &str) -> AgentResult<ReverseEngineerSummary> {
        if source.contains("://") || source.starts_with("git@") {
            return Err(AgentError::InvalidInput(format!(
                "remote sources are not supported, clone '{}' locally first",
                source
            )));
        }

        let root = PathBuf::from(source);
        if !root.is_dir() {
            return Err(AgentError::InvalidInput(format!(
                "source '{}' is not a directory",
                source
            )));
        }

        info!(source = %root.display(), "Analyzing codebase");

        let walk_root = root.clone();
        let metrics = tokio::task::spawn_blocking(move || collect_metrics(&walk_root))
            .await
            .map_err(|e| AgentError::stage_failed(Self::AGENT_NAME, e.to_string()))?;

        let language = primary_language(&metrics);
        let name = root
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| source.to_string());

        debug!(
            files = metrics.total_files,
            lines = metrics.lines_of_code,
            language = ?language,
            "Codebase metrics collected"
        );

        let reconstructed_spec = ReconstructedSpec {
            title: title_case(&name),
            description: format!(
                "A {} application",
                language.as_deref().unwrap_or("software")
            ),
            purpose: format!(
                "Based on analysis of {} files with {} lines of code",
                metrics.total_files, metrics.lines_of_code
            ),
        };

        Ok(ReverseEngineerSummary {
            analysis_id: timestamp_id("analysis"),
            tech_stack_guess: language,
            reconstructed_spec,
            file_metrics: metrics,
        })
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.depth() > 0
        && entry.file_type().is_dir()
        && (name.starts_with('.') || SKIPPED_DIRS.contains(&&*name))
}

fn language_for(path: &Path) -> Option<(&'static str, &'static str)> {
    let ext = path.extension()?.to_str()?;
    CODE_EXTENSIONS.iter().find(|(e, _)| *e == ext).copied()
}

fn collect_metrics(root: &Path) -> FileMetrics {
    let mut metrics = FileMetrics::default();

    let files = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file());

    for entry in files {
        let Some((ext, _)) = language_for(entry.path()) else {
            continue;
        };
        let Ok(bytes) = std::fs::read(entry.path()) else {
            continue;
        };

        metrics.total_files += 1;
        *metrics.file_types.entry(format!(".{}", ext)).or_insert(0) += 1;

        for line in String::from_utf8_lossy(&bytes).lines() {
            metrics.lines_of_code += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                metrics.blank_lines += 1;
            } else if COMMENT_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
                metrics.comment_lines += 1;
            }
        }
    }

    metrics
}

/// Picks the language with the most files; ties go to the alphabetically first.
fn primary_language(metrics: &FileMetrics) -> Option<String> {
    let mut per_language: BTreeMap<&str, usize> = BTreeMap::new();
    for (ext, count) in &metrics.file_types {
        let ext = ext.trim_start_matches('.');
        if let Some((_, language)) = CODE_EXTENSIONS.iter().find(|(e, _)| *e == ext) {
            *per_language.entry(*language).or_insert(0) += count;
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (language, count) in per_language {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((language, count));
        }
    }
    best.map(|(language, _)| language.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir failed");
        }
        std::fs::write(path, contents).expect("write failed");
    }

    #[tokio::test]
    async fn test_analyze_counts_code_files() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let root = dir.path().join("my-cool_app");
        write(&root, "src/main.rs", "// entry\n\nfn main() {}\n");
        write(&root, "src/lib.rs", "pub fn f() {}\n");
        write(&root, "scripts/build.py", "# build\nprint('x')\n");
        write(&root, "README.md", "# readme\n");
        write(&root, "node_modules/dep/index.js", "module.exports = 1;\n");
        write(&root, ".git/hooks/pre-commit.rs", "fn x() {}\n");

        let summary = CodebaseAnalyzer::new()
            .analyze(root.to_str().expect("utf8 path"))
            .await
            .expect("analysis failed");

        let metrics = &summary.file_metrics;
        assert_eq!(metrics.total_files, 3);
        assert_eq!(metrics.file_types.get(".rs"), Some(&2));
        assert_eq!(metrics.file_types.get(".py"), Some(&1));
        assert!(metrics.file_types.get(".js").is_none());
        assert_eq!(metrics.lines_of_code, 6);
        assert_eq!(metrics.blank_lines, 1);
        assert_eq!(metrics.comment_lines, 2);

        assert_eq!(summary.tech_stack_guess.as_deref(), Some("Rust"));
        assert_eq!(summary.reconstructed_spec.title, "My Cool App");
        assert!(summary.analysis_id.starts_with("analysis_"));
    }

    #[tokio::test]
    async fn test_analyze_rejects_remote_and_missing() {
        let analyzer = CodebaseAnalyzer::new();
        assert!(matches!(
            analyzer.analyze("https://github.com/org/repo").await,
            Err(AgentError::InvalidInput(_))
        ));
        assert!(matches!(
            analyzer.analyze("/definitely/not/here").await,
            Err(AgentError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_codebase_has_no_language() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let summary = CodebaseAnalyzer::new()
            .analyze(dir.path().to_str().expect("utf8 path"))
            .await
            .expect("analysis failed");

        assert_eq!(summary.file_metrics.total_files, 0);
        assert!(summary.tech_stack_guess.is_none());
        assert_eq!(summary.reconstructed_spec.description, "A software application");
    }
}
