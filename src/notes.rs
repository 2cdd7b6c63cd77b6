//! Release note extraction from pull request bodies.
//!
//! A pull request body carries its notes in a block that starts on the line
//! after a header such as `RELEASES` or `QA` and runs to the next blank line:
//!
//! ```text
//! Some description of the change
//!
//! RELEASES
//! - Users can now export reports [ENG-12]
//! - Fixed the date picker
//!
//! QA
//! Check the export on a large account
//! ```
use regex::Regex;
use std::sync::LazyLock;

/// Header that opens the release notes block.
pub const RELEASE_HEADER: &str = "release";
/// Header that opens the notes-for-QA block.
pub const QA_HEADER: &str = "qa";
/// Label prefix marking a changelog category, e.g. `feat-Reporting`.
pub const DEFAULT_CATEGORY_PREFIX: &str = "feat-";
/// Category for pull requests without a category label.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Matches html comments, including ones spanning lines. Nested or
/// unterminated comments are not handled.
static HTML_COMMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Release notes of one pull request split by kind.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassifiedNotes {
    pub fixes: Option<String>,
    pub noteworthy: Option<String>,
    pub features: Option<String>,
}

/// Only bodies mentioning "release" anywhere contribute notes.
pub fn mentions_release(body: &str) -> bool {
    body.to_lowercase().contains(RELEASE_HEADER)
}

/// Remove html comments, then trim every line and strip its leading `-`
/// bullet markers.
pub fn clean_lines(body: &str) -> Vec<String> {
    let stripped = HTML_COMMENT_REGEX.replace_all(body, "");

    stripped
        .trim()
        .split('\n')
        .map(|line| line.trim().trim_start_matches('-').trim().to_string())
        .collect()
}

/// Lines of the first block following a line that starts with `header`
/// (case-insensitive), up to the next blank line.
fn section_lines(body: &str, header: &str) -> Vec<String> {
    let header = header.to_lowercase();

    clean_lines(body)
        .into_iter()
        .skip_while(|line| !line.to_lowercase().starts_with(&header))
        .skip(1)
        .take_while(|line| !line.is_empty())
        .collect()
}

/// Extract the block under `header` as a single line. Multi-line notes are
/// joined with a space. Returns `None` when the header is missing or its
/// block is empty.
pub fn extract_section(body: &str, header: &str) -> Option<String> {
    join_non_empty(section_lines(body, header))
}

/// Split the release block line by line into fixes, noteworthy changes and
/// features. Fix detection wins over noteworthy detection.
pub fn classify(body: &str, header: &str) -> ClassifiedNotes {
    let mut fixes = vec![];
    let mut noteworthy = vec![];
    let mut features = vec![];

    for line in section_lines(body, header) {
        if is_fix(&line) {
            fixes.push(line);
        } else if is_noteworthy(&line) {
            noteworthy.push(embolden_brackets(&line));
        } else {
            features.push(line);
        }
    }

    ClassifiedNotes {
        fixes: join_non_empty(fixes),
        noteworthy: join_non_empty(noteworthy),
        features: join_non_empty(features),
    }
}

pub fn is_fix(line: &str) -> bool {
    let line = line.to_lowercase();
    line.contains("fixes [") || line.starts_with("fix")
}

pub fn is_noteworthy(line: &str) -> bool {
    line.contains('[')
}

/// Wrap bracketed tokens in `*` so chat clients render them bold.
pub fn embolden_brackets(line: &str) -> String {
    line.replace('[', "*[").replace(']', "]*")
}

/// Category from the first label starting with `prefix`, e.g. `feat-Billing`
/// gives `Billing`.
pub fn category_from_labels(labels: &[String], prefix: &str) -> String {
    labels
        .iter()
        .find_map(|label| label.strip_prefix(prefix))
        .unwrap_or(UNCATEGORIZED)
        .to_string()
}

fn join_non_empty(lines: Vec<String>) -> Option<String> {
    let joined = lines.join(" ");
    (!joined.is_empty()).then_some(joined)
}
