//! Issue-tracker ticket reference extraction.
//!
//! Scans free text for ticket ids such as `ENG-123`, `[eng-123]` or
//! `[[DEV-9]]`, each optionally preceded by a transition keyword such as
//! `closes` or `Fixes`. The grammar, matched case-insensitively and
//! left-to-right without overlap, is:
//!
//! ```text
//! reference  := keyword? whitespace* issue
//! keyword    := close | closes | closed | fix | fixes | fixed
//!             | resolve | resolves | resolved
//! issue      := "["* letter{2,} "-" digit+ "]"*
//! ```
//!
//! Keywords are tried in the order listed, the first that lets an issue token
//! follow wins. Issues are normalized to uppercase with every bracket removed.
use serde::Serialize;

/// Words that mark a ticket as done by the pull request mentioning it.
pub const TRANSITION_KEYWORDS: [&str; 9] = [
    "close", "closes", "closed", "fix", "fixes", "fixed", "resolve",
    "resolves", "resolved",
];

/// `1-on-1` scans as a ticket id, it never is one.
const ONE_ON_ONE: &str = "ON-1";

/// A ticket id found in text, plus the transition keyword in front of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketReference {
    /// Uppercase `PREFIX-NUMBER` without brackets.
    pub issue: String,
    /// Lowercase transition keyword, if one preceded the issue.
    pub transition: Option<String>,
}

impl TicketReference {
    pub fn has_transition(&self) -> bool {
        self.transition.is_some()
    }
}

/// Extract every ticket reference in `text`, in the order encountered.
pub fn extract(text: &str) -> Vec<TicketReference> {
    let bytes = text.as_bytes();
    let mut references = vec![];
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(found) = match_at(bytes, pos) else {
            pos += 1;
            continue;
        };

        pos = found.end;

        let issue = normalize_issue(&bytes[found.issue_start..found.end]);

        if issue == ONE_ON_ONE {
            continue;
        }

        references.push(TicketReference {
            issue,
            transition: found.keyword.map(str::to_string),
        });
    }

    references
}

struct Match {
    keyword: Option<&'static str>,
    issue_start: usize,
    end: usize,
}

fn match_at(bytes: &[u8], pos: usize) -> Option<Match> {
    for keyword in TRANSITION_KEYWORDS {
        if !starts_with_ignore_case(&bytes[pos..], keyword.as_bytes()) {
            continue;
        }

        let issue_start = skip_whitespace(bytes, pos + keyword.len());

        if let Some(end) = issue_end(bytes, issue_start) {
            return Some(Match {
                keyword: Some(keyword),
                issue_start,
                end,
            });
        }
    }

    let issue_start = skip_whitespace(bytes, pos);

    issue_end(bytes, issue_start).map(|end| Match {
        keyword: None,
        issue_start,
        end,
    })
}

/// Returns the end offset of an issue token starting at `start`.
fn issue_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = skip_while(bytes, start, |b| b == b'[');

    let letters_start = pos;
    pos = skip_while(bytes, pos, |b| b.is_ascii_alphabetic());
    if pos - letters_start < 2 {
        return None;
    }

    if bytes.get(pos) != Some(&b'-') {
        return None;
    }
    pos += 1;

    let digits_start = pos;
    pos = skip_while(bytes, pos, |b| b.is_ascii_digit());
    if pos == digits_start {
        return None;
    }

    Some(skip_while(bytes, pos, |b| b == b']'))
}

fn skip_whitespace(bytes: &[u8], start: usize) -> usize {
    skip_while(bytes, start, |b| {
        matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
    })
}

fn skip_while(bytes: &[u8], start: usize, pred: impl Fn(u8) -> bool) -> usize {
    let mut pos = start;
    while pos < bytes.len() && pred(bytes[pos]) {
        pos += 1;
    }
    pos
}

fn starts_with_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len()
        && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

fn normalize_issue(token: &[u8]) -> String {
    token
        .iter()
        .filter(|b| !matches!(b, b'[' | b']'))
        .map(|b| b.to_ascii_uppercase() as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(issue: &str, transition: Option<&str>) -> TicketReference {
        TicketReference {
            issue: issue.into(),
            transition: transition.map(String::from),
        }
    }

    #[test]
    fn returns_nothing_for_empty_text() {
        assert!(extract("").is_empty());
    }

    #[test]
    fn returns_nothing_for_prose_without_tickets() {
        let text = r#"
    Call me Ishmael. Some years ago--never mind how long precisely --having little or no money in
    my purse, and nothing particular to interest me on shore, I thought I would sail about a little and see the watery
    part of the world.
    "#;
        assert!(extract(text).is_empty());
    }

    #[test]
    fn ignores_one_on_ones() {
        assert!(extract("bla bla bla 1-on-1").is_empty());
    }

    #[test]
    fn finds_bare_issue() {
        assert_eq!(
            extract("Some text goes ENG-123 here"),
            vec![reference("ENG-123", None)]
        );
    }

    #[test]
    fn strips_brackets() {
        assert_eq!(
            extract("Some text goes [ENG-123] here"),
            vec![reference("ENG-123", None)]
        );
    }

    #[test]
    fn brackets_do_not_need_to_balance() {
        assert_eq!(
            extract("see [[ENG-1] and DEV-2]]]"),
            vec![reference("ENG-1", None), reference("DEV-2", None)]
        );
    }

    #[test]
    fn uppercases_lowercase_issue() {
        assert_eq!(
            extract("Some text goes [eng-123] here"),
            vec![reference("ENG-123", None)]
        );
    }

    #[test]
    fn captures_transition_keyword() {
        assert_eq!(
            extract("Some text goes closes ENG-123 here"),
            vec![reference("ENG-123", Some("closes"))]
        );
    }

    #[test]
    fn lowercases_mixed_case_keyword_and_issue() {
        assert_eq!(
            extract("Closes Eng-123, fixing this ticket"),
            vec![reference("ENG-123", Some("closes"))]
        );
    }

    #[test]
    fn keyword_may_touch_bracketed_issue() {
        assert_eq!(
            extract("RESOLVED[OPS-42]"),
            vec![reference("OPS-42", Some("resolved"))]
        );
    }

    #[test]
    fn keyword_without_issue_is_ignored() {
        assert!(extract("fixes the build, closes nothing").is_empty());
    }

    #[test]
    fn single_letter_prefix_is_not_an_issue() {
        assert!(extract("fix A-1 and b-22").is_empty());
    }

    #[test]
    fn finds_multiple_issues_in_order() {
        let text = r#"
        Some text goes ENG-123 here
        RELEASES
        Fixes [DEV-723], after making some changes
        also linked to [ENG-4567]
        "#;

        assert_eq!(
            extract(text),
            vec![
                reference("ENG-123", None),
                reference("DEV-723", Some("fixes")),
                reference("ENG-4567", None),
            ]
        );
    }

    #[test]
    fn handles_non_ascii_text_around_issues() {
        assert_eq!(
            extract("naïve café — fixed ÜX-1 then ENG-9 ✅"),
            vec![reference("ENG-9", None)]
        );
    }
}
