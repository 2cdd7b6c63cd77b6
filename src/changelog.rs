//! Changelog assembly from pull request release notes, and the deploy
//! announcement built around it.
//!
//! A rendered changelog is a list of sections meant for a chat client:
//!
//! ```text
//! *Reporting*
//! • Users can export reports <https://github.com/org/repo/pull/12|PR-12>
//!
//! *Uncategorized*
//! • Faster logins <https://github.com/org/repo/pull/14|PR-14>
//! ```
use chrono::NaiveDateTime;
use clap::ValueEnum;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::{
    config::ChangelogConfig,
    forge::{config::RemoteConfig, types::PullRequest},
    notes,
};

/// Shown instead of a changelog when nothing was deployed.
pub const NO_CHANGES: &str =
    "Start and end commit hashes are the same - no changes for release notes to log";

const BULLET: &str = "• ";
const HOTFIX_PREFIX: &str = ":fire: *HOTFIX* :fire: ";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const SHORT_SHA_LEN: usize = 7;

static JIRA_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\w+-\d+)\]").unwrap());

/// How release notes are grouped into sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChangelogStyle {
    /// One section per `feat-` category label.
    #[default]
    Categorized,
    /// Noteworthy changes, features, fixes and notes for QA.
    Taxonomy,
}

/// A titled group of changelog entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub notes: Vec<String>,
}

impl Section {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            notes: vec![],
        }
    }
}

/// The deploy an announcement describes.
#[derive(Debug, Clone)]
pub struct Deploy {
    pub env_name: String,
    pub from_revision: String,
    pub to_revision: String,
    pub timestamp: NaiveDateTime,
}

impl Deploy {
    fn is_empty(&self) -> bool {
        self.from_revision == self.to_revision
    }
}

pub struct ChangelogAssembler {
    remote: RemoteConfig,
    config: ChangelogConfig,
    jira_url: Option<String>,
    include_qa: bool,
}

impl ChangelogAssembler {
    pub fn new(remote: RemoteConfig, config: ChangelogConfig) -> Self {
        Self {
            remote,
            config,
            jira_url: None,
            include_qa: false,
        }
    }

    /// Link `[ENG-1]` style ids to this Jira instance.
    pub fn with_jira_url(mut self, url: &str) -> Self {
        let url = url.trim_end_matches('/');
        self.jira_url = (!url.is_empty()).then(|| url.to_string());
        self
    }

    /// Add the notes-for-QA section (taxonomy style only).
    pub fn with_qa_notes(mut self, include: bool) -> Self {
        self.include_qa = include;
        self
    }

    /// Link ticket ids to Jira when configured, then append a link to the
    /// pull request.
    pub fn linkify(&self, note: &str, pr_number: u64) -> String {
        let note = match &self.jira_url {
            Some(url) => JIRA_ID_REGEX
                .replace_all(note, |caps: &regex::Captures| {
                    format!("<{url}/browse/{id}|{id}>", id = &caps[1])
                })
                .into_owned(),
            None => note.to_string(),
        };

        format!(
            "{note} <{}|PR-{pr_number}>",
            self.remote.pull_request_link(pr_number)
        )
    }

    /// Group the notes of every pull request mentioning a release, in the
    /// order the pull requests are given.
    pub fn sections(&self, prs: &[PullRequest]) -> Vec<Section> {
        let release_prs = prs
            .iter()
            .filter(|pr| notes::mentions_release(&pr.body));

        match self.config.style {
            ChangelogStyle::Categorized => self.categorized(release_prs),
            ChangelogStyle::Taxonomy => self.taxonomy(release_prs),
        }
    }

    fn categorized<'p>(
        &self,
        prs: impl Iterator<Item = &'p PullRequest>,
    ) -> Vec<Section> {
        let mut sections: Vec<Section> = vec![];

        for pr in prs {
            let Some(note) =
                notes::extract_section(&pr.body, &self.config.release_header)
            else {
                continue;
            };

            let category = notes::category_from_labels(
                &pr.labels,
                &self.config.category_prefix,
            );
            let note = self.linkify(&note, pr.number);

            match sections.iter_mut().find(|s| s.title == category) {
                Some(section) => section.notes.push(note),
                None => sections.push(Section {
                    title: category,
                    notes: vec![note],
                }),
            }
        }

        sections
    }

    fn taxonomy<'p>(
        &self,
        prs: impl Iterator<Item = &'p PullRequest>,
    ) -> Vec<Section> {
        let mut noteworthy = Section::new("Noteworthy Changes");
        let mut features = Section::new("Features");
        let mut fixes = Section::new("Fixes");
        let mut qa = Section::new("Notes for QA");

        for pr in prs {
            let classified =
                notes::classify(&pr.body, &self.config.release_header);

            for (section, note) in [
                (&mut noteworthy, classified.noteworthy),
                (&mut features, classified.features),
                (&mut fixes, classified.fixes),
            ] {
                if let Some(note) = note {
                    section.notes.push(self.linkify(&note, pr.number));
                }
            }

            if let Some(note) =
                notes::extract_section(&pr.body, &self.config.qa_header)
            {
                qa.notes.push(self.linkify(&note, pr.number));
            }
        }

        let mut sections = vec![noteworthy, features, fixes];
        if self.include_qa {
            sections.push(qa);
        }

        sections.retain(|s| !s.notes.is_empty());
        sections
    }

    /// The rendered changelog, or [`NO_CHANGES`] for an empty range.
    pub fn assemble(
        &self,
        prs: &[PullRequest],
        from_revision: &str,
        to_revision: &str,
    ) -> String {
        if from_revision == to_revision {
            return NO_CHANGES.to_string();
        }

        render(&self.sections(prs))
    }

    /// Title, ticket and PR counts, then the changelog.
    pub fn announcement(
        &self,
        deploy: &Deploy,
        prs: &[PullRequest],
        ticket_count: usize,
    ) -> String {
        let header = [
            self.title_line(deploy, prs),
            format!("{ticket_count} jira tickets found."),
            format!("{} PRs found.", prs.len()),
        ]
        .join("\n");

        if deploy.is_empty() {
            return format!("{header}\n{NO_CHANGES}");
        }

        let body =
            self.assemble(prs, &deploy.from_revision, &deploy.to_revision);

        if body.is_empty() {
            return header;
        }

        format!("{header}\n\n{}", body.trim_end())
    }

    fn title_line(&self, deploy: &Deploy, prs: &[PullRequest]) -> String {
        let from = short_sha(&deploy.from_revision);
        let to = short_sha(&deploy.to_revision);
        let link =
            format!("<{}|{from}...{to}>", self.remote.compare_link(from, to));

        let title = format!(
            "*{} RELEASE* {} ({link})",
            deploy.env_name.to_uppercase(),
            deploy.timestamp.format(TIMESTAMP_FORMAT)
        );

        if is_hotfix(&deploy.env_name, prs) {
            format!("{HOTFIX_PREFIX}{title}")
        } else {
            title
        }
    }
}

/// A deploy is a hotfix when a pull request title says hotfix and names
/// the environment, e.g. `hotfix-staging-2019-03-05.0`.
pub fn is_hotfix(env_name: &str, prs: &[PullRequest]) -> bool {
    let env_name = env_name.to_lowercase();

    prs.iter().any(|pr| {
        let title = pr.title.to_lowercase();
        title.contains("hotfix") && title.contains(&env_name)
    })
}

/// Each section as a bold title line and one bullet per note, sections
/// separated by a blank line.
pub fn render(sections: &[Section]) -> String {
    sections
        .iter()
        .filter(|s| !s.notes.is_empty())
        .map(|s| {
            let bullets = s
                .notes
                .iter()
                .map(|note| format!("{BULLET}{note}"))
                .collect::<Vec<String>>()
                .join("\n");
            format!("*{}*\n{bullets}\n\n", s.title)
        })
        .collect()
}

fn short_sha(revision: &str) -> &str {
    revision.get(..SHORT_SHA_LEN).unwrap_or(revision)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn remote() -> RemoteConfig {
        RemoteConfig {
            owner: "org_name".into(),
            repo: "repo_name".into(),
            ..Default::default()
        }
    }

    fn assembler(style: ChangelogStyle) -> ChangelogAssembler {
        ChangelogAssembler::new(
            remote(),
            ChangelogConfig {
                style,
                ..Default::default()
            },
        )
    }

    fn pr(number: u64, body: &str, labels: &[&str]) -> PullRequest {
        PullRequest {
            number,
            title: format!("PR {number}"),
            body: body.into(),
            merged: true,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    fn categorized(prs: &[PullRequest]) -> String {
        assembler(ChangelogStyle::Categorized).assemble(prs, "a", "b")
    }

    fn deploy(env_name: &str, from: &str, to: &str) -> Deploy {
        Deploy {
            env_name: env_name.into(),
            from_revision: from.into(),
            to_revision: to.into(),
            timestamp: NaiveDate::from_ymd_opt(2019, 3, 5)
                .unwrap()
                .and_hms_micro_opt(14, 2, 9, 123456)
                .unwrap(),
        }
    }

    #[test]
    fn note_is_in_right_format() {
        let prs = [pr(1, "RELEASES\nDESCRIPTION_1", &["feat-CATEGORY1"])];
        assert_eq!(
            categorized(&prs),
            "*CATEGORY1*\n• DESCRIPTION_1 <https://github.com/org_name/repo_name/pull/1|PR-1>\n\n"
        );
    }

    #[test]
    fn note_picks_up_right_label() {
        let prs =
            [pr(1, "RELEASES\nDESCRIPTION_1", &["ignore", "feat-CATEGORY1"])];
        assert!(categorized(&prs).starts_with("*CATEGORY1*\n"));
    }

    #[test]
    fn unlabeled_note_is_uncategorized() {
        let prs = [pr(1, "RELEASES\nDESCRIPTION_1", &[])];
        assert_eq!(
            categorized(&prs),
            "*Uncategorized*\n• DESCRIPTION_1 <https://github.com/org_name/repo_name/pull/1|PR-1>\n\n"
        );
    }

    #[test]
    fn multiple_lines_collapse_into_one_bullet() {
        let prs = [pr(1, "RELEASES\nSentence1. Sentence 2.\nSentence 3.", &[])];
        assert_eq!(
            categorized(&prs),
            "*Uncategorized*\n• Sentence1. Sentence 2. Sentence 3. <https://github.com/org_name/repo_name/pull/1|PR-1>\n\n"
        );
    }

    #[test]
    fn notes_land_in_their_categories() {
        let prs = [
            pr(1, "RELEASES\nDESCRIPTION_1", &["feat-CATEGORY1"]),
            pr(2, "RELEASES\nDESCRIPTION_2", &["feat-CATEGORY2"]),
        ];
        assert_eq!(
            categorized(&prs),
            "*CATEGORY1*\n• DESCRIPTION_1 <https://github.com/org_name/repo_name/pull/1|PR-1>\n\n\
             *CATEGORY2*\n• DESCRIPTION_2 <https://github.com/org_name/repo_name/pull/2|PR-2>\n\n"
        );
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let prs = [
            pr(1, "RELEASES\nDESCRIPTION_1", &["feat-CATEGORY1"]),
            pr(5, "RELEASES\nfoo", &["feat-CATEGORY1"]),
            pr(2, "RELEASES\nDESCRIPTION_2", &["feat-CATEGORY2"]),
            pr(6, "RELEASES\nfah", &["feat-CATEGORY2"]),
        ];
        assert_eq!(
            categorized(&prs),
            "*CATEGORY1*\n\
             • DESCRIPTION_1 <https://github.com/org_name/repo_name/pull/1|PR-1>\n\
             • foo <https://github.com/org_name/repo_name/pull/5|PR-5>\n\n\
             *CATEGORY2*\n\
             • DESCRIPTION_2 <https://github.com/org_name/repo_name/pull/2|PR-2>\n\
             • fah <https://github.com/org_name/repo_name/pull/6|PR-6>\n\n"
        );
    }

    #[test]
    fn links_jira_ids_when_configured() {
        let assembler = assembler(ChangelogStyle::Categorized)
            .with_jira_url("https://company.atlassian.net/");
        let prs = [pr(12, "RELEASES\n[DS-435]", &[])];

        assert_eq!(
            assembler.assemble(&prs, "a", "b"),
            "*Uncategorized*\n• <https://company.atlassian.net/browse/DS-435|DS-435> <https://github.com/org_name/repo_name/pull/12|PR-12>\n\n"
        );
    }

    #[test]
    fn leaves_jira_ids_alone_without_url() {
        let prs = [pr(12, "RELEASES\n[DS-435]", &[])];
        assert!(categorized(&prs).contains("• [DS-435] <"));
    }

    #[test]
    fn bodies_without_release_contribute_nothing() {
        let prs = [pr(1, "Fixes [ENG-1]\n\nQA\ncheck it", &["feat-X"])];
        assert_eq!(categorized(&prs), "");
    }

    #[test]
    fn release_mention_without_block_contributes_nothing() {
        let prs = [pr(1, "pre-release cleanup", &[])];
        assert_eq!(categorized(&prs), "");
    }

    #[test]
    fn empty_range_short_circuits() {
        let prs = [pr(1, "RELEASES\nDESCRIPTION_1", &[])];
        assert_eq!(
            assembler(ChangelogStyle::Categorized).assemble(&prs, "", ""),
            NO_CHANGES
        );
    }

    #[test]
    fn taxonomy_splits_notes_by_kind() {
        let prs = [
            pr(1, "RELEASES\nNew dashboard\nAdded export [ENG-1]\n\nQA\nTry the export", &[]),
            pr(2, "RELEASES\nfixes [ENG-2] crash", &[]),
        ];

        let sections = assembler(ChangelogStyle::Taxonomy)
            .with_qa_notes(true)
            .sections(&prs);

        assert_eq!(
            sections,
            vec![
                Section {
                    title: "Noteworthy Changes".into(),
                    notes: vec!["Added export *[ENG-1]* <https://github.com/org_name/repo_name/pull/1|PR-1>".into()],
                },
                Section {
                    title: "Features".into(),
                    notes: vec!["New dashboard <https://github.com/org_name/repo_name/pull/1|PR-1>".into()],
                },
                Section {
                    title: "Fixes".into(),
                    notes: vec!["fixes [ENG-2] crash <https://github.com/org_name/repo_name/pull/2|PR-2>".into()],
                },
                Section {
                    title: "Notes for QA".into(),
                    notes: vec!["Try the export <https://github.com/org_name/repo_name/pull/1|PR-1>".into()],
                },
            ]
        );
    }

    #[test]
    fn taxonomy_omits_qa_unless_requested() {
        let prs = [pr(1, "RELEASES\nNew dashboard\n\nQA\nTry it", &[])];

        let sections = assembler(ChangelogStyle::Taxonomy).sections(&prs);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Features");
    }

    #[test]
    fn announcement_has_title_counts_and_changelog() {
        let prs = [pr(1, "RELEASES\nDESCRIPTION_1", &["feat-CATEGORY1"])];
        let text = assembler(ChangelogStyle::Categorized).announcement(
            &deploy(
                "prod",
                "0782415a9c3f2b7e2f9e61b1a3b0e2f0f0f0f0f0",
                "8038fc3d6c1e2b7e2f9e61b1a3b0e2f0f0f0f0f0",
            ),
            &prs,
            3,
        );

        assert_eq!(
            text,
            "*PROD RELEASE* 2019-03-05 14:02:09.123456 (<https://github.com/org_name/repo_name/compare/0782415...8038fc3|0782415...8038fc3>)\n\
             3 jira tickets found.\n\
             1 PRs found.\n\
             \n\
             *CATEGORY1*\n\
             • DESCRIPTION_1 <https://github.com/org_name/repo_name/pull/1|PR-1>"
        );
    }

    #[test]
    fn announcement_for_empty_range() {
        let text = assembler(ChangelogStyle::Categorized).announcement(
            &deploy("staging", "abc", "abc"),
            &[],
            0,
        );

        assert!(text.ends_with(&format!("0 jira tickets found.\n0 PRs found.\n{NO_CHANGES}")));
    }

    #[test]
    fn announcement_without_notes_is_just_the_header() {
        let prs = [pr(1, "no notes here", &[])];
        let text = assembler(ChangelogStyle::Categorized).announcement(
            &deploy("prod", "a", "b"),
            &prs,
            0,
        );

        assert!(text.ends_with("0 jira tickets found.\n1 PRs found."));
    }

    #[test]
    fn hotfix_needs_keyword_and_environment() {
        let hotfix = PullRequest {
            title: "__2019-03-05.1 - Hotfix to Staging".into(),
            ..Default::default()
        };

        assert!(is_hotfix("staging", std::slice::from_ref(&hotfix)));
        assert!(!is_hotfix("prod", std::slice::from_ref(&hotfix)));

        let text = assembler(ChangelogStyle::Categorized).announcement(
            &deploy("staging", "a", "b"),
            &[hotfix],
            0,
        );
        assert!(text.starts_with(":fire: *HOTFIX* :fire: *STAGING RELEASE* "));
    }
}
