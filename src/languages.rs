// src/languages.rs
//! Per-language project counts for the skills/languages view.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::feeds::types::NormalizedProject;

pub const DEFAULT_COLOR: &str = "#808080";

const LANGUAGE_COLORS: &[(&str, &str)] = &[
    ("JavaScript", "#f7df1e"),
    ("TypeScript", "#3178c6"),
    ("Python", "#3776ab"),
    ("Java", "#b07219"),
    ("C++", "#f34b7d"),
    ("Ruby", "#701516"),
    ("Go", "#00add8"),
    ("Rust", "#dea584"),
    ("PHP", "#4F5D95"),
    ("HTML", "#e34c26"),
    ("CSS", "#563d7c"),
    ("Shell", "#89e051"),
    ("Vue", "#41b883"),
    ("React", "#61dafb"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageStat {
    pub count: usize,
    pub color: &'static str,
}

pub fn color_for(language: &str) -> &'static str {
    LANGUAGE_COLORS
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, c)| *c)
        .unwrap_or(DEFAULT_COLOR)
}

/// Count projects per primary language. Projects without one are not counted.
pub fn language_stats(projects: &[NormalizedProject]) -> BTreeMap<String, LanguageStat> {
    let mut out: BTreeMap<String, LanguageStat> = BTreeMap::new();
    for lang in projects.iter().filter_map(|p| p.language.as_deref()) {
        out.entry(lang.to_string())
            .or_insert_with(|| LanguageStat {
                count: 0,
                color: color_for(lang),
            })
            .count += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::types::ProjectOrigin;
    use chrono::Utc;

    fn p(lang: Option<&str>, origin: ProjectOrigin) -> NormalizedProject {
        NormalizedProject {
            id: 1,
            name: "x".into(),
            description: None,
            language: lang.map(str::to_string),
            stars: 0,
            forks: 0,
            url: String::new(),
            origin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn counts_across_origins_with_colors() {
        let stats = language_stats(&[
            p(Some("Rust"), ProjectOrigin::Github),
            p(Some("Rust"), ProjectOrigin::Gitlab),
            p(Some("Elixir"), ProjectOrigin::Github),
            p(None, ProjectOrigin::Gitlab),
        ]);
        assert_eq!(stats.len(), 2);
        assert_eq!(
            stats["Rust"],
            LanguageStat {
                count: 2,
                color: "#dea584"
            }
        );
        assert_eq!(stats["Elixir"].color, DEFAULT_COLOR);
    }
}
