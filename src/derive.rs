// src/derive.rs
//! Filter/sort engine: a pure function from (records, config) to the displayed list.
//!
//! Order of steps is fixed: search, then origin/language restriction, then a stable
//! sort. Descending is the natural orientation of every key; ascending reverses the
//! comparator (not the output), so ties keep their input order either way.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::de::value::StringDeserializer;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};

use crate::feeds::types::{ArticleOrigin, NormalizedArticle, NormalizedProject, ProjectOrigin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectSortKey {
    Stars,
    Forks,
    #[default]
    Updated,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArticleSortKey {
    #[default]
    Date,
    ReadTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFilter {
    pub search: String,
    pub language: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    pub origin: Option<ProjectOrigin>,
    pub sort_by: ProjectSortKey,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleFilter {
    pub search: String,
    #[serde(deserialize_with = "empty_as_none")]
    pub origin: Option<ArticleOrigin>,
    pub sort_by: ArticleSortKey,
    pub sort_order: SortOrder,
}

/// An empty value (the "All Sources" choice, `?origin=`) means no restriction.
fn empty_as_none<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<String>::deserialize(d)? {
        Some(s) if !s.trim().is_empty() => {
            let de: StringDeserializer<D::Error> = s.trim().to_string().into_deserializer();
            T::deserialize(de).map(Some)
        }
        _ => Ok(None),
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Lowercased search needle, or `None` when search is off.
fn needle(search: &str) -> Option<String> {
    (!search.is_empty()).then(|| search.to_lowercase())
}

fn oriented(desc: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Desc => desc,
        SortOrder::Asc => desc.reverse(),
    }
}

pub fn project_matches_search(p: &NormalizedProject, needle_lower: &str) -> bool {
    contains_ci(&p.name, needle_lower)
        || p
            .description
            .as_deref()
            .is_some_and(|d| contains_ci(d, needle_lower))
}

pub fn article_matches_search(a: &NormalizedArticle, needle_lower: &str) -> bool {
    contains_ci(&a.title, needle_lower)
        || contains_ci(&a.description, needle_lower)
        || a.tags.iter().any(|t| contains_ci(t, needle_lower))
}

pub fn derive_projects(records: &[NormalizedProject], cfg: &ProjectFilter) -> Vec<NormalizedProject> {
    let needle = needle(&cfg.search);
    let mut out: Vec<NormalizedProject> = records
        .iter()
        .filter(|p| needle.as_deref().map_or(true, |n| project_matches_search(p, n)))
        .filter(|p| {
            cfg.language
                .as_deref()
                .filter(|l| !l.is_empty())
                .map_or(true, |l| p.display_language() == l)
        })
        .filter(|p| cfg.origin.map_or(true, |o| p.origin == o))
        .cloned()
        .collect();

    // `sort_by` is a stable merge sort.
    out.sort_by(|a, b| {
        let desc = match cfg.sort_by {
            ProjectSortKey::Stars => b.stars.cmp(&a.stars),
            ProjectSortKey::Forks => b.forks.cmp(&a.forks),
            ProjectSortKey::Updated => b.updated_at.cmp(&a.updated_at),
            ProjectSortKey::Created => b.created_at.cmp(&a.created_at),
        };
        oriented(desc, cfg.sort_order)
    });
    out
}

pub fn derive_articles(records: &[NormalizedArticle], cfg: &ArticleFilter) -> Vec<NormalizedArticle> {
    let needle = needle(&cfg.search);
    let mut out: Vec<NormalizedArticle> = records
        .iter()
        .filter(|a| needle.as_deref().map_or(true, |n| article_matches_search(a, n)))
        .filter(|a| cfg.origin.map_or(true, |o| a.origin == o))
        .cloned()
        .collect();

    out.sort_by(|a, b| {
        let desc = match cfg.sort_by {
            ArticleSortKey::Date => b.published_at.cmp(&a.published_at),
            ArticleSortKey::ReadTime => b.reading_time_minutes.cmp(&a.reading_time_minutes),
        };
        oriented(desc, cfg.sort_order)
    });
    out
}

/// Distinct languages present in `records`, sorted, for the language dropdown.
/// Projects without a language are not listed.
pub fn unique_languages(records: &[NormalizedProject]) -> Vec<String> {
    records
        .iter()
        .filter_map(|p| p.language.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn project(id: u64, name: &str, stars: u64, lang: Option<&str>) -> NormalizedProject {
        NormalizedProject {
            id,
            name: name.to_string(),
            description: None,
            language: lang.map(str::to_string),
            stars,
            forks: 0,
            url: format!("https://example.com/{name}"),
            origin: ProjectOrigin::Github,
            created_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, id as u32 % 60).unwrap(),
        }
    }

    #[test]
    fn empty_search_keeps_everything() {
        let recs = vec![project(1, "a", 1, None), project(2, "b", 2, None)];
        let out = derive_projects(&recs, &ProjectFilter::default());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn language_filter_is_exact() {
        let recs = vec![
            project(1, "a", 1, Some("Rust")),
            project(2, "b", 2, Some("rust")),
            project(3, "c", 3, None),
        ];
        let cfg = ProjectFilter {
            language: Some("Rust".into()),
            ..Default::default()
        };
        let out = derive_projects(&recs, &cfg);
        assert_eq!(out.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);

        let na = ProjectFilter {
            language: Some("N/A".into()),
            ..Default::default()
        };
        assert_eq!(derive_projects(&recs, &na)[0].id, 3);
    }

    #[test]
    fn updated_sort_uses_instants() {
        let recs = vec![project(1, "a", 0, None), project(5, "b", 0, None)];
        let out = derive_projects(&recs, &ProjectFilter::default());
        assert_eq!(out[0].id, 5);
    }

    #[test]
    fn read_time_key_deserializes_camel_case() {
        let k: ArticleSortKey = serde_json::from_str("\"readTime\"").unwrap();
        assert_eq!(k, ArticleSortKey::ReadTime);
    }

    #[test]
    fn empty_origin_means_all_sources() {
        let f: ArticleFilter = serde_json::from_str(r#"{"origin": ""}"#).unwrap();
        assert_eq!(f.origin, None);
        let f: ProjectFilter = serde_json::from_str(r#"{"origin": "gitlab"}"#).unwrap();
        assert_eq!(f.origin, Some(ProjectOrigin::Gitlab));
        assert!(serde_json::from_str::<ProjectFilter>(r#"{"origin": "bitbucket"}"#).is_err());
        let f: ProjectFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(f.origin, None);
    }

    #[test]
    fn unique_languages_sorted_and_deduped() {
        let recs = vec![
            project(1, "a", 0, Some("Rust")),
            project(2, "b", 0, Some("Go")),
            project(3, "c", 0, Some("Rust")),
            project(4, "d", 0, None),
        ];
        assert_eq!(unique_languages(&recs), vec!["Go", "Rust"]);
    }
}
