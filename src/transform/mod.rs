pub mod dedup;
pub mod filter;
pub mod identity;
pub mod repair;
pub mod report;
pub mod text;
pub mod tokenize;

use std::collections::HashSet;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, Stage, TransformError};
use crate::settings::TransformConfig;
use report::StageTracker;

/// One scraped article as written by the extract step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArticle {
    pub url: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Working row while the batch moves through the stages. `row` is the
/// position in the input batch and only used for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleRow {
    pub row: usize,
    pub id: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub host: Option<String>,
    pub source_id: Option<String>,
    pub n_tokens_title: Option<usize>,
    pub n_tokens_body: Option<usize>,
}

impl ArticleRow {
    pub fn from_raw(row: usize, raw: RawArticle) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        ArticleRow {
            row,
            url: present(raw.url),
            title: present(raw.title),
            body: present(raw.body),
            ..ArticleRow::default()
        }
    }
}

/// A fully derived, deduplicated and complete article, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub url: String,
    pub title: String,
    pub body: String,
    pub host: String,
    pub source_id: String,
    pub n_tokens_title: usize,
    pub n_tokens_body: usize,
}

pub struct Transformed {
    pub articles: Vec<Article>,
    pub report: StageTracker,
}

/// Run every stage, in order, over one batch. Either the whole batch comes
/// out clean or the run fails; nothing is applied partially.
pub fn run(raw: Vec<RawArticle>, source_id: &str, cfg: &TransformConfig) -> Result<Transformed> {
    info!(rows = raw.len(), source_id, language = %cfg.language, "Starting cleaning process");
    let mut tracker = StageTracker::new();

    let rows: Vec<ArticleRow> = raw
        .into_iter()
        .enumerate()
        .map(|(i, r)| ArticleRow::from_raw(i, r))
        .collect();

    let rows = step(&mut tracker, Stage::SourceId, rows, |r| Ok(add_source_id(r, source_id)))?;
    let rows = step(&mut tracker, Stage::Host, rows, |r| Ok(add_host(r)))?;
    let rows = step(&mut tracker, Stage::FillTitles, rows, |r| Ok(fill_missing_titles(r)))?;
    let rows = step(&mut tracker, Stage::Identity, rows, |r| Ok(add_ids(r)))?;
    let rows = step(&mut tracker, Stage::NormalizeBody, rows, |r| Ok(normalize_bodies(r)))?;
    let rows = step(&mut tracker, Stage::TokenizeTitle, rows, |r| {
        tokenize_titles(r, &cfg.stopwords)
    })?;
    let rows = step(&mut tracker, Stage::TokenizeBody, rows, |r| {
        tokenize_bodies(r, &cfg.stopwords)
    })?;
    let rows = step(&mut tracker, Stage::Deduplicate, rows, |r| Ok(dedupe_titles(r)))?;

    let before = rows.len();
    let articles = filter::drop_incomplete(rows);
    tracker.record(Stage::DropIncomplete, before, articles.len());

    info!(rows = articles.len(), "Cleaning done");
    Ok(Transformed {
        articles,
        report: tracker,
    })
}

fn step<F>(
    tracker: &mut StageTracker,
    stage: Stage,
    rows: Vec<ArticleRow>,
    f: F,
) -> Result<Vec<ArticleRow>>
where
    F: FnOnce(Vec<ArticleRow>) -> Result<Vec<ArticleRow>>,
{
    debug!(stage = stage.name(), rows = rows.len(), "stage start");
    let before = rows.len();
    let rows = f(rows)?;
    tracker.record(stage, before, rows.len());
    Ok(rows)
}

// ── Stages ──

pub fn add_source_id(rows: Vec<ArticleRow>, source_id: &str) -> Vec<ArticleRow> {
    rows.into_iter()
        .map(|r| identity::assign_source_id(r, source_id))
        .collect()
}

pub fn add_host(rows: Vec<ArticleRow>) -> Vec<ArticleRow> {
    rows.into_iter()
        .map(|r| ArticleRow {
            host: r.url.as_deref().and_then(repair::extract_host),
            ..r
        })
        .collect()
}

pub fn fill_missing_titles(rows: Vec<ArticleRow>) -> Vec<ArticleRow> {
    rows.into_iter()
        .map(|r| match (&r.title, &r.url) {
            (None, Some(url)) => ArticleRow {
                title: Some(repair::fill_missing_title(url)),
                ..r
            },
            _ => r,
        })
        .collect()
}

pub fn add_ids(rows: Vec<ArticleRow>) -> Vec<ArticleRow> {
    rows.into_iter()
        .map(|r| ArticleRow {
            id: r.url.as_deref().map(identity::assign_id),
            ..r
        })
        .collect()
}

pub fn normalize_bodies(rows: Vec<ArticleRow>) -> Vec<ArticleRow> {
    rows.into_iter()
        .map(|r| ArticleRow {
            body: r.body.as_deref().map(text::normalize_body),
            ..r
        })
        .collect()
}

pub fn tokenize_titles(rows: Vec<ArticleRow>, stopwords: &HashSet<String>) -> Result<Vec<ArticleRow>> {
    let counts = count_column(&rows, Stage::TokenizeTitle, "title", |r| r.title.as_deref(), stopwords)?;
    Ok(rows
        .into_iter()
        .zip(counts)
        .map(|(r, n)| ArticleRow {
            n_tokens_title: n,
            ..r
        })
        .collect())
}

pub fn tokenize_bodies(rows: Vec<ArticleRow>, stopwords: &HashSet<String>) -> Result<Vec<ArticleRow>> {
    let counts = count_column(&rows, Stage::TokenizeBody, "body", |r| r.body.as_deref(), stopwords)?;
    Ok(rows
        .into_iter()
        .zip(counts)
        .map(|(r, n)| ArticleRow {
            n_tokens_body: n,
            ..r
        })
        .collect())
}

pub fn dedupe_titles(rows: Vec<ArticleRow>) -> Vec<ArticleRow> {
    dedup::deduplicate(rows, |r| r.title.clone())
}

/// Token counts for one column. Missing values stay missing; the first row
/// (by input order) holding non-text content fails the run.
fn count_column(
    rows: &[ArticleRow],
    stage: Stage,
    field: &'static str,
    get: fn(&ArticleRow) -> Option<&str>,
    stopwords: &HashSet<String>,
) -> Result<Vec<Option<usize>>> {
    let count = |r: &ArticleRow| -> Result<Option<usize>> {
        match get(r) {
            None => Ok(None),
            Some(value) if !text::is_text(value) => Err(TransformError::UnparseableText {
                stage,
                row: r.row,
                field,
            }),
            Some(value) => Ok(Some(tokenize::count_tokens(value, stopwords))),
        }
    };

    #[cfg(feature = "rayon")]
    let counts: Vec<Result<Option<usize>>> = rows.par_iter().map(count).collect();
    #[cfg(not(feature = "rayon"))]
    let counts: Vec<Result<Option<usize>>> = rows.iter().map(count).collect();

    counts.into_iter().collect()
}
