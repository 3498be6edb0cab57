use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::transform::{Article, RawArticle};

const BOM: &str = "\u{feff}";
const RAW_HEADER: [&str; 3] = ["url", "title", "body"];
const CLEAN_HEADER: [&str; 8] = [
    "id",
    "url",
    "title",
    "body",
    "host",
    "source_id",
    "n_tokens_title",
    "n_tokens_body",
];

// ── Naming ──

/// `<site>_<YYYY_MM_DD>_articles.csv`
pub fn articles_file_name(site_uid: &str, date: NaiveDate) -> String {
    format!("{}_{}_articles.csv", site_uid, date.format("%Y_%m_%d"))
}

/// Source id from the batch file name: everything before the first `_`.
pub fn source_id_from_path(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("No file name in {:?}", path))?;
    let name = name.strip_prefix("clean_").unwrap_or(name);
    let uid = name.split('_').next().unwrap_or_default();
    if uid.is_empty() {
        bail!("Cannot derive a source id from {:?}", path);
    }
    Ok(uid.to_string())
}

pub fn clean_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("clean_{}", name))
}

// ── Reading ──

pub fn parse_raw(text: &str) -> Result<Vec<RawArticle>> {
    parse_records(text)
}

pub fn parse_clean(text: &str) -> Result<Vec<Article>> {
    parse_records(text)
}

fn parse_records<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    reader
        .deserialize()
        .enumerate()
        .map(|(i, record)| record.with_context(|| format!("Unreadable record at row {}", i)))
        .collect()
}

pub fn read_raw_file(path: &Path) -> Result<Vec<RawArticle>> {
    let text = read_text(path)?;
    parse_raw(&text).with_context(|| format!("Failed to parse {:?}", path))
}

pub fn read_clean_file(path: &Path) -> Result<Vec<Article>> {
    let text = read_text(path)?;
    parse_clean(&text).with_context(|| format!("Failed to parse {:?}", path))
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

// ── Writing ──

pub fn write_raw<W: Write>(writer: W, rows: &[RawArticle]) -> Result<()> {
    write_records(writer, &RAW_HEADER, rows)
}

pub fn write_clean<W: Write>(writer: W, rows: &[Article]) -> Result<()> {
    write_records(writer, &CLEAN_HEADER, rows)
}

// Header is written by hand so empty batches still get one.
fn write_records<W: Write, T: Serialize>(mut writer: W, header: &[&str], rows: &[T]) -> Result<()> {
    writer.write_all(BOM.as_bytes())?;
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    out.write_record(header)?;
    for row in rows {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_raw_file(path: &Path, rows: &[RawArticle]) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_raw(file, rows)
}

pub fn write_clean_file(path: &Path, rows: &[Article]) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_clean(file, rows)
}
