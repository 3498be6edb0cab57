use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

use crate::transform::Article;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS articles (
            id             TEXT PRIMARY KEY,
            url            TEXT UNIQUE NOT NULL,
            title          TEXT NOT NULL,
            body           TEXT NOT NULL,
            host           TEXT NOT NULL,
            source_id      TEXT NOT NULL,
            n_tokens_title INTEGER NOT NULL,
            n_tokens_body  INTEGER NOT NULL,
            loaded_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_articles_source ON articles(source_id);
        CREATE INDEX IF NOT EXISTS idx_articles_host ON articles(host);
        ",
    )?;
    Ok(())
}

/// Insert a clean batch in one transaction. Rows already present (same id
/// or url) are replaced, so loading the same batch twice is harmless.
pub fn save_articles(conn: &Connection, rows: &[Article]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO articles
             (id, url, title, body, host, source_id, n_tokens_title, n_tokens_body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for a in rows {
            count += stmt.execute(rusqlite::params![
                a.id,
                a.url,
                a.title,
                a.body,
                a.host,
                a.source_id,
                a.n_tokens_title as i64,
                a.n_tokens_body as i64,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Stats ──

#[derive(Debug, Serialize)]
pub struct Stats {
    pub total: usize,
    pub sources: Vec<SourceStats>,
}

#[derive(Debug, Serialize)]
pub struct SourceStats {
    pub source_id: String,
    pub articles: usize,
    pub avg_tokens_body: f64,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM articles", [], |r| r.get(0))?;
    let mut stmt = conn.prepare(
        "SELECT source_id, COUNT(*), COALESCE(AVG(n_tokens_body), 0)
         FROM articles
         GROUP BY source_id
         ORDER BY source_id",
    )?;
    let sources = stmt
        .query_map([], |row| {
            Ok(SourceStats {
                source_id: row.get(0)?,
                articles: row.get(1)?,
                avg_tokens_body: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stats { total, sources })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(url: &str, source: &str, n_body: usize) -> Article {
        Article {
            id: crate::transform::identity::assign_id(url),
            url: url.to_string(),
            title: format!("title {}", url),
            body: "cuerpo".into(),
            host: "n.test".into(),
            source_id: source.into(),
            n_tokens_title: 2,
            n_tokens_body: n_body,
        }
    }

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn saves_and_counts() {
        let conn = memory();
        let rows = vec![
            article("https://n.test/a", "n", 10),
            article("https://n.test/b", "n", 20),
            article("https://m.test/c", "m", 5),
        ];
        assert_eq!(save_articles(&conn, &rows).unwrap(), 3);

        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.sources.len(), 2);
        assert_eq!(stats.sources[0].source_id, "m");
        assert_eq!(stats.sources[1].articles, 2);
        assert!((stats.sources[1].avg_tokens_body - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reloading_is_idempotent() {
        let conn = memory();
        let rows = vec![article("https://n.test/a", "n", 1)];
        save_articles(&conn, &rows).unwrap();
        save_articles(&conn, &rows).unwrap();
        assert_eq!(get_stats(&conn).unwrap().total, 1);
    }

    #[test]
    fn schema_is_reentrant() {
        let conn = memory();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn empty_db_stats() {
        let stats = get_stats(&memory()).unwrap();
        assert_eq!(stats.total, 0);
        assert!(stats.sources.is_empty());
    }
}
