use super::{Article, ArticleRow};

/// Rows that still miss a required field are dropped. Blank text counts as missing.
pub fn drop_incomplete(rows: Vec<ArticleRow>) -> Vec<Article> {
    rows.into_iter().filter_map(complete).collect()
}

fn complete(row: ArticleRow) -> Option<Article> {
    Some(Article {
        id: present(row.id)?,
        url: present(row.url)?,
        title: present(row.title)?,
        body: present(row.body)?,
        host: present(row.host)?,
        source_id: present(row.source_id)?,
        n_tokens_title: row.n_tokens_title?,
        n_tokens_body: row.n_tokens_body?,
    })
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
