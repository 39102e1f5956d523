use async_trait::async_trait;
use chrono::{DateTime, Utc};
use co_core::{
    ArticleFilter, ArticlePatch, ArticleStore, Error, NewArticle, Page, Reference, Result,
    SourceArticle,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        content TEXT NOT NULL,
        excerpt TEXT,
        author TEXT,
        published_date TEXT,
        scraped_at TEXT NOT NULL,
        is_optimized INTEGER NOT NULL DEFAULT 0,
        original_article_id TEXT,
        refs TEXT NOT NULL DEFAULT '[]',
        metadata TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_is_optimized ON articles (is_optimized)",
    // At most one optimized derivative per source article.
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_articles_single_derivative
    ON articles (original_article_id) WHERE is_optimized = 1
    "#,
];

const SELECT_COLUMNS: &str = "id, title, url, content, excerpt, author, published_date, scraped_at, \
     is_optimized, original_article_id, refs, metadata, created_at, updated_at";

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: Option<PathBuf>,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be available at ./articles.db"
    }

    async fn new() -> Result<Self> {
        Self::new_with_path(Path::new("articles.db")).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let mut storage = Self::with_options(options).await?;
        storage.db_path = Some(db_path.to_path_buf());
        Ok(storage)
    }

    /// Accepts either a `sqlite:` URL or a plain file path.
    pub async fn connect(url: &str) -> Result<Self> {
        if url.starts_with("sqlite:") {
            let options = SqliteConnectOptions::from_str(url)
                .map_err(|e| Error::Config(format!("Invalid SQLite URL {}: {}", url, e)))?
                .create_if_missing(true);
            Self::with_options(options).await
        } else {
            Self::new_with_path(Path::new(url)).await
        }
    }

    async fn with_options(options: SqliteConnectOptions) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("{}: {}", Self::get_error_message(), e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self { pool, db_path: None })
    }

    pub fn get_db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    async fn write_row(&self, sql: &str, article: &SourceArticle) -> Result<()> {
        let refs = serde_json::to_string(&article.references)?;
        let metadata = serde_json::to_string(&article.metadata)?;

        sqlx::query(sql)
            .bind(&article.id)
            .bind(&article.title)
            .bind(&article.url)
            .bind(&article.content)
            .bind(article.excerpt.as_deref())
            .bind(article.author.as_deref())
            .bind(article.published_date.map(|d| d.to_rfc3339()))
            .bind(article.scraped_at.to_rfc3339())
            .bind(article.is_optimized)
            .bind(article.original_article_id.as_deref())
            .bind(refs)
            .bind(metadata)
            .bind(article.created_at.to_rfc3339())
            .bind(article.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, article))?;
        Ok(())
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> Result<Option<SourceArticle>> {
        let sql = format!("SELECT {} FROM articles WHERE {} LIMIT 1", SELECT_COLUMNS, clause);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to query articles: {}", e)))?;
        row.as_ref().map(row_to_article).transpose()
    }
}

fn map_write_error(e: sqlx::Error, article: &SourceArticle) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::Conflict(format!(
            "Article {} conflicts with an existing article: {}",
            article.url,
            db.message()
        )),
        _ => Error::Database(format!("Failed to write article: {}", e)),
    }
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse date {}: {}", raw, e)))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| Error::Database(format!("Failed to read column {}: {}", name, e)))
}

fn row_to_article(row: &SqliteRow) -> Result<SourceArticle> {
    let refs: String = column(row, "refs")?;
    let metadata: String = column(row, "metadata")?;
    let published_date: Option<String> = column(row, "published_date")?;
    let references: Vec<Reference> = serde_json::from_str(&refs)?;

    Ok(SourceArticle {
        id: column(row, "id")?,
        title: column(row, "title")?,
        url: column(row, "url")?,
        content: column(row, "content")?,
        excerpt: column(row, "excerpt")?,
        author: column(row, "author")?,
        published_date: published_date.as_deref().map(parse_date).transpose()?,
        scraped_at: parse_date(&column::<String>(row, "scraped_at")?)?,
        is_optimized: column(row, "is_optimized")?,
        original_article_id: column(row, "original_article_id")?,
        references,
        metadata: serde_json::from_str(&metadata)?,
        created_at: parse_date(&column::<String>(row, "created_at")?)?,
        updated_at: parse_date(&column::<String>(row, "updated_at")?)?,
    })
}

#[async_trait]
impl ArticleStore for SQLiteStorage {
    async fn create(&self, article: NewArticle) -> Result<SourceArticle> {
        article.validate()?;
        let stored = article.into_article(Uuid::new_v4().to_string(), Utc::now());
        self.write_row(
            r#"
            INSERT INTO articles
            (id, title, url, content, excerpt, author, published_date, scraped_at,
             is_optimized, original_article_id, refs, metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            &stored,
        )
        .await?;
        Ok(stored)
    }

    async fn get(&self, id: &str) -> Result<Option<SourceArticle>> {
        self.fetch_one_where("id = ?", id).await
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<SourceArticle>> {
        self.fetch_one_where("url = ?", url.trim()).await
    }

    async fn find_optimized_for(&self, original_id: &str) -> Result<Option<SourceArticle>> {
        self.fetch_one_where("is_optimized = 1 AND original_article_id = ?", original_id)
            .await
    }

    async fn list(&self, filter: &ArticleFilter, page: usize, limit: usize) -> Result<Page<SourceArticle>> {
        const WHERE: &str = "WHERE (?1 IS NULL OR is_optimized = ?1) AND (?2 IS NULL OR original_article_id = ?2)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM articles {}", WHERE))
            .bind(filter.is_optimized)
            .bind(filter.original_article_id.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count articles: {}", e)))?;

        let sql = format!(
            "SELECT {} FROM articles {} ORDER BY created_at DESC, rowid DESC LIMIT ?3 OFFSET ?4",
            SELECT_COLUMNS, WHERE
        );
        let rows = sqlx::query(&sql)
            .bind(filter.is_optimized)
            .bind(filter.original_article_id.as_deref())
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(Page::<SourceArticle>::offset(page, limit)).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list articles: {}", e)))?;

        let items = rows.iter().map(row_to_article).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, total as usize, page, limit))
    }

    async fn update(&self, id: &str, patch: ArticlePatch) -> Result<Option<SourceArticle>> {
        patch.validate()?;
        let Some(mut article) = self.get(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut article, Utc::now());
        article.validate()?;

        self.write_row(
            r#"
            UPDATE articles SET
                id = ?1, title = ?2, url = ?3, content = ?4, excerpt = ?5, author = ?6,
                published_date = ?7, scraped_at = ?8, is_optimized = ?9,
                original_article_id = ?10, refs = ?11, metadata = ?12,
                created_at = ?13, updated_at = ?14
            WHERE id = ?1
            "#,
            &article,
        )
        .await?;
        Ok(Some(article))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete article: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }
}
