use std::{future::Future, path::Path, pin::Pin, str::FromStr};

use sqlx::{
    FromRow, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteSynchronous},
    types::Json,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    db::interface::{DatabaseClient, DatabaseError},
    models::{Collection, Document, DocumentUpdate, Fields, new_uuid},
};


#[derive(Debug, thiserror::Error)]
pub enum CreateSqliteClientError {
    #[error("failed to migrate database to current version: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// # SQLite document store
///
/// Each collection is a table of `(seq, id, body)` rows where `body` is the document's JSON text
/// and `seq` records insertion order. Field lookups and partial updates go through SQLite's JSON
/// functions, so no document is ever read back into the process just to be rewritten.
#[derive(Debug, Clone)]
pub struct SqliteClient {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    body: Json<Fields>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            fields: row.body.0,
        }
    }
}

/// Builds the JSON path of a top-level field.
fn json_path(key: &str) -> String {
    format!("$.\"{key}\"")
}

impl SqliteClient {
    /// Opens or creates the database at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CreateSqliteClientError> {
        Ok(Self {
            pool: Self::do_open(
                SqliteConnectOptions::new()
                    .create_if_missing(true)
                    .filename(path),
            )
            .await?,
        })
    }

    /// Creates a client that uses a new in-memory database.
    pub async fn new_memory() -> Result<Self, CreateSqliteClientError> {
        // sqlx has some special handling for the in-memory database which only
        // happens when parsing from a URL string
        Ok(Self {
            pool: Self::do_open(SqliteConnectOptions::from_str("sqlite://:memory:")?).await?,
        })
    }

    async fn do_open(
        base_options: SqliteConnectOptions,
    ) -> Result<SqlitePool, CreateSqliteClientError> {
        let options = base_options
            .synchronous(SqliteSynchronous::Normal)
            .optimize_on_close(true, None);
        let pool = SqlitePool::connect_with(options).await?;

        sqlx::migrate!("src/db/clients/sqlite/migrations")
            .run(&pool)
            .await?;

        Ok(pool)
    }
}

impl DatabaseClient for SqliteClient {
    fn insert_document<'a>(
        &self,
        collection: Collection,
        fields: &'a Fields,
    ) -> Pin<Box<dyn Future<Output = Result<Document, DatabaseError>> + Send + 'a>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let id = new_uuid();
            let sql = format!("INSERT INTO {collection} (id, body) VALUES ($1, $2)");
            sqlx::query(&sql)
                .bind(id)
                .bind(Json(fields))
                .execute(&pool)
                .await?;
            debug!("inserted document {id} into {collection}");
            Ok(Document {
                id,
                fields: fields.clone(),
            })
        })
    }

    fn find_documents(
        &self,
        collection: Collection,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Document>, DatabaseError>> + Send + 'static>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let sql = format!("SELECT id, body FROM {collection} ORDER BY seq");
            let rows: Vec<DocumentRow> = sqlx::query_as(&sql).fetch_all(&pool).await?;
            Ok(rows.into_iter().map(Document::from).collect())
        })
    }

    fn find_document<'a>(
        &self,
        collection: Collection,
        filter: &'a Fields,
    ) -> Pin<Box<dyn Future<Output = Result<Document, DatabaseError>> + Send + 'a>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            // Compare SQL values on both sides so that e.g. a JSON string matches a stored string
            let mut sql = format!("SELECT id, body FROM {collection} WHERE 1 = 1");
            for _ in filter {
                sql.push_str(" AND json_extract(body, ?) = json_extract(?, '$')");
            }
            sql.push_str(" ORDER BY seq LIMIT 1");

            let mut query = sqlx::query_as::<_, DocumentRow>(&sql);
            for (key, value) in filter {
                query = query.bind(json_path(key)).bind(Json(value));
            }
            let row = query.fetch_one(&pool).await?;
            Ok(row.into())
        })
    }

    fn update_document_by_id<'a>(
        &self,
        collection: Collection,
        id: &'a Uuid,
        update: &'a DocumentUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<(), DatabaseError>> + Send + 'a>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let result = match update {
                DocumentUpdate::Replace(fields) => {
                    let sql = format!("UPDATE {collection} SET body = ? WHERE id = ?");
                    sqlx::query(&sql)
                        .bind(Json(fields))
                        .bind(id)
                        .execute(&pool)
                        .await?
                }
                DocumentUpdate::Set(fields) => {
                    // An empty set still has to match the row to report whether it exists
                    let sql = if fields.is_empty() {
                        format!("UPDATE {collection} SET body = body WHERE id = ?")
                    } else {
                        let assignments = vec!["?, json(?)"; fields.len()].join(", ");
                        format!(
                            "UPDATE {collection} SET body = json_set(body, {assignments}) WHERE id = ?"
                        )
                    };
                    let mut query = sqlx::query(&sql);
                    for (key, value) in fields {
                        query = query.bind(json_path(key)).bind(Json(value));
                    }
                    query.bind(id).execute(&pool).await?
                }
            };
            if result.rows_affected() == 0 {
                return Err(DatabaseError::NotFound);
            }
            Ok(())
        })
    }

    fn delete_document_by_id<'id>(
        &self,
        collection: Collection,
        id: &'id Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<(), DatabaseError>> + Send + 'id>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let sql = format!("DELETE FROM {collection} WHERE id = $1");
            let result = sqlx::query(&sql).bind(id).execute(&pool).await?;
            if result.rows_affected() == 0 {
                return Err(DatabaseError::NotFound);
            }
            debug!("deleted document {id} from {collection}");
            Ok(())
        })
    }

    fn count_documents(
        &self,
        collection: Collection,
    ) -> Pin<Box<dyn Future<Output = Result<u64, DatabaseError>> + Send + 'static>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let sql = format!("SELECT COUNT(*) FROM {collection}");
            let count: i64 = sqlx::query_scalar(&sql).fetch_one(&pool).await?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }
}
