use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use sqlx::{
    postgres::PgPoolOptions, query, query_as, types::Json, Error as SqlxError, FromRow, PgPool,
};

use keepsake_core::{
    CompletedUpload, Database, DatabaseError, DatabaseResult, NewOrder, NewSession, NewUser,
    OrderData, OrderFiles, PrimaryKey, Result, SessionData, UserData,
};

/// A postgres database implementation for keepsake
pub struct PgDatabase {
    pool: PgPool,
}

#[derive(FromRow)]
struct UserRow {
    id: PrimaryKey,
    username: String,
    password: String,
}

#[derive(FromRow)]
struct SessionRow {
    id: PrimaryKey,
    token: String,
    expires_at: DateTime<Utc>,
    user_id: PrimaryKey,
    username: String,
    password: String,
}

#[derive(FromRow)]
struct OrderRow {
    id: String,
    has_uploaded: bool,
    files: Option<Json<OrderFiles>>,
    song_request: Option<String>,
    created_at: String,
}

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id SERIAL PRIMARY KEY,
        token TEXT NOT NULL UNIQUE,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        expires_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id TEXT PRIMARY KEY,
        has_uploaded BOOLEAN NOT NULL DEFAULT FALSE,
        files JSONB,
        song_request TEXT,
        created_at TEXT NOT NULL
    )",
];

const SELECT_SESSION: &str = "
    SELECT
        sessions.id,
        sessions.token,
        sessions.expires_at,
        sessions.user_id,
        users.username,
        users.password
    FROM sessions
        INNER JOIN users ON sessions.user_id = users.id
    WHERE token = $1";

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| e.any())?;

        let database = Self { pool };
        database.ensure_schema().await?;

        Ok(database)
    }

    /// Creates the tables if they're missing
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| e.any())?;
        }

        info!("Database schema is ready");
        Ok(())
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map(UserData::from)
            .map_err(|e| e.not_found_or("user", "id"))
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map(UserData::from)
            .map_err(|e| e.not_found_or("user", "username"))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.user_by_username(&new_user.username)
            .await
            .conflict_or_ok("user", "username", &new_user.username)?;

        query_as::<_, UserRow>(
            "INSERT INTO users (username, password) VALUES ($1, $2) RETURNING *",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .fetch_one(&self.pool)
        .await
        .map(UserData::from)
        .map_err(|e| e.conflict_or("user", "username", &new_user.username))
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        query_as::<_, SessionRow>(SELECT_SESSION)
            .bind(token)
            .fetch_one(&self.pool)
            .await
            .map(SessionData::from)
            .map_err(|e| e.not_found_or("session", "token"))
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_token(&new_session.token)
            .await
            .conflict_or_ok("session", "token", &new_session.token)?;

        query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&new_session.token)
            .bind(new_session.user_id)
            .bind(new_session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| e.conflict_or("session", "token", &new_session.token))?;

        self.session_by_token(&new_session.token).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        query("DELETE FROM sessions WHERE now() > expires_at")
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn order_by_id(&self, order_id: &str) -> Result<OrderData> {
        query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_one(&self.pool)
            .await
            .map(OrderData::from)
            .map_err(|e| e.not_found_or("order", "id"))
    }

    async fn list_orders(&self) -> Result<Vec<OrderData>> {
        let orders = query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?
            .into_iter()
            .map(OrderData::from)
            .collect();

        Ok(orders)
    }

    async fn create_order(&self, new_order: NewOrder) -> Result<OrderData> {
        let order = OrderData::new(new_order.id);

        // ON CONFLICT keeps the existing row intact, no row comes back if the id is taken
        let row = query_as::<_, OrderRow>(
            "INSERT INTO orders (id, has_uploaded, files, song_request, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            RETURNING *",
        )
        .bind(&order.id)
        .bind(order.has_uploaded)
        .bind(order.files.clone().map(Json))
        .bind(&order.song_request)
        .bind(&order.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.any())?;

        row.map(OrderData::from).ok_or(DatabaseError::Conflict {
            resource: "order",
            field: "id",
            value: order.id,
        })
    }

    async fn complete_upload(&self, upload: CompletedUpload) -> Result<OrderData> {
        let row = query_as::<_, OrderRow>(
            "UPDATE orders SET
                files = $2,
                song_request = $3,
                has_uploaded = TRUE
            WHERE id = $1 AND has_uploaded = FALSE
            RETURNING *",
        )
        .bind(&upload.order_id)
        .bind(Json(&upload.files))
        .bind(&upload.song_request)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.any())?;

        match row {
            Some(row) => Ok(row.into()),
            None => {
                // Either the order is gone or someone else uploaded first
                let _ = self.order_by_id(&upload.order_id).await?;

                Err(DatabaseError::Conflict {
                    resource: "order upload",
                    field: "id",
                    value: upload.order_id,
                })
            }
        }
    }

    async fn delete_order(&self, order_id: &str) -> Result<()> {
        query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }
}

impl From<UserRow> for UserData {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password: row.password,
        }
    }
}

impl From<SessionRow> for SessionData {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            token: row.token,
            expires_at: row.expires_at,
            user: UserData {
                id: row.user_id,
                username: row.username,
                password: row.password,
            },
        }
    }
}

impl From<OrderRow> for OrderData {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            has_uploaded: row.has_uploaded,
            files: row.files.map(|f| f.0),
            song_request: row.song_request.unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

/// Helper trait to reduce boilerplate
trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    /// Turns a unique violation into a conflict
    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str)
        -> DatabaseError;
    fn any(self) -> DatabaseError;
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }

    fn conflict_or(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> DatabaseError {
        let is_unique_violation = matches!(
            &self,
            SqlxError::Database(e) if e.is_unique_violation()
        );

        if is_unique_violation {
            DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }
        } else {
            self.any()
        }
    }
}
