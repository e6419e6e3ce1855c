//! Postgres store adapter (sqlx).
//!
//! Implements the core `SubscriberStore` over the `subscribers` and
//! `regexes` tables (see `schema.sql`). `has_blocked_bot` is runtime state
//! and deliberately has no column.

use async_trait::async_trait;

use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use picbot_core::{
    domain::{ChatId, Subscriber},
    ports::SubscriberStore,
    Error, Result,
};

const GET_SUBSCRIBERS: &str = "SELECT chatid, username, isactive FROM subscribers";
const ADD_SUBSCRIBER: &str =
    "INSERT INTO subscribers (chatid, username, isactive) VALUES ($1, $2, $3)";
const CHANGE_STATE: &str = "UPDATE subscribers SET isactive = $2 WHERE chatid = $1";
const GET_PATTERNS: &str = "SELECT reg FROM regexes";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct SubscriberRow {
    chatid: i64,
    username: String,
    isactive: bool,
}

impl From<SubscriberRow> for Subscriber {
    fn from(row: SubscriberRow) -> Self {
        Subscriber {
            chat_id: ChatId(row.chatid),
            username: row.username,
            is_active: row.isactive,
            has_blocked_bot: false,
        }
    }
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(store_err)?;
        Ok(Self { pool })
    }
}

fn store_err(e: sqlx::Error) -> Error {
    Error::Store(e.to_string())
}

#[async_trait]
impl SubscriberStore for PgStore {
    async fn load_subscribers(&self) -> Result<Vec<Subscriber>> {
        let rows: Vec<SubscriberRow> = sqlx::query_as(GET_SUBSCRIBERS)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(Subscriber::from).collect())
    }

    async fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
        sqlx::query(ADD_SUBSCRIBER)
            .bind(subscriber.chat_id.0)
            .bind(&subscriber.username)
            .bind(subscriber.is_active)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn set_active(&self, chat_id: ChatId, active: bool) -> Result<()> {
        sqlx::query(CHANGE_STATE)
            .bind(chat_id.0)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn load_patterns(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(GET_PATTERNS)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(|(reg,)| reg).collect())
    }
}
