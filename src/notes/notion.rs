//! Notion note source
//!
//! Reads note records from a Notion database through the public REST API.
//!
//! - `POST /v1/search` (filtered to databases) → [`NotionSource::list_databases`]
//! - `POST /v1/databases/{id}/query` → [`NotionSource::query_database`]
//!
//! Only the first page of results is read; cursors are not followed.
//!
//! Configuration via [`NotionConfig`] (YAML `notion:` section) or environment
//! variables, see [`crate::Config`].

use super::models::{NoteBatch, NoteRecord};
use super::source::NoteSource;
use crate::error::{DataShapeError, FetchError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub const NOTION_VERSION: &str = "2022-02-22";
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";

/// Connection and property-mapping settings for a Notion database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    /// Integration token, sent as a bearer token
    pub token: Option<String>,
    pub base_url: String,
    /// Database name or id used when no selector is given
    pub database: Option<String>,
    /// Title property (Notion type `title`)
    pub title_property: String,
    /// Free-text summary property (Notion type `rich_text`)
    pub summary_property: String,
    /// Self-relation property holding child pages (Notion type `relation`)
    pub children_property: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: DEFAULT_BASE_URL.into(),
            database: None,
            title_property: "Name".into(),
            summary_property: "AI summary".into(),
            children_property: "Children".into(),
        }
    }
}

/// A database visible to the integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseInfo {
    pub id: String,
    pub name: String,
    /// Relation properties that point back at this same database
    pub self_relation_properties: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ResultsEnvelope {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct NotionErrorBody {
    message: Option<String>,
}

/// HTTP client for the Notion API.
#[derive(Clone)]
pub struct NotionSource {
    client: reqwest::Client,
    config: NotionConfig,
}

impl NotionSource {
    pub fn new(config: NotionConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &NotionConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Vec<Value>, FetchError> {
        let mut req = self
            .client
            .post(self.endpoint(path))
            .header("Notion-Version", NOTION_VERSION)
            .json(&body);

        if let Some(ref token) = self.config.token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<NotionErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ResultsEnvelope = serde_json::from_str(&text)?;
        Ok(envelope.results)
    }

    /// List all databases shared with the integration.
    pub async fn list_databases(&self) -> Result<Vec<DatabaseInfo>, FetchError> {
        let results = self
            .post(
                "/v1/search",
                json!({ "filter": { "value": "database", "property": "object" } }),
            )
            .await?;

        Ok(results.iter().filter_map(database_info).collect())
    }

    /// Databases that have at least one self-relation property, i.e. the ones
    /// a relation graph can be drawn from.
    pub async fn list_databases_with_relations(&self) -> Result<Vec<DatabaseInfo>, FetchError> {
        Ok(self
            .list_databases()
            .await?
            .into_iter()
            .filter(|db| !db.self_relation_properties.is_empty())
            .collect())
    }

    /// Resolve a database name or id to an id.
    pub async fn resolve_database(&self, selector: &str) -> Result<String, FetchError> {
        if looks_like_id(selector) {
            return Ok(selector.to_string());
        }
        self.list_databases()
            .await?
            .into_iter()
            .find(|db| db.name == selector)
            .map(|db| db.id)
            .ok_or_else(|| FetchError::DatabaseNotFound(selector.to_string()))
    }

    /// Query one page of a database and map its rows to note records.
    pub async fn query_database(&self, database_id: &str) -> Result<Vec<NoteRecord>, FetchError> {
        let pages = self
            .post(&format!("/v1/databases/{}/query", database_id), json!({}))
            .await?;

        let total = pages.len();
        let notes: Vec<NoteRecord> = pages
            .iter()
            .filter_map(|page| match self.page_to_note(page) {
                Ok(note) => Some(note),
                Err(e) => {
                    tracing::warn!(database = database_id, error = %e, "Skipping malformed page");
                    None
                }
            })
            .collect();

        tracing::debug!(
            database = database_id,
            pages = total,
            notes = notes.len(),
            "Notion database queried"
        );
        Ok(notes)
    }

    /// Map one Notion page object to a [`NoteRecord`].
    pub fn page_to_note(&self, page: &Value) -> Result<NoteRecord, DataShapeError> {
        let id = page
            .get("id")
            .and_then(Value::as_str)
            .ok_or(DataShapeError::MissingId)?
            .to_string();

        let title = first_plain_text(page, &self.config.title_property, "title")
            .ok_or_else(|| DataShapeError::MissingTitle { id: id.clone() })?;

        let summary =
            first_plain_text(page, &self.config.summary_property, "rich_text").unwrap_or_default();

        let children = relation_ids(page, &self.config.children_property);

        Ok(NoteRecord {
            id,
            title,
            summary,
            children,
        })
    }
}

#[async_trait]
impl NoteSource for NotionSource {
    async fn fetch_batch(&self, selector: &str) -> Result<NoteBatch, FetchError> {
        let database_id = self.resolve_database(selector).await?;
        let notes = self.query_database(&database_id).await?;
        Ok(NoteBatch::new(notes))
    }
}

// ============================================================================
// Property helpers
// ============================================================================

/// `properties[name][kind][0].plain_text`
fn first_plain_text(page: &Value, name: &str, kind: &str) -> Option<String> {
    page.get("properties")?
        .get(name)?
        .get(kind)?
        .get(0)?
        .get("plain_text")?
        .as_str()
        .map(str::to_string)
}

/// `properties[name].relation[*].id`, empty when the property is absent.
fn relation_ids(page: &Value, name: &str) -> Vec<String> {
    page.get("properties")
        .and_then(|p| p.get(name))
        .and_then(|p| p.get("relation"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn database_info(db: &Value) -> Option<DatabaseInfo> {
    let id = db.get("id")?.as_str()?.to_string();
    let name = db
        .get("title")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| {
                    p.get("plain_text")
                        .or_else(|| p.get("text").and_then(|t| t.get("content")))
                        .and_then(Value::as_str)
                })
                .collect::<String>()
        })
        .unwrap_or_default();

    let mut self_relation_properties: Vec<String> = db
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .filter(|(_, prop)| {
                    prop.get("relation")
                        .and_then(|r| r.get("database_id"))
                        .and_then(Value::as_str)
                        .is_some_and(|target| same_id(target, &id))
                })
                .map(|(prop_name, _)| prop_name.clone())
                .collect()
        })
        .unwrap_or_default();
    self_relation_properties.sort();

    Some(DatabaseInfo {
        id,
        name,
        self_relation_properties,
    })
}

/// Notion ids are 32 hex digits, with or without dashes.
fn looks_like_id(s: &str) -> bool {
    let hex: Vec<char> = s.chars().filter(|c| *c != '-').collect();
    hex.len() == 32 && hex.iter().all(|c| c.is_ascii_hexdigit())
}

fn same_id(a: &str, b: &str) -> bool {
    a.chars()
        .filter(|c| *c != '-')
        .eq(b.chars().filter(|c| *c != '-'))
}
