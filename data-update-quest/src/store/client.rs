use std::collections::BTreeMap;

use redis::{IntoConnectionInfo, RedisError, Value, aio::ConnectionManager, cmd, from_redis_value};
use serde_json::Value as JsonValue;

use super::naming::IndexNaming;
use crate::errors::{MigrationError, Result};

/// Documents fetched per `FT.SEARCH` round trip.
pub const SEARCH_PAGE_SIZE: usize = 100;

/// RediSearch's default `MAXSEARCHRESULTS`. `FT.SEARCH` rejects `LIMIT` offsets past it.
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 10_000;

/// A JSON document together with the key it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub key: String,
    pub document: JsonValue,
}

/// Thin client over RediSearch and RedisJSON commands.
#[derive(Clone)]
pub struct StoreClient {
    conn: ConnectionManager,
    naming: IndexNaming,
}

impl StoreClient {
    pub fn new(conn: ConnectionManager, naming: IndexNaming) -> Self {
        Self { conn, naming }
    }

    /// Open a managed connection from a URL or a prebuilt `redis::ConnectionInfo`.
    ///
    /// # Example
    /// ```ignore
    /// let client = StoreClient::connect("redis://localhost:6379", IndexNaming::default()).await?;
    /// ```
    pub async fn connect(target: impl IntoConnectionInfo, naming: IndexNaming) -> Result<Self> {
        let redis_client = redis::Client::open(target)?;
        let conn = ConnectionManager::new(redis_client).await?;
        log::debug!("connected to redis store");
        Ok(Self::new(conn, naming))
    }

    pub fn naming(&self) -> &IndexNaming {
        &self.naming
    }

    /// All search indexes in the namespace, keyed by short name.
    pub async fn list_indexes(&mut self) -> Result<BTreeMap<String, String>> {
        let indexes: Vec<String> = cmd("FT._LIST").query_async(&mut self.conn).await?;
        Ok(group_indexes(&self.naming, indexes))
    }

    /// Every document of `index`, fetched page by page.
    ///
    /// Paging uses `LIMIT`, so an index holding more than the server's
    /// `MAXSEARCHRESULTS` (default [`DEFAULT_MAX_SEARCH_RESULTS`]) documents fails
    /// once the offset passes that bound. Raise it with
    /// `FT.CONFIG SET MAXSEARCHRESULTS <n>` before dumping such an index.
    pub async fn search_all(&mut self, index: &str) -> Result<Vec<StoredDocument>> {
        let mut documents = Vec::new();
        let mut offset = 0;
        let mut total = 0;

        loop {
            let raw: Value = cmd("FT.SEARCH")
                .arg(index)
                .arg("*")
                .arg("LIMIT")
                .arg(offset)
                .arg(SEARCH_PAGE_SIZE)
                .arg("RETURN")
                .arg(1)
                .arg("$")
                .arg("DIALECT")
                .arg(3)
                .query_async(&mut self.conn)
                .await
                .map_err(|err| page_error(index, offset, total, err))?;

            let (hits, page) = parse_search_response(&raw)?;
            if offset == 0 && hits > DEFAULT_MAX_SEARCH_RESULTS {
                log::warn!(
                    "{index} holds {hits} documents, more than the default MAXSEARCHRESULTS ({DEFAULT_MAX_SEARCH_RESULTS})"
                );
            }
            total = hits;
            let fetched = page.len();
            documents.extend(page);
            offset += SEARCH_PAGE_SIZE;

            if fetched == 0 || offset >= total {
                break;
            }
        }

        log::debug!("fetched {} documents from {index}", documents.len());
        Ok(documents)
    }

    /// Store `document` at the root path of `key`.
    pub async fn set_document(&mut self, key: &str, document: &JsonValue) -> Result<()> {
        cmd("JSON.SET")
            .arg(key)
            .arg("$")
            .arg(document.to_string())
            .query_async::<()>(&mut self.conn)
            .await?;
        Ok(())
    }
}

/// Past the default search window a failed page most likely hit `MAXSEARCHRESULTS`.
fn page_error(index: &str, offset: usize, total: usize, err: RedisError) -> MigrationError {
    if offset < DEFAULT_MAX_SEARCH_RESULTS {
        return err.into();
    }
    MigrationError::store(format!(
        "FT.SEARCH on {index} failed at offset {offset} of {total} ({err}); \
         raise MAXSEARCHRESULTS with FT.CONFIG SET to dump this index"
    ))
}

fn group_indexes(naming: &IndexNaming, indexes: Vec<String>) -> BTreeMap<String, String> {
    let mut grouped = BTreeMap::new();
    for index in indexes {
        match naming.short_name(&index) {
            Some(name) => {
                grouped.insert(name, index);
            }
            None => log::debug!("ignoring index outside namespace: {index}"),
        }
    }
    grouped
}

/// Split an `FT.SEARCH` reply into the total hit count and the returned documents.
fn parse_search_response(raw: &Value) -> Result<(usize, Vec<StoredDocument>)> {
    let values: Vec<Value> = from_redis_value(raw)
        .map_err(|err| MigrationError::store(format!("Failed to parse search response: {err}")))?;

    let Some(first) = values.first() else {
        return Ok((0, Vec::new()));
    };

    let total = match first {
        Value::Int(v) => usize::try_from(*v).unwrap_or(0),
        other => value_to_string(other)?
            .parse::<usize>()
            .map_err(|_| MigrationError::store("Invalid total count in search response"))?,
    };

    let mut documents = Vec::new();
    for pair in values[1..].chunks(2) {
        let [key, fields] = pair else {
            return Err(MigrationError::store("Search response has a key without fields"));
        };
        let key = value_to_string(key)?;
        let payload = extract_json_payload(fields)?;
        let document = serde_json::from_str(&payload)
            .map_err(|err| MigrationError::store(format!("Failed to parse document {key}: {err}")))?;
        documents.push(StoredDocument { key, document });
    }

    Ok((total, documents))
}

fn extract_json_payload(value: &Value) -> Result<String> {
    match value {
        Value::Array(items) => {
            for chunk in items.chunks(2) {
                let [alias, payload] = chunk else {
                    continue;
                };
                if value_to_string(alias)? == "$" {
                    return normalize_json_payload(value_to_string(payload)?);
                }
            }
            Err(MigrationError::store("Search response missing JSON payload"))
        }
        other => normalize_json_payload(value_to_string(other)?),
    }
}

/// With `DIALECT 3` the payload is wrapped in a one-element array.
fn normalize_json_payload(payload: String) -> Result<String> {
    let trimmed = payload.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        let value: JsonValue = serde_json::from_str(trimmed)
            .map_err(|err| MigrationError::store(format!("Failed to parse JSON payload array: {err}")))?;
        if let Some(first) = value.as_array().and_then(|items| items.first()) {
            return Ok(first.to_string());
        }
    }
    Ok(payload)
}

fn value_to_string(value: &Value) -> Result<String> {
    match value {
        Value::BulkString(bytes) => String::from_utf8(bytes.clone())
            .map_err(|err| MigrationError::store(format!("Invalid UTF-8 in search response: {err}"))),
        Value::SimpleString(status) => Ok(status.clone()),
        Value::Int(v) => Ok(v.to_string()),
        Value::VerbatimString { text, .. } => Ok(text.clone()),
        _ => from_redis_value::<String>(value)
            .map_err(|err| MigrationError::store(format!("Unexpected search value type: {err}"))),
    }
}
