use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Table};
use redis::{ConnectionAddr, ConnectionInfo, IntoConnectionInfo, RedisConnectionInfo};
use serde::Serialize;

use data_update_quest::store::{self, DumpReport, IndexNaming, StoreClient, UploadReport};

use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, table_with_header};
use crate::theme::Glyph;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Indexes",
        commands: &["duq redis list-index --host localhost          # Show search indexes by short name"],
    },
    ExampleGroup {
        title: "Dump",
        commands: &[
            "duq redis dump ./dump                           # Every index, one directory each",
            "duq redis dump ./dump -i organization -i solution   # Selected indexes only",
        ],
    },
    ExampleGroup {
        title: "Upload",
        commands: &["duq redis upload ./dump                         # Set each <name>/<id>.json back into the store"],
    },
];

/// How to reach the store
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Redis connection URL (takes precedence over host/port)
    #[arg(long, env = "REDIS_URL")]
    pub url: Option<String>,

    /// Redis host
    #[arg(long, env = "REDIS_HOST")]
    pub host: Option<String>,

    /// Redis port
    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    pub port: u16,

    /// Redis password
    #[arg(long, env = "REDIS_SECRET", hide_env_values = true)]
    pub password: Option<String>,

    /// Search index namespace (default: config, then com.cosmotech)
    #[arg(long)]
    pub index_prefix: Option<String>,
}

impl ConnectionArgs {
    /// `--url`, then `--host`/`--port`/`--password`, then the config file URL.
    /// The password never goes through a URL, so it may contain any character.
    fn connection_info(&self, ctx: &CliContext) -> Result<ConnectionInfo> {
        if self.url.is_none()
            && let Some(host) = &self.host
        {
            return Ok(ConnectionInfo {
                addr: ConnectionAddr::Tcp(host.clone(), self.port),
                redis: RedisConnectionInfo {
                    password: self.password.clone(),
                    ..Default::default()
                },
            });
        }

        let url = match &self.url {
            Some(url) => url.clone(),
            None => ctx
                .redis_url()
                .context("No Redis connection configured. Pass --url or --host, or set REDIS_URL.")?,
        };
        url.as_str()
            .into_connection_info()
            .with_context(|| format!("Invalid Redis URL '{url}'"))
    }

    fn naming(&self, ctx: &CliContext) -> IndexNaming {
        IndexNaming::new(
            self.index_prefix
                .clone()
                .unwrap_or_else(|| ctx.config.redis.index_prefix.clone()),
        )
    }
}

#[derive(Subcommand)]
pub enum RedisCommands {
    /// List the search indexes of the namespace
    #[command(name = "list-index")]
    ListIndex {
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Write every document of the selected indexes to <dir>/<name>/<id>.json
    #[command(name = "dump")]
    Dump {
        /// Target directory
        dir: PathBuf,

        /// Short index name to dump (repeatable; all indexes when omitted)
        #[arg(short = 'i', long = "index")]
        indexes: Vec<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Set every <dir>/<name>/*.json file back into the store
    #[command(name = "upload")]
    Upload {
        /// Directory produced by `duq redis dump`
        dir: PathBuf,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

pub async fn handle_redis_commands(command: RedisCommands, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    match command {
        RedisCommands::ListIndex { connection } => {
            let mut client = connect(&connection, ctx, output).await?;
            handle_list_index(&mut client, output).await
        }
        RedisCommands::Dump {
            dir,
            indexes,
            connection,
        } => {
            let mut client = connect(&connection, ctx, output).await?;
            handle_dump(&mut client, dir, &indexes, output).await
        }
        RedisCommands::Upload { dir, connection } => {
            let mut client = connect(&connection, ctx, output).await?;
            handle_upload(&mut client, dir, output).await
        }
    }
}

async fn connect(connection: &ConnectionArgs, ctx: &CliContext, output: &OutputManager) -> Result<StoreClient> {
    let info = connection.connection_info(ctx)?;

    output.progress("Connecting to Redis");
    let client = StoreClient::connect(info, connection.naming(ctx))
        .await
        .context("Failed to connect to Redis")?;
    output.end_progress();
    output.success("Connected to Redis");

    Ok(client)
}

/// Index names keyed by short name
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct IndexList(pub BTreeMap<String, String>);

impl TableDisplay for IndexList {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = table_with_header(options, &["Name", "Index"]);
        for (name, index) in &self.0 {
            table.add_row(vec![Cell::new(name), Cell::new(index)]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.0.keys().cloned().collect::<Vec<_>>().join(" ")
    }
}

async fn handle_list_index(client: &mut StoreClient, output: &OutputManager) -> Result<()> {
    output.heading("Search Indexes");
    let indexes = IndexList(client.list_indexes().await?);

    if indexes.0.is_empty() {
        output.warning(&format!("No indexes under {}", client.naming().prefix()));
        return Ok(());
    }

    output.display(&indexes)
}

impl TableDisplay for DumpReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = table_with_header(options, &["Index", "Documents"]);
        for (name, files) in &self.written {
            table.add_row(vec![Cell::new(name), Cell::new(files.len())]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!("dumped: {} skipped: {}", self.total_written(), self.skipped.len())
    }
}

async fn handle_dump(client: &mut StoreClient, dir: PathBuf, indexes: &[String], output: &OutputManager) -> Result<()> {
    output.heading("Redis Dump");
    output.key_value("Directory", &dir.display().to_string());

    let report = store::dump(client, &dir, indexes)
        .await
        .with_context(|| format!("Failed to dump documents to {}", dir.display()))?;

    for key in &report.skipped {
        output.warning(&format!("Skipped {key}: id missing or unusable as a file name"));
    }
    for (name, files) in &report.written {
        output.item(Glyph::Index, &format!("{name}: {} document(s)", files.len()));
    }
    output.success(&format!("Dumped {} document(s)", report.total_written()));

    output.display(&report)
}

impl TableDisplay for UploadReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = table_with_header(options, &["Index", "Documents"]);
        for (name, keys) in &self.uploaded {
            table.add_row(vec![Cell::new(name), Cell::new(keys.len())]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!("uploaded: {}", self.total_uploaded())
    }
}

async fn handle_upload(client: &mut StoreClient, dir: PathBuf, output: &OutputManager) -> Result<()> {
    output.heading("Redis Upload");
    output.key_value("Directory", &dir.display().to_string());

    let report = store::upload(client, &dir)
        .await
        .with_context(|| format!("Failed to upload documents from {}", dir.display()))?;

    output.success(&format!("Uploaded {} document(s)", report.total_uploaded()));
    output.display(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DuqConfig;

    fn context() -> CliContext {
        CliContext {
            config_path: None,
            config: DuqConfig::default(),
        }
    }

    fn connection() -> ConnectionArgs {
        ConnectionArgs {
            url: None,
            host: None,
            port: 6379,
            password: None,
            index_prefix: None,
        }
    }

    #[test]
    fn test_url_flag_wins() {
        let args = ConnectionArgs {
            url: Some("redis://cache:6380".to_string()),
            host: Some("ignored".to_string()),
            ..connection()
        };
        let info = args.connection_info(&context()).unwrap();
        assert_eq!(info.addr, ConnectionAddr::Tcp("cache".to_string(), 6380));
    }

    #[test]
    fn test_host_and_password_kept_apart() {
        let args = ConnectionArgs {
            host: Some("localhost".to_string()),
            port: 6390,
            password: Some("p@ss/w#rd:1".to_string()),
            ..connection()
        };
        let info = args.connection_info(&context()).unwrap();
        assert_eq!(info.addr, ConnectionAddr::Tcp("localhost".to_string(), 6390));
        assert_eq!(info.redis.password.as_deref(), Some("p@ss/w#rd:1"));
        assert_eq!(info.redis.db, 0);
    }

    #[test]
    fn test_invalid_url_rejected_before_connecting() {
        let args = ConnectionArgs {
            url: Some("not a url".to_string()),
            ..connection()
        };
        assert!(args.connection_info(&context()).is_err());
    }

    #[test]
    fn test_index_prefix_falls_back_to_config() {
        let mut ctx = context();
        ctx.config.redis.index_prefix = "com.example".to_string();
        assert_eq!(connection().naming(&ctx).prefix(), "com.example");

        let args = ConnectionArgs {
            index_prefix: Some("org.other".to_string()),
            ..connection()
        };
        assert_eq!(args.naming(&ctx).prefix(), "org.other");
    }

    #[test]
    fn test_index_list_compact() {
        let list = IndexList(BTreeMap::from([
            ("solution".to_string(), "com.cosmotech.solution.domain.SolutionIdx".to_string()),
            ("dataset".to_string(), "com.cosmotech.dataset.domain.DatasetIdx".to_string()),
        ]));
        assert_eq!(list.to_compact(), "dataset solution");
    }
}
