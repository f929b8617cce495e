//! Database engine: an open connection plus its dialect

use sea_orm::{metric, ConnectOptions, Database, DatabaseConnection};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::{Arc, Mutex, RwLock};

use crate::database::config::{DatabaseKind, DbConfig, Dialect};
use crate::error::FrameworkError;

/// Shared handle over an open database connection
///
/// Clones share the same underlying pool. Closing through any clone closes
/// it for all of them.
///
/// # Example
///
/// ```rust,ignore
/// let engine = DbEngine::connect(&config.database).await?;
/// let users = User::find().all(&engine.connection()?).await?;
/// engine.close().await?;
/// ```
#[derive(Clone)]
pub struct DbEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    kind: DatabaseKind,
    connection: RwLock<Option<DatabaseConnection>>,
}

impl DbEngine {
    /// Open a connection for the configured database kind
    ///
    /// # Errors
    ///
    /// Returns `FrameworkError::Database` when the kind is unrecognized,
    /// the connection cannot be opened, or the ping fails.
    pub async fn connect(config: &DbConfig) -> Result<Self, FrameworkError> {
        let dsn = config.dsn();
        let kind = match config.database_kind() {
            Some(kind) if !dsn.is_empty() => kind,
            _ => {
                tracing::error!("Invalid DSN for database type {:?}", config.kind);
                return Err(FrameworkError::database(format!(
                    "Invalid DSN for database type {:?}",
                    config.kind
                )));
            }
        };

        let mut options = ConnectOptions::new(config.url()?);
        options.sqlx_logging(false);

        let mut connection = Database::connect(options).await.map_err(|e| {
            tracing::error!("Error connecting to db: {}", e);
            FrameworkError::database(format!("Error connecting to db: {}", e))
        })?;
        connection.ping().await?;

        if config.verbose {
            let sink = Arc::new(TraceSink::open(&config.log_file));
            connection.set_metric_callback(move |info| sink.write(info));
        }

        tracing::debug!("[{}] connected to {:?}", kind.driver(), config.database);

        Ok(Self {
            inner: Arc::new(EngineInner {
                kind,
                connection: RwLock::new(Some(connection)),
            }),
        })
    }

    /// Get the underlying sea-orm connection
    ///
    /// # Errors
    ///
    /// Returns `FrameworkError::Database` once the engine has been closed.
    pub fn connection(&self) -> Result<DatabaseConnection, FrameworkError> {
        self.inner
            .connection
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or_else(|| FrameworkError::database("Database connection is closed"))
    }

    pub fn kind(&self) -> DatabaseKind {
        self.inner.kind
    }

    pub fn dialect(&self) -> Dialect {
        self.inner.kind.dialect()
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .connection
            .read()
            .map(|guard| guard.is_none())
            .unwrap_or(true)
    }

    /// Release the connection; closing an already closed engine succeeds
    pub async fn close(&self) -> Result<(), FrameworkError> {
        let connection = match self.inner.connection.write() {
            Ok(mut guard) => guard.take(),
            Err(_) => return Err(FrameworkError::database("Database handle is poisoned")),
        };

        match connection {
            Some(connection) => connection.close().await.map_err(|e| {
                tracing::error!("Failed to close DB connection: {}", e);
                FrameworkError::from(e)
            }),
            None => Ok(()),
        }
    }
}

/// Destination of the SQL statement trace
enum TraceSink {
    /// Dedicated trace file
    File(Mutex<File>),
    /// The shared tracing subscriber, target `polaris::sql`
    Shared,
}

impl TraceSink {
    fn open(path: &str) -> Self {
        if path.is_empty() {
            return Self::Shared;
        }
        match OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => Self::File(Mutex::new(file)),
            Err(e) => {
                tracing::warn!("Cannot open SQL log {}: {}, using the shared log", path, e);
                Self::Shared
            }
        }
    }

    fn write(&self, info: &metric::Info<'_>) {
        match self {
            Self::File(file) => {
                let line = format!(
                    "sql {} [SQL] {} [{:?}]{}\n",
                    chrono::Local::now().format("%Y/%m/%d %H:%M:%S%.6f"),
                    info.statement,
                    info.elapsed,
                    if info.failed { " FAILED" } else { "" }
                );
                if let Ok(mut file) = file.lock() {
                    let _ = file.write_all(line.as_bytes());
                }
            }
            Self::Shared => {
                tracing::debug!(target: "polaris::sql", "[SQL] {} [{:?}]", info.statement, info.elapsed);
            }
        }
    }
}
