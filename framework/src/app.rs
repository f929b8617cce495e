//! Application composition and lifecycle
//!
//! [`Application::compose`] turns a [`ConfigSource`] and a user factory into
//! a fully wired application:
//!
//! 1. load the configuration
//! 2. open the daily log and register request logging, panic recovery,
//!    static files and template rendering
//! 3. connect the session store
//! 4. connect the database, when one is configured
//! 5. register session authentication
//! 6. let the source register its routes
//!
//! Any failing step aborts composition and closes what was already opened.
//!
//! # Example
//!
//! ```rust,ignore
//! use polaris::{Application, UserModel};
//!
//! #[tokio::main]
//! async fn main() {
//!     match Application::with_config_file("polaris.ini", UserModel::anonymous()).await {
//!         Ok(app) => app.run().await,
//!         Err(e) => eprintln!("Failed to start: {}", e),
//!     }
//! }
//! ```

use crate::auth::{AuthRedirect, LoginRequired, SessionAuth, UserFactory};
use crate::config::{env_optional, ConfigSource, IniConfig, PolarisConfig};
use crate::database::DbEngine;
use crate::error::FrameworkError;
use crate::http::{Request, Response};
use crate::logging::{self, LogFile};
use crate::middleware::{
    DatabaseMiddleware, Logger, Middleware, MiddlewareRegistry, Recovery, Render, Renderer, Static,
};
use crate::routing::{RouteBuilder, Router};
use crate::server::Server;
use crate::session::{select_store, SessionMiddleware, SessionStore};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A composed Polaris application
pub struct Application {
    config: PolarisConfig,
    router: Router,
    middleware: MiddlewareRegistry,
    session_store: Option<Arc<dyn SessionStore>>,
    db: Option<DbEngine>,
    log: Option<LogFile>,
}

impl Application {
    /// Create an application with the basic middleware
    ///
    /// Opens today's log file when `dir_log` is set and installs the tracing
    /// subscriber, then registers request logging, panic recovery and static
    /// file serving.
    ///
    /// # Errors
    ///
    /// Returns `FrameworkError::Io` when the log file cannot be opened.
    pub fn new(config: PolarisConfig) -> Result<Self, FrameworkError> {
        let log = if config.dir_log.is_empty() {
            None
        } else {
            Some(LogFile::open_daily(&config.dir_log).map_err(|e| {
                tracing::error!("Failed to open log file: {}", e);
                e
            })?)
        };
        logging::init(log.as_ref());
        tracing::debug!("Application started......");
        warn_if_missing("Static", &config.dir_static);

        let mut middleware = MiddlewareRegistry::new();
        middleware.push(Logger);
        middleware.push(Recovery);
        middleware.push(Static::new(&config.dir_static));

        Ok(Self {
            config,
            router: Router::new(),
            middleware,
            session_store: None,
            db: None,
            log,
        })
    }

    /// Compose a fully wired application from a configuration source
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that fails. Handles opened by
    /// earlier steps are closed before returning.
    pub async fn compose<S: ConfigSource>(
        mut source: S,
        new_user: UserFactory,
    ) -> Result<Self, FrameworkError> {
        if let Err(e) = source.load_config() {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }

        let mut app = Self::new(source.basic_config().clone())?;
        tracing::debug!("Initializing application......");

        if let Err(e) = app.wire(&source, new_user).await {
            tracing::error!("Failed to initialize application: {}", e);
            if let Err(close_error) = app.close().await {
                tracing::warn!("Cleanup after failed composition: {}", close_error);
            }
            return Err(e);
        }
        Ok(app)
    }

    /// Compose from an INI file on disk
    pub async fn with_config_file(
        path: impl Into<PathBuf>,
        new_user: UserFactory,
    ) -> Result<Self, FrameworkError> {
        Self::compose(IniConfig::new(path), new_user).await
    }

    async fn wire<S: ConfigSource>(
        &mut self,
        source: &S,
        new_user: UserFactory,
    ) -> Result<(), FrameworkError> {
        warn_if_missing("Template", &self.config.dir_template);
        self.middleware.push(Render::new(Renderer::new(
            &self.config.dir_template,
            &self.config.tpl_extension,
            &self.config.tpl_encoding,
        )));

        if self.config.session_store_kind() == crate::config::StoreKind::Redis {
            tracing::debug!("Connect to redis......{}", self.config.redis.address);
        }
        let store = select_store(&self.config).await?;
        self.session_store = Some(store.clone());
        self.middleware
            .push(SessionMiddleware::new(self.config.session_name.clone(), store));

        if self.config.has_database() {
            let engine = DbEngine::connect(&self.config.database).await.map_err(|e| {
                tracing::error!(
                    "Failed to connect to database ({}): {}",
                    self.config.database.database,
                    e
                );
                e
            })?;
            self.db = Some(engine.clone());
            self.middleware.push(DatabaseMiddleware::new(engine));
        } else {
            tracing::debug!("No database configured, skipping database wiring");
        }

        self.middleware.push(SessionAuth::new(new_user));

        source.route_map(self)
    }

    /// Register a GET route
    pub fn get<H, Fut>(&mut self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.router.get(path, handler)
    }

    /// Register a POST route
    pub fn post<H, Fut>(&mut self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.router.post(path, handler)
    }

    /// Register a PUT route
    pub fn put<H, Fut>(&mut self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.router.put(path, handler)
    }

    /// Register a PATCH route
    pub fn patch<H, Fut>(&mut self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.router.patch(path, handler)
    }

    /// Register a DELETE route
    pub fn delete<H, Fut>(&mut self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.router.delete(path, handler)
    }

    /// Add global middleware after the built-in ones
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middleware.push(middleware);
    }

    /// Login redirect settings from the configuration
    pub fn redirect(&self) -> AuthRedirect {
        AuthRedirect::new(self.config.redirect_url(), self.config.redirect_param())
    }

    /// Route middleware sending anonymous users to the login page
    pub fn login_required(&self) -> LoginRequired {
        LoginRequired::new(self.redirect())
    }

    pub fn config(&self) -> &PolarisConfig {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn session_store(&self) -> Option<&Arc<dyn SessionStore>> {
        self.session_store.as_ref()
    }

    pub fn db(&self) -> Option<&DbEngine> {
        self.db.as_ref()
    }

    pub fn log_file(&self) -> Option<&LogFile> {
        self.log.as_ref()
    }

    /// Path of the active log file, if file logging is enabled
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log.as_ref().map(LogFile::path)
    }

    /// Switch logging to today's file
    ///
    /// # Errors
    ///
    /// Fails when file logging is disabled or the new file cannot be
    /// opened; in the latter case the current file stays active.
    pub fn rotate_log(&self) -> Result<PathBuf, FrameworkError> {
        match &self.log {
            Some(log) => log.rotate(),
            None => Err(FrameworkError::config("File logging is not enabled")),
        }
    }

    /// Release the session store, the database and the log file
    ///
    /// Safe to call more than once; later calls do nothing.
    pub async fn close(&mut self) -> Result<(), FrameworkError> {
        tracing::debug!("Uninitializing application......");
        let mut result = Ok(());

        if let Some(store) = self.session_store.take() {
            if let Err(e) = store.close().await {
                tracing::error!("Failed to close session store: {}", e);
                result = Err(e);
            }
        }

        if let Some(db) = self.db.take() {
            if let Err(e) = db.close().await {
                result = result.and(Err(e));
            }
        }

        if let Some(log) = self.log.take() {
            log.close();
        }

        result
    }

    /// Turn the application into a server bound to `HOST:port`
    pub fn into_server(self) -> Server {
        let host = bind_host();
        Server::new(self.router, self.middleware, &host, self.config.port)
    }

    /// Bind and serve until the process ends
    ///
    /// # Errors
    ///
    /// Returns `FrameworkError::Bind` when the address cannot be bound.
    pub async fn serve(self) -> Result<(), FrameworkError> {
        self.into_server().serve().await
    }

    /// Serve, exiting the process with status 1 if serving fails
    pub async fn run(self) {
        if let Err(e) = self.serve().await {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Interface to bind, from `HOST`; all interfaces when unset or empty
fn bind_host() -> String {
    env_optional::<String>("HOST")
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| "0.0.0.0".to_string())
}

fn warn_if_missing(kind: &str, dir: &str) {
    if !dir.is_empty() && !Path::new(dir).is_dir() {
        tracing::warn!("{} directory {:?} does not exist", kind, dir);
    }
}
