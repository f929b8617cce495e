pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod routing;
pub mod server;
pub mod session;
pub mod user;

pub use app::Application;
pub use auth::{
    authenticate_session, logout, AuthRedirect, AuthUser, LoginRequired, SessionAuth, User,
    UserFactory, SESSION_KEY,
};
pub use config::{
    env, env_optional, load_dotenv, ConfigSource, IniConfig, PolarisConfig, RedisConfig,
    StoreKind, PLACEHOLDER_ROOT,
};
pub use database::{DatabaseKind, DbConfig, DbEngine, Dialect};
pub use error::{AppError, FrameworkError};
pub use crate::http::{json, text, HttpResponse, Redirect, Request, Response, ResponseExt};
pub use logging::LogFile;
pub use middleware::{
    DatabaseMiddleware, Logger, Middleware, MiddlewareRegistry, Next, Recovery, Render, Renderer,
    Static,
};
pub use routing::{RouteBuilder, Router};
pub use server::Server;
pub use session::{CookieStore, RedisStore, Session, SessionMiddleware, SessionStore};
pub use user::UserModel;

pub use async_trait::async_trait;
