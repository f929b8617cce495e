use bytes::Bytes;
use pretty_assertions::assert_eq;
use polaris::{
    text, Application, ConfigSource, FrameworkError, HttpResponse, IniConfig, PolarisConfig,
    Request, Response, Server, UserModel, PLACEHOLDER_ROOT,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("public")).unwrap();
        std::fs::create_dir(dir.path().join("view")).unwrap();
        std::fs::create_dir(dir.path().join("logs")).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write an INI file with the directories pointing into the fixture
    fn config(&self, extra: &str) -> PathBuf {
        let root = self.dir.path().display();
        let content = format!(
            "[system]\ndir_public = {root}/public\ndir_template = {root}/view\ndir_log = {root}/logs\nRedirectUrl = /login\nRedirectParam = next\n{extra}"
        );
        let path = self.path("polaris.ini");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cookie_config(&self) -> PathBuf {
        self.config("[session]\nsession_store = cookie\nsession_mask = secret\n[database]\ndb_database =\n")
    }
}

fn get(path: &str, cookie: Option<&str>) -> Request {
    let mut builder = http::Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }
    Request::new(builder.body(Bytes::new()).unwrap())
}

fn body(response: &HttpResponse) -> String {
    String::from_utf8_lossy(response.body()).to_string()
}

/// `name=value` part of the Set-Cookie header
fn session_cookie(response: &HttpResponse) -> String {
    let header = response.header_value("set-cookie").expect("session cookie");
    header.split(';').next().unwrap().to_string()
}

/// INI configuration with a counter route and a protected page
struct CounterConfig {
    ini: IniConfig,
}

async fn count(req: Request) -> Response {
    let session = req.session()?;
    let visits = session.get_as::<u64>("visits").unwrap_or(0) + 1;
    session.set("visits", visits)?;
    text(visits.to_string())
}

async fn secret(_req: Request) -> Response {
    text("secret")
}

async fn login(req: Request) -> Response {
    polaris::authenticate_session(&req.session()?, &req.user()?)?;
    text("welcome")
}

impl ConfigSource for CounterConfig {
    fn load_config(&mut self) -> Result<(), FrameworkError> {
        self.ini.load_config()
    }

    fn basic_config(&self) -> &PolarisConfig {
        self.ini.basic_config()
    }

    fn route_map(&self, app: &mut Application) -> Result<(), FrameworkError> {
        app.get("/count", count);
        app.post("/login", login);
        let guard = app.login_required();
        app.get("/secret", secret).middleware(guard);
        Ok(())
    }
}

async fn counter_server(fixture: &Fixture) -> Server {
    let source = CounterConfig {
        ini: IniConfig::new(fixture.cookie_config()),
    };
    Application::compose(source, UserModel::anonymous())
        .await
        .unwrap()
        .into_server()
}

#[tokio::test]
async fn test_cookie_store_composes_and_serves_placeholder() {
    let fixture = Fixture::new();
    let app = Application::with_config_file(fixture.cookie_config(), UserModel::anonymous())
        .await
        .unwrap();

    assert!(app.db().is_none());
    let log_path = app.log_path().unwrap();
    assert!(log_path.starts_with(fixture.path("logs")));
    assert!(log_path.exists());

    let response = app.into_server().handle(get("/", None)).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(body(&response), PLACEHOLDER_ROOT);
}

#[tokio::test]
async fn test_missing_config_file_fails() {
    let result = Application::with_config_file("/definitely/not/here.ini", UserModel::anonymous()).await;
    assert!(matches!(result, Err(FrameworkError::Config(_))));
}

#[tokio::test]
async fn test_unreachable_redis_fails_composition() {
    let fixture = Fixture::new();
    let path = fixture.config(
        "[session]\nsession_store = Redis\n[redis]\nredis_address = 127.0.0.1:1\n[database]\ndb_database =\n",
    );

    let result = Application::with_config_file(path, UserModel::anonymous()).await;
    assert!(matches!(result, Err(FrameworkError::Session(_))));
}

#[tokio::test]
async fn test_unknown_database_kind_fails_composition() {
    let fixture = Fixture::new();
    let path = fixture.config("[session]\nsession_store = cookie\n[database]\ndb_type = mssql\n");

    let result = Application::with_config_file(path, UserModel::anonymous()).await;
    assert!(matches!(result, Err(FrameworkError::Database(_))));
}

#[tokio::test]
async fn test_close_twice_succeeds() {
    let fixture = Fixture::new();
    let mut app = Application::with_config_file(fixture.cookie_config(), UserModel::anonymous())
        .await
        .unwrap();

    app.close().await.unwrap();
    app.close().await.unwrap();
    assert!(app.session_store().is_none());
    assert!(app.log_file().is_none());
}

#[tokio::test]
async fn test_rotate_log_keeps_directory() {
    let fixture = Fixture::new();
    let app = Application::with_config_file(fixture.cookie_config(), UserModel::anonymous())
        .await
        .unwrap();

    let rotated = app.rotate_log().unwrap();
    assert_eq!(rotated.parent(), Some(fixture.path("logs").as_path()));
    assert_eq!(app.log_path(), Some(rotated));
}

#[tokio::test]
async fn test_session_survives_cookie_round_trip() {
    let fixture = Fixture::new();
    let server = counter_server(&fixture).await;

    let first = server.handle(get("/count", None)).await;
    assert_eq!(body(&first), "1");
    let cookie = session_cookie(&first);
    assert!(cookie.starts_with("my_session="));
    assert!(first
        .header_value("set-cookie")
        .unwrap()
        .contains("HttpOnly"));

    let second = server.handle(get("/count", Some(&cookie))).await;
    assert_eq!(body(&second), "2");

    let tampered = format!("{}x", cookie);
    let third = server.handle(get("/count", Some(&tampered))).await;
    assert_eq!(body(&third), "1");
}

#[tokio::test]
async fn test_login_required_redirects_anonymous_users() {
    let fixture = Fixture::new();
    let server = counter_server(&fixture).await;

    let response = server.handle(get("/secret", None)).await;
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header_value("location"), Some("/login?next=%2Fsecret"));

    let login = Request::new(
        http::Request::builder()
            .method("POST")
            .uri("/login")
            .body(Bytes::new())
            .unwrap(),
    );
    let response = server.handle(login).await;
    assert_eq!(body(&response), "welcome");
    let cookie = session_cookie(&response);

    let response = server.handle(get("/secret", Some(&cookie))).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(body(&response), "secret");
}

#[tokio::test]
async fn test_static_files_are_served() {
    let fixture = Fixture::new();
    std::fs::write(fixture.path("public/robots.txt"), "User-agent: *").unwrap();
    let server = counter_server(&fixture).await;

    let response = server.handle(get("/robots.txt", None)).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(body(&response), "User-agent: *");

    let response = server.handle(get("/missing.txt", None)).await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_sqlite_database_is_wired() {
    let fixture = Fixture::new();
    let db = fixture.path("app.db");
    let sql_log = fixture.path("sql.log");
    let path = fixture.config(&format!(
        "[session]\nsession_store = cookie\n[database]\ndb_type = sqlite\ndb_database = {}\ndb_log = {}\n",
        db.display(),
        sql_log.display()
    ));

    let mut app = Application::with_config_file(path, UserModel::anonymous())
        .await
        .unwrap();

    let engine = app.db().cloned().unwrap();
    assert_eq!(engine.kind(), polaris::DatabaseKind::Sqlite);
    assert!(Path::new(&db).exists());

    app.close().await.unwrap();
    assert!(engine.is_closed());
}
