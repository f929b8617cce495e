use polaris::Application;

use crate::controllers;
use crate::middleware::PoweredBy;

pub fn register(app: &mut Application) {
    app.use_middleware(PoweredBy);

    app.get("/", controllers::home::index);
    let redirect = app.redirect();
    let login_path = redirect.url.clone();
    app.get(&login_path, move |req| {
        controllers::auth::show_login(req, redirect.clone())
    });
    app.post(&login_path, controllers::auth::login);
    app.get("/logout", controllers::auth::logout);

    let guard = app.login_required();
    app.get("/profile", controllers::profile::show).middleware(guard);
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;
    use bytes::Bytes;
    use polaris::{Application, Request, Server, UserModel};

    async fn server(dir: &tempfile::TempDir) -> Server {
        let root = env!("CARGO_MANIFEST_DIR");
        let ini = dir.path().join("polaris.ini");
        std::fs::write(
            &ini,
            format!(
                "[system]\ndir_public = {root}/public\ndir_template = {root}/view\ndir_log =\nRedirectUrl = /sign-in\nRedirectParam = back\n[session]\nsession_store = cookie\nsession_mask = test\n[database]\ndb_database =\n"
            ),
        )
        .unwrap();

        Application::compose(AppConfig::new(&ini), UserModel::anonymous())
            .await
            .unwrap()
            .into_server()
    }

    fn get(path: &str) -> Request {
        Request::new(http::Request::builder().uri(path).body(Bytes::new()).unwrap())
    }

    #[tokio::test]
    async fn test_login_form_follows_configured_redirect() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir).await;

        let response = server.handle(get("/profile")).await;
        assert_eq!(response.status_code(), 302);
        assert_eq!(response.header_value("location"), Some("/sign-in?back=%2Fprofile"));

        let response = server.handle(get("/sign-in?back=%2Fprofile")).await;
        assert_eq!(response.status_code(), 200);
        let body = String::from_utf8_lossy(response.body());
        assert!(body.contains(r#"value="/profile""#));
        assert!(body.contains(r#"action="/sign-in""#));
    }
}
