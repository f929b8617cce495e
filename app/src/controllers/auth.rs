use polaris::{AppError, AuthRedirect, Redirect, Request, Response, UserModel};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct LoginForm {
    pub user_id: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Login form; `redirect.param` names the query key holding the return path
pub async fn show_login(req: Request, redirect: AuthRedirect) -> Response {
    let next = local_path(req.query_param(&redirect.param));

    req.renderer()?.html(
        200,
        "login",
        json!({ "next": next, "action": redirect.url }),
    )
}

pub async fn login(req: Request) -> Response {
    let form: LoginForm = req.input()?;
    if form.user_id.is_empty() {
        return Err(AppError::bad_request("User id is required").into());
    }

    let mut model = UserModel::default();
    model.get_by_name_pass(&form.user_id, &form.password).await?;

    let user = req.user()?;
    polaris::authenticate_session(&req.session()?, &user)?;
    tracing::info!("User {} logged in", form.user_id);

    Redirect::to(local_path(form.next)).into()
}

/// A same-site path, or `/` for anything that could leave the site
fn local_path(next: Option<String>) -> String {
    next.filter(|next| {
        next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\")
    })
    .unwrap_or_else(|| "/".to_string())
}

pub async fn logout(req: Request) -> Response {
    polaris::logout(&req.session()?, &req.user()?);
    Redirect::to("/").into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_paths_are_kept() {
        assert_eq!(local_path(Some("/profile".to_string())), "/profile");
        assert_eq!(local_path(Some("/a?b=c".to_string())), "/a?b=c");
    }

    #[test]
    fn test_offsite_targets_fall_back_to_root() {
        assert_eq!(local_path(Some("//evil.example".to_string())), "/");
        assert_eq!(local_path(Some("/\\evil.example".to_string())), "/");
        assert_eq!(local_path(Some("https://evil.example".to_string())), "/");
        assert_eq!(local_path(None), "/");
    }
}
