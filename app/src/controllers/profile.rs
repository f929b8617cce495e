use polaris::{Request, Response, UserModel};
use serde_json::json;

pub async fn show(req: Request) -> Response {
    let user = req.user()?;
    let uid = user.with(|model: &UserModel| model.uid).unwrap_or_default();

    req.renderer()?.html(
        200,
        "profile",
        json!({
            "uid": uid,
            "id": user.unique_id(),
        }),
    )
}
