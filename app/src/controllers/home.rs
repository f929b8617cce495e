use polaris::{Request, Response};
use serde_json::json;

pub async fn index(req: Request) -> Response {
    let visits = {
        let session = req.session()?;
        let visits = session.get_as::<u64>("visits").unwrap_or(0) + 1;
        session.set("visits", visits)?;
        visits
    };

    req.renderer()?.html(
        200,
        "home",
        json!({
            "title": "Polaris",
            "visits": visits,
            "authenticated": req.user()?.is_authenticated(),
        }),
    )
}
