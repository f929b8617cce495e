use super::{Middleware, Next};
use crate::error::FrameworkError;
use crate::http::{HttpResponse, Request, Response};
use async_trait::async_trait;
use minijinja::Environment;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Template renderer over the configured template directory
///
/// Template names are given without extension; the configured one is
/// appended on lookup. Rendered pages announce the configured charset.
pub struct Renderer {
    env: Environment<'static>,
    extension: String,
    charset: String,
}

impl Renderer {
    pub fn new(dir: impl AsRef<Path>, extension: &str, charset: &str) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir.as_ref().to_path_buf()));
        Self {
            env,
            extension: extension.to_string(),
            charset: charset.to_string(),
        }
    }

    fn template_name(&self, name: &str) -> String {
        if self.extension.is_empty() || name.ends_with(&self.extension) {
            name.to_string()
        } else {
            format!("{}{}", name, self.extension)
        }
    }

    /// Render a template to a string
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, FrameworkError> {
        let template = self.env.get_template(&self.template_name(name))?;
        Ok(template.render(context)?)
    }

    /// Render a template into an HTML response
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// pub async fn index(req: Request) -> Response {
    ///     req.renderer()?.html(200, "home", minijinja::context! { title => "Polaris" })
    /// }
    /// ```
    pub fn html<S: Serialize>(&self, status: u16, name: &str, context: S) -> Response {
        let body = self.render(name, context)?;
        Ok(HttpResponse::html(body, &self.charset).status(status))
    }

    /// Serialize a value into a JSON response
    pub fn json<S: Serialize>(&self, status: u16, value: S) -> Response {
        let value = serde_json::to_value(value)
            .map_err(|e| FrameworkError::internal(format!("JSON serialization failed: {}", e)))?;
        Ok(HttpResponse::json(value).status(status))
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }
}

/// Makes the shared [`Renderer`] available through `Request::renderer`
pub struct Render {
    renderer: Arc<Renderer>,
}

impl Render {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer: Arc::new(renderer),
        }
    }
}

#[async_trait]
impl Middleware for Render {
    async fn handle(&self, mut request: Request, next: Next) -> Response {
        request.insert_extension(self.renderer.clone());
        next(request).await
    }
}
