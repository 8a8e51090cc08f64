//! Blocking client for the deployed admin HTTP surface.

use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::Deserialize;
use serde_json::{json, Value};

use vellum_core::admin::{InitResponse, StatusResponse};
use vellum_core::Config;

/// One image as listed by the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteImage {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Reply of `GET /api/admin/images`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageListing {
    #[serde(default)]
    pub images: Vec<RemoteImage>,
    #[serde(default)]
    pub public_base: Option<String>,
    #[serde(default)]
    pub storage_path: Option<String>,
}

struct Reply {
    status: u16,
    cookie: Option<String>,
    body: Value,
}

pub struct AdminClient {
    agent: ureq::Agent,
    base_url: String,
    password: String,
    session: Option<String>,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            password: password.into(),
            session: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config.require_production_url()?;
        let password = config.require_admin_password()?;
        Ok(Self::new(url, password))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.password)
    }

    // -----------------------------------------------------------------------
    // init-database (bearer auth)
    // -----------------------------------------------------------------------

    pub fn database_status(&self) -> Result<StatusResponse> {
        let reply = read_reply(
            self.agent
                .get(&self.url("/api/init-database"))
                .set("Authorization", &self.bearer())
                .call(),
            "GET /api/init-database",
        )?;
        if reply.status == 401 {
            bail!("deployment rejected ADMIN_PASSWORD");
        }
        if !is_success(reply.status) {
            bail!(
                "status request failed ({}): {}",
                reply.status,
                error_text(&reply.body)
            );
        }
        serde_json::from_value(reply.body).context("unexpected status response")
    }

    /// POST the optional seed body. `force` replaces an existing document.
    pub fn init_database(&self, body: Option<&Value>, force: bool) -> Result<InitResponse> {
        let mut url = self.url("/api/init-database");
        if force {
            url.push_str("?force=true");
        }
        let request = self
            .agent
            .post(&url)
            .set("Authorization", &self.bearer());
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        let reply = read_reply(result, "POST /api/init-database")?;
        interpret_init_reply(reply.status, reply.body)
    }

    // -----------------------------------------------------------------------
    // images (session cookie auth)
    // -----------------------------------------------------------------------

    pub fn login(&mut self) -> Result<()> {
        let reply = read_reply(
            self.agent
                .post(&self.url("/api/admin/login"))
                .send_json(json!({ "password": self.password })),
            "POST /api/admin/login",
        )?;
        if !is_success(reply.status) {
            bail!("login failed ({}): {}", reply.status, error_text(&reply.body));
        }
        let cookie = reply
            .cookie
            .context("login succeeded but no session cookie was returned")?;
        tracing::debug!("logged in to {}", self.base_url);
        self.session = Some(cookie);
        Ok(())
    }

    fn session(&self) -> Result<&str> {
        self.session.as_deref().context("not logged in")
    }

    pub fn list_images(&self) -> Result<ImageListing> {
        let reply = read_reply(
            self.agent
                .get(&self.url("/api/admin/images"))
                .set("Cookie", self.session()?)
                .call(),
            "GET /api/admin/images",
        )?;
        if !is_success(reply.status) {
            bail!(
                "listing images failed ({}): {}",
                reply.status,
                error_text(&reply.body)
            );
        }
        serde_json::from_value(reply.body).context("unexpected image list response")
    }

    /// Names already present remotely.
    pub fn image_names(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .list_images()?
            .images
            .into_iter()
            .map(|i| i.name)
            .collect())
    }

    /// Upload one image; returns the name the deployment stored it under.
    pub fn upload_image(&self, filename: &str, bytes: &[u8], mime: &str) -> Result<String> {
        let payload = json!({
            "data": BASE64_STANDARD.encode(bytes),
            "filename": filename,
            "mimeType": mime,
        });
        let reply = read_reply(
            self.agent
                .post(&self.url("/api/admin/images"))
                .set("Cookie", self.session()?)
                .send_json(payload),
            "POST /api/admin/images",
        )?;
        if !is_success(reply.status) {
            bail!("upload failed ({}): {}", reply.status, error_text(&reply.body));
        }
        Ok(stored_name(&reply.body, filename))
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Error statuses are replies too; only transport failures are errors here.
fn read_reply(result: Result<ureq::Response, ureq::Error>, what: &str) -> Result<Reply> {
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(e) => return Err(e).with_context(|| format!("{what} could not be sent")),
    };
    let status = response.status();
    let cookie = response.header("set-cookie").and_then(session_cookie);
    let text = response
        .into_string()
        .with_context(|| format!("{what}: failed to read response body"))?;
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    Ok(Reply {
        status,
        cookie,
        body,
    })
}

/// `name=value` part of a `Set-Cookie` header.
fn session_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    (!pair.is_empty()).then(|| pair.to_string())
}

/// Name the deployment stored an upload under. `uploaded` is
/// `<publicBase>/<finalName>`; older deployments reply with `name`.
fn stored_name(body: &Value, requested: &str) -> String {
    let from_url = body
        .get("uploaded")
        .and_then(Value::as_str)
        .and_then(|url| url.rsplit('/').next())
        .filter(|name| !name.is_empty());
    from_url
        .or_else(|| body.get("name").and_then(Value::as_str))
        .unwrap_or(requested)
        .to_string()
}

fn error_text(body: &Value) -> String {
    match body {
        Value::Object(map) => map
            .get("error")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// A 400 that reports `exists` is the deployment declining to overwrite,
/// not a failure.
fn interpret_init_reply(status: u16, body: Value) -> Result<InitResponse> {
    if is_success(status) {
        return serde_json::from_value(body).context("unexpected init response");
    }
    if status == 400 && body.get("exists").and_then(Value::as_bool) == Some(true) {
        return Ok(InitResponse {
            message: error_text(&body),
            path: body
                .get("path")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            exists: true,
        });
    }
    if status == 401 {
        bail!("deployment rejected ADMIN_PASSWORD");
    }
    bail!("init request failed ({status}): {}", error_text(&body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_keeps_only_the_pair() {
        assert_eq!(
            session_cookie("admin_session=abc123; Path=/; HttpOnly").as_deref(),
            Some("admin_session=abc123")
        );
        assert_eq!(session_cookie("  ; Path=/"), None);
    }

    #[test]
    fn init_success_parses_body() {
        let reply = interpret_init_reply(
            200,
            json!({ "message": "Database initialized successfully", "path": "/data/database.json" }),
        )
        .unwrap();
        assert_eq!(reply.path, "/data/database.json");
        assert!(!reply.exists);
    }

    #[test]
    fn existing_document_is_informational() {
        let reply = interpret_init_reply(
            400,
            json!({ "error": "Database already exists", "exists": true, "path": "/data/database.json" }),
        )
        .unwrap();
        assert!(reply.exists);
        assert_eq!(reply.message, "Database already exists");
    }

    #[test]
    fn other_failures_are_errors() {
        let err = interpret_init_reply(401, json!({ "error": "Unauthorized" })).unwrap_err();
        assert!(err.to_string().contains("ADMIN_PASSWORD"));

        let err = interpret_init_reply(500, Value::String("boom".into())).unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn renamed_upload_is_read_from_uploaded_url() {
        let body = json!({ "success": true, "uploaded": "/images/team-1.jpg", "images": [] });
        assert_eq!(stored_name(&body, "team.jpg"), "team-1.jpg");

        let body = json!({ "name": "team-2.jpg" });
        assert_eq!(stored_name(&body, "team.jpg"), "team-2.jpg");

        let body = json!({ "uploaded": "/images/" });
        assert_eq!(stored_name(&body, "team.jpg"), "team.jpg");
        assert_eq!(stored_name(&Value::String("ok".into()), "team.jpg"), "team.jpg");
    }

    #[test]
    fn image_listing_carries_storage_details() {
        let listing: ImageListing = serde_json::from_value(json!({
            "images": [{ "name": "a.png", "url": "/images/a.png" }],
            "publicBase": "/images",
            "storagePath": "/data/images"
        }))
        .unwrap();
        assert_eq!(listing.images[0].url.as_deref(), Some("/images/a.png"));
        assert_eq!(listing.storage_path.as_deref(), Some("/data/images"));

        let bare: ImageListing = serde_json::from_value(json!({})).unwrap();
        assert!(bare.images.is_empty());
        assert!(bare.public_base.is_none());
    }

    #[test]
    fn trailing_slash_dropped_from_base() {
        let client = AdminClient::new("https://site.test/", "pw");
        assert_eq!(client.base_url(), "https://site.test");
        assert_eq!(client.url("/api/admin/login"), "https://site.test/api/admin/login");
    }
}
