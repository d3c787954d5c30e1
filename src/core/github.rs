//! GitHub release API client.
//!
//! Covers the handful of resource operations the pipelines need: release
//! lookup/creation, release-notes patching, and asset delete/upload.
//! Every non-success response is fatal; there are no retries.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::utils::net;

const API_ROOT: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Deserialize)]
pub struct Release {
    pub id: u64,
    pub upload_url: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
}

impl Release {
    /// The asset upload endpoint with the `{?name,label}` URI-template
    /// suffix stripped.
    pub fn upload_endpoint(&self) -> &str {
        match self.upload_url.find('{') {
            Some(index) => &self.upload_url[..index],
            None => &self.upload_url,
        }
    }

    pub fn asset_named(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

pub struct ReleaseClient {
    client: reqwest::blocking::Client,
    repo: String,
    token: String,
}

impl ReleaseClient {
    pub fn new(repo: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: net::client()?,
            repo: repo.into(),
            token: token.into(),
        })
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::blocking::RequestBuilder {
        self.client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(&self.token)
    }

    fn check(response: reqwest::blocking::Response, context: &str) -> Result<reqwest::blocking::Response> {
        if !response.status().is_success() {
            return Err(Error::http_status(context, response.status().as_u16()));
        }
        Ok(response)
    }

    /// Look up an existing release by tag name.
    pub fn release_by_tag(&self, tag: &str) -> Result<Release> {
        let url = format!("{}/repos/{}/releases/tags/{}", API_ROOT, self.repo, tag);
        let response = self.request(reqwest::Method::GET, url).send()?;
        let response = Self::check(response, "look up release")?;
        Ok(response.json()?)
    }

    /// Create a new release for an existing tag.
    pub fn create_release(&self, tag: &str) -> Result<Release> {
        let url = format!("{}/repos/{}/releases", API_ROOT, self.repo);
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({ "tag_name": tag, "name": tag }))
            .send()?;
        let response = Self::check(response, "create release")?;
        Ok(response.json()?)
    }

    /// Replace a release's description body.
    pub fn update_release_body(&self, release_id: u64, body: &str) -> Result<()> {
        let url = format!("{}/repos/{}/releases/{}", API_ROOT, self.repo, release_id);
        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(&json!({ "body": body }))
            .send()?;
        Self::check(response, "update release notes")?;
        Ok(())
    }

    pub fn delete_asset(&self, asset_id: u64) -> Result<()> {
        let url = format!("{}/repos/{}/releases/assets/{}", API_ROOT, self.repo, asset_id);
        let response = self.request(reqwest::Method::DELETE, url).send()?;
        Self::check(response, "delete asset")?;
        Ok(())
    }

    /// Upload a local file as a release asset, streaming the body.
    pub fn upload_asset(&self, release: &Release, name: &str, path: &Path) -> Result<()> {
        let file = File::open(path)?;
        let length = file.metadata()?.len();

        let url = format!("{}?name={}", release.upload_endpoint(), name);
        let response = self
            .request(reqwest::Method::POST, url)
            .header("Content-Type", "application/zip")
            .body(reqwest::blocking::Body::sized(file, length))
            .send()?;
        Self::check(response, "upload asset")?;
        Ok(())
    }
}
