//! GitLab REST (v4) implementation of [`GroupApi`]

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GroupApi, Project, RootGroup};
use crate::error::{Result, SyncError};

const API_PREFIX: &str = "api/v4";
const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const NEXT_PAGE_HEADER: &str = "x-next-page";
const PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Which clone address of a project to use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CloneProtocol {
    /// `ssh_url_to_repo`
    #[default]
    Ssh,
    /// `http_url_to_repo`
    Https,
}

#[derive(Deserialize)]
struct GitLabGroup {
    id: u64,
    full_path: String,
}

#[derive(Deserialize)]
struct GitLabProject {
    id: u64,
    path_with_namespace: String,
    ssh_url_to_repo: String,
    http_url_to_repo: String,
}

impl GitLabProject {
    fn into_project(self, protocol: CloneProtocol) -> Project {
        let clone_url = match protocol {
            CloneProtocol::Ssh => self.ssh_url_to_repo,
            CloneProtocol::Https => self.http_url_to_repo,
        };
        Project::new(self.id, &self.path_with_namespace, clone_url)
    }
}

/// Authenticated GitLab API handle
pub struct GitLabClient {
    http: Client,
    base_url: String,
    token: String,
    protocol: CloneProtocol,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: &str, protocol: CloneProtocol) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("glsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            protocol,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{API_PREFIX}/{path}", self.base_url)
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> reqwest::Result<Response> {
        self.http
            .get(url)
            .header(PRIVATE_TOKEN_HEADER, &self.token)
            .query(query)
            .send()
            .await
    }

    fn auth_error(&self, message: impl Into<String>) -> SyncError {
        SyncError::Authentication {
            url: self.base_url.clone(),
            message: message.into(),
        }
    }
}

/// GitLab addresses groups by their URL-encoded full path
fn encode_group_path(path: &str) -> String {
    path.replace('/', "%2F")
}

fn next_page(response: &Response) -> Option<u32> {
    response
        .headers()
        .get(NEXT_PAGE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

#[async_trait]
impl GroupApi for GitLabClient {
    async fn authenticate(&self) -> Result<()> {
        let response = self
            .get(&self.endpoint("user"), &[])
            .await
            .map_err(|e| self.auth_error(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(self.auth_error(format!("server answered {status}"))),
        }
    }

    async fn group(&self, path: &str) -> Result<RootGroup> {
        let url = self.endpoint(&format!("groups/{}", encode_group_path(path)));
        let not_found = |message: String| SyncError::NotFound {
            path: path.to_string(),
            message,
        };

        let response = self
            .get(&url, &[("with_projects", "false".to_string())])
            .await
            .map_err(|e| not_found(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(self.auth_error(format!("access to group '{path}' denied")))
            }
            status if status.is_success() => {
                let group: GitLabGroup = response
                    .json()
                    .await
                    .map_err(|e| not_found(format!("unreadable group response: {e}")))?;
                Ok(RootGroup {
                    id: group.id,
                    full_path: group.full_path,
                })
            }
            status => Err(not_found(format!("server answered {status}"))),
        }
    }

    async fn group_projects(&self, group: &RootGroup) -> Result<Vec<Project>> {
        let url = self.endpoint(&format!("groups/{}/projects", group.id));
        let list_error = |message: String| SyncError::List {
            group: group.full_path.clone(),
            message,
        };

        let mut projects = Vec::new();
        let mut page = 1u32;
        loop {
            let query = [
                ("include_subgroups", "true".to_string()),
                ("order_by", "id".to_string()),
                ("sort", "asc".to_string()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let response = self
                .get(&url, &query)
                .await
                .map_err(|e| list_error(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(list_error(format!("page {page}: server answered {status}")));
            }

            let next = next_page(&response);
            let listed: Vec<GitLabProject> = response
                .json()
                .await
                .map_err(|e| list_error(format!("page {page}: {e}")))?;
            tracing::debug!(page, count = listed.len(), "listed project page");

            projects.extend(
                listed
                    .into_iter()
                    .map(|project| project.into_project(self.protocol)),
            );

            match next {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT_JSON: &str = r#"{
        "id": 42,
        "name": "terraform",
        "path_with_namespace": "acme/platform/infra/terraform",
        "ssh_url_to_repo": "git@gitlab.example.com:acme/platform/infra/terraform.git",
        "http_url_to_repo": "https://gitlab.example.com/acme/platform/infra/terraform.git",
        "archived": false
    }"#;

    #[test]
    fn test_encode_group_path() {
        assert_eq!(encode_group_path("acme/platform"), "acme%2Fplatform");
        assert_eq!(encode_group_path("acme"), "acme");
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = GitLabClient::new("https://gitlab.example.com/", "t", CloneProtocol::Ssh)
            .expect("client builds");
        assert_eq!(
            client.endpoint("groups/7/projects"),
            "https://gitlab.example.com/api/v4/groups/7/projects"
        );
    }

    #[test]
    fn test_project_uses_ssh_by_default() {
        let raw: GitLabProject = serde_json::from_str(PROJECT_JSON).expect("valid json");
        let project = raw.into_project(CloneProtocol::default());
        assert_eq!(project.id, 42);
        assert_eq!(
            project.clone_url,
            "git@gitlab.example.com:acme/platform/infra/terraform.git"
        );
        assert_eq!(project.namespace_path.len(), 4);
    }

    #[test]
    fn test_project_https_protocol() {
        let raw: GitLabProject = serde_json::from_str(PROJECT_JSON).expect("valid json");
        let project = raw.into_project(CloneProtocol::Https);
        assert!(project.clone_url.starts_with("https://"));
    }

    #[test]
    fn test_protocol_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            protocol: CloneProtocol,
        }
        let parsed: Wrapper = toml::from_str("protocol = \"https\"").expect("valid toml");
        assert_eq!(parsed.protocol, CloneProtocol::Https);
    }
}
