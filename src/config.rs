//! Deploy target configuration.
//!
//! A [`Config`] is built once at start-up, from an optional TOML file and then the
//! process environment, and is shared read-only with every request. Requests never
//! mutate it; they only [`Config::resolve`] a [`ProjectCredentials`] pair from it.

use anyhow::Context as _;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::read_to_string;
use std::path::Path;

/// Base URL of the public GitHub REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
/// Label reported for requests that do not name a project.
pub const DEFAULT_PROJECT_LABEL: &str = "default";

/// Default `owner/repo` to write into.
const ENV_REPO: &str = "GITHUB_REPO";
/// Default access token.
const ENV_TOKEN: &str = "GITHUB_TOKEN";
/// Prefix of a per-project repository, e.g. `GITHUB_REPO_BLOG`.
const ENV_REPO_PREFIX: &str = "GITHUB_REPO_";
/// Prefix of a per-project token, e.g. `GITHUB_TOKEN_BLOG`.
const ENV_TOKEN_PREFIX: &str = "GITHUB_TOKEN_";
/// Shared secret callers must echo back as `deployKey`.
const ENV_DEPLOY_KEY: &str = "DEPLOY_KEY";
/// Override for the GitHub API location.
const ENV_API_URL: &str = "GITHUB_API_URL";

/// A repository and token pair, either of which may be unset.
#[derive(Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Target {
    /// Repository in `owner/repo` form.
    pub repo: Option<String>,
    /// Access token used as a bearer credential.
    pub token: Option<String>,
}

impl Target {
    /// Drop empty strings so that they count as unset.
    fn normalized(self) -> Self {
        Self {
            repo: non_empty(self.repo),
            token: non_empty(self.token),
        }
    }
}

/// On-disk shape of the configuration file.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct File {
    /// Shared secret for the `deployKey` check.
    deploy_key: Option<String>,
    /// GitHub API location.
    api_base_url: Option<String>,
    /// Target used when a request names no project.
    #[serde(default)]
    default: Target,
    /// Per-project targets.
    #[serde(default)]
    projects: BTreeMap<String, Target>,
}

/// Credentials resolved for a single request.
#[derive(Clone, PartialEq, Eq)]
pub struct ProjectCredentials {
    /// Repository in `owner/repo` form.
    pub repository: String,
    /// Access token used as a bearer credential.
    pub token: String,
}

impl fmt::Debug for ProjectCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_struct("ProjectCredentials")
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Immutable, process-wide deploy configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Target used when a request names no project.
    default: Target,
    /// Per-project targets keyed by the upper-cased project identifier.
    projects: BTreeMap<String, Target>,
    /// Shared secret for the `deployKey` check. `None` means open mode.
    deploy_key: Option<String>,
    /// GitHub API location.
    api_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default: Target::default(),
            projects: BTreeMap::new(),
            deploy_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
        }
    }
}

impl Config {
    /// Load the configuration file at `path`, if any, and overlay the process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    ///
    /// # Errors
    /// Will error if the file cannot be read or is not valid configuration TOML.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(file_path) => Self::from_file(file_path)?,
            None => Self::default(),
        };
        config.overlay_env(std::env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }));
        Ok(config)
    }

    /// Read a configuration file.
    ///
    /// # Errors
    /// Will error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = read_to_string(path)
            .with_context(|| format!("could not read config file '{}'", path.display()))?;
        Self::from_toml(&raw)
            .with_context(|| format!("could not parse config file '{}'", path.display()))
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Will error on malformed TOML or unknown keys.
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let file: File = toml::from_str(raw)?;
        let mut config = Self {
            default: file.default.normalized(),
            deploy_key: non_empty(file.deploy_key),
            ..Self::default()
        };
        if let Some(url) = non_empty(file.api_base_url) {
            config.api_base_url = url;
        }
        for (id, target) in file.projects {
            let target = target.normalized();
            let entry = config.project_mut(&id);
            entry.repo = target.repo;
            entry.token = target.token;
        }
        Ok(config)
    }

    /// Apply `GITHUB_*` and `DEPLOY_KEY` variables on top of the current values.
    ///
    /// Empty values are ignored, as are variables this service does not know about.
    pub fn overlay_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                ENV_REPO => self.default.repo = Some(value),
                ENV_TOKEN => self.default.token = Some(value),
                ENV_DEPLOY_KEY => self.deploy_key = Some(value),
                ENV_API_URL => self.api_base_url = value,
                _ => {
                    if let Some(id) = key.strip_prefix(ENV_REPO_PREFIX) {
                        if !id.is_empty() {
                            self.project_mut(id).repo = Some(value);
                        }
                    } else if let Some(id) = key.strip_prefix(ENV_TOKEN_PREFIX) {
                        if !id.is_empty() {
                            self.project_mut(id).token = Some(value);
                        }
                    }
                }
            }
        }
    }

    /// Set the default repository.
    #[must_use]
    pub fn with_default_repo(mut self, repo: &str) -> Self {
        self.default.repo = non_empty(Some(repo.to_owned()));
        self
    }

    /// Set the default token.
    #[must_use]
    pub fn with_default_token(mut self, token: &str) -> Self {
        self.default.token = non_empty(Some(token.to_owned()));
        self
    }

    /// Add or replace a project target.
    #[must_use]
    pub fn with_project(mut self, id: &str, repo: Option<&str>, token: Option<&str>) -> Self {
        let entry = self.project_mut(id);
        entry.repo = non_empty(repo.map(str::to_owned));
        entry.token = non_empty(token.map(str::to_owned));
        self
    }

    /// Require callers to present `key` as their `deployKey`.
    #[must_use]
    pub fn with_deploy_key(mut self, key: &str) -> Self {
        self.deploy_key = non_empty(Some(key.to_owned()));
        self
    }

    /// Resolve the repository and token for `project`.
    ///
    /// A named project uses its own repository and its own token, falling back to the
    /// default token. No project means the default pair. Returns `None` when either
    /// half is still missing afterwards.
    #[must_use]
    pub fn resolve(&self, project: Option<&str>) -> Option<ProjectCredentials> {
        let (repo, token) = match project {
            Some(id) => {
                let target = self.projects.get(&project_key(id));
                (
                    target.and_then(|found| found.repo.clone()),
                    target
                        .and_then(|found| found.token.clone())
                        .or_else(|| self.default.token.clone()),
                )
            }
            None => (self.default.repo.clone(), self.default.token.clone()),
        };
        Some(ProjectCredentials {
            repository: repo?,
            token: token?,
        })
    }

    /// The shared secret, if one is configured.
    #[must_use]
    pub fn deploy_key(&self) -> Option<&str> {
        self.deploy_key.as_deref()
    }

    /// GitHub API location.
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Default repository, if set.
    #[must_use]
    pub fn default_repo(&self) -> Option<&str> {
        self.default.repo.as_deref()
    }

    /// Whether the default repository and token are both set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.default.repo.is_some() && self.default.token.is_some()
    }

    /// Lower-cased identifiers of every project that names a repository.
    #[must_use]
    pub fn project_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .projects
            .iter()
            .filter(|&(_, target)| target.repo.is_some())
            .map(|(id, _)| id.to_lowercase())
            .collect();
        ids.sort();
        ids
    }

    /// Project entry for `id`, created empty if absent.
    fn project_mut(&mut self, id: &str) -> &mut Target {
        self.projects.entry(project_key(id)).or_default()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_struct("Config")
            .field("default_repo", &self.default.repo)
            .field("default_token_set", &self.default.token.is_some())
            .field("projects", &self.project_ids())
            .field("deploy_key_required", &self.deploy_key.is_some())
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Projects are looked up by their upper-cased identifier, matching the environment naming.
fn project_key(id: &str) -> String {
    id.to_uppercase()
}

/// `None` for missing or empty strings.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|found| !found.is_empty())
}
