//! Workspace configuration resolution.
//!
//! Maps a source file to the project that owns it and extracts the active
//! schema endpoint. Resolution is heuristic-tolerant: when no project's
//! patterns match the file, the first declared project is used and the
//! result is marked [`Match::Fallback`] so callers can warn.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

use gqlive_core::EndpointDescriptor;

/// Config file names probed at the workspace root, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".graphqlrc.yml",
    ".graphqlrc.yaml",
    "graphql.config.yml",
    "graphql.config.yaml",
];

/// Terminal resolution failures. The message is surfaced verbatim as the
/// complete session output.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error: this file is outside the workspace.")]
    OutsideWorkspace,
    #[error("Error: no GraphQL config file found in {}", .0.display())]
    MissingConfig(PathBuf),
    #[error("Error: schema missing from graphql config")]
    MissingEndpoint,
    #[error("Error: failed to read graphql config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error: failed to parse graphql config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// One configured endpoint: a bare URL or a URL with static headers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EndpointEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        headers: IndexMap<String, String>,
    },
}

impl EndpointEntry {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Detailed { url, .. } => url,
        }
    }

    pub fn headers(&self) -> IndexMap<String, String> {
        match self {
            Self::Url(_) => IndexMap::new(),
            Self::Detailed { headers, .. } => headers.clone(),
        }
    }
}

/// One project block of the workspace configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Schema pointer(s); http(s) URLs double as the execution endpoint.
    #[serde(deserialize_with = "one_or_many")]
    pub schema: Vec<String>,
    /// Patterns for the documents this project owns.
    #[serde(deserialize_with = "one_or_many")]
    pub documents: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub include: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub exclude: Vec<String>,
    /// Named execution endpoints; take precedence over schema URLs.
    pub endpoints: IndexMap<String, EndpointEntry>,
}

impl ProjectConfig {
    /// True when the root-relative path falls under this project's
    /// include/documents patterns and none of its exclude patterns.
    fn owns(&self, relative: &str) -> bool {
        if self.exclude.iter().any(|p| pattern_matches(p, relative)) {
            return false;
        }
        self.include
            .iter()
            .chain(self.documents.iter())
            .any(|p| pattern_matches(p, relative))
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(one) => vec![one],
        OneOrMany::Many(many) => many,
    })
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    projects: Option<IndexMap<String, ProjectConfig>>,
    #[serde(flatten)]
    root: ProjectConfig,
}

/// The loaded workspace configuration: named projects in declaration
/// order. A configuration without a `projects` table is one anonymous
/// project named `default`.
#[derive(Debug, Clone)]
pub struct GraphQLConfig {
    projects: IndexMap<String, ProjectConfig>,
}

impl GraphQLConfig {
    /// Parses a configuration document.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(text)?;
        let projects = match raw.projects {
            Some(projects) if !projects.is_empty() => projects,
            _ => IndexMap::from([("default".to_string(), raw.root)]),
        };
        Ok(Self { projects })
    }

    /// Loads the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Probes the workspace root for a config file.
    pub fn locate(root: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|candidate| candidate.is_file())
    }

    pub fn projects(&self) -> &IndexMap<String, ProjectConfig> {
        &self.projects
    }

    /// Picks the project owning `relative`, falling back to the first
    /// declared project when no patterns match.
    fn project_for(&self, relative: &str) -> Option<(&str, &ProjectConfig, Match)> {
        for (name, project) in &self.projects {
            if project.owns(relative) {
                return Some((name.as_str(), project, Match::Include));
            }
        }
        self.projects
            .first()
            .map(|(name, project)| (name.as_str(), project, Match::Fallback))
    }
}

/// How a project was resolved for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// The project's patterns matched the file.
    Include,
    /// No project matched; the first declared project was used.
    Fallback,
}

impl Match {
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// The outcome of config resolution for one source file.
#[derive(Debug, Clone)]
pub struct ResolvedProject {
    pub name: String,
    pub project: ProjectConfig,
    pub matched: Match,
}

impl ResolvedProject {
    /// Names of the project's configured endpoints, declaration order.
    pub fn endpoint_names(&self) -> Vec<String> {
        self.project.endpoints.keys().cloned().collect()
    }

    /// Builds the endpoint descriptor, preferring the named endpoint
    /// table over schema URLs. `name = None` selects the first entry.
    pub fn endpoint(&self, name: Option<&str>) -> Result<EndpointDescriptor, ConfigError> {
        if !self.project.endpoints.is_empty() {
            let (entry_name, entry) = match name {
                Some(name) => self
                    .project
                    .endpoints
                    .get_key_value(name)
                    .ok_or(ConfigError::MissingEndpoint)?,
                None => self
                    .project
                    .endpoints
                    .first()
                    .ok_or(ConfigError::MissingEndpoint)?,
            };
            return Ok(
                EndpointDescriptor::new(entry_name.clone(), vec![entry.url().to_string()])
                    .with_headers(entry.headers()),
            );
        }

        let urls: Vec<String> = self
            .project
            .schema
            .iter()
            .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
            .cloned()
            .collect();
        if urls.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        Ok(EndpointDescriptor::new("default", urls))
    }
}

/// Resolves the project and endpoint for `source` inside `workspace_root`.
///
/// `source` may be absolute (it must then live under the root) or already
/// root-relative.
pub fn resolve(workspace_root: &Path, source: &Path) -> Result<ResolvedProject, ConfigError> {
    let relative = if source.is_absolute() {
        source
            .strip_prefix(workspace_root)
            .map_err(|_| ConfigError::OutsideWorkspace)?
    } else {
        source
    };

    let config_path = GraphQLConfig::locate(workspace_root)
        .ok_or_else(|| ConfigError::MissingConfig(workspace_root.to_path_buf()))?;
    debug!(path = %config_path.display(), "loading graphql config");
    let config = GraphQLConfig::load(&config_path)?;

    let relative = relative.to_string_lossy().replace('\\', "/");
    let (name, project, matched) = config
        .project_for(&relative)
        .ok_or(ConfigError::MissingEndpoint)?;

    debug!(project = name, matched = ?matched, "resolved project");
    Ok(ResolvedProject {
        name: name.to_string(),
        project: project.clone(),
        matched,
    })
}

/// Glob-ish matching over `/`-separated paths: `**` spans segments, `*`
/// and `?` stay within one segment.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    match_segments(&pattern_segments, &path_segments)
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some(&"**") => {
            if match_segments(&pattern[1..], path) {
                return true;
            }
            !path.is_empty() && match_segments(pattern, &path[1..])
        }
        Some(segment) => {
            !path.is_empty()
                && match_segment(segment, path[0])
                && match_segments(&pattern[1..], &path[1..])
        }
    }
}

fn match_segment(pattern: &str, segment: &str) -> bool {
    fn matches(pattern: &[char], segment: &[char]) -> bool {
        match pattern.first() {
            None => segment.is_empty(),
            Some('*') => {
                matches(&pattern[1..], segment)
                    || (!segment.is_empty() && matches(pattern, &segment[1..]))
            }
            Some('?') => !segment.is_empty() && matches(&pattern[1..], &segment[1..]),
            Some(c) => segment.first() == Some(c) && matches(&pattern[1..], &segment[1..]),
        }
    }
    let pattern: Vec<char> = pattern.chars().collect();
    let segment: Vec<char> = segment.chars().collect();
    matches(&pattern, &segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_table() {
        assert!(pattern_matches("src/**/*.graphql", "src/queries/user.graphql"));
        assert!(pattern_matches("src/**/*.graphql", "src/a/b/c/user.graphql"));
        assert!(pattern_matches("src/*.graphql", "src/user.graphql"));
        assert!(!pattern_matches("src/*.graphql", "src/queries/user.graphql"));
        assert!(pattern_matches("**/*.graphql", "user.graphql"));
        assert!(pattern_matches("src/u?er.graphql", "src/user.graphql"));
        assert!(!pattern_matches("lib/**/*.graphql", "src/user.graphql"));
        assert!(pattern_matches("./src/*.graphql", "src/user.graphql"));
    }

    #[test]
    fn single_project_config() {
        let config = GraphQLConfig::parse("schema: http://localhost:4000/graphql\n").unwrap();
        assert_eq!(config.projects().len(), 1);
        let (name, project) = config.projects().first().unwrap();
        assert_eq!(name, "default");
        assert_eq!(project.schema, ["http://localhost:4000/graphql"]);
    }

    #[test]
    fn multi_project_matching_and_fallback() {
        let config = GraphQLConfig::parse(
            r#"
projects:
  app:
    schema: http://localhost:4000/graphql
    include: app/**/*.graphql
  admin:
    schema: http://localhost:5000/graphql
    include: admin/**/*.graphql
"#,
        )
        .unwrap();

        let (name, _, matched) = config.project_for("admin/users.graphql").unwrap();
        assert_eq!(name, "admin");
        assert_eq!(matched, Match::Include);

        let (name, _, matched) = config.project_for("elsewhere/thing.graphql").unwrap();
        assert_eq!(name, "app");
        assert_eq!(matched, Match::Fallback);
    }

    #[test]
    fn exclude_beats_include() {
        let config = GraphQLConfig::parse(
            r#"
projects:
  app:
    schema: http://localhost:4000/graphql
    include: "**/*.graphql"
    exclude: "**/generated/**"
  rest:
    schema: http://localhost:5000/graphql
    include: "**/generated/**"
"#,
        )
        .unwrap();

        let (name, _, matched) = config.project_for("src/generated/ops.graphql").unwrap();
        assert_eq!(name, "rest");
        assert_eq!(matched, Match::Include);
    }

    #[test]
    fn named_endpoints_win_over_schema() {
        let config = GraphQLConfig::parse(
            r#"
schema: ./schema.graphql
endpoints:
  dev: http://localhost:4000/graphql
  prod:
    url: https://api.example.com/graphql
    headers:
      x-api-key: secret
"#,
        )
        .unwrap();
        let (name, project) = config.projects().first().unwrap();
        let resolved = ResolvedProject {
            name: name.clone(),
            project: project.clone(),
            matched: Match::Include,
        };

        assert_eq!(resolved.endpoint_names(), ["dev", "prod"]);

        let dev = resolved.endpoint(None).unwrap();
        assert_eq!(dev.name(), "dev");
        assert_eq!(dev.first_url(), Some("http://localhost:4000/graphql"));

        let prod = resolved.endpoint(Some("prod")).unwrap();
        assert_eq!(prod.first_url(), Some("https://api.example.com/graphql"));
        assert_eq!(prod.headers().get("x-api-key").map(String::as_str), Some("secret"));
    }

    #[test]
    fn file_schema_without_endpoint_is_an_error() {
        let config = GraphQLConfig::parse("schema: ./schema.graphql\n").unwrap();
        let (name, project) = config.projects().first().unwrap();
        let resolved = ResolvedProject {
            name: name.clone(),
            project: project.clone(),
            matched: Match::Include,
        };
        assert!(matches!(
            resolved.endpoint(None),
            Err(ConfigError::MissingEndpoint)
        ));
    }

    #[test]
    fn resolve_against_a_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".graphqlrc.yml"),
            "schema: http://localhost:4000/graphql\n",
        )
        .unwrap();

        let resolved = resolve(dir.path(), Path::new("queries/user.graphql")).unwrap();
        assert_eq!(resolved.matched, Match::Fallback);
        let endpoint = resolved.endpoint(None).unwrap();
        assert_eq!(endpoint.first_url(), Some("http://localhost:4000/graphql"));
    }

    #[test]
    fn missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(dir.path(), Path::new("q.graphql")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingConfig(_)));
    }

    #[test]
    fn absolute_source_outside_the_workspace() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".graphqlrc.yml"),
            "schema: http://localhost:4000/graphql\n",
        )
        .unwrap();

        let outside = tempfile::tempdir().unwrap();
        let err = resolve(dir.path(), &outside.path().join("q.graphql")).unwrap_err();
        assert!(matches!(err, ConfigError::OutsideWorkspace));
        assert_eq!(err.to_string(), "Error: this file is outside the workspace.");
    }
}
