//! Fetching component libraries from artifact repositories
//!
//! Libraries are addressed by coordinates,
//! `group:artifact[:extension[:classifier]]:version`, and stored in the
//! usual repository layout:
//!
//! ```text
//! org.example:demo:1.0  ->  org/example/demo/1.0/demo-1.0.yaml
//! ```
//!
//! [`RepositoryFetcher`] looks in the local repository first and then in
//! each extra repository in order. Anything found in an extra repository is
//! copied into the local one. A fetched library may name further libraries
//! in its `dependencies`; those are fetched too.

use crate::analysis::error::ResolutionError;
use crate::analysis::library::LibraryManifest;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

pub const DEFAULT_EXTENSION: &str = "yaml";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactCoordinate {
    pub group: String,
    pub artifact: String,
    pub extension: String,
    pub classifier: Option<String>,
    pub version: String,
}

impl ArtifactCoordinate {
    /// Path of the artifact relative to a repository root.
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.group.split('.').collect();
        path.push(&self.artifact);
        path.push(&self.version);
        path.push(self.file_name());
        path
    }

    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        }
    }
}

impl FromStr for ArtifactCoordinate {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ResolutionError::InvalidCoordinate {
            coordinate: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("empty segment"));
        }
        // Segments become path components; none may climb out of the repository
        if parts
            .iter()
            .any(|p| p.contains(['/', '\\']) || p.contains(".."))
        {
            return Err(invalid("segments may not contain '/', '\\' or '..'"));
        }
        if parts[0].split('.').any(str::is_empty) {
            return Err(invalid("empty group component"));
        }
        let (group, artifact, extension, classifier, version) = match parts.as_slice() {
            [g, a, v] => (g, a, DEFAULT_EXTENSION, None, v),
            [g, a, e, v] => (g, a, *e, None, v),
            [g, a, e, c, v] => (g, a, *e, Some(c.to_string()), v),
            _ => {
                return Err(invalid(
                    "expected group:artifact[:extension[:classifier]]:version",
                ))
            }
        };
        Ok(ArtifactCoordinate {
            group: group.to_string(),
            artifact: artifact.to_string(),
            extension: extension.to_string(),
            classifier,
            version: version.to_string(),
        })
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)?;
        match &self.classifier {
            Some(classifier) => write!(f, ":{}:{}", self.extension, classifier)?,
            None if self.extension != DEFAULT_EXTENSION => write!(f, ":{}", self.extension)?,
            None => {}
        }
        write!(f, ":{}", self.version)
    }
}

/// An extra repository to search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub url: String,
}

impl Repository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Repository {
            id: id.into(),
            url: url.into(),
        }
    }

    /// Parse the `ID=URL` command-line form.
    pub fn parse(s: &str) -> Result<Self, ResolutionError> {
        match s.split_once('=') {
            Some((id, url)) if !id.trim().is_empty() && !url.trim().is_empty() => {
                Ok(Repository::new(id.trim(), url.trim()))
            }
            _ => Err(ResolutionError::InvalidRepository(s.to_string())),
        }
    }

    /// Filesystem root of the repository. Only `file://` URLs and plain
    /// paths are supported.
    pub fn root(&self) -> Result<PathBuf, ResolutionError> {
        if let Some(path) = self.url.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if self.url.contains("://") {
            return Err(ResolutionError::UnsupportedRepository {
                id: self.id.clone(),
                url: self.url.clone(),
            });
        }
        Ok(PathBuf::from(&self.url))
    }
}

/// What happened to one artifact during a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Already present in the local repository
    Local {
        coordinate: String,
        path: PathBuf,
    },
    /// Copied from an extra repository into the local one
    Copied {
        coordinate: String,
        repository: String,
        path: PathBuf,
    },
}

/// State of one fetch: where artifacts land and what was transferred.
///
/// A session is consumed by the fetch it is passed to.
#[derive(Debug)]
pub struct FetchSession {
    local_repository: PathBuf,
    events: Vec<TransferEvent>,
}

impl FetchSession {
    pub fn new(local_repository: impl Into<PathBuf>) -> Self {
        FetchSession {
            local_repository: local_repository.into(),
            events: Vec::new(),
        }
    }

    pub fn local_repository(&self) -> &Path {
        &self.local_repository
    }

    fn record(&mut self, event: TransferEvent) {
        debug!(?event, "transfer");
        self.events.push(event);
    }
}

/// Result of a fetch.
#[derive(Debug)]
pub struct Fetched {
    /// Local paths of every library, dependencies before dependents
    pub artifacts: Vec<PathBuf>,
    pub events: Vec<TransferEvent>,
}

pub trait ArtifactFetcher {
    fn fetch(
        &self,
        session: FetchSession,
        coordinates: &[ArtifactCoordinate],
        repositories: &[Repository],
    ) -> Result<Fetched, ResolutionError>;
}

/// Fetches from the local filesystem: the local repository plus `file://`
/// or plain-path repositories.
#[derive(Debug, Default, Clone, Copy)]
pub struct RepositoryFetcher;

struct Walk<'a> {
    session: FetchSession,
    roots: Vec<(&'a Repository, PathBuf)>,
    seen: HashSet<ArtifactCoordinate>,
    artifacts: Vec<PathBuf>,
}

impl Walk<'_> {
    /// Depth-first: dependencies land in `artifacts` before their dependent.
    fn visit(&mut self, coordinate: &ArtifactCoordinate) -> Result<(), ResolutionError> {
        if !self.seen.insert(coordinate.clone()) {
            return Ok(());
        }
        let path = self.locate(coordinate)?;
        let manifest = LibraryManifest::from_file(&path)?;
        for dependency in &manifest.dependencies {
            let dependency: ArtifactCoordinate = dependency.parse()?;
            debug!(%coordinate, %dependency, "following dependency");
            self.visit(&dependency)?;
        }
        self.artifacts.push(path);
        Ok(())
    }

    fn locate(&mut self, coordinate: &ArtifactCoordinate) -> Result<PathBuf, ResolutionError> {
        let relative = coordinate.relative_path();
        let local = self.session.local_repository.join(&relative);
        if local.is_file() {
            self.session.record(TransferEvent::Local {
                coordinate: coordinate.to_string(),
                path: local.clone(),
            });
            return Ok(local);
        }

        let mut searched = vec![local.clone()];
        for (repository, root) in &self.roots {
            let candidate = root.join(&relative);
            if !candidate.is_file() {
                searched.push(candidate);
                continue;
            }
            if let Some(parent) = local.parent() {
                fs::create_dir_all(parent).map_err(|e| ResolutionError::io(parent, e))?;
            }
            fs::copy(&candidate, &local).map_err(|e| ResolutionError::io(&candidate, e))?;
            info!(%coordinate, repository = %repository.id, "fetched library");
            self.session.record(TransferEvent::Copied {
                coordinate: coordinate.to_string(),
                repository: repository.id.clone(),
                path: local.clone(),
            });
            return Ok(local);
        }

        Err(ResolutionError::ArtifactNotFound {
            coordinate: coordinate.to_string(),
            searched,
        })
    }
}

impl ArtifactFetcher for RepositoryFetcher {
    fn fetch(
        &self,
        session: FetchSession,
        coordinates: &[ArtifactCoordinate],
        repositories: &[Repository],
    ) -> Result<Fetched, ResolutionError> {
        let roots = repositories
            .iter()
            .map(|repository| Ok((repository, repository.root()?)))
            .collect::<Result<Vec<_>, ResolutionError>>()?;

        let mut walk = Walk {
            session,
            roots,
            seen: HashSet::new(),
            artifacts: Vec::new(),
        };
        for coordinate in coordinates {
            walk.visit(coordinate)?;
        }

        info!(
            libraries = walk.artifacts.len(),
            local = %walk.session.local_repository.display(),
            "fetch complete"
        );
        Ok(Fetched {
            artifacts: walk.artifacts,
            events: walk.session.events,
        })
    }
}
