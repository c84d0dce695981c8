//! Operator override tables and the sources they are loaded from

use crate::check::CheckExpression;
use crate::error::{PolicyError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Operator-supplied checks keyed by rule name
///
/// Owned by configuration loading; the enforcer only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    entries: BTreeMap<String, CheckExpression>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override (builder style)
    pub fn with(mut self, name: impl Into<String>, check: CheckExpression) -> Self {
        self.entries.insert(name.into(), check);
        self
    }

    /// Parse a name -> check-string mapping
    pub fn from_check_strings<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut table = Self::new();
        for (name, text) in entries {
            let name = name.into();
            let check = CheckExpression::parse(text.as_ref()).map_err(|err| match err {
                PolicyError::InvalidExpression { text, message } => PolicyError::InvalidExpression {
                    text,
                    message: format!("in override for {}: {}", name, message),
                },
                other => other,
            })?;
            table.entries.insert(name, check);
        }
        Ok(table)
    }

    pub fn get(&self, name: &str) -> Option<&CheckExpression> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overrides in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CheckExpression)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Source of operator overrides
#[async_trait]
pub trait OverrideSource: Send + Sync {
    /// Load and parse the full override table
    async fn load(&self) -> Result<OverrideTable>;
}

/// Overrides held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryOverrideSource {
    table: OverrideTable,
}

impl InMemoryOverrideSource {
    pub fn new(table: OverrideTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl OverrideSource for InMemoryOverrideSource {
    async fn load(&self) -> Result<OverrideTable> {
        Ok(self.table.clone())
    }
}

/// Policy file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    /// Infer the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            Some("json") => Ok(FileFormat::Json),
            _ => Err(PolicyError::Config(format!(
                "cannot infer policy file format from {}",
                path.display()
            ))),
        }
    }
}

/// Overrides read from a YAML or JSON policy file
///
/// The file maps rule names to check strings:
///
/// ```yaml
/// "identity:get_endpoint": "role:admin"
/// "admin_required": "role:admin or role:cloud_admin"
/// ```
#[derive(Debug, Clone)]
pub struct FileOverrideSource {
    path: PathBuf,
    format: FileFormat,
}

impl FileOverrideSource {
    /// Create a source, inferring the format from the extension
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = FileFormat::from_path(&path)?;
        Ok(Self { path, format })
    }

    pub fn with_format(path: impl Into<PathBuf>, format: FileFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse file contents without touching the filesystem
    pub fn parse_contents(contents: &str, format: FileFormat) -> Result<OverrideTable> {
        if contents.trim().is_empty() {
            return Ok(OverrideTable::new());
        }

        let raw: BTreeMap<String, String> = match format {
            FileFormat::Yaml => serde_yaml::from_str(contents)
                .map_err(|e| PolicyError::Config(format!("invalid YAML policy file: {}", e)))?,
            FileFormat::Json => serde_json::from_str(contents)
                .map_err(|e| PolicyError::Config(format!("invalid JSON policy file: {}", e)))?,
        };

        OverrideTable::from_check_strings(raw)
    }
}

#[async_trait]
impl OverrideSource for FileOverrideSource {
    async fn load(&self) -> Result<OverrideTable> {
        debug!("Loading policy overrides from {}", self.path.display());
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let table = Self::parse_contents(&contents, self.format)?;

        info!(
            "Loaded {} policy overrides from {}",
            table.len(),
            self.path.display()
        );
        Ok(table)
    }
}
