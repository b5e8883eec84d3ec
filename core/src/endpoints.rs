//! Logical operation name → resource path template.
//!
//! # Design
//! The table is data, not code: the bundled routes live in
//! `endpoints.toml` and a caller may load a replacement or override single
//! entries. Nested TOML tables flatten into dotted names so the dispatcher
//! only ever sees `"transfer.recipient.create"`-style keys.

use std::{collections::BTreeMap, path::Path};

use crate::error::ConfigError;

const BUNDLED: &str = include_str!("../endpoints.toml");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTable {
    routes: BTreeMap<String, String>,
}

impl EndpointTable {
    pub fn empty() -> Self {
        Self { routes: BTreeMap::new() }
    }

    /// Routes shipped with the crate.
    pub fn bundled() -> Self {
        Self::from_toml_str(BUNDLED).expect("bundled endpoint table is valid")
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(source)?;
        let mut routes = BTreeMap::new();
        flatten(None, &table, &mut routes)?;
        Ok(Self { routes })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn get(&self, name: &str) -> Result<&str, ConfigError> {
        self.routes
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownEndpoint(name.to_owned()))
    }

    /// Add or replace a single route, returning the previous template.
    pub fn insert(&mut self, name: impl Into<String>, template: impl Into<String>) -> Option<String> {
        self.routes.insert(name.into(), template.into())
    }

    /// Overlay `other` on top of this table.
    pub fn merge(&mut self, other: EndpointTable) {
        self.routes.extend(other.routes);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for EndpointTable {
    fn default() -> Self {
        Self::bundled()
    }
}

fn flatten(
    prefix: Option<&str>,
    table: &toml::Table,
    out: &mut BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    for (key, value) in table {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            toml::Value::String(template) => {
                out.insert(name, template.clone());
            }
            toml::Value::Table(nested) => flatten(Some(&name), nested, out)?,
            _ => return Err(ConfigError::InvalidEndpoint { name }),
        }
    }
    Ok(())
}
