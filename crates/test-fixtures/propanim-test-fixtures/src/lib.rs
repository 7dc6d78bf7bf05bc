//! Shared JSON fixtures for integration tests.
//!
//! `fixtures/manifest.json` names every clip description and animator config
//! under the workspace `fixtures/` directory. Clips may carry tags so tests can
//! pick up a whole family (the four corners of a 2D blend, say) by name. This
//! crate only locates and deserializes files; it knows nothing about the
//! animation types.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    clips: BTreeMap<String, ClipEntry>,
    #[serde(default)]
    configs: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ClipEntry {
    path: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// One manifest entry, relative to the fixtures directory.
#[derive(Copy, Clone, Debug)]
pub struct Fixture {
    pub name: &'static str,
    rel: &'static str,
}

impl Fixture {
    pub fn path(&self) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(self.rel)
    }

    pub fn text(&self) -> Result<String> {
        let path = self.path();
        fs::read_to_string(&path)
            .with_context(|| format!("fixture '{}': cannot read {}", self.name, path.display()))
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.text()?)
            .with_context(|| format!("fixture '{}': invalid JSON in {}", self.name, self.rel))
    }
}

pub mod clips {
    use super::*;

    /// Clip names in sorted order.
    pub fn names() -> Vec<&'static str> {
        MANIFEST.clips.keys().map(String::as_str).collect()
    }

    /// Clips carrying `tag`, in sorted order.
    pub fn tagged(tag: &str) -> Vec<&'static str> {
        MANIFEST
            .clips
            .iter()
            .filter(|(_, e)| e.tags.iter().any(|t| t == tag))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn get(name: &str) -> Result<Fixture> {
        let (name, entry) = MANIFEST
            .clips
            .get_key_value(name)
            .ok_or_else(|| anyhow!("unknown clip fixture '{name}'"))?;
        Ok(Fixture {
            name,
            rel: &entry.path,
        })
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        get(name)?.parse()
    }
}

pub mod configs {
    use super::*;

    pub fn get(name: &str) -> Result<Fixture> {
        let (name, rel) = MANIFEST
            .configs
            .get_key_value(name)
            .ok_or_else(|| anyhow!("unknown config fixture '{name}'"))?;
        Ok(Fixture { name, rel })
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        get(name)?.parse()
    }
}
