use crate::definition::Recipe;
use crate::engine::options::OptionSet;
use crate::engine::settings::Settings;
use crate::engine::{EngineSettings, Plan};
use crate::utils::WalkError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

mod copy;
mod layout;

pub use copy::copy_matching;
pub use layout::Layout;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("required artifact `{pattern}` not found at {}", .path.display())]
    MissingArtifact { pattern: String, path: PathBuf },

    #[error("invalid copy pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },

    #[error("file name {} is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<WalkError> for PackageError {
    fn from(e: WalkError) -> Self {
        PackageError::Io {
            path: e.path,
            source: e.source,
        }
    }
}

/// One copy into the package: files matching `pattern` under the install
/// tree's `src` land in the package's `dst`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ManifestEntry {
    pub pattern: String,
    pub src: String,
    pub dst: String,
}

/// The copy rules that apply to one option configuration.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct ArtifactManifest {
    entries: Vec<ManifestEntry>,
}

impl ArtifactManifest {
    pub fn from_recipe(recipe: &Recipe, options: &OptionSet) -> Self {
        let entries = recipe
            .package
            .iter()
            .filter(|x| x.when.holds(options))
            .map(|x| ManifestEntry {
                pattern: x.pattern.clone(),
                src: x.src.clone(),
                dst: x.dst.clone(),
            })
            .collect();

        ArtifactManifest { entries }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Package subdirectories this manifest writes to.
    #[cfg(test)]
    pub fn categories(&self) -> std::collections::BTreeSet<&str> {
        self.entries.iter().map(|x| x.dst.as_str()).collect()
    }

    #[cfg(test)]
    pub fn includes(&self, pattern: &str, dst: &str) -> bool {
        self.entries
            .iter()
            .any(|x| x.pattern == pattern && x.dst == dst)
    }
}

/// Whether any copy rule of `recipe` depends on `option`.
pub fn gates_packaging(recipe: &Recipe, option: &str) -> bool {
    recipe
        .package
        .iter()
        .any(|x| x.when.option() == Some(option))
}

/// What consumers link against. Does not vary with options.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct PackageInfo {
    pub libs: Vec<String>,
}

pub fn package_info(recipe: &Recipe) -> PackageInfo {
    PackageInfo {
        libs: recipe.libs.clone(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PackageContext<'a> {
    pub recipe: &'a Recipe,
    pub options: &'a OptionSet,
    pub settings: &'a Settings,
    pub plan: &'a Plan,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub package_id: String,
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
    pub info: PackageInfo,
}

#[async_trait]
pub trait Packager: Send + Sync + Debug {
    async fn build_package<'a>(&self, context: PackageContext<'a>) -> anyhow::Result<PackageReport>;
}

pub trait PackagerBuilder {
    type Output: Packager + 'static;

    fn build(settings: Arc<EngineSettings>) -> Self::Output;
}
