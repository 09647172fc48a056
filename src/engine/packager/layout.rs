use crate::engine::packager::{
    copy_matching, PackageContext, PackageError, PackageReport, Packager, PackagerBuilder,
};
use crate::engine::EngineSettings;
use crate::utils::{recreate_dir, FileWalker};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const PACKAGE_INFO_FILE: &str = "package-info.json";

#[derive(Serialize)]
struct PackageRecord<'a> {
    reference: String,
    package_id: &'a str,
    settings: BTreeMap<String, String>,
    options: BTreeMap<&'a str, bool>,
    requires: Vec<String>,
    libs: &'a [String],
    files: &'a [PathBuf],
}

/// Lays the package out as a plain directory tree: `include/`, `lib/` and
/// `bin/` next to a JSON record of how it was built.
#[derive(Debug)]
pub struct Layout {
    settings: Arc<EngineSettings>,
}

impl PackagerBuilder for Layout {
    type Output = Layout;

    fn build(settings: Arc<EngineSettings>) -> Self::Output {
        Layout { settings }
    }
}

#[async_trait]
impl Packager for Layout {
    async fn build_package<'a>(&self, context: PackageContext<'a>) -> anyhow::Result<PackageReport> {
        let path = self
            .settings
            .package_path_for_id(context.recipe, &context.plan.package_id);

        recreate_dir(&path).await?;

        match self.fill(&path, context).await {
            Ok(report) => {
                info!(path = %path.display(), files = report.files.len(), "package ready");
                Ok(report)
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_dir_all(&path).await {
                    warn!(path = %path.display(), error = %cleanup, "could not remove partial package");
                }
                Err(e)
            }
        }
    }
}

impl Layout {
    async fn fill(&self, path: &Path, context: PackageContext<'_>) -> anyhow::Result<PackageReport> {
        let install = self.settings.build_path_for_recipe(context.recipe);
        let plan = context.plan;

        for entry in plan.manifest.entries() {
            let copied = copy_matching(
                &install.join(&entry.src),
                &entry.pattern,
                &path.join(&entry.dst),
                &[],
            )
            .await?;

            debug!(pattern = %entry.pattern, dst = %entry.dst, count = copied.len(), "packaged");
        }

        let files = FileWalker::new(path).await?.collect().await?;

        let record = PackageRecord {
            reference: context.recipe.reference(),
            package_id: &plan.package_id,
            settings: context
                .settings
                .values(&context.recipe.settings)
                .into_iter()
                .collect(),
            options: context.options.iter().collect(),
            requires: plan
                .dependencies
                .iter()
                .map(|x| x.reference.to_string())
                .collect(),
            libs: &plan.info.libs,
            files: &files,
        };

        let record_path = path.join(PACKAGE_INFO_FILE);
        tokio::fs::write(&record_path, serde_json::to_vec_pretty(&record)?)
            .await
            .map_err(|source| PackageError::Io {
                path: record_path,
                source,
            })?;

        Ok(PackageReport {
            package_id: plan.package_id.clone(),
            path: path.to_path_buf(),
            files,
            info: plan.info.clone(),
        })
    }
}
