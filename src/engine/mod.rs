use crate::definition::actions::Stage;
use crate::definition::Recipe;
use crate::engine::build_style::BuildPlan;
use crate::engine::environment::Environment;
use crate::engine::generator::Generator;
use crate::engine::options::OptionSet;
use crate::engine::packager::{
    copy_matching, gates_packaging, package_info, ArtifactManifest, PackageContext, PackageInfo,
    PackageReport, Packager, PackagerBuilder,
};
use crate::engine::resolver::{resolve_dependencies, DependencySet};
use crate::engine::settings::Settings;
use crate::utils::{absolute, recreate_dir};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod build_style;
pub mod environment;
pub mod generator;
pub mod options;
pub mod package_id;
pub mod packager;
pub mod resolver;
pub mod settings;

#[derive(Debug)]
pub struct Engine {
    environment: Environment,
    generator: Generator,
    packager: Box<dyn Packager>,
    pub settings: Arc<EngineSettings>,
}

/// Where the engine reads sources, keeps its work trees and finds tools.
/// Work trees are relative to `root_path` unless absolute.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    root_path: PathBuf,
    source_path: PathBuf,
    export_path: PathBuf,
    build_path: PathBuf,
    package_path: PathBuf,
    deps_path: PathBuf,
    cmake_program: PathBuf,
    make_program: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            root_path: PathBuf::from(".csio"),
            source_path: PathBuf::from("."),
            export_path: PathBuf::from("export"),
            build_path: PathBuf::from("build"),
            package_path: PathBuf::from("package"),
            deps_path: PathBuf::from("deps"),
            cmake_program: PathBuf::from("cmake"),
            make_program: PathBuf::from("make"),
        }
    }
}

impl EngineSettings {
    pub fn with_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_path = path.into();
        self
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn with_deps_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.deps_path = path.into();
        self
    }

    pub fn with_cmake_program(mut self, path: impl Into<PathBuf>) -> Self {
        self.cmake_program = path.into();
        self
    }

    pub fn with_make_program(mut self, path: impl Into<PathBuf>) -> Self {
        self.make_program = path.into();
        self
    }

    /// Anchors every relative path at the current directory. Tool programs
    /// given as bare names are left for `PATH` lookup.
    pub fn absolutize(mut self) -> std::io::Result<Self> {
        self.root_path = absolute(&self.root_path)?;
        self.source_path = absolute(&self.source_path)?;

        for program in [&mut self.cmake_program, &mut self.make_program] {
            if program.components().count() > 1 {
                *program = absolute(program)?;
            }
        }

        Ok(self)
    }

    pub fn root_path(&self) -> &Path {
        self.root_path.as_path()
    }

    pub fn source_path(&self) -> &Path {
        self.source_path.as_path()
    }

    pub fn cmake_program(&self) -> &Path {
        self.cmake_program.as_path()
    }

    pub fn make_program(&self) -> &Path {
        self.make_program.as_path()
    }

    pub fn deps_path(&self) -> PathBuf {
        self.root_path.join(&self.deps_path)
    }

    pub fn export_path_for_recipe(&self, recipe: &Recipe) -> PathBuf {
        self.root_path.join(&self.export_path).join(recipe.dir_name())
    }

    /// Directory the configure step reads: the exported copy when the
    /// recipe exports anything, the source tree itself otherwise.
    pub fn source_path_for_recipe(&self, recipe: &Recipe) -> PathBuf {
        if recipe.exports.is_empty() {
            self.source_path.clone()
        } else {
            self.export_path_for_recipe(recipe)
        }
    }

    pub fn build_path_for_recipe(&self, recipe: &Recipe) -> PathBuf {
        self.root_path.join(&self.build_path).join(recipe.dir_name())
    }

    pub fn package_path_for_recipe(&self, recipe: &Recipe) -> PathBuf {
        self.root_path.join(&self.package_path).join(recipe.dir_name())
    }

    pub fn package_path_for_id(&self, recipe: &Recipe, package_id: &str) -> PathBuf {
        self.package_path_for_recipe(recipe).join(package_id)
    }
}

/// Everything decided about one build before anything runs.
#[derive(Debug, Clone)]
pub struct Plan {
    pub dependencies: DependencySet,
    pub package_id: String,
    pub build: BuildPlan,
    pub manifest: ArtifactManifest,
    pub info: PackageInfo,
}

impl Plan {
    pub fn new(
        engine: &EngineSettings,
        recipe: &Recipe,
        options: &OptionSet,
        settings: &Settings,
        jobs: usize,
    ) -> Self {
        let dependencies = resolve_dependencies(recipe, options);
        let package_id = package_id::package_id(recipe, settings, options, &dependencies);
        let build = BuildPlan::new(
            recipe,
            options,
            settings,
            &engine.source_path_for_recipe(recipe),
            jobs,
        );

        Plan {
            dependencies,
            package_id,
            build,
            manifest: ArtifactManifest::from_recipe(recipe, options),
            info: package_info(recipe),
        }
    }
}

impl Engine {
    pub fn from_settings<T: PackagerBuilder>(settings: EngineSettings) -> Self {
        let settings = Arc::from(settings);
        Engine {
            environment: Environment::new(settings.clone()),
            generator: Generator::new(settings.clone()),
            packager: Box::new(T::build(settings.clone())),
            settings,
        }
    }

    pub fn plan(&self, recipe: &Recipe, options: &OptionSet, settings: &Settings) -> Plan {
        Plan::new(&self.settings, recipe, options, settings, self.environment.cpus)
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Runs every stage for one configuration and returns the finished
    /// package. Stops at the first failing stage.
    pub async fn create(
        &self,
        recipe: &Recipe,
        options: &OptionSet,
        settings: &Settings,
    ) -> anyhow::Result<PackageReport> {
        let plan = self.plan(recipe, options, settings);

        if recipe.declares_option("shared") && !gates_packaging(recipe, "shared") {
            warn!(
                shared = options.is_enabled("shared"),
                "option shared does not change the packaged artifacts"
            );
        }

        let mut report = None;

        for stage in Stage::stages() {
            info!(%stage, recipe = %recipe.reference(), "running stage");

            match stage {
                Stage::Export => self.export(recipe).await?,

                Stage::Generate => {
                    recreate_dir(&self.settings.build_path_for_recipe(recipe)).await?;
                    self.generator
                        .write(recipe, settings, &plan.dependencies)
                        .await?;
                }

                Stage::Configure | Stage::Build | Stage::Install => {
                    for invocation in plan.build.for_stage(stage) {
                        self.environment.run(recipe, invocation).await?;
                    }
                }

                Stage::Package => {
                    let context = PackageContext {
                        recipe,
                        options,
                        settings,
                        plan: &plan,
                    };
                    report = Some(self.packager.build_package(context).await?);
                }
            }
        }

        report.ok_or_else(|| anyhow::anyhow!("{} produced no package", recipe.reference()))
    }

    async fn export(&self, recipe: &Recipe) -> anyhow::Result<()> {
        if recipe.exports.is_empty() {
            debug!("nothing exported, building from the source tree");
            return Ok(());
        }

        let dest = self.settings.export_path_for_recipe(recipe);
        recreate_dir(&dest).await?;

        let skip = [self.settings.root_path().to_path_buf()];
        for pattern in &recipe.exports {
            let copied = copy_matching(self.settings.source_path(), pattern, &dest, &skip).await?;
            debug!(%pattern, count = copied.len(), "exported");
        }

        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::definition::revisions;
    use crate::engine::environment::BuildError;
    use crate::engine::generator::BUILD_INFO_FILE;
    use crate::engine::options::OptionOverride;
    use crate::engine::packager::Layout;
    use crate::engine::settings::{Arch, BuildType, CompilerKind, Os};
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    const FAKE_CMAKE: &str = r#"#!/bin/sh
if [ "$1" = "--build" ]; then
    exit 0
fi
echo "$@" > configure.args
"#;

    const FAKE_MAKE: &str = r#"#!/bin/sh
[ "$1" = "install" ] || exit 2
mkdir -p distr/include distr/lib
echo "" > distr/include/csio.h
echo "" > distr/lib/libcsio.a
if grep -q -- "-DWITH_dzip=1" configure.args; then
    mkdir -p distr/bin
    echo "" > distr/bin/dzip
fi
"#;

    const FAILING_CMAKE: &str = "#!/bin/sh\nexit 3\n";

    async fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        tokio::fs::write(&path, body).await.unwrap();
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .await
            .unwrap();
        path
    }

    async fn engine(dir: &TempDir, cmake: &str) -> Engine {
        let source = dir.path().join("src");
        tokio::fs::create_dir_all(&source).await.unwrap();
        tokio::fs::write(source.join("CMakeLists.txt"), "project(csio)\n")
            .await
            .unwrap();

        let tools = dir.path().join("tools");
        tokio::fs::create_dir_all(&tools).await.unwrap();

        let settings = EngineSettings::default()
            .with_root(dir.path().join("root"))
            .with_source(source)
            .with_cmake_program(script(&tools, "cmake", cmake).await)
            .with_make_program(script(&tools, "make", FAKE_MAKE).await);

        Engine::from_settings::<Layout>(settings)
    }

    fn linux() -> Settings {
        Settings::new(Os::Linux, CompilerKind::Gcc, BuildType::Release, Arch::X86_64)
    }

    fn options_for(recipe: &Recipe, input: &[&str]) -> OptionSet {
        let overrides: Vec<OptionOverride> = input.iter().map(|x| x.parse().unwrap()).collect();
        OptionSet::for_recipe(recipe, &overrides).unwrap()
    }

    #[tokio::test]
    async fn creates_package_with_dzip() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, FAKE_CMAKE).await;
        let recipe = revisions::find("0.1.2").unwrap().load().unwrap();
        let options = options_for(&recipe, &["dzip=True"]);

        let report = engine.create(&recipe, &options, &linux()).await.unwrap();

        let build = engine.settings.build_path_for_recipe(&recipe);
        let args = tokio::fs::read_to_string(build.join("configure.args"))
            .await
            .unwrap();
        assert!(args.contains("-DWITH_dzip=1"));
        assert!(args.contains("-DWITH_CONAN=1"));
        assert!(args.contains("-DCMAKE_INSTALL_PREFIX=./distr"));

        let export = engine.settings.export_path_for_recipe(&recipe);
        assert!(args.starts_with(&export.display().to_string()));
        assert!(export.join("CMakeLists.txt").is_file());

        assert!(build.join(BUILD_INFO_FILE).is_file());
        assert!(report.path.join("bin/dzip").is_file());
        assert!(report.path.join("include/csio.h").is_file());
        assert!(report.path.join("lib/libcsio.a").is_file());
        assert_eq!(report.info.libs, vec!["csio"]);
    }

    #[tokio::test]
    async fn creates_package_without_dzip() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, FAKE_CMAKE).await;
        let recipe = revisions::latest().load().unwrap();
        let options = options_for(&recipe, &[]);

        let report = engine.create(&recipe, &options, &linux()).await.unwrap();

        assert!(!report.path.join("bin").exists());
        assert!(report.path.join("lib/libcsio.a").is_file());
        assert_eq!(report.package_id, engine.plan(&recipe, &options, &linux()).package_id);
    }

    #[tokio::test]
    async fn failing_configure_stops_before_packaging() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, FAILING_CMAKE).await;
        let recipe = revisions::latest().load().unwrap();
        let options = options_for(&recipe, &[]);

        let err = engine.create(&recipe, &options, &linux()).await.unwrap_err();

        match err.downcast_ref::<BuildError>() {
            Some(BuildError::Failed { stage, status, .. }) => {
                assert_eq!(*stage, Stage::Configure);
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!engine.settings.package_path_for_recipe(&recipe).exists());
    }

    #[tokio::test]
    async fn missing_tool_is_a_spawn_error() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::from_settings::<Layout>(
            EngineSettings::default()
                .with_root(dir.path().join("root"))
                .with_source(dir.path())
                .with_cmake_program(dir.path().join("no-such-cmake")),
        );
        let recipe = revisions::latest().load().unwrap();
        let options = options_for(&recipe, &[]);

        let err = engine.create(&recipe, &options, &linux()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::Spawn { stage: Stage::Configure, .. })
        ));
    }
}
