use crate::definition::Recipe;
use crate::engine::resolver::{Dependency, DependencySet};
use crate::engine::settings::Settings;
use crate::engine::EngineSettings;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub const BUILD_INFO_FILE: &str = "conanbuildinfo.cmake";

const BUILD_INFO_TEMPLATE: &str = r#"# Generated for {{reference}}, do not edit.
set(CONAN_PACKAGE_NAME {{name}})
set(CONAN_PACKAGE_VERSION {{version}})
{{#each settings}}
set(CONAN_SETTINGS_{{this.key}} "{{this.value}}")
{{/each}}
{{#each dependencies}}

set(CONAN_{{this.var}}_ROOT "{{this.root}}")
set(CONAN_INCLUDE_DIRS_{{this.var}} "{{this.root}}/include")
set(CONAN_LIB_DIRS_{{this.var}} "{{this.root}}/lib")
set(CONAN_BIN_DIRS_{{this.var}} "{{this.root}}/bin")
set(CONAN_LIBS_{{this.var}} {{this.name}})
{{/each}}

set(CONAN_DEPENDENCIES{{#each dependencies}} {{this.name}}{{/each}})
set(CONAN_INCLUDE_DIRS{{#each dependencies}} "{{this.root}}/include"{{/each}})
set(CONAN_LIB_DIRS{{#each dependencies}} "{{this.root}}/lib"{{/each}})
set(CONAN_LIBS{{#each dependencies}} {{this.name}}{{/each}})

macro(conan_basic_setup)
    include_directories(${CONAN_INCLUDE_DIRS})
    link_directories(${CONAN_LIB_DIRS})
endmacro()
"#;

#[derive(Serialize)]
struct SettingVar {
    key: String,
    value: String,
}

#[derive(Serialize)]
struct DependencyVar {
    name: String,
    var: String,
    root: String,
}

#[derive(Serialize)]
struct BuildInfoTemplate {
    reference: String,
    name: String,
    version: String,
    settings: Vec<SettingVar>,
    dependencies: Vec<DependencyVar>,
}

/// CMake variable suffix for a package name.
fn cmake_var(name: &str) -> String {
    name.to_uppercase().replace(['-', '.'], "_")
}

/// Writes the CMake include that points the build at its dependencies.
#[derive(Debug)]
pub struct Generator {
    settings: Arc<EngineSettings>,
}

impl Generator {
    pub fn new(settings: Arc<EngineSettings>) -> Self {
        Generator { settings }
    }

    pub fn dependency_root(&self, dependency: &Dependency) -> PathBuf {
        let reference = &dependency.reference;

        self.settings
            .deps_path()
            .join(&reference.name)
            .join(&reference.version)
            .join(&reference.user)
            .join(&reference.channel)
    }

    pub fn render(
        &self,
        recipe: &Recipe,
        settings: &Settings,
        dependencies: &DependencySet,
    ) -> anyhow::Result<String> {
        let vars = BuildInfoTemplate {
            reference: recipe.reference(),
            name: recipe.name.clone(),
            version: recipe.version.clone(),
            settings: settings
                .values(&recipe.settings)
                .into_iter()
                .map(|(key, value)| SettingVar {
                    key: cmake_var(&key),
                    value,
                })
                .collect(),
            dependencies: dependencies
                .iter()
                .map(|x| DependencyVar {
                    name: x.name().to_string(),
                    var: cmake_var(x.name()),
                    root: self.dependency_root(x).to_string_lossy().replace('\\', "/"),
                })
                .collect(),
        };

        let mut engine = Handlebars::new();
        engine.register_escape_fn(handlebars::no_escape);
        engine.set_strict_mode(true);

        Ok(engine.render_template(BUILD_INFO_TEMPLATE, &vars)?)
    }

    /// Renders the build info into the recipe's build directory, which must
    /// exist.
    pub async fn write(
        &self,
        recipe: &Recipe,
        settings: &Settings,
        dependencies: &DependencySet,
    ) -> anyhow::Result<PathBuf> {
        let path = self
            .settings
            .build_path_for_recipe(recipe)
            .join(BUILD_INFO_FILE);

        let content = self.render(recipe, settings, dependencies)?;
        tokio::fs::write(&path, content).await?;
        debug!(path = %path.display(), "wrote build info");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::revisions;
    use crate::engine::options::{OptionOverride, OptionSet};
    use crate::engine::resolver::resolve_dependencies;
    use crate::engine::settings::{Arch, BuildType, CompilerKind, Os};

    fn render(input: &[&str]) -> String {
        let recipe = revisions::find("0.1.2").unwrap().load().unwrap();
        let overrides: Vec<OptionOverride> = input.iter().map(|x| x.parse().unwrap()).collect();
        let options = OptionSet::for_recipe(&recipe, &overrides).unwrap();
        let deps = resolve_dependencies(&recipe, &options);
        let settings = Settings::new(Os::Linux, CompilerKind::Gcc, BuildType::Release, Arch::X86_64);

        let generator = Generator::new(Arc::new(
            EngineSettings::default().with_deps_path("/opt/deps"),
        ));

        generator.render(&recipe, &settings, &deps).unwrap()
    }

    #[test]
    fn points_at_dependency_roots() {
        let text = render(&["dzip=True"]);

        assert!(text.contains("set(CONAN_PACKAGE_NAME csio)"));
        assert!(text.contains("set(CONAN_SETTINGS_BUILD_TYPE \"Release\")"));
        assert!(text.contains("set(CONAN_ZLIB_ROOT \"/opt/deps/zlib/1.2.8/lasote/stable\")"));
        assert!(text.contains(
            "set(CONAN_INCLUDE_DIRS_GLOG \"/opt/deps/glog/0.3.4/dwerner/testing/include\")"
        ));
        assert!(text.contains("set(CONAN_DEPENDENCIES zlib libzmq glog)"));
        assert!(text.contains("include_directories(${CONAN_INCLUDE_DIRS})"));
    }

    #[test]
    fn only_resolved_dependencies_appear() {
        let text = render(&[]);

        assert!(text.contains("set(CONAN_DEPENDENCIES zlib)"));
        assert!(!text.contains("LIBZMQ"));
        assert!(!text.contains("GLOG"));
    }
}
