pub mod cmake;

use crate::definition::actions::{Action, Stage};
use crate::definition::build_style::BuildStyleType;
use crate::definition::Recipe;
use crate::engine::options::OptionSet;
use crate::engine::settings::Settings;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub struct BuildStyle {
    pub configure: &'static [Action],
    pub build: &'static [Action],
    pub install: &'static [Action],
}

pub const EMPTY_ACTIONS: &[Action] = &[];

const NOOP: BuildStyle = BuildStyle {
    configure: EMPTY_ACTIONS,
    build: EMPTY_ACTIONS,
    install: EMPTY_ACTIONS,
};

const CMAKE: BuildStyle = BuildStyle {
    configure: &[Action::CMakeConfigure],
    build: &[Action::CMakeBuild],
    install: &[Action::CMakeInstall],
};

pub fn get_build_style(style: BuildStyleType) -> &'static BuildStyle {
    match style {
        BuildStyleType::Noop => &NOOP,
        BuildStyleType::CMake => &CMAKE,
    }
}

impl BuildStyle {
    pub fn actions(&self, stage: Stage) -> &'static [Action] {
        match stage {
            Stage::Configure => self.configure,
            Stage::Build => self.build,
            Stage::Install => self.install,
            _ => EMPTY_ACTIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Tool {
    CMake,
    Make,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::CMake => "cmake",
            Tool::Make => "make",
        }
    }
}

/// One external process: the tool to run and its argument vector.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Invocation {
    pub stage: Stage,
    pub tool: Tool,
    pub args: Vec<String>,
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tool.name())?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }

        Ok(())
    }
}

pub fn option_flag(enabled: bool) -> &'static str {
    if enabled {
        "1"
    } else {
        "0"
    }
}

/// The `-D` defines handed to the configure step, in the order they are
/// passed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BuildParameters {
    pub install_prefix: String,
    pub defines: Vec<(String, String)>,
}

impl BuildParameters {
    pub fn new(recipe: &Recipe, options: &OptionSet) -> Self {
        let vars = &recipe.style.vars;
        let install_prefix = vars.install_prefix().to_string();

        let mut defines: Vec<(String, String)> = vars
            .defines
            .iter()
            .map(|x| (x.name.clone(), x.value.clone()))
            .collect();

        defines.push(("CMAKE_INSTALL_PREFIX".to_string(), install_prefix.clone()));

        for define in &vars.option_defines {
            let value = option_flag(options.is_enabled(&define.option));
            defines.push((define.name.clone(), value.to_string()));
        }

        BuildParameters {
            install_prefix,
            defines,
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.defines
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_args(&self) -> Vec<String> {
        self.defines
            .iter()
            .map(|(k, v)| format!("-D{}={}", k, v))
            .collect()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BuildPlan {
    pub parameters: BuildParameters,
    pub invocations: Vec<Invocation>,
}

impl BuildPlan {
    pub fn new(
        recipe: &Recipe,
        options: &OptionSet,
        settings: &Settings,
        source_dir: &Path,
        jobs: usize,
    ) -> Self {
        let parameters = BuildParameters::new(recipe, options);
        let style = get_build_style(recipe.style.style);

        let mut invocations = vec![];
        for stage in [Stage::Configure, Stage::Build, Stage::Install] {
            for action in style.actions(stage) {
                invocations.push(invocation(
                    *action,
                    stage,
                    recipe,
                    &parameters,
                    settings,
                    source_dir,
                    jobs,
                ));
            }
        }

        BuildPlan {
            parameters,
            invocations,
        }
    }

    pub fn for_stage(&self, stage: Stage) -> impl Iterator<Item = &Invocation> {
        self.invocations.iter().filter(move |x| x.stage == stage)
    }
}

fn invocation(
    action: Action,
    stage: Stage,
    recipe: &Recipe,
    parameters: &BuildParameters,
    settings: &Settings,
    source_dir: &Path,
    jobs: usize,
) -> Invocation {
    let generator = cmake::generator(settings);

    let (tool, args) = match action {
        Action::CMakeConfigure => {
            let mut args = vec![source_dir.to_string_lossy().into_owned()];
            args.extend(cmake::command_line(settings));

            if let Some(extra) = &recipe.style.vars.cmake_args {
                args.extend(extra.iter().cloned());
            }

            args.extend(parameters.to_args());
            (Tool::CMake, args)
        }

        Action::CMakeBuild => {
            let mut args = vec!["--build".to_string(), ".".to_string()];
            args.extend(cmake::build_config(settings));

            if cmake::is_makefiles(&generator) {
                args.push("--".to_string());
                args.push(format!("-j{}", jobs));
            }

            (Tool::CMake, args)
        }

        Action::CMakeInstall if generator == cmake::UNIX_MAKEFILES => {
            (Tool::Make, vec!["install".to_string()])
        }

        Action::CMakeInstall => {
            let mut args = vec![
                "--build".to_string(),
                ".".to_string(),
                "--target".to_string(),
                "install".to_string(),
            ];
            args.extend(cmake::build_config(settings));
            (Tool::CMake, args)
        }
    };

    Invocation { stage, tool, args }
}
