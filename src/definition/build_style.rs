/// Install prefix used when a cmake recipe does not name one.
pub const DEFAULT_INSTALL_PREFIX: &str = "./distr";

#[derive(Debug, Clone, Default)]
pub struct BuildStyle {
    pub style: BuildStyleType,
    pub vars: BuildStyleVariables,
}

#[derive(Debug, Clone, Eq, PartialEq, Copy)]
pub enum BuildStyleType {
    Noop,
    CMake,
}

impl BuildStyleType {
    pub fn parse<T: AsRef<str>>(data: T) -> Option<BuildStyleType> {
        Some(match data.as_ref() {
            "noop" => BuildStyleType::Noop,
            "cmake" => BuildStyleType::CMake,
            _ => return None,
        })
    }
}

impl Default for BuildStyleType {
    fn default() -> Self {
        BuildStyleType::Noop
    }
}

#[derive(Default, Debug, Clone)]
pub struct BuildStyleVariables {
    pub install_prefix: Option<String>,
    pub defines: Vec<Define>,
    pub option_defines: Vec<OptionDefine>,
    pub cmake_args: Option<Vec<String>>,
}

impl BuildStyleVariables {
    pub fn install_prefix(&self) -> &str {
        self.install_prefix
            .as_deref()
            .unwrap_or(DEFAULT_INSTALL_PREFIX)
    }
}

/// A fixed `-D<name>=<value>` passed at configure time.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Define {
    pub name: String,
    pub value: String,
}

/// A `-D<name>=1|0` mirroring a recipe option.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OptionDefine {
    pub name: String,
    pub option: String,
}
