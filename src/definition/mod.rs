pub mod actions;
pub mod build_style;
pub mod parsing;
pub mod reference;
pub mod revisions;

use crate::definition::build_style::BuildStyle;
use crate::definition::parsing::ParseDocument;
use crate::definition::reference::Reference;
use crate::engine::options::OptionSet;
use kdl::KdlDocument;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Settings a recipe may declare as affecting its binaries.
pub const SETTING_NAMES: &[&str] = &["os", "compiler", "build_type", "arch"];

#[derive(Default, Debug, Clone)]
pub struct Document {
    pub recipes: Vec<Recipe>,
}

#[derive(Default, Debug, Clone)]
pub struct Recipe {
    pub name: String,
    pub version: String,
    pub description: String,
    pub url: Option<String>,
    pub license: Vec<String>,
    pub settings: Vec<String>,
    pub options: Vec<OptionDecl>,
    pub exports: Vec<String>,
    pub requires: Vec<Requirement>,
    pub dependency_options: Vec<DependencyOption>,
    pub style: BuildStyle,
    pub package: Vec<CopyRule>,
    pub libs: Vec<String>,
}

impl Recipe {
    /// Parses a source holding exactly one recipe, rejecting documents with
    /// any diagnostics.
    pub fn from_source(source: &str, filename: &str) -> miette::Result<Recipe> {
        let kdl_document: KdlDocument = source.parse()?;
        let mut document = Document::parse_document_strict(&kdl_document, source, Some(filename))?;

        if document.recipes.len() != 1 {
            return Err(miette::miette!(
                "{} must define exactly one recipe, found {}",
                filename,
                document.recipes.len()
            ));
        }

        Ok(document.recipes.remove(0))
    }

    pub fn from_file(path: &std::path::Path) -> miette::Result<Recipe> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| miette::miette!("failed reading {}: {}", path.display(), e))?;

        Self::from_source(&source, &path.display().to_string())
    }

    pub fn reference(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    pub fn declares_option(&self, name: &str) -> bool {
        self.options.iter().any(|x| x.name == name)
    }

    /// Directory name shared by the export, build and package trees.
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OptionDecl {
    pub name: String,
    pub default: bool,
}

/// Gate on a recipe option, attached to requirements and copy rules.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub enum Condition {
    #[default]
    Always,
    Enabled(String),
    Disabled(String),
}

impl Condition {
    pub fn holds(&self, options: &OptionSet) -> bool {
        match self {
            Condition::Always => true,
            Condition::Enabled(name) => options.is_enabled(name),
            Condition::Disabled(name) => !options.is_enabled(name),
        }
    }

    pub fn option(&self) -> Option<&str> {
        match self {
            Condition::Always => None,
            Condition::Enabled(name) | Condition::Disabled(name) => Some(name),
        }
    }

    /// Whether no option set can satisfy both conditions at once.
    pub fn excludes(&self, other: &Condition) -> bool {
        match (self, other) {
            (Condition::Enabled(a), Condition::Disabled(b))
            | (Condition::Disabled(a), Condition::Enabled(b)) => a == b,
            _ => false,
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Always => write!(f, "always"),
            Condition::Enabled(name) => write!(f, "when {}", name),
            Condition::Disabled(name) => write!(f, "unless {}", name),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Requirement {
    pub reference: Reference,
    pub when: Condition,
}

/// Option value pinned on a dependency, e.g. `glog:shared=False`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DependencyOption {
    pub package: String,
    pub option: String,
    pub value: bool,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum DependencyOptionError {
    #[error("dependency option `{0}` should look like package:option=value")]
    Malformed(String),

    #[error("`{value}` is not a boolean value for {option}")]
    InvalidValue { option: String, value: String },
}

impl FromStr for DependencyOption {
    type Err = DependencyOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DependencyOptionError::Malformed(s.to_string());

        let (package, rest) = s.split_once(':').ok_or_else(malformed)?;
        let (option, value) = rest.split_once('=').ok_or_else(malformed)?;
        if package.is_empty() || option.is_empty() {
            return Err(malformed());
        }

        let value = parse_flag(value).ok_or_else(|| DependencyOptionError::InvalidValue {
            option: format!("{}:{}", package, option),
            value: value.to_string(),
        })?;

        Ok(DependencyOption {
            package: package.to_string(),
            option: option.to_string(),
            value,
        })
    }
}

impl Display for DependencyOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}={}",
            self.package,
            self.option,
            flag_name(self.value)
        )
    }
}

/// One packaging rule: files matching `pattern` under the build directory's
/// `src` are copied into the package's `dst` category.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CopyRule {
    pub pattern: String,
    pub src: String,
    pub dst: String,
    pub when: Condition,
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "True" | "true" | "1" => Some(true),
        "False" | "false" | "0" => Some(false),
        _ => None,
    }
}

pub fn flag_name(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_option_parses_conan_syntax() {
        let opt: DependencyOption = "glog:shared=False".parse().unwrap();
        assert_eq!(opt.package, "glog");
        assert_eq!(opt.option, "shared");
        assert!(!opt.value);
        assert_eq!(opt.to_string(), "glog:shared=False");
    }

    #[test]
    fn dependency_option_rejects_missing_package() {
        assert_eq!(
            "shared=False".parse::<DependencyOption>(),
            Err(DependencyOptionError::Malformed("shared=False".into()))
        );
        assert!(matches!(
            "zlib:shared=maybe".parse::<DependencyOption>(),
            Err(DependencyOptionError::InvalidValue { .. })
        ));
    }

    #[test]
    fn opposite_conditions_on_same_option_exclude() {
        let on = Condition::Enabled("dzip".into());
        let off = Condition::Disabled("dzip".into());
        assert!(on.excludes(&off));
        assert!(!on.excludes(&on));
        assert!(!Condition::Always.excludes(&off));
        assert!(!on.excludes(&Condition::Disabled("shared".into())));
    }
}
