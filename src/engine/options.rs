use crate::definition::{flag_name, parse_flag, DependencyOption, Recipe};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum OptionError {
    #[error("option override `{0}` should look like [package:]name=value")]
    Malformed(String),

    #[error("`{value}` is not a boolean value for option {name}")]
    InvalidValue { name: String, value: String },

    #[error("recipe {recipe} has no option named {name}")]
    Unknown { recipe: String, name: String },
}

/// A `-o` value given by the caller, optionally scoped to a package.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OptionOverride {
    pub package: Option<String>,
    pub name: String,
    pub value: bool,
}

impl FromStr for OptionOverride {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| OptionError::Malformed(s.to_string()))?;

        let (package, name) = match key.split_once(':') {
            Some((package, name)) => (Some(package.to_string()), name),
            None => (None, key),
        };

        if name.is_empty() || package.as_deref() == Some("") {
            return Err(OptionError::Malformed(s.to_string()));
        }

        let value = parse_flag(value).ok_or_else(|| OptionError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        })?;

        Ok(OptionOverride {
            package,
            name: name.to_string(),
            value,
        })
    }
}

/// Concrete value for every option a recipe declares, plus the caller's
/// overrides of dependency options. Immutable once built.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct OptionSet {
    values: BTreeMap<String, bool>,
    dependency_overrides: Vec<DependencyOption>,
}

impl OptionSet {
    /// Starts from the recipe's declared defaults and applies `overrides` in
    /// order. Overrides scoped to another package are kept for the resolver.
    pub fn for_recipe(recipe: &Recipe, overrides: &[OptionOverride]) -> Result<Self, OptionError> {
        let mut values: BTreeMap<String, bool> = recipe
            .options
            .iter()
            .map(|x| (x.name.clone(), x.default))
            .collect();
        let mut dependency_overrides = vec![];

        for o in overrides {
            match &o.package {
                Some(package) if *package != recipe.name => {
                    dependency_overrides.retain(|x: &DependencyOption| {
                        !(x.package == *package && x.option == o.name)
                    });
                    dependency_overrides.push(DependencyOption {
                        package: package.clone(),
                        option: o.name.clone(),
                        value: o.value,
                    });
                }

                _ => match values.get_mut(&o.name) {
                    Some(v) => *v = o.value,
                    None => {
                        return Err(OptionError::Unknown {
                            recipe: recipe.name.clone(),
                            name: o.name.clone(),
                        })
                    }
                },
            }
        }

        Ok(OptionSet {
            values,
            dependency_overrides,
        })
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.values.get(name).copied()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn dependency_overrides(&self) -> &[DependencyOption] {
        &self.dependency_overrides
    }

    /// Every option as `name=True|False`, sorted by name.
    pub fn to_pairs(&self) -> Vec<String> {
        self.iter()
            .map(|(k, v)| format!("{}={}", k, flag_name(v)))
            .collect()
    }
}
