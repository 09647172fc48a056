use crate::definition::reference::Reference;
use crate::definition::{flag_name, Recipe};
use crate::engine::options::OptionSet;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Dependency {
    pub reference: Reference,
    pub options: BTreeMap<String, bool>,
}

impl Dependency {
    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn version(&self) -> &str {
        &self.reference.version
    }

    pub fn source_channel(&self) -> String {
        self.reference.source_channel()
    }

    pub fn option_pairs(&self) -> Vec<String> {
        self.options
            .iter()
            .map(|(k, v)| format!("{}:{}={}", self.name(), k, flag_name(*v)))
            .collect()
    }
}

/// Dependencies of one build, in recipe declaration order.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct DependencySet {
    dependencies: Vec<Dependency>,
}

impl DependencySet {
    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.dependencies.iter()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|x| x.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.dependencies.iter().map(Dependency::name).collect()
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Requirements whose condition holds under `options`, each carrying the
/// recipe's option defaults for it with the caller's overrides on top.
pub fn resolve_dependencies(recipe: &Recipe, options: &OptionSet) -> DependencySet {
    let dependencies = recipe
        .requires
        .iter()
        .filter(|x| x.when.holds(options))
        .map(|requirement| {
            let name = &requirement.reference.name;

            let dependency_options = recipe
                .dependency_options
                .iter()
                .chain(options.dependency_overrides())
                .filter(|x| x.package == *name)
                .map(|x| (x.option.clone(), x.value))
                .collect();

            Dependency {
                reference: requirement.reference.clone(),
                options: dependency_options,
            }
        })
        .collect();

    DependencySet { dependencies }
}
