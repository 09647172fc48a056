use crate::definition::build_style::{
    BuildStyle, BuildStyleType, BuildStyleVariables, Define, OptionDefine,
};
use crate::definition::reference::Reference;
use crate::definition::{
    Condition, CopyRule, DependencyOption, Document, OptionDecl, Recipe, Requirement,
    SETTING_NAMES,
};
use kdl::{KdlDocument, KdlEntry, KdlNode};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[error("Failed parsing recipe document")]
pub struct RecipeParserCompoundError {
    #[source_code]
    pub source_code: NamedSource,
    #[related]
    pub(crate) errors: Vec<RecipeParseError>,
}

impl RecipeParserCompoundError {
    fn new(source: &str, filename: Option<&str>, errors: Vec<RecipeParseError>) -> Self {
        RecipeParserCompoundError {
            source_code: NamedSource::new(
                filename
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "[memory.kdl]".to_string()),
                source.to_string(),
            ),
            errors,
        }
    }

    #[cfg(test)]
    pub fn errors(&self) -> &[RecipeParseError] {
        &self.errors
    }
}

#[derive(Debug, Diagnostic, Eq, PartialEq, Error)]
#[error("{kind}")]
pub struct RecipeParseError {
    /// Offset in chars of the error.
    #[label("{}", label.unwrap_or("here"))]
    pub span: SourceSpan,

    /// Label text for this span. Defaults to `"here"`.
    pub label: Option<&'static str>,

    /// Suggestion for fixing the parser error.
    #[help]
    pub help: Option<String>,

    /// Specific error kind for this parser error.
    pub kind: &'static str,
}

impl RecipeParseError {
    pub fn new(span: SourceSpan, kind: &'static str) -> Self {
        RecipeParseError {
            span,
            label: None,
            help: None,
            kind,
        }
    }

    fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    fn with_help<T: ToString>(mut self, help: T) -> Self {
        self.help = Some(help.to_string());
        self
    }
}

const EMPTY_NODES: &[KdlNode] = &[];

pub(crate) trait GetNodes {
    fn nodes(&self) -> &[KdlNode];
}

impl GetNodes for KdlNode {
    fn nodes(&self) -> &[KdlNode] {
        self.children().map_or(EMPTY_NODES, |x| x.nodes())
    }
}

pub trait ParseDocument {
    fn parse_document_strict(
        input: &KdlDocument,
        source: &str,
        filename: Option<&str>,
    ) -> miette::Result<Self>
    where
        Self: Sized,
    {
        let (data, errors) = Self::parse_document_with_errors(input);

        match data {
            Some(obj) if errors.is_empty() => Ok(obj),
            _ => Err(RecipeParserCompoundError::new(source, filename, errors).into()),
        }
    }

    fn parse_document_with_errors(input: &KdlDocument) -> (Option<Self>, Vec<RecipeParseError>)
    where
        Self: Sized;
}

pub trait ParseNode {
    fn parse_node_with_errors(input: &KdlNode) -> (Option<Self>, Vec<RecipeParseError>)
    where
        Self: Sized;
}

macro_rules! parse_string_into {
    ($input:ident, $into:expr, $errors:expr, $name:literal) => {
        match $crate::definition::parsing::extract_single_string_value(
            $input,
            concat!($name, " missing"),
            concat!($name, " should be a string"),
            concat!("only 1 string expected for ", $name),
        ) {
            Ok(n) => $into = n.into(),
            Err(e) => $errors.push(e),
        };
    };
}

macro_rules! parse_string_list_into {
    ($input:ident, $into:expr, $errors:expr, $name:literal) => {
        match $crate::definition::parsing::extract_string_values(
            $input,
            concat!($name, " expects only string values"),
        ) {
            Ok(n) => $into.extend(n),
            Err(e) => $errors.push(e),
        };
    };
}

impl ParseDocument for Document {
    fn parse_document_with_errors(input: &KdlDocument) -> (Option<Self>, Vec<RecipeParseError>)
    where
        Self: Sized,
    {
        let mut recipes = vec![];
        let mut errors = vec![];

        for node in input.nodes() {
            match node.name().value() {
                "recipe" => {
                    let (recipe, err) = Recipe::parse_node_with_errors(node);
                    if let Some(recipe) = recipe {
                        recipes.push(recipe);
                    }
                    errors.extend(err);
                }

                _ => errors.push(
                    RecipeParseError::new(*node.name().span(), "unknown top-level node")
                        .with_help("a recipe document only holds `recipe` nodes"),
                ),
            }
        }

        (Some(Document { recipes }), errors)
    }
}

impl ParseNode for Recipe {
    fn parse_node_with_errors(input: &KdlNode) -> (Option<Self>, Vec<RecipeParseError>)
    where
        Self: Sized,
    {
        let mut errors: Vec<RecipeParseError> = vec![];

        let mut name: String = "<unnamed>".to_string();
        let mut found_version = false;
        let mut version: String = "0.0.0".to_string();
        let mut description: String = "".to_string();
        let mut url: Option<String> = None;
        let mut license: Vec<String> = vec![];
        let mut settings: Vec<String> = vec![];
        let mut options: Vec<OptionDecl> = vec![];
        let mut exports: Vec<String> = vec![];
        let mut requires: Vec<(Requirement, SourceSpan)> = vec![];
        let mut dependency_options: Vec<DependencyOption> = vec![];
        let mut style: Option<BuildStyle> = None;
        let mut package: Vec<CopyRule> = vec![];
        let mut libs: Vec<String> = vec![];

        parse_string_into!(input, name, errors, "name of recipe");
        errors.extend(check_properties(input, &[]));

        for node in input.nodes() {
            match node.name().value() {
                "version" => {
                    found_version = true;
                    parse_string_into!(node, version, errors, "version");
                }

                "description" => {
                    parse_string_into!(node, description, errors, "description");
                }

                "url" => {
                    parse_string_into!(node, url, errors, "url");
                }

                "license" => {
                    parse_string_list_into!(node, license, errors, "license");
                }

                "settings" => {
                    parse_string_list_into!(node, settings, errors, "settings");

                    for entry in positional(node) {
                        if let Some(setting) = entry.value().as_string() {
                            if !SETTING_NAMES.contains(&setting) {
                                errors.push(
                                    RecipeParseError::new(*entry.span(), "unknown setting")
                                        .with_help(format!(
                                            "known settings are {}",
                                            SETTING_NAMES.join(", ")
                                        )),
                                );
                            }
                        }
                    }
                }

                "option" => {
                    let (opt, err) = OptionDecl::parse_node_with_errors(node);
                    errors.extend(err);

                    if let Some(opt) = opt {
                        if options.iter().any(|x| x.name == opt.name) {
                            errors.push(
                                RecipeParseError::new(*node.span(), "option declared twice")
                                    .with_label("second declaration here"),
                            );
                        } else {
                            options.push(opt);
                        }
                    }
                }

                "exports" => {
                    parse_string_list_into!(node, exports, errors, "exports");
                }

                "requires" => {
                    let (requirement, err) = Requirement::parse_node_with_errors(node);
                    errors.extend(err);

                    if let Some(requirement) = requirement {
                        requires.push((requirement, *node.span()));
                    }
                }

                "dependency-options" => {
                    errors.extend(check_properties(node, &[]));

                    for entry in positional(node) {
                        let value = match entry.value().as_string() {
                            Some(v) => v,
                            None => {
                                errors.push(RecipeParseError::new(
                                    *entry.span(),
                                    "dependency options should be strings",
                                ));
                                continue;
                            }
                        };

                        match value.parse::<DependencyOption>() {
                            Ok(opt) => dependency_options.push(opt),
                            Err(e) => errors.push(
                                RecipeParseError::new(*entry.span(), "invalid dependency option")
                                    .with_help(e),
                            ),
                        }
                    }
                }

                "style" => {
                    if style.is_some() {
                        errors.push(
                            RecipeParseError::new(
                                *node.span(),
                                "redefinition of style, can only have one build style",
                            )
                            .with_label("second definition of style here"),
                        );
                        continue;
                    }

                    let (styl, err) = BuildStyle::parse_node_with_errors(node);
                    errors.extend(err);

                    if let Some(styl) = styl {
                        style = Some(styl);
                    }
                }

                "package" => {
                    let (rules, err) = Vec::<CopyRule>::parse_node_with_errors(node);
                    errors.extend(err);

                    if let Some(rules) = rules {
                        package.extend(rules);
                    }
                }

                "libs" => {
                    parse_string_list_into!(node, libs, errors, "libs");
                }

                _ => errors.push(RecipeParseError::new(
                    *node.name().span(),
                    "unknown recipe node",
                )),
            }
        }

        if !found_version {
            errors.push(RecipeParseError::new(
                *input.span(),
                "recipe missing version",
            ));
        }

        for (idx, (later, span)) in requires.iter().enumerate() {
            let clash = requires[..idx].iter().any(|(earlier, _)| {
                earlier.reference.name == later.reference.name && !earlier.when.excludes(&later.when)
            });

            if clash {
                errors.push(
                    RecipeParseError::new(*span, "package required more than once")
                        .with_label("second requirement here")
                        .with_help("requirements of the same package need opposite conditions"),
                );
            }
        }

        let mut references = vec![];
        for node in input.nodes() {
            option_references(node, &mut references);
        }

        for (option, span) in references {
            if !options.iter().any(|x| x.name == option) {
                errors.push(
                    RecipeParseError::new(span, "reference to undeclared option")
                        .with_help(format!("declare it with `option \"{}\" default=false`", option)),
                );
            }
        }

        let recipe = Recipe {
            name,
            version,
            description,
            url,
            license,
            settings,
            options,
            exports,
            requires: requires.into_iter().map(|(x, _)| x).collect(),
            dependency_options,
            style: style.unwrap_or_default(),
            package,
            libs,
        };

        (Some(recipe), errors)
    }
}

impl ParseNode for OptionDecl {
    fn parse_node_with_errors(input: &KdlNode) -> (Option<Self>, Vec<RecipeParseError>)
    where
        Self: Sized,
    {
        let mut errors = check_properties(input, &["default"]);
        let mut name: Option<String> = None;
        parse_string_into!(input, name, errors, "option name");

        let default = match extract_bool_property(input, "default", "option default should be a bool") {
            Ok(v) => v.unwrap_or(false),
            Err(e) => {
                errors.push(e);
                false
            }
        };

        (name.map(|name| OptionDecl { name, default }), errors)
    }
}

impl ParseNode for Requirement {
    fn parse_node_with_errors(input: &KdlNode) -> (Option<Self>, Vec<RecipeParseError>)
    where
        Self: Sized,
    {
        let mut errors = check_properties(input, &["when", "unless"]);
        let mut raw: Option<String> = None;
        parse_string_into!(input, raw, errors, "requirement reference");

        let when = match extract_condition(input) {
            Ok(v) => v,
            Err(e) => {
                errors.push(e);
                Condition::Always
            }
        };

        let reference = raw.and_then(|raw| match raw.parse::<Reference>() {
            Ok(r) => Some(r),
            Err(e) => {
                let span = positional(input).next().map_or(*input.span(), |x| *x.span());
                errors.push(RecipeParseError::new(span, "invalid package reference").with_help(e));
                None
            }
        });

        (reference.map(|reference| Requirement { reference, when }), errors)
    }
}

impl ParseNode for Vec<CopyRule> {
    fn parse_node_with_errors(input: &KdlNode) -> (Option<Self>, Vec<RecipeParseError>)
    where
        Self: Sized,
    {
        let mut rules = vec![];
        let mut errors = check_properties(input, &[]);

        for node in input.nodes() {
            if node.name().value() != "copy" {
                errors.push(
                    RecipeParseError::new(*node.name().span(), "unknown package rule")
                        .with_help("package rules are written as `copy \"<pattern>\" src=.. dst=..`"),
                );
                continue;
            }

            let (rule, err) = CopyRule::parse_node_with_errors(node);
            errors.extend(err);

            if let Some(rule) = rule {
                rules.push(rule);
            }
        }

        (Some(rules), errors)
    }
}

impl ParseNode for CopyRule {
    fn parse_node_with_errors(input: &KdlNode) -> (Option<Self>, Vec<RecipeParseError>)
    where
        Self: Sized,
    {
        let mut errors = check_properties(input, &["src", "dst", "when", "unless"]);
        let mut pattern: Option<String> = None;
        parse_string_into!(input, pattern, errors, "copy pattern");

        let src = extract_string_property(input, "src", "copy src should be a string")
            .unwrap_or_else(|e| {
                errors.push(e);
                None
            });

        let dst = extract_string_property(input, "dst", "copy dst should be a string")
            .unwrap_or_else(|e| {
                errors.push(e);
                None
            });

        if dst.is_none() {
            errors.push(RecipeParseError::new(
                *input.span(),
                "copy rule requires a dst category",
            ));
        }

        let when = extract_condition(input).unwrap_or_else(|e| {
            errors.push(e);
            Condition::Always
        });

        let rule = match (pattern, dst) {
            (Some(pattern), Some(dst)) => Some(CopyRule {
                pattern,
                src: src.unwrap_or_else(|| ".".to_string()),
                dst,
                when,
            }),
            _ => None,
        };

        (rule, errors)
    }
}

impl ParseNode for BuildStyle {
    fn parse_node_with_errors(input: &KdlNode) -> (Option<Self>, Vec<RecipeParseError>)
    where
        Self: Sized,
    {
        let mut errors = vec![];
        let mut style: Option<String> = None;
        parse_string_into!(input, style, errors, "name of build style");
        let style = style.and_then(BuildStyleType::parse);

        let style = if let Some(style) = style {
            style
        } else {
            let span = positional(input).next().map_or(*input.span(), |x| *x.span());
            errors.push(
                RecipeParseError::new(span, "unknown build style found")
                    .with_help("supported styles are cmake and noop"),
            );

            BuildStyleType::Noop
        };

        let (vars, err) = BuildStyleVariables::parse_node_with_errors(input);
        errors.extend(err);

        (vars.map(|vars| BuildStyle { style, vars }), errors)
    }
}

impl ParseNode for BuildStyleVariables {
    fn parse_node_with_errors(input: &KdlNode) -> (Option<Self>, Vec<RecipeParseError>)
    where
        Self: Sized,
    {
        let mut vars = BuildStyleVariables::default();
        let mut errors = vec![];

        for node in input.nodes() {
            match node.name().value() {
                "install-prefix" => {
                    parse_string_into!(node, vars.install_prefix, errors, "install prefix");
                }

                "define" => {
                    if let Some([name, value]) = extract_pair(node, &mut errors) {
                        vars.defines.push(Define { name, value });
                    }
                }

                "option-define" => {
                    if let Some([name, option]) = extract_pair(node, &mut errors) {
                        vars.option_defines.push(OptionDefine { name, option });
                    }
                }

                "cmake-args" => {
                    let mut args = vec![];
                    parse_string_list_into!(node, args, errors, "cmake args");
                    vars.cmake_args.get_or_insert_with(Vec::new).extend(args);
                }

                _ => errors.push(RecipeParseError::new(
                    *node.name().span(),
                    "unknown build style variable",
                )),
            }
        }

        (Some(vars), errors)
    }
}

/// Collects every option named by a `when`/`unless` property or an
/// `option-define` node below `input`.
fn option_references(input: &KdlNode, found: &mut Vec<(String, SourceSpan)>) {
    for entry in input.entries() {
        let is_condition = entry
            .name()
            .map_or(false, |x| matches!(x.value(), "when" | "unless"));

        if is_condition {
            if let Some(v) = entry.value().as_string() {
                found.push((v.to_string(), *entry.span()));
            }
        }
    }

    if input.name().value() == "option-define" {
        if let Some(entry) = positional(input).nth(1) {
            if let Some(v) = entry.value().as_string() {
                found.push((v.to_string(), *entry.span()));
            }
        }
    }

    for node in input.nodes() {
        option_references(node, found);
    }
}

fn positional(input: &KdlNode) -> impl Iterator<Item = &KdlEntry> {
    input.entries().iter().filter(|x| x.name().is_none())
}

fn property<'a>(input: &'a KdlNode, key: &str) -> Option<&'a KdlEntry> {
    input
        .entries()
        .iter()
        .find(|x| x.name().map_or(false, |n| n.value() == key))
}

fn span_of(entries: &[&KdlEntry]) -> Option<SourceSpan> {
    let first = entries.first()?;
    let last = entries.last()?;
    let start = first.span().offset();
    let end = last.span().offset() + last.span().len();

    Some(SourceSpan::new(start.into(), (end - start).into()))
}

fn check_properties(input: &KdlNode, allowed: &[&str]) -> Vec<RecipeParseError> {
    input
        .entries()
        .iter()
        .filter_map(|entry| {
            let key = entry.name()?;
            if allowed.contains(&key.value()) {
                return None;
            }

            let help = if allowed.is_empty() {
                format!("`{}` takes no properties", input.name().value())
            } else {
                format!("expected one of: {}", allowed.join(", "))
            };

            Some(RecipeParseError::new(*entry.span(), "unknown property").with_help(help))
        })
        .collect()
}

fn extract_condition(input: &KdlNode) -> Result<Condition, RecipeParseError> {
    let when = extract_string_property(input, "when", "when should name an option")?;
    let unless = extract_string_property(input, "unless", "unless should name an option")?;

    match (when, unless) {
        (Some(_), Some(_)) => Err(RecipeParseError::new(
            *input.span(),
            "only one of when and unless may be given",
        )),
        (Some(option), None) => Ok(Condition::Enabled(option)),
        (None, Some(option)) => Ok(Condition::Disabled(option)),
        (None, None) => Ok(Condition::Always),
    }
}

fn extract_pair(input: &KdlNode, errors: &mut Vec<RecipeParseError>) -> Option<[String; 2]> {
    errors.extend(check_properties(input, &[]));

    match extract_string_values(input, "expected string values") {
        Ok(values) => match <[String; 2]>::try_from(values) {
            Ok(pair) => Some(pair),
            Err(_) => {
                errors.push(RecipeParseError::new(
                    *input.span(),
                    "expected exactly two values, a name and a value",
                ));
                None
            }
        },
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn extract_string_property(
    input: &KdlNode,
    key: &str,
    wrong_type_error: &'static str,
) -> Result<Option<String>, RecipeParseError> {
    match property(input, key) {
        None => Ok(None),
        Some(entry) => entry
            .value()
            .as_string()
            .map(|v| Some(v.to_string()))
            .ok_or_else(|| RecipeParseError::new(*entry.span(), wrong_type_error)),
    }
}

fn extract_bool_property(
    input: &KdlNode,
    key: &str,
    wrong_type_error: &'static str,
) -> Result<Option<bool>, RecipeParseError> {
    match property(input, key) {
        None => Ok(None),
        Some(entry) => entry
            .value()
            .as_bool()
            .map(Some)
            .ok_or_else(|| RecipeParseError::new(*entry.span(), wrong_type_error)),
    }
}

pub(crate) fn extract_single_string_value(
    input: &KdlNode,
    missing_error: &'static str,
    wrong_type_error: &'static str,
    too_many_error: &'static str,
) -> Result<String, RecipeParseError> {
    let values: Vec<&KdlEntry> = positional(input).collect();

    match values.as_slice() {
        [] => Err(RecipeParseError::new(*input.name().span(), missing_error)),

        [entry] => entry
            .value()
            .as_string()
            .map(ToString::to_string)
            .ok_or_else(|| RecipeParseError::new(*entry.span(), wrong_type_error)),

        _ => Err(RecipeParseError::new(
            span_of(&values).unwrap_or(*input.span()),
            too_many_error,
        )),
    }
}

pub(crate) fn extract_string_values(
    input: &KdlNode,
    wrong_type_error: &'static str,
) -> Result<Vec<String>, RecipeParseError> {
    positional(input)
        .map(|entry| {
            entry
                .value()
                .as_string()
                .map(ToString::to_string)
                .ok_or_else(|| RecipeParseError::new(*entry.span(), wrong_type_error))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Option<Document>, Vec<RecipeParseError>) {
        let kdl: KdlDocument = source.parse().unwrap();
        Document::parse_document_with_errors(&kdl)
    }

    fn kinds(errors: &[RecipeParseError]) -> Vec<&'static str> {
        errors.iter().map(|x| x.kind).collect()
    }

    const MINIMAL: &str = r#"
        recipe "csio" {
            version "1.0"
            settings "os" "arch"
            option "dzip" default=true
            option "shared"
            requires "zlib/1.2.8@lasote/stable"
            requires "libzmq/4.1.5@memsharded/stable" when="dzip"
            dependency-options "zlib:shared=False"
            style "cmake" {
                install-prefix "./out"
                define "WITH_CONAN" "1"
                option-define "WITH_dzip" "dzip"
                cmake-args "-Wdev"
            }
            package {
                copy "*.h" src="out/include" dst="include"
                copy "dzip" src="out/bin" dst="bin" unless="shared"
            }
            libs "csio"
        }
    "#;

    #[test]
    fn parses_complete_recipe() {
        let (doc, errors) = parse(MINIMAL);
        assert!(errors.is_empty(), "{:?}", errors);

        let recipe = &doc.unwrap().recipes[0];
        assert_eq!(recipe.name, "csio");
        assert_eq!(recipe.version, "1.0");
        assert_eq!(recipe.settings, vec!["os", "arch"]);
        assert_eq!(
            recipe.options,
            vec![
                OptionDecl {
                    name: "dzip".into(),
                    default: true
                },
                OptionDecl {
                    name: "shared".into(),
                    default: false
                },
            ]
        );
        assert_eq!(recipe.requires.len(), 2);
        assert_eq!(recipe.requires[1].when, Condition::Enabled("dzip".into()));
        assert_eq!(recipe.dependency_options[0].package, "zlib");
        assert_eq!(recipe.style.style, BuildStyleType::CMake);
        assert_eq!(recipe.style.vars.install_prefix(), "./out");
        assert_eq!(recipe.style.vars.option_defines[0].option, "dzip");
        assert_eq!(recipe.style.vars.cmake_args, Some(vec!["-Wdev".to_string()]));
        assert_eq!(recipe.package[1].when, Condition::Disabled("shared".into()));
        assert_eq!(recipe.libs, vec!["csio"]);
    }

    #[test]
    fn parses_metadata() {
        let (doc, errors) = parse(
            r#"
            recipe "csio" {
                version "0.1.2"
                description "compressed stream I/O"
                url "https://example.org/csio"
                license "MIT" "BSD-3-Clause"
            }
        "#,
        );

        assert!(errors.is_empty());
        let recipe = &doc.unwrap().recipes[0];
        assert_eq!(recipe.description, "compressed stream I/O");
        assert_eq!(recipe.url.as_deref(), Some("https://example.org/csio"));
        assert_eq!(recipe.license, vec!["MIT", "BSD-3-Clause"]);
    }

    #[test]
    fn reports_undeclared_options() {
        let (_, errors) = parse(
            r#"
            recipe "x" {
                version "1"
                requires "zlib/1.2.8@lasote/stable" when="zip"
                style "cmake" {
                    option-define "WITH_X" "x"
                }
            }
        "#,
        );

        assert_eq!(
            kinds(&errors),
            vec!["reference to undeclared option", "reference to undeclared option"]
        );
    }

    #[test]
    fn reports_missing_version_and_unknown_style() {
        let (_, errors) = parse(
            r#"
            recipe "x" {
                style "autotools"
            }
        "#,
        );

        assert_eq!(
            kinds(&errors),
            vec!["unknown build style found", "recipe missing version"]
        );
    }

    #[test]
    fn reports_overlapping_requirements() {
        let (_, errors) = parse(
            r#"
            recipe "x" {
                version "1"
                option "dzip"
                requires "zlib/1.2.8@lasote/stable" when="dzip"
                requires "zlib/1.2.11@conan/stable" unless="dzip"
                requires "zlib/1.2.11@conan/stable"
            }
        "#,
        );

        assert_eq!(kinds(&errors), vec!["package required more than once"]);
    }

    #[test]
    fn reports_malformed_entries() {
        let (_, errors) = parse(
            r#"
            recipe "x" {
                version "1"
                settings "os" "color"
                requires "zlib"
                dependency-options "zlib=False"
                package {
                    copy "*.h" src="include"
                    strip "bin"
                }
                colour "blue"
            }
        "#,
        );

        assert_eq!(
            kinds(&errors),
            vec![
                "unknown setting",
                "invalid package reference",
                "invalid dependency option",
                "copy rule requires a dst category",
                "unknown package rule",
                "unknown recipe node",
            ]
        );
    }

    #[test]
    fn reports_duplicate_options() {
        let (_, errors) = parse(
            r#"
            recipe "x" {
                version "1"
                option "dzip"
                option "shared"
                option "dzip" default=true
            }
        "#,
        );

        assert_eq!(kinds(&errors), vec!["option declared twice"]);
        assert_eq!(errors[0].label, Some("second declaration here"));
    }

    #[test]
    fn rejects_when_and_unless_together() {
        let (_, errors) = parse(
            r#"
            recipe "x" {
                version "1"
                option "a"
                requires "zlib/1.2.8@lasote/stable" when="a" unless="a"
            }
        "#,
        );

        assert_eq!(kinds(&errors), vec!["only one of when and unless may be given"]);
    }

    #[test]
    fn strict_parsing_wraps_errors_with_source() {
        let source = "recipe \"x\" {\n}\n";
        let kdl: KdlDocument = source.parse().unwrap();
        let err = Document::parse_document_strict(&kdl, source, Some("x.kdl")).unwrap_err();

        let compound = err.downcast_ref::<RecipeParserCompoundError>().unwrap();
        assert_eq!(kinds(compound.errors()), vec!["recipe missing version"]);
    }
}
