use crate::definition::Recipe;
use crate::engine::options::OptionSet;
use crate::engine::resolver::DependencySet;
use crate::engine::settings::Settings;
use hex::ToHex;
use ring::digest::{Context, SHA256};

/// Canonical description of one binary configuration. Only settings the
/// recipe declares take part.
pub fn info_text(
    recipe: &Recipe,
    settings: &Settings,
    options: &OptionSet,
    dependencies: &DependencySet,
) -> String {
    let mut text = String::from("[settings]\n");
    for (key, value) in settings.values(&recipe.settings) {
        text.push_str(&format!("    {}={}\n", key, value));
    }

    text.push_str("[options]\n");
    for pair in options.to_pairs() {
        text.push_str(&format!("    {}\n", pair));
    }

    text.push_str("[requires]\n");
    let mut requires: Vec<String> = dependencies
        .iter()
        .map(|x| x.reference.to_string())
        .collect();
    requires.sort();
    for reference in requires {
        text.push_str(&format!("    {}\n", reference));
    }

    text
}

pub fn package_id(
    recipe: &Recipe,
    settings: &Settings,
    options: &OptionSet,
    dependencies: &DependencySet,
) -> String {
    let mut context = Context::new(&SHA256);
    context.update(info_text(recipe, settings, options, dependencies).as_bytes());
    context.finish().encode_hex::<String>()
}
