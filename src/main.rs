use crate::definition::{flag_name, revisions, Recipe};
use crate::engine::options::{OptionOverride, OptionSet};
use crate::engine::packager::Layout;
use crate::engine::settings::Settings;
use crate::engine::{Engine, EngineSettings, Plan};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod definition;
mod engine;
mod utils;

/// Builds and packages the csio compressed stream library
#[derive(Debug, Parser)]
#[command(name = "csio-recipe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the bundled recipe revisions
    Revisions,

    /// Show what a build would do without running it
    Inspect {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Export, build and package
    Create {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        engine: EngineArgs,

        /// Directory holding the library sources
        #[arg(long)]
        source: PathBuf,
    },

    /// Print what consumers link against
    Info {
        #[command(flatten)]
        recipe: RecipeArgs,
    },
}

#[derive(Debug, Args)]
struct RecipeArgs {
    /// Recipe file to load instead of a bundled revision
    #[arg(long, conflicts_with = "revision")]
    recipe: Option<PathBuf>,

    /// Bundled revision to use (default: latest)
    #[arg(long)]
    revision: Option<String>,

    /// Option override, e.g. dzip=True or zlib:shared=True
    #[arg(short = 'o', long = "option")]
    options: Vec<OptionOverride>,

    /// Settings override, e.g. build_type=Debug
    #[arg(short = 's', long = "setting")]
    settings: Vec<String>,
}

#[derive(Debug, Args)]
struct EngineArgs {
    /// Working root for export, build and package trees
    #[arg(long, default_value = ".csio")]
    root: PathBuf,

    /// CMake program to run
    #[arg(long, default_value = "cmake")]
    cmake: PathBuf,

    /// Make program to run
    #[arg(long, default_value = "make")]
    make: PathBuf,

    /// Directory holding installed dependencies
    #[arg(long)]
    deps: Option<PathBuf>,
}

impl RecipeArgs {
    fn load(&self) -> miette::Result<Recipe> {
        match (&self.recipe, &self.revision) {
            (Some(path), _) => Recipe::from_file(path),
            (None, Some(version)) => match revisions::find(version) {
                Some(revision) => revision.load(),
                None => Err(miette::miette!(
                    "no bundled revision {}, see `csio-recipe revisions`",
                    version
                )),
            },
            (None, None) => revisions::latest().load(),
        }
    }

    fn configure(&self, recipe: &Recipe) -> anyhow::Result<(OptionSet, Settings)> {
        let options = OptionSet::for_recipe(recipe, &self.options)?;

        let settings = Settings::resolve(&self.settings)?;

        Ok((options, settings))
    }
}

impl EngineArgs {
    fn engine(&self, source: Option<PathBuf>) -> anyhow::Result<Engine> {
        let mut settings = EngineSettings::default()
            .with_root(&self.root)
            .with_cmake_program(&self.cmake)
            .with_make_program(&self.make);

        if let Some(source) = source {
            settings = settings.with_source(source);
        }

        if let Some(deps) = &self.deps {
            settings = settings.with_deps_path(deps);
        }

        let settings = settings
            .absolutize()
            .context("could not resolve working directories")?;

        Ok(Engine::from_settings::<Layout>(settings))
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .without_time()
        .init();

    let result = match cli.command {
        Commands::Revisions => cmd_revisions(),
        Commands::Inspect { recipe, engine } => cmd_inspect(&recipe.load()?, &recipe, &engine),
        Commands::Create {
            recipe,
            engine,
            source,
        } => cmd_create(&recipe.load()?, &recipe, &engine, source).await,
        Commands::Info { recipe } => cmd_info(&recipe.load()?),
    };

    result.map_err(|e| miette::miette!("{:#}", e))
}

fn cmd_revisions() -> anyhow::Result<()> {
    let latest = revisions::latest();

    for revision in revisions::REVISIONS {
        let marker = if revision.version == latest.version {
            " (latest)"
        } else {
            ""
        };
        println!("{}{}", revision.version, marker);
    }

    Ok(())
}

fn cmd_inspect(recipe: &Recipe, args: &RecipeArgs, engine_args: &EngineArgs) -> anyhow::Result<()> {
    let (options, settings) = args.configure(recipe)?;
    let engine = engine_args.engine(None)?;
    let plan = engine.plan(recipe, &options, &settings);

    print_plan(recipe, &options, &settings, &plan);

    println!();
    println!("build info:");
    let rendered = engine
        .generator()
        .render(recipe, &settings, &plan.dependencies)?;
    for line in rendered.lines() {
        println!("    {}", line);
    }

    Ok(())
}

async fn cmd_create(
    recipe: &Recipe,
    args: &RecipeArgs,
    engine_args: &EngineArgs,
    source: PathBuf,
) -> anyhow::Result<()> {
    let (options, settings) = args.configure(recipe)?;
    let engine = engine_args.engine(Some(source))?;

    let report = engine
        .create(recipe, &options, &settings)
        .await
        .with_context(|| format!("creating {} failed", recipe.reference()))?;

    println!("{} package {}", recipe.reference(), report.package_id);
    println!("    path: {}", report.path.display());
    for file in &report.files {
        println!("    {}", file.display());
    }
    println!("    libs: {}", report.info.libs.join(" "));

    Ok(())
}

fn cmd_info(recipe: &Recipe) -> anyhow::Result<()> {
    let info = engine::packager::package_info(recipe);

    println!("{}", serde_json::to_string_pretty(&info)?);

    Ok(())
}

fn print_plan(recipe: &Recipe, options: &OptionSet, settings: &Settings, plan: &Plan) {
    println!("{}", recipe.reference());
    if !recipe.description.is_empty() {
        println!("    {}", recipe.description);
    }
    if let Some(url) = &recipe.url {
        println!("    {}", url);
    }
    if !recipe.license.is_empty() {
        println!("license: {}", recipe.license.join(", "));
    }
    println!("package id: {}", plan.package_id);

    println!("settings:");
    for (key, value) in settings.values(&recipe.settings) {
        println!("    {}={}", key, value);
    }

    println!("options:");
    for (name, value) in options.iter() {
        println!("    {}={}", name, flag_name(value));
    }

    println!("requires:");
    for dependency in &plan.dependencies {
        println!("    {}", dependency.reference);
        for pair in dependency.option_pairs() {
            println!("        {}", pair);
        }
    }

    println!("build parameters:");
    for (name, value) in &plan.build.parameters.defines {
        println!("    {}={}", name, value);
    }

    println!("invocations:");
    for invocation in &plan.build.invocations {
        println!("    [{}] {}", invocation.stage, invocation);
    }

    println!("package:");
    for entry in plan.manifest.entries() {
        println!("    {}/{} -> {}", entry.src, entry.pattern, entry.dst);
    }
    println!("libs: {}", plan.info.libs.join(" "));
}
