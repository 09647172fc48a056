use crate::definition::actions::Stage;
use crate::definition::Recipe;
use crate::engine::build_style::{Invocation, Tool};
use crate::engine::EngineSettings;
use std::path::Path;
use std::process::ExitStatus;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{stage} step could not run {program}: {source}")]
    Spawn {
        stage: Stage,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} step failed, {program} exited with {status}")]
    Failed {
        stage: Stage,
        program: String,
        status: ExitStatus,
    },
}

#[derive(Debug)]
pub struct Environment {
    settings: Arc<EngineSettings>,
    pub cpus: usize,
}

impl Environment {
    pub fn new(settings: Arc<EngineSettings>) -> Self {
        Environment {
            settings,
            cpus: num_cpus::get(),
        }
    }

    pub fn program(&self, tool: Tool) -> &Path {
        match tool {
            Tool::CMake => self.settings.cmake_program(),
            Tool::Make => self.settings.make_program(),
        }
    }

    pub fn command(&self, recipe: &Recipe, invocation: &Invocation) -> Command {
        let mut cmd = Command::new(self.program(invocation.tool));
        cmd.current_dir(self.settings.build_path_for_recipe(recipe));
        cmd.args(&invocation.args);
        cmd
    }

    /// Runs `invocation` in the recipe's build directory and waits for it.
    /// Any exit status other than success is an error.
    pub async fn run(&self, recipe: &Recipe, invocation: &Invocation) -> Result<(), BuildError> {
        let program = self.program(invocation.tool).display().to_string();
        debug!(stage = %invocation.stage, %invocation, "spawning");

        let spawn_error = |source| BuildError::Spawn {
            stage: invocation.stage,
            program: program.clone(),
            source,
        };

        let mut proc = self.command(recipe, invocation).spawn().map_err(spawn_error)?;
        let status = proc.wait().await.map_err(spawn_error)?;

        if !status.success() {
            return Err(BuildError::Failed {
                stage: invocation.stage,
                program,
                status,
            });
        }

        Ok(())
    }
}
