use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{Shell, generate};

use super::app::App;

#[derive(Args, Clone, Debug)]
pub struct CompletionsArg {
    #[arg(value_enum)]
    shell: Shell,
}

impl CompletionsArg {
    pub fn run(self) -> Result<ExitCode> {
        let mut cmd = App::command();
        generate(self.shell, &mut cmd, "odc", &mut std::io::stdout());
        Ok(ExitCode::SUCCESS)
    }
}
