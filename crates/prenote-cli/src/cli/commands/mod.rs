use super::args::{Cli, Command};

pub(crate) mod run;
pub(crate) mod validate;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Validate(args) => validate::run(args),
    }
}
