use anyhow::Result;
use clap::Parser;

mod cli;
mod codec_cmd;
mod device_cmd;
mod path_guard;
mod schemas_cmd;
mod session;

use cli::{Cli, Command};
use session::Session;

fn main() -> Result<()> {
    let cli = Cli::parse();
    fortimap::logging::init(cli.verbose);

    let session = Session::open(cli.config.as_deref())?;
    match cli.command {
        Command::Schemas(args) => schemas_cmd::run_schemas(&session, args),
        Command::Decode(args) => codec_cmd::run_decode(&session, args),
        Command::Encode(args) => codec_cmd::run_encode(&session, args),
        Command::Read(args) => device_cmd::run_read(&session, args),
        Command::Apply(args) => device_cmd::run_apply(&session, args),
        Command::Delete(args) => device_cmd::run_delete(&session, args),
    }
}
