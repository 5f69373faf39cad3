use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use page_mirror::cli::MirrorCommand;
use page_mirror::console::Console;
use page_mirror::mirror::PageMirror;

fn main() -> ExitCode {
    let args = MirrorCommand::parse();
    let console = Console::new(args.quiet);
    console.banner();

    match run(&args, &console) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            console.abort(&error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &MirrorCommand, console: &Console) -> Result<()> {
    let url = args.target_url()?;
    let mirror = PageMirror::new(console, &args.parent_dir, Duration::from_secs(args.timeout));
    mirror.run(&url)?;
    Ok(())
}
