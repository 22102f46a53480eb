//! Formats a new virtual disk image. The crate-local realization of the
//! external `mkfs` formatter spec.md names (see SPEC_FULL.md §6).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Format a virtual disk image for use with ecs150fs.
#[derive(Parser)]
struct Args {
    /// Path of the image file to create (overwritten if it exists).
    disk: PathBuf,

    /// Total number of blocks in the image, including the superblock.
    #[arg(default_value_t = 8192)]
    total_blocks: u16,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match ecs150fs::format::format_image(&args.disk, args.total_blocks) {
        Ok(()) => {
            println!("formatted {} ({} blocks)", args.disk.display(), args.total_blocks);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("mkfs: {e}");
            ExitCode::FAILURE
        }
    }
}
