//! A thin one-shot command runner over `ecs150fs`, for manually exercising
//! a mounted image. Mirrors the role `original_source/test/my_unit_test.c`
//! plays over the C original: a small caller, not part of the tested
//! contract (see SPEC_FULL.md §6).

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ecs150fs::FileSystem;

#[derive(Parser)]
struct Args {
    /// Path of the disk image to mount.
    disk: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print superblock geometry and free-space ratios.
    Info,
    /// List every file on the disk.
    Ls,
    /// Create an empty file.
    Create { name: String },
    /// Delete a file.
    Rm { name: String },
    /// Print a file's contents to standard output.
    Cat { name: String },
    /// Overwrite a file's contents from standard input.
    Write { name: String },
}

fn run(args: Args) -> ecs150fs::Result<()> {
    let mut fs = FileSystem::mount(&args.disk)?;

    match args.command {
        Command::Info => println!("{}", fs.info()),
        Command::Ls => {
            for entry in fs.ls() {
                println!("file: {}, size: {}, data_blk: {}", entry.name, entry.size, entry.first_block);
            }
        }
        Command::Create { name } => fs.create(&name)?,
        Command::Rm { name } => fs.delete(&name)?,
        Command::Cat { name } => {
            let fd = fs.open(&name)?;
            let size = fs.stat(fd)? as usize;
            let mut buf = vec![0u8; size];
            let n = fs.read(fd, &mut buf)?;
            std::io::stdout().write_all(&buf[..n])?;
            fs.close(fd)?;
        }
        Command::Write { name } => {
            let mut data = Vec::new();
            std::io::stdin().read_to_end(&mut data)?;
            let fd = fs.open(&name)?;
            fs.write(fd, &data)?;
            fs.close(fd)?;
        }
    }

    fs.unmount()
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fs-shell: {e}");
            ExitCode::FAILURE
        }
    }
}
