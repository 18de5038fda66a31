use anyhow::Result;
use std::path::PathBuf;
use toothpm::installer::InstallOptions;
use toothpm::{batch, platform, PackageInstaller, ShellScriptRunner};

pub fn run(
    archives: Vec<String>,
    variant: String,
    dry_run: bool,
    ignore_scripts: bool,
) -> Result<()> {
    let (_config, paths, cache) = super::workspace()?;
    let runner = ShellScriptRunner;
    let installer = PackageInstaller::new(&paths, &cache, &runner);
    let platform = platform::identifier();

    let archives: Vec<PathBuf> = archives.into_iter().map(PathBuf::from).collect();

    if dry_run {
        println!("Dry run: nothing will be written to the working directory.");
        println!();
    }

    let opts = InstallOptions {
        dry_run,
        ignore_scripts,
        locked: true,
    };
    batch::install_all(&installer, &cache, &platform, &archives, &variant, &opts)?;

    println!(
        "{} {} package{}",
        if dry_run { "Would install" } else { "Installed" },
        archives.len(),
        if archives.len() == 1 { "" } else { "s" }
    );

    Ok(())
}
