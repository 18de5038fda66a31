use anyhow::Result;
use toothpm::installer::UninstallOptions;
use toothpm::{batch, platform, PackageIdentifier, PackageInstaller, ShellScriptRunner};

pub fn run(packages: Vec<String>, dry_run: bool, ignore_scripts: bool) -> Result<()> {
    let (_config, paths, cache) = super::workspace()?;
    let runner = ShellScriptRunner;
    let installer = PackageInstaller::new(&paths, &cache, &runner);
    let platform = platform::identifier();

    let identifiers = packages
        .iter()
        .map(|text| text.parse::<PackageIdentifier>())
        .collect::<toothpm::Result<Vec<_>>>()?;

    if dry_run {
        println!("Dry run: nothing will be removed from the working directory.");
        println!();
    }

    let opts = UninstallOptions {
        dry_run,
        ignore_scripts,
    };
    let processed = batch::uninstall_all(&paths, &installer, &platform, &identifiers, &opts)?;

    if processed < identifiers.len() {
        println!(
            "Skipped {} package{} that {} not installed.",
            identifiers.len() - processed,
            if identifiers.len() - processed == 1 { "" } else { "s" },
            if identifiers.len() - processed == 1 { "is" } else { "are" }
        );
    }
    println!(
        "{} {} package{}",
        if dry_run { "Would uninstall" } else { "Uninstalled" },
        processed,
        if processed == 1 { "" } else { "s" }
    );

    Ok(())
}
