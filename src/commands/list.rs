use anyhow::Result;
use std::env;
use toothpm::{PackageLock, PathResolver};

pub fn run() -> Result<()> {
    // Listing only needs the lock file, so a missing cache root is fine.
    let paths = PathResolver::new(env::current_dir()?, None);
    let lock = PackageLock::load(paths.lock_path())?;

    if lock.locks.is_empty() {
        println!("No packages installed.");
        println!();
        println!("Install packages with: toothpm install <archive>");
        return Ok(());
    }

    println!("Installed packages:");
    for entry in &lock.locks {
        let variant = if entry.variant_label.is_empty() {
            String::new()
        } else {
            format!("#{}", entry.variant_label)
        };
        let marker = if entry.locked { "" } else { " (dependency)" };
        println!(
            "  {}{} @ {}{}",
            entry.package.tooth, variant, entry.package.version, marker
        );
    }
    println!();
    println!(
        "Total: {} package{}",
        lock.locks.len(),
        if lock.locks.len() == 1 { "" } else { "s" }
    );

    Ok(())
}
