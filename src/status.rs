//! Local collection overview.
//!
//! Summarises what is already on disk, per term, without touching the
//! network. Used by `harvest status`.

use anyhow::Result;

use crate::config::Config;
use crate::inventory::build_inventory;
use crate::progress::format_number;

pub fn run_status(config: &Config) -> Result<()> {
    let inventory = build_inventory(&config.storage.save_dir)?;

    println!("Local speeches in {}", config.storage.save_dir.display());
    println!();
    println!("{:<8} {:>10} {:>12}", "TERM", "SITTINGS", "SPEECHES");
    for (term, sessions) in inventory.terms() {
        let speeches: usize = sessions.values().map(Vec::len).sum();
        println!(
            "{:<8} {:>10} {:>12}",
            term,
            sessions.len(),
            format_number(speeches as u64)
        );
    }
    println!();
    println!(
        "{:<8} {:>10} {:>12}",
        "total",
        inventory.session_count(),
        format_number(inventory.speech_count() as u64)
    );

    Ok(())
}
