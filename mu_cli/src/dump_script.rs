use std::{error::Error, path::PathBuf};

use clap::Parser;
use mu_text::TextArchive;

#[derive(Parser)]
pub struct DumpScript {
    /// Zip archive holding the script
    #[clap(parse(from_os_str))]
    archive: PathBuf,
    /// Entry name, with either separator. Lists all entries if omitted
    entry: Option<String>,
}

pub fn dump_script(opts: &DumpScript) -> Result<(), Box<dyn Error>> {
    let mut archive = TextArchive::open(&opts.archive)?;

    let entry = match &opts.entry {
        Some(entry) => entry,
        None => {
            for name in archive.entry_names() {
                println!("{name}");
            }
            return Ok(());
        }
    };

    let script = archive.read_script(entry)?;

    for (i, section) in script.sections().iter().enumerate() {
        println!("section {i}:");
        for line in *section {
            println!("{:>5}: {}", line.number(), line.fields().join(" | "));
        }
    }

    Ok(())
}
