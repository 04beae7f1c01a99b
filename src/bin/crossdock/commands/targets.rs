//! `crossdock targets` command

use anyhow::Result;
use crossdock::Target;

pub fn execute() -> Result<()> {
    let host = Target::host();
    for target in Target::all() {
        if *target == host {
            println!("{} (host)", target);
        } else {
            println!("{}", target);
        }
    }
    Ok(())
}
