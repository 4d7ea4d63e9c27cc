use std::path::PathBuf;

use clap::CommandFactory;

// Only clap is needed to describe the flags, so the CLI module is compiled
// here on its own.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let Some(out_dir) = std::env::var_os("OUT_DIR").map(PathBuf::from) else {
        panic!("cargo did not set OUT_DIR");
    };
    let man_page = out_dir.join("man").join("jive5ab-katcp-proxy.1");

    let mut roff = Vec::new();
    if let Err(e) = clap_mangen::Man::new(cli::Cli::command()).render(&mut roff) {
        panic!("rendering jive5ab-katcp-proxy.1: {e}");
    }
    if let Some(dir) = man_page.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            panic!("creating {}: {e}", dir.display());
        }
    }
    if let Err(e) = std::fs::write(&man_page, roff) {
        panic!("writing {}: {e}", man_page.display());
    }
}
