use clap_complete::{generate_to, Shell};
use std::{env, path::PathBuf};

#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let Some(out_dir) = env::var_os("OUT_DIR") else {
        return;
    };
    let mut out_dir = PathBuf::from(out_dir);
    let _ = out_dir.pop();
    let _ = out_dir.pop();
    let _ = out_dir.pop();

    let mut cli = cli::generate_cli();
    for shell in [Shell::Bash, Shell::Fish, Shell::Zsh] {
        if let Err(e) = generate_to(shell, &mut cli, "manifest-analyzer", &out_dir) {
            println!(
                "cargo:warning=could not generate {} completion script: {}",
                shell, e
            );
        }
    }
}
