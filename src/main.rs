//! Android manifest security analyzer binary.

use manifest_analyzer_core::{
    analyze_package, cli, initialize_config, initialize_logger, print_error,
};
use std::process::exit;

fn main() {
    let cli = cli::generate_cli().get_matches();
    initialize_logger(cli.get_flag("verbose"));

    let config = match initialize_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            print_error(format!("{:#}", e));
            exit(1);
        }
    };

    let mut failed = false;
    for package in config.packages() {
        if let Err(e) = analyze_package(package, &config) {
            print_error(format!("{:#}", e));
            failed = true;
        }
    }

    if failed {
        if !config.is_verbose() {
            eprintln!("If you need more information, try to run the program again with the -v flag.");
        }
        exit(1);
    }
}
