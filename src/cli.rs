//! Command line interface definition.
//!
//! Shared between the binary and `build.rs`, which generates the shell completion scripts from
//! it, so it can only depend on `clap`.

use clap::{crate_version, value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Generates the command line interface.
pub fn generate_cli() -> Command {
    Command::new("manifest-analyzer")
        .version(crate_version!())
        .about(
            "Audits the security relevant configuration of Android applications, from a raw \
             AndroidManifest.xml or an APK",
        )
        .arg(
            Arg::new("package")
                .help("AndroidManifest.xml files or APK archives to analyze")
                .value_name("PACKAGE")
                .required(true)
                .num_args(1..)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("min-sdk-version")
                .long("min-sdk-version")
                .value_name("API")
                .help("Minimal SDK version supported by the application")
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("target-sdk-version")
                .long("target-sdk-version")
                .value_name("API")
                .help("Target SDK version of the application (defaults to the minimal one)")
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("max-sdk-version")
                .long("max-sdk-version")
                .value_name("API")
                .help("Maximal SDK version the application can be installed on")
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("min-criticality")
                .long("min-criticality")
                .value_name("LEVEL")
                .help("Minimal criticality of the findings printed to the console")
                .value_parser(["info", "warning", "critical"]),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Generates a JSON report in the results folder")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("results")
                .long("results")
                .value_name("FOLDER")
                .help("Folder where the reports are stored")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("no-network")
                .long("no-network")
                .help("Does not check the Digital Asset Links files of the app link hosts")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-signature")
                .long("no-signature")
                .help("Does not run apksigner on APK archives")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("adb-backup")
                .long("adb-backup")
                .value_name("PACKAGE_ID")
                .help("Pulls an ADB backup of the given installed package from the device"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Prints debugging information")
                .conflicts_with("quiet")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only prints warnings and critical findings")
                .action(ArgAction::SetTrue),
        )
}
