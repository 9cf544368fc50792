//! Android manifest security analyzer.
//!
//! Audits the security relevant configuration of an Android application: backups, debugging,
//! cleartext traffic, network security configuration, exported components, deep and app links
//! and permissions. Many of those settings change meaning with the API level, so every rule is
//! evaluated over the whole supported SDK range of the application.

#![forbid(
    overflowing_literals,
    unconditional_recursion,
    unused_allocation,
    while_true,
    unused_parens,
    unused_comparisons,
    improper_ctypes,
    non_shorthand_field_patterns
)]
#![deny(unused_extern_crates, unused_import_braces)]
#![warn(unused_qualifications, unused_results)]

pub mod cli;
pub mod config;
pub mod criticality;
pub mod error;
pub mod external;
pub mod policy;
pub mod results;
pub mod sdk_number;
pub mod static_analysis;
mod utils;

pub use crate::{
    config::Config,
    criticality::Criticality,
    error::Kind as ErrorKind,
    utils::{print_error, print_warning},
};

use crate::{
    external::ReqwestVerifier,
    results::Results,
    static_analysis::{
        package::{Package, PackageKind},
        rules::links::{AssetLinkVerifier, NoVerification},
        AnalysisContext,
    },
};
use anyhow::{Context, Result};
use chrono::Local;
use clap::ArgMatches;
use colored::Colorize;
use log::{debug, info, warn, Level, LevelFilter};
use std::{
    env,
    io::Write,
    path::{Path, PathBuf},
};

/// Initialize the config with the config files and command line options.
///
/// On UNIX, if the local file (`config.toml`) does not exist but the global one does
/// (`/etc/manifest-analyzer/config.toml`), the latter is used. Otherwise the local file is used.
/// Finally, if none of the files could be loaded, the default config is used.
pub fn initialize_config(cli: &ArgMatches) -> Result<Config> {
    let config_path = PathBuf::from("config.toml");
    let global_config_path = PathBuf::from("/etc/manifest-analyzer/config.toml");

    let mut config =
        if cfg!(target_family = "unix") && !config_path.exists() && global_config_path.exists() {
            Config::from_file(&global_config_path).with_context(|| {
                format!(
                    "there was an error when reading the {} file",
                    global_config_path.display()
                )
            })?
        } else if config_path.exists() {
            Config::from_file(&config_path)
                .context("there was an error when reading the config.toml file")?
        } else {
            debug!("config file not found, using the default configuration");
            Config::default()
        };

    config
        .decorate_with_cli(cli)
        .context("there was an error reading config from CLI")?;

    Ok(config)
}

/// Analyzes the given package with the given config.
pub fn analyze_package<P: AsRef<Path>>(package: P, config: &Config) -> Result<()> {
    let path = package.as_ref();
    let package = Package::load(path)
        .with_context(|| format!("could not load the package {}", path.display()))?;
    let range = config
        .sdk_range(package.manifest())
        .context("the supported SDK range is not valid")?;

    info!(
        "analyzing {} ({})",
        package.manifest().package().italic(),
        range
    );

    let verifier: Box<dyn AssetLinkVerifier> = if config.is_check_asset_links() {
        match ReqwestVerifier::new() {
            Ok(verifier) => Box::new(verifier),
            Err(e) => {
                warn!("app links will not be verified: {:#}", e);
                Box::new(NoVerification)
            }
        }
    } else {
        Box::new(NoVerification)
    };
    let context = AnalysisContext {
        range,
        today: Local::now().date_naive(),
        verifier: verifier.as_ref(),
    };

    let mut results = Results::init(&package, range, config.min_criticality());
    static_analysis::run(&package, &context, &mut results);

    if config.is_verify_signature() && package.kind() == PackageKind::Apk {
        if let Some(output) =
            external::verify_signature(config.apksigner(), package.file(), range.min())
        {
            results.set_signature(output);
        }
    }

    if let Some(app_id) = config.adb_backup_package() {
        if app_id == package.manifest().package() {
            if let Some(backup) =
                external::adb_backup(config.adb(), app_id, config.adb_backup_path())
            {
                info!("ADB backup of {} stored in {}", app_id, backup.display());
                results.set_adb_backup(backup);
            }
        } else {
            debug!(
                "not pulling the backup of {} while analyzing {}",
                app_id,
                package.manifest().package()
            );
        }
    }

    if results.generate_report(config).with_context(|| {
        format!(
            "there was an error generating the results report, tried to generate it at: {}",
            results.report_folder(config).display()
        )
    })? {
        info!(
            "report generated in {}",
            results.report_folder(config).display()
        );
    }

    Ok(())
}

/// Initializes the logger.
///
/// Warnings are prefixed with `[-]` and errors with `[!]`. `RUST_LOG` overrides the default
/// filter.
pub fn initialize_logger(is_verbose: bool) {
    let log_level = if is_verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    let _ = builder.format(|buf, record| {
        let message = match record.level() {
            Level::Warn => format!(
                "{} {}",
                "[-]".bold().yellow(),
                record.args().to_string().yellow()
            ),
            Level::Error => format!(
                "{} {}",
                "[!]".bold().red(),
                record.args().to_string().red()
            ),
            Level::Debug => format!("{}", record.args().to_string().bold()),
            Level::Info => format!("{}", record.args()),
            Level::Trace => format!("{}: {}", record.level(), record.args()),
        };
        writeln!(buf, "{}", message)
    });

    if let Ok(env_log) = env::var("RUST_LOG") {
        let _ = builder.parse_filters(&env_log);
    } else {
        let _ = builder.filter(Some("manifest_analyzer_core"), log_level);
    }

    if let Err(e) = builder.try_init() {
        print_warning(format!("could not initialize logger: {}", e));
    }
}
