use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axres_manifest::Apk;
use colored::Colorize;

use crate::commands::path_helpers::get_all_files;

pub(crate) fn command_show(paths: &[PathBuf]) -> Result<()> {
    for apk_path in get_all_files(paths, &["apk"]) {
        show(&apk_path)?;
    }

    Ok(())
}

fn show(path: &Path) -> Result<()> {
    let apk = Apk::new(path).with_context(|| format!("got error while parsing apk: {:?}", path))?;

    let package_name = apk.get_package_name().unwrap_or_default();
    let min_sdk = apk.get_min_sdk_version().unwrap_or_default();

    println!("{} ({})", package_name.green().bold(), min_sdk.yellow());

    Ok(())
}
