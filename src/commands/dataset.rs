//! Dataset subcommands

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

use picsort_core::{BinController, BuildReport};

fn open(controller: &mut BinController, dir: &Path) -> anyhow::Result<BuildReport> {
    controller
        .load_dataset(dir)
        .with_context(|| format!("failed to load dataset {}", dir.display()))
}

/// Resolve user-supplied paths against the loaded dataset root
fn resolve(controller: &BinController, files: &[PathBuf]) -> Vec<PathBuf> {
    let root = controller.dataset_root();
    files
        .iter()
        .map(|file| match root {
            Some(root) if file.is_relative() => root.join(file),
            _ => file.clone(),
        })
        .collect()
}

pub fn load(controller: &mut BinController, dir: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
    let report = open(controller, dir)?;

    writeln!(
        out,
        "{} images: {} cached, {} rendered, {} failed",
        report.total, report.cached, report.rendered, report.failed
    )?;
    for file in &report.failed_files {
        writeln!(out, "  unreadable: {}", file.display())?;
    }
    Ok(())
}

pub fn list(
    controller: &mut BinController,
    dir: &Path,
    bin: i64,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    open(controller, dir)?;

    let mut paths = controller.get_image_paths(bin);
    paths.sort();
    for path in paths {
        writeln!(out, "{}", path.display())?;
    }
    Ok(())
}

pub fn move_files(
    controller: &mut BinController,
    dir: &Path,
    from: i64,
    to: i64,
    files: &[PathBuf],
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    open(controller, dir)?;

    let paths = resolve(controller, files);
    let moved = controller.move_images(&paths, from, to)?;
    writeln!(out, "moved {} images from bin {} to bin {}", moved, from, to)?;
    Ok(())
}

pub fn tag(
    controller: &mut BinController,
    dir: &Path,
    to: i64,
    files: &[PathBuf],
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    open(controller, dir)?;

    let paths = resolve(controller, files);
    let added = controller.add_images_to_bin(&paths, to)?;
    writeln!(out, "added {} images to bin {}", added, to)?;
    Ok(())
}

pub fn export(
    controller: &mut BinController,
    dir: &Path,
    dest: &Path,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    open(controller, dir)?;

    let report = controller.export_dataset(dest)?;
    writeln!(
        out,
        "exported {} images in {} bins to {}",
        report.copied,
        report.bins,
        report.export_root.display()
    )?;
    Ok(())
}

pub fn stats(controller: &mut BinController, dir: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
    open(controller, dir)?;

    let stats = controller.stats()?;
    writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
    Ok(())
}
