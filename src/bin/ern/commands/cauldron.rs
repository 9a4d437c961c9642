//! `ern cauldron` commands

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::{CauldronGetArgs, CauldronSyncArgs};
use crate::commands::setup;
use crate::GlobalOptions;
use ern::cauldron::Cauldron;
use ern::core::{AppDescriptor, PackagePath};
use ern::ops::{get_app, sync_container, SyncOptions};
use ern::util::diagnostic::{self, Diagnostic};
use ern::util::shell::Status;

pub fn sync(args: CauldronSyncArgs, cauldron: Option<PathBuf>, global_opts: &GlobalOptions) -> Result<()> {
    let (ctx, shell) = setup(global_opts, false)?;

    let descriptor = AppDescriptor::parse(&args.descriptor)?;
    let mini_apps = args
        .mini_apps
        .iter()
        .map(|p| PackagePath::parse(p))
        .collect::<Result<Vec<_>, _>>()?;
    let composite = match &args.composite {
        Some(dir) => ctx.resolve_path(dir),
        None => ctx.cwd().to_path_buf(),
    };

    let manifest = ctx.load_manifest_if_configured(
        args.manifest.manifest.as_deref(),
        args.manifest.platform_version.as_deref(),
    )?;

    let path = ctx.cauldron_path(cauldron.as_deref());
    let store = Cauldron::open_file(&path)
        .with_context(|| format!("failed to open cauldron at {}", path.display()))?;

    let opts = SyncOptions {
        descriptor,
        composite,
        container_version: args.container_version,
        mini_apps,
    };

    let spinner = shell.spinner(Status::Scanning, opts.composite.display());
    let result = sync_container(&store, manifest.as_ref(), &opts)?;
    spinner.finish();

    if manifest.is_none() && !result.not_in_manifest.is_empty() {
        shell.warn(format!(
            "no manifest configured; {} native dependencies were not checked",
            result.not_in_manifest.len()
        ));
    }
    for path in &result.unsupported_on_platform {
        let warning = Diagnostic::warning(format!(
            "`{}` is not supported on {} according to the manifest",
            path,
            opts.descriptor.platform()
        ))
        .with_context(format!("recorded for {}", opts.descriptor))
        .with_suggestion(format!("Remove `{}` from the composite", path.base_path()))
        .with_suggestion("Mark the platform as supported in the manifest");
        diagnostic::emit(&warning, shell.use_color());
    }
    shell.status(
        Status::Synced,
        format!(
            "{} native dependencies for {}",
            result.native_dependencies.len(),
            opts.descriptor
        ),
    );
    shell.status(
        Status::Committed,
        format!("{} (container {})", result.commit_id, result.container_version),
    );

    Ok(())
}

pub fn get(args: CauldronGetArgs, cauldron: Option<PathBuf>, global_opts: &GlobalOptions) -> Result<()> {
    let (ctx, shell) = setup(global_opts, args.json)?;

    let descriptor = AppDescriptor::parse(&args.descriptor)?;
    let path = ctx.cauldron_path(cauldron.as_deref());
    let store = Cauldron::open_file(&path)
        .with_context(|| format!("failed to open cauldron at {}", path.display()))?;

    let record = get_app(&store, &descriptor)?;
    if shell.is_json() {
        return shell.json(&record);
    }

    shell.print(format!(
        "container version: {}",
        record.container_version.as_deref().unwrap_or("-")
    ));
    shell.print("native dependencies:");
    for dep in &record.native_dependencies {
        shell.print(format!("  {}", dep));
    }
    if !record.mini_apps.is_empty() {
        shell.print("mini-apps:");
        for app in &record.mini_apps {
            shell.print(format!("  {}", app));
        }
    }

    Ok(())
}
