//! `ern list dependencies` command

use anyhow::Result;

use crate::cli::ListDependenciesArgs;
use crate::commands::setup;
use crate::GlobalOptions;
use ern::ops::{list_dependencies, ListTarget};
use ern::reconcile::PackageInstaller;
use ern::util::shell::Status;

pub fn execute(args: ListDependenciesArgs, global_opts: &GlobalOptions) -> Result<()> {
    let (ctx, shell) = setup(global_opts, args.json)?;

    let manifest = ctx.load_manifest_if_configured(
        args.manifest.manifest.as_deref(),
        args.manifest.platform_version.as_deref(),
    )?;
    if manifest.is_none() {
        tracing::debug!("no manifest configured; native packages are listed as not in manifest");
    }

    let target = ListTarget::resolve(ctx.cwd(), args.module.as_deref())?;
    let client = match &target {
        ListTarget::Package(_) => Some(ctx.npm_client()?),
        _ => None,
    };

    let spinner = match &target {
        ListTarget::Package(package) => shell.spinner(Status::Probing, package),
        ListTarget::WorkingDir(dir) | ListTarget::ModuleDir(dir) => {
            shell.spinner(Status::Scanning, dir.display())
        }
    };
    let installer = client.as_ref().map(|c| c as &dyn PackageInstaller);
    let deps = list_dependencies(&target, manifest.as_ref(), installer)?;
    spinner.finish();

    if shell.is_json() {
        return shell.json(&deps);
    }

    if deps.is_empty() {
        shell.note("no native dependencies found");
    } else {
        shell.print(deps.format_grouped().trim_end());
    }

    Ok(())
}
