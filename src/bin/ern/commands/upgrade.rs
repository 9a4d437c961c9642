//! `ern upgrade` command

use anyhow::Result;

use crate::cli::UpgradeArgs;
use crate::commands::setup;
use crate::GlobalOptions;
use ern::ops::upgrade_mini_app;
use ern::util::shell::Status;

pub fn execute(args: UpgradeArgs, global_opts: &GlobalOptions) -> Result<()> {
    let (ctx, shell) = setup(global_opts, false)?;

    let manifest = ctx.load_manifest(args.manifest.as_deref(), Some(args.platform_version.as_str()))?;
    let bumps = upgrade_mini_app(ctx.cwd(), &manifest, &args.platform_version)?;

    if bumps.is_empty() {
        shell.note(format!("already on platform version {}", args.platform_version));
        return Ok(());
    }

    for bump in &bumps {
        shell.status(Status::Upgraded, bump);
    }

    Ok(())
}
