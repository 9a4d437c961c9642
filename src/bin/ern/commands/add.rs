//! `ern add` command

use anyhow::Result;

use crate::cli::AddArgs;
use crate::commands::setup;
use crate::GlobalOptions;
use ern::core::{DependencyKind, PackagePath};
use ern::ops::{add_to_mini_app, AddOptions};
use ern::util::shell::Status;

pub fn execute(args: AddArgs, global_opts: &GlobalOptions) -> Result<()> {
    let (ctx, shell) = setup(global_opts, false)?;

    let packages = args
        .packages
        .iter()
        .map(|p| PackagePath::parse(p))
        .collect::<Result<Vec<_>, _>>()?;

    let kind = if args.dev {
        DependencyKind::Dev
    } else if args.peer {
        DependencyKind::Peer
    } else {
        DependencyKind::Regular
    };

    let manifest = ctx.load_manifest(
        args.manifest.manifest.as_deref(),
        args.manifest.platform_version.as_deref(),
    )?;
    let client = ctx.npm_client()?;

    let opts = AddOptions { packages, kind };
    let spinner = shell.spinner(Status::Probing, format!("{} package(s)", opts.packages.len()));
    let added = add_to_mini_app(ctx.cwd(), &manifest, &client, &opts)?;
    spinner.finish();

    for package in &added {
        shell.status(Status::Added, format!("{} to {}", package, kind.section()));
    }

    Ok(())
}
