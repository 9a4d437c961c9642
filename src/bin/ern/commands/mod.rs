//! Command implementations

pub mod add;
pub mod cauldron;
pub mod completions;
pub mod list;
pub mod upgrade;

use anyhow::Result;
use ern::util::shell::Shell;
use ern::util::GlobalContext;

use crate::GlobalOptions;

/// Context and shell for a command run in the current directory.
pub fn setup(global_opts: &GlobalOptions, json: bool) -> Result<(GlobalContext, Shell)> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(global_opts.verbose);

    let shell = Shell::from_flags(global_opts.verbose, global_opts.color, json);
    ctx.set_color(shell.use_color());
    Ok((ctx, shell))
}
