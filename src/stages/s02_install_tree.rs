use anyhow::Result;
use std::path::PathBuf;

use crate::build::context::BuildContext;
use crate::config::Config;
use crate::error::BuildError;
use crate::process::{Cmd, Runner};

/// Location of the install tree builder inside the applied runtime package.
pub fn buildinstall_path(ctx: &BuildContext, config: &Config) -> PathBuf {
    ctx.package_dir(&config.buildinstall.package)
        .join(&config.buildinstall.tool)
}

/// The `buildinstall` invocation for this build, every path absolute.
pub fn buildinstall_command(ctx: &BuildContext, config: &Config) -> Cmd {
    let tool = buildinstall_path(ctx, config);
    let project = &config.project;
    let mut cmd = Cmd::new(&tool)
        .arg("--product")
        .arg(project.display_name())
        .arg("--prodpath")
        .arg(&project.prodpath)
        .arg("--version")
        .arg(project.version())
        .arg("--release")
        .arg(&project.release)
        .arg_path(&ctx.distro_root);
    // buildinstall finds its helper scripts next to itself.
    if let Some(tool_dir) = tool.parent() {
        cmd = cmd.current_dir(tool_dir);
    }
    cmd
}

/// Build the install tree (stage2 image, isolinux and images directories)
/// into the distribution tree.
pub fn build_install_tree(ctx: &BuildContext, config: &Config, runner: &dyn Runner) -> Result<()> {
    let tool = buildinstall_path(ctx, config);
    if !tool.is_file() {
        return Err(BuildError::missing(
            &tool,
            format!(
                "'{}' did not provide the install tree builder",
                config.buildinstall.package
            ),
        )
        .into());
    }

    let cmd = buildinstall_command(ctx, config).error_msg("buildinstall failed");
    println!("  buildinstall cmd: {}", cmd);
    cmd.run_with(runner)?;
    Ok(())
}
