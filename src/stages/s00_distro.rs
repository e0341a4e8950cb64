use anyhow::Result;

use crate::build::context::BuildContext;
use crate::config::Config;
use crate::packages::distro::DistributionTree;
use crate::process::Runner;

/// Generate the distribution tree for the context's architecture.
pub fn generate_distribution(
    ctx: &BuildContext,
    config: &Config,
    runner: &dyn Runner,
) -> Result<DistributionTree> {
    let mut tree = DistributionTree::new(&ctx.distro_root);
    tree.generate(
        runner,
        &config.distro.generate,
        &ctx.work_dir,
        &config.project.prodpath,
    )?;
    println!(
        "  distribution at {} ({} packages)",
        tree.root().display(),
        tree.packages().len()
    );
    Ok(tree)
}
