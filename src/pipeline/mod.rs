//! The assembly pipeline.
//!
//! A forward-only cursor over [`PipelineState`]. Each call to
//! [`Pipeline::advance`] runs exactly one stage. A failed stage aborts the
//! pipeline: every later `advance` errors without running anything.
//!
//! ```text
//! Start
//!   -> DistroReady            generate the distribution tree
//!   -> BasePackagesApplied    installer runtime, web server, tracker
//!   -> Stage2Built            buildinstall into the distribution tree
//!   -> ImagesExtracted        ramdisks (ia64: out of the loop-mounted boot.img)
//!   -> KernelPackagesApplied  kernels into kernels/
//!   -> Done
//! ```

use anyhow::{bail, Context, Result};
use std::fmt;

use crate::build::context::BuildContext;
use crate::config::Config;
use crate::manifest::BuildReport;
use crate::packages::distro::DistributionTree;
use crate::packages::index::LocalPackageIndex;
use crate::packages::resolve::PackageResolver;
use crate::process::Runner;
use crate::stages::{
    s00_distro, s01_base_packages, s02_install_tree, s03_boot_images, s04_kernel_packages,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineState {
    Start,
    DistroReady,
    BasePackagesApplied,
    Stage2Built,
    ImagesExtracted,
    KernelPackagesApplied,
    Done,
}

impl PipelineState {
    /// The state after this one; `None` once done.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::DistroReady),
            Self::DistroReady => Some(Self::BasePackagesApplied),
            Self::BasePackagesApplied => Some(Self::Stage2Built),
            Self::Stage2Built => Some(Self::ImagesExtracted),
            Self::ImagesExtracted => Some(Self::KernelPackagesApplied),
            Self::KernelPackagesApplied => Some(Self::Done),
            Self::Done => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::DistroReady => "distro",
            Self::BasePackagesApplied => "base-packages",
            Self::Stage2Built => "stage2",
            Self::ImagesExtracted => "images",
            Self::KernelPackagesApplied => "kernels",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct Pipeline<'a> {
    ctx: &'a BuildContext,
    config: &'a Config,
    runner: &'a dyn Runner,
    local: &'a LocalPackageIndex,
    state: PipelineState,
    aborted: bool,
    distro: Option<DistributionTree>,
    report: BuildReport,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        ctx: &'a BuildContext,
        config: &'a Config,
        runner: &'a dyn Runner,
        local: &'a LocalPackageIndex,
    ) -> Self {
        Self {
            ctx,
            config,
            runner,
            local,
            state: PipelineState::Start,
            aborted: false,
            distro: None,
            report: BuildReport {
                arch: ctx.arch.clone(),
                kernel_arch: ctx.kernel_arch().to_string(),
                distro_root: ctx.distro_root.clone(),
                ..BuildReport::default()
            },
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// True once a stage has failed.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Run every remaining stage in order.
    pub fn run(mut self) -> Result<BuildReport> {
        while self.state != PipelineState::Done {
            self.advance()?;
        }
        Ok(self.report)
    }

    /// Run the stage that leads out of the current state.
    pub fn advance(&mut self) -> Result<PipelineState> {
        if self.aborted {
            bail!(
                "pipeline for {} was aborted after '{}'; stages are never retried",
                self.ctx.arch,
                self.state
            );
        }
        let Some(target) = self.state.next() else {
            bail!("pipeline for {} already finished", self.ctx.arch);
        };
        println!(
            "[initrd-prep:{}] {} -> {} ({})",
            target, self.state, target, self.ctx.arch
        );

        if let Err(e) = self.run_stage(target) {
            self.aborted = true;
            return Err(e.context(format!(
                "stage '{}' failed for architecture {}",
                target, self.ctx.arch
            )));
        }

        self.state = target;
        Ok(target)
    }

    fn run_stage(&mut self, target: PipelineState) -> Result<()> {
        let ctx = self.ctx;
        let config = self.config;
        let runner = self.runner;

        match target {
            PipelineState::Start => bail!("cannot transition back to start"),
            PipelineState::DistroReady => {
                self.distro = Some(s00_distro::generate_distribution(ctx, config, runner)?);
            }
            PipelineState::BasePackagesApplied => {
                let distro = distribution(&self.distro)?;
                let resolver = PackageResolver::new(self.local, distro);
                self.report.base_packages = s01_base_packages::apply_base_packages(
                    ctx,
                    &config.packages.base,
                    &resolver,
                    runner,
                )?;
            }
            PipelineState::Stage2Built => {
                s02_install_tree::build_install_tree(ctx, config, runner)?;
            }
            PipelineState::ImagesExtracted => {
                self.report.images = s03_boot_images::extract_boot_images(ctx, runner)?;
            }
            PipelineState::KernelPackagesApplied => {
                let distro = distribution(&self.distro)?;
                let resolver = PackageResolver::new(self.local, distro);
                self.report.kernel_packages =
                    s04_kernel_packages::apply_kernel_packages(ctx, config, &resolver, runner)?;
            }
            PipelineState::Done => {}
        }
        Ok(())
    }
}

fn distribution(distro: &Option<DistributionTree>) -> Result<&DistributionTree> {
    distro
        .as_ref()
        .context("distribution tree used before it was generated")
}
