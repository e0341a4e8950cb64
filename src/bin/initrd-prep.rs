use std::path::Path;

use anyhow::{bail, Context, Result};
use initrd_prep::arch::{host_arch, precedence_list};
use initrd_prep::build::lock::WorkDirLock;
use initrd_prep::manifest::BuildManifest;
use initrd_prep::packages::distro::DistributionTree;
use initrd_prep::packages::index::LocalPackageIndex;
use initrd_prep::packages::resolve::{NoRemote, PackageResolver, RemoteResolver};
use initrd_prep::preflight::check_host_tools;
use initrd_prep::process::HostRunner;
use initrd_prep::{BuildContext, Config, Pipeline};

fn usage() -> &'static str {
    "Usage:\n  initrd-prep build [arch]\n  initrd-prep precedence <arch>\n  initrd-prep resolve <name> <arch>"
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [build] if build == "build" => build_images(&host_arch()?),
        [build, arch] if build == "build" => build_images(arch),
        [precedence, arch] if precedence == "precedence" => {
            println!("{}", precedence_list(arch).join(" "));
            Ok(())
        }
        [resolve, name, arch] if resolve == "resolve" => resolve_one(name, arch),
        _ => bail!(usage()),
    }
}

fn build_images(arch: &str) -> Result<()> {
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let config = Config::load(&cwd)?;
    let ctx = BuildContext::new(&cwd, &config, arch)?;
    let _lock = WorkDirLock::acquire(&ctx.work_dir)?;

    check_host_tools(arch)?;

    println!(
        "[initrd-prep] {} {} for {} in {}",
        config.project.display_name(),
        config.project.version(),
        arch,
        ctx.work_dir.display()
    );

    let local = load_local_index(&ctx.local_tree);
    let report = Pipeline::new(&ctx, &config, &HostRunner, &local)
        .run()
        .with_context(|| format!("preparing boot images for {arch}"))?;

    let manifest = BuildManifest::from_report(&report, &config.project.version())?;
    let path = manifest.write(&ctx.work_dir)?;

    for image in &manifest.images {
        println!(
            "[initrd-prep] {} ({} bytes, sha256 {})",
            image.path.display(),
            image.size_bytes,
            image.sha256
        );
    }
    println!("[initrd-prep] manifest: {}", path.display());
    Ok(())
}

fn resolve_one(name: &str, arch: &str) -> Result<()> {
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let config = Config::load(&cwd)?;
    let local = load_local_index(&cwd.join(&config.packages.local_tree));

    let distro_root = cwd.join(DistributionTree::relative_path(&config.distro.name, arch));
    let distro = distro_root.is_dir().then(|| {
        let mut tree = DistributionTree::new(&distro_root);
        tree.load_packages(&config.project.prodpath);
        tree
    });
    let remote: &dyn RemoteResolver = match &distro {
        Some(tree) => tree,
        None => &NoRemote,
    };

    let package = PackageResolver::new(&local, remote).resolve(name, arch)?;
    println!("{} ({})", package.path.display(), package.source);
    Ok(())
}

fn load_local_index(root: &Path) -> LocalPackageIndex {
    let index = LocalPackageIndex::build(root);
    println!(
        "[initrd-prep] {} local packages under {}",
        index.len(),
        index.root().display()
    );
    index
}
