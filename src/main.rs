//! Samples a point set, builds its quadtree and prints every region.

use pr_quadtree::{Config, NodeKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "quadtree.toml".to_string());
    let config = Config::load(&path)?;
    info!("  Canvas: {}x{}", config.canvas.width, config.canvas.height);
    info!("  Samples: {}", config.sampling.count);

    let points = config.sample_points();
    let tree = config.builder().build_with_points(config.root_region()?, &points)?;
    info!("{} points, {}", points.len(), tree.summary());

    for (id, region) in tree.iter() {
        let kind = match region.kind() {
            NodeKind::Empty => "empty",
            NodeKind::Leaf => "leaf",
            NodeKind::Branch => "branch",
        };
        println!(
            "{:<6} {:<7} {} parent={}",
            id.index(),
            kind,
            region,
            tree.parent_name(id).unwrap_or("-")
        );
    }

    Ok(())
}
