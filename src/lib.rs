mod config;
mod error;
mod point;
mod quadtree;
mod region;

/// Receives each region of a finished tree, classified by point count.
pub trait QuadtreeVisitor {
    /// A region holding more than one point. Always subdivided.
    fn branch(&mut self, id: RegionId, region: &Region);
    fn leaf(&mut self, id: RegionId, region: &Region, point: &Point);
    fn empty(&mut self, id: RegionId, region: &Region);
}

pub use config::*;
pub use error::*;
pub use point::*;
pub use quadtree::*;
pub use region::*;
