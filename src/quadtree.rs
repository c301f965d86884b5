use std::fmt;
use std::ops::Index;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::point::{Point, PointSet};
use crate::region::{NodeKind, Region};
use crate::QuadtreeVisitor;

/// Position of a region in a `QuadTree` arena, assigned in construction order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(usize);

impl RegionId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct Node {
    parent: Option<RegionId>,
    // The four children of a split are stored contiguously.
    first_child: Option<RegionId>,
}

/// Every region created by one build, root first.
///
/// Regions hold no links of their own; the hierarchy lives in a parallel
/// node list indexed by `RegionId`.
#[derive(Clone, Debug)]
pub struct QuadTree {
    regions: Vec<Region>,
    nodes: Vec<Node>,
}

impl QuadTree {
    pub const ROOT: RegionId = RegionId(0);

    fn with_root(root: Region) -> Self {
        Self {
            regions: vec![root],
            nodes: vec![Node::default()],
        }
    }

    fn insert(&mut self, region: Region, parent: RegionId) -> RegionId {
        let id = RegionId(self.regions.len());
        self.regions.push(region);
        self.nodes.push(Node {
            parent: Some(parent),
            first_child: None,
        });
        id
    }

    pub fn root(&self) -> &Region {
        &self.regions[Self::ROOT.0]
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0)
    }

    pub fn parent(&self, id: RegionId) -> Option<RegionId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn parent_name(&self, id: RegionId) -> Option<&str> {
        self.parent(id).map(|p| self.regions[p.0].name())
    }

    /// Children in UR, UL, LR, LL order, or `None` for a terminal region.
    pub fn children(&self, id: RegionId) -> Option<[RegionId; 4]> {
        let fc = self.nodes.get(id.0)?.first_child?;
        Some([
            RegionId(fc.0),
            RegionId(fc.0 + 1),
            RegionId(fc.0 + 2),
            RegionId(fc.0 + 3),
        ])
    }

    pub fn is_terminal(&self, id: RegionId) -> bool {
        self.children(id).is_none()
    }

    /// Number of regions, root included. Never zero.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &Region)> + '_ {
        self.regions.iter().enumerate().map(|(i, r)| (RegionId(i), r))
    }

    /// Regions that were never subdivided.
    pub fn leaves(&self) -> impl Iterator<Item = (RegionId, &Region)> + '_ {
        self.iter().filter(move |(id, _)| self.is_terminal(*id))
    }

    /// `(child name, parent name)` for every non-root region.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.iter()
            .filter_map(move |(id, r)| self.parent_name(id).map(|p| (r.name(), p)))
    }

    /// Descends from the root to the terminal region containing `point`.
    pub fn find_leaf(&self, point: &Point) -> Option<RegionId> {
        if !self.root().contains(point) {
            return None;
        }
        let mut current = Self::ROOT;
        while let Some(children) = self.children(current) {
            current = children
                .into_iter()
                .find(|c| self.regions[c.0].contains(point))?;
        }
        Some(current)
    }

    /// Depth-first walk from the root, visiting each region once.
    ///
    /// Regions are reported by point count, so a root holding fewer than two
    /// points is reported as empty or leaf even though it was split.
    pub fn traverse<V>(&self, visitor: &mut V)
        where
            V: QuadtreeVisitor,
    {
        let mut to_process = vec![Self::ROOT];

        while let Some(id) = to_process.pop() {
            if let Some(children) = self.children(id) {
                to_process.extend(children);
            }
            let region = &self.regions[id.0];
            match region.kind() {
                NodeKind::Branch => visitor.branch(id, region),
                NodeKind::Empty => visitor.empty(id, region),
                NodeKind::Leaf => {
                    if let Some(point) = region.points().first() {
                        visitor.leaf(id, region, point);
                    }
                }
            }
        }
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        self.traverse(&mut summary);
        summary
    }
}

impl Index<RegionId> for QuadTree {
    type Output = Region;

    fn index(&self, id: RegionId) -> &Region {
        &self.regions[id.0]
    }
}

/// Region counts by kind, gathered with a traversal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub regions: usize,
    pub empty: usize,
    pub leaves: usize,
    pub branches: usize,
    pub max_depth: u32,
}

impl Summary {
    fn record(&mut self, region: &Region) {
        self.regions += 1;
        self.max_depth = self.max_depth.max(region.depth());
    }
}

impl QuadtreeVisitor for Summary {
    fn branch(&mut self, _id: RegionId, region: &Region) {
        self.record(region);
        self.branches += 1;
    }

    fn leaf(&mut self, _id: RegionId, region: &Region, _point: &Point) {
        self.record(region);
        self.leaves += 1;
    }

    fn empty(&mut self, _id: RegionId, region: &Region) {
        self.record(region);
        self.empty += 1;
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} regions ({} branch, {} leaf, {} empty), depth {}",
            self.regions, self.branches, self.leaves, self.empty, self.max_depth
        )
    }
}

/// Builds a `QuadTree` by splitting regions until none holds more than one
/// point.
#[derive(Copy, Clone, Debug)]
pub struct TreeBuilder {
    max_depth: u32,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

impl TreeBuilder {
    pub const DEFAULT_MAX_DEPTH: u32 = 48;

    pub fn new() -> Self {
        Self::default()
    }

    /// Deepest level at which a region may still need splitting.
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Seeds `root` with `points` and builds the tree.
    pub fn build_with_points(&self, mut root: Region, points: &PointSet) -> Result<QuadTree> {
        let accepted = root.add_points(points.iter().copied());
        if accepted < points.len() {
            warn!(
                region = root.name(),
                dropped = points.len() - accepted,
                "points outside the root region were dropped"
            );
        }
        self.build(root)
    }

    /// Splits `root` and, depth first, every child holding more than one
    /// point. The root itself is always split once.
    ///
    /// Fails with `Error::DepthExceeded` when a region that needs splitting
    /// sits at `max_depth` or is too small for its midlines to be
    /// represented.
    pub fn build(&self, root: Region) -> Result<QuadTree> {
        let mut tree = QuadTree::with_root(root);
        let mut to_process = vec![QuadTree::ROOT];

        while let Some(parent) = to_process.pop() {
            let region = &tree.regions[parent.0];
            if !region.bounds().is_divisible() {
                warn!(region = region.name(), depth = region.depth(), "region too small to split");
                return Err(Error::DepthExceeded {
                    region: region.name().to_owned(),
                    depth: region.depth(),
                    points: region.len(),
                });
            }
            let children = tree.regions[parent.0].subdivide();
            debug!(
                region = tree.regions[parent.0].name(),
                points = tree.regions[parent.0].len(),
                "subdividing"
            );

            tree.nodes[parent.0].first_child = Some(RegionId(tree.regions.len()));
            for child in children {
                let expand = child.len() > 1;
                if expand && child.depth() >= self.max_depth {
                    warn!(region = child.name(), depth = child.depth(), "depth limit reached");
                    return Err(Error::DepthExceeded {
                        region: child.name().to_owned(),
                        depth: child.depth(),
                        points: child.len(),
                    });
                }
                let id = tree.insert(child, parent);
                if expand {
                    to_process.push(id);
                }
            }
        }

        info!(regions = tree.len(), points = tree.root().len(), "quadtree built");
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn build(points: &[(f64, f64)]) -> Result<QuadTree> {
        let root = Region::new(0.0, 512.0, 512.0, 512.0, "Main").unwrap();
        let points: PointSet = points.iter().copied().map(Point::from).collect();
        TreeBuilder::new().build_with_points(root, &points)
    }

    fn by_name<'a>(tree: &'a QuadTree, name: &str) -> (RegionId, &'a Region) {
        tree.iter().find(|(_, r)| r.name() == name).unwrap()
    }

    #[test]
    fn single_point_splits_root_once() {
        let tree = build(&[(10.0, 10.0)]).unwrap();
        assert_eq!(tree.len(), 5);

        let (ll, region) = by_name(&tree, "Main_LL");
        assert_eq!(region.len(), 1);
        assert!(region.points().contains(&Point::new(10.0, 10.0)));
        assert!(tree.is_terminal(ll));
        for name in ["Main_UR", "Main_UL", "Main_LR"] {
            let (id, sibling) = by_name(&tree, name);
            assert!(sibling.is_empty());
            assert!(tree.is_terminal(id));
        }
        assert_eq!(tree.find_leaf(&Point::new(10.0, 10.0)), Some(ll));
    }

    #[test]
    fn far_points_separate_after_one_split() {
        let tree = build(&[(5.0, 5.0), (500.0, 500.0)]).unwrap();
        assert_eq!(tree.len(), 5);
        assert_eq!(by_name(&tree, "Main_LL").1.len(), 1);
        assert_eq!(by_name(&tree, "Main_UR").1.len(), 1);
        assert!(tree.leaves().all(|(_, r)| r.len() <= 1));
    }

    #[test]
    fn coincident_points_collapse() {
        let tree = build(&[(5.0, 5.0), (5.0, 5.0)]).unwrap();
        assert_eq!(tree.root().len(), 1);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn near_coincident_points_hit_depth_limit() {
        let root = Region::new(0.0, 512.0, 512.0, 512.0, "Main").unwrap();
        let points: PointSet = [Point::new(5.0, 5.0), Point::new(5.0 + 1e-9, 5.0)].into();

        let err = TreeBuilder::new()
            .max_depth(8)
            .build_with_points(root.clone(), &points)
            .unwrap_err();
        match err {
            Error::DepthExceeded { depth, points, .. } => {
                assert_eq!(depth, 8);
                assert_eq!(points, 2);
            }
            other => panic!("unexpected error: {other}"),
        }

        let tree = TreeBuilder::new().build_with_points(root, &points).unwrap();
        let leaves: Vec<_> = tree.leaves().filter(|(_, r)| r.len() == 1).collect();
        assert_eq!(leaves.len(), 2);
    }

    #[test]
    fn float_resolution_stops_the_build() {
        let root = Region::new(0.0, 512.0, 512.0, 512.0, "Main").unwrap();
        let points: PointSet = [
            Point::new(1.0, 300.0),
            Point::new(1.0 + 2f64.powi(-50), 300.0),
        ]
        .into();

        let err = TreeBuilder::new()
            .max_depth(100)
            .build_with_points(root, &points)
            .unwrap_err();
        match err {
            Error::DepthExceeded { depth, points, .. } => {
                assert!(depth < 100);
                assert_eq!(points, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn points_outside_root_are_dropped() {
        let tree = build(&[(10.0, 10.0), (512.0, 10.0), (10.0, 512.0), (-1.0, 3.0)]).unwrap();
        assert_eq!(tree.root().len(), 1);
        assert_eq!(tree.find_leaf(&Point::new(512.0, 10.0)), None);
    }

    #[test]
    fn depth_first_construction_order() {
        let tree = build(&[(300.0, 300.0), (400.0, 400.0), (10.0, 10.0), (100.0, 100.0)]).unwrap();
        let names: Vec<&str> = tree.iter().map(|(_, r)| r.name()).collect();
        assert_eq!(tree.len(), 17);
        assert_eq!(&names[1..5], ["Main_UR", "Main_UL", "Main_LR", "Main_LL"]);
        // Main_LL was pushed last, so it is split first.
        assert_eq!(names[5], "Main_LL_UR");
        assert_eq!(names[9], "Main_LL_LL_UR");
        assert_eq!(names[13], "Main_UR_UR");
    }

    #[test]
    fn random_build_invariants() {
        let mut rng = StdRng::seed_from_u64(1234);
        let points = Point::sample(&mut rng, 0.0, 512.0, 0.0, 512.0, 300);
        let root = Region::new(0.0, 512.0, 512.0, 512.0, "Main").unwrap();
        let tree = TreeBuilder::new().build_with_points(root, &points).unwrap();

        assert_eq!(tree.root().len(), points.len());

        let names: HashSet<&str> = tree.iter().map(|(_, r)| r.name()).collect();
        assert_eq!(names.len(), tree.len());

        let mut split = 0;
        for (id, region) in tree.iter() {
            match tree.children(id) {
                Some(children) => {
                    split += 1;
                    assert!(id == QuadTree::ROOT || region.len() > 1);
                    let area: f64 = children.iter().map(|c| tree[*c].area()).sum();
                    assert_eq!(area, region.area());
                    let count: usize = children.iter().map(|c| tree[*c].len()).sum();
                    assert_eq!(count, region.len());
                    for c in children {
                        assert_eq!(tree.parent(c), Some(id));
                        assert_eq!(tree[c].width(), region.width() / 2.0);
                        assert_eq!(tree[c].height(), region.height() / 2.0);
                        assert!(tree[c].points().is_subset(region.points()));
                    }
                }
                None => assert!(region.len() <= 1),
            }
        }
        assert_eq!(tree.len(), 1 + 4 * split);

        let occupied = tree.leaves().filter(|(_, r)| r.len() == 1).count();
        assert_eq!(occupied, points.len());
        for p in &points {
            let leaf = tree.find_leaf(p).unwrap();
            assert!(tree[leaf].points().contains(p));
        }
    }

    #[test]
    fn edges_link_every_non_root_region() {
        let tree = build(&[(5.0, 5.0), (6.0, 6.0), (500.0, 20.0)]).unwrap();
        let edges: Vec<(&str, &str)> = tree.edges().collect();
        assert_eq!(edges.len(), tree.len() - 1);
        assert!(edges.contains(&("Main_LL", "Main")));
        assert!(edges.iter().all(|(child, parent)| child.starts_with(parent)));
        assert_eq!(tree.parent_name(QuadTree::ROOT), None);
    }

    #[test]
    fn summary_counts_kinds() {
        let tree = build(&[(5.0, 5.0), (500.0, 500.0), (500.0, 5.0)]).unwrap();
        let summary = tree.summary();
        assert_eq!(summary.regions, 5);
        assert_eq!(summary.branches, 1);
        assert_eq!(summary.leaves, 3);
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.max_depth, 1);
    }

    #[test]
    fn traverse_is_depth_first() {
        struct Order(Vec<String>);
        impl QuadtreeVisitor for Order {
            fn branch(&mut self, _id: RegionId, region: &Region) {
                self.0.push(region.name().to_owned());
            }
            fn leaf(&mut self, _id: RegionId, region: &Region, _point: &Point) {
                self.0.push(region.name().to_owned());
            }
            fn empty(&mut self, _id: RegionId, region: &Region) {
                self.0.push(region.name().to_owned());
            }
        }

        let tree = build(&[(10.0, 10.0), (100.0, 100.0)]).unwrap();
        let mut order = Order(Vec::new());
        tree.traverse(&mut order);
        assert_eq!(order.0.len(), tree.len());
        assert_eq!(order.0[0], "Main");
        assert_eq!(order.0[1], "Main_LL");
        assert_eq!(order.0[2], "Main_LL_LL");
    }
}
