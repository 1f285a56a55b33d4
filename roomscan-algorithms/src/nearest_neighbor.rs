//! Nearest neighbor search over fused scan clouds

use roomscan_core::{NearestNeighborSearch, Point3f};
use rstar::primitives::GeomWithData;
use rstar::RTree;

/// Cloud position tagged with its index in the source slice
type IndexedPosition = GeomWithData<[f32; 3], usize>;

/// R*-tree over cloud positions answering k-NN queries by point index.
///
/// Query cost does not depend on point spacing, so sparse single-frame clouds
/// are as cheap to search as dense fused ones.
pub struct PointIndex {
    tree: RTree<IndexedPosition>,
}

impl PointIndex {
    pub fn new(points: &[Point3f]) -> Self {
        let indexed = points
            .iter()
            .enumerate()
            .map(|(idx, p)| IndexedPosition::new([p.x, p.y, p.z], idx))
            .collect();
        Self {
            tree: RTree::bulk_load(indexed),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl NearestNeighborSearch for PointIndex {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        let q = [query.x, query.y, query.z];
        self.tree
            .nearest_neighbor_iter_with_distance_2(&q)
            .take(k)
            .map(|(entry, distance_2)| (entry.data, distance_2.sqrt()))
            .collect()
    }
}
