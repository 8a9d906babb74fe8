use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A feature's (m/z, rt) coordinates tagged with its node id.
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    position: [f64; 2],
    item: usize,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// 2D nearest-neighbour index over (m/z, rt) coordinates.
///
/// Distances are Euclidean in the combined space, so querying with a radius
/// of `sqrt(mz_tol² + rt_tol²)` yields a conservative superset of the
/// rectangular tolerance box; callers re-check each axis exactly.
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
    len: usize,
}

impl SpatialIndex {
    /// Bulk load the index. The position of a coordinate in the slice is the
    /// id reported by queries.
    pub fn new(coords: &[(f64, f64)]) -> Self {
        let points: Vec<IndexedPoint> = coords
            .iter()
            .enumerate()
            .map(|(item, &(mz, rt))| IndexedPoint {
                position: [mz, rt],
                item,
            })
            .collect();
        SpatialIndex {
            tree: RTree::bulk_load(points),
            len: coords.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All unordered pairs of distinct points within `radius` of each other,
    /// each reported exactly once with the smaller id first, sorted.
    pub fn query_pairs(&self, radius: f64) -> Vec<(usize, usize)> {
        // pad for squaring round-off so points at exactly `radius` are kept
        let radius_2 = radius * radius * (1.0 + 1e-12);
        let mut pairs = Vec::new();
        for point in self.tree.iter() {
            for hit in self.tree.locate_within_distance(point.position, radius_2) {
                if hit.item > point.item {
                    pairs.push((point.item, hit.item));
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }
}
