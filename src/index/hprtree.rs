use super::error::IndexError;
use super::hilbert;
use crate::geo::Region;

const DEFAULT_NODE_CAPACITY: usize = 16;
const DEFAULT_HILBERT_LEVEL: u32 = 12;

struct Item<T> {
    region: Region,
    payload: T,
}

/// one level of the bulk-built tree: the bounds of every node at that
/// level, indexed positionally. Node `i`'s children are nodes
/// `[i * C, i * C + C)` of the layer below; the leaf layer's "children"
/// are items (addressed through `order`) instead of nodes.
struct Layer {
    bounds: Vec<Region>,
}

struct BuiltIndex {
    /// item indices (into the original insertion-ordered `items` vec),
    /// permuted into Hilbert-code order. The leaf layer's node `i` covers
    /// `order[i * C .. i * C + C]`.
    order: Vec<usize>,
    layers: Vec<Layer>,
}

/// A static, bulk-built spatial index over axis-aligned regions. Items are
/// Hilbert-sorted and packed bottom-up into fixed-capacity nodes on the
/// first call to [`HilbertRTree::query`] or [`HilbertRTree::build`];
/// inserting after that point fails with [`IndexError::Sealed`].
pub struct HilbertRTree<T> {
    items: Vec<Item<T>>,
    node_capacity: usize,
    hilbert_level: u32,
    built: Option<BuiltIndex>,
}

impl<T> Default for HilbertRTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HilbertRTree<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            node_capacity: DEFAULT_NODE_CAPACITY,
            hilbert_level: DEFAULT_HILBERT_LEVEL,
            built: None,
        }
    }

    pub fn with_node_capacity(mut self, node_capacity: usize) -> Self {
        self.node_capacity = node_capacity.max(1);
        self
    }

    pub fn with_hilbert_level(mut self, level: u32) -> Self {
        self.hilbert_level = hilbert::clamp_level(level);
        self
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.built.is_some()
    }

    /// registers an item. Only valid before the first [`query`](Self::query)
    /// or explicit [`build`](Self::build) call.
    pub fn insert(&mut self, region: Region, payload: T) -> Result<(), IndexError> {
        if self.built.is_some() {
            return Err(IndexError::Sealed);
        }
        self.items.push(Item { region, payload });
        Ok(())
    }

    /// not supported on a static bulk-built index.
    pub fn delete(&mut self) -> Result<(), IndexError> {
        Err(IndexError::Unsupported)
    }

    /// forces the bulk build if it hasn't run yet. Idempotent.
    pub fn build(&mut self) {
        if self.built.is_some() {
            return;
        }
        self.built = Some(Self::bulk_load(&self.items, self.node_capacity, self.hilbert_level));
    }

    fn bulk_load(items: &[Item<T>], node_capacity: usize, level: u32) -> BuiltIndex {
        if items.is_empty() {
            return BuiltIndex {
                order: Vec::new(),
                layers: vec![Layer { bounds: Vec::new() }],
            };
        }

        let total_extent = items
            .iter()
            .fold(Region::empty(), |acc, item| acc.expand_to_include(&item.region));

        let mut order: Vec<usize> = (0..items.len()).collect();
        let codes: Vec<u32> = items
            .iter()
            .map(|item| {
                let (cx, cy) = item.region.center();
                hilbert::encode_point(&total_extent, cx, cy, level)
            })
            .collect();
        // ties broken by insertion order: `order` starts ascending by index,
        // and the sort is stable, so equal codes stay in insertion order.
        order.sort_by_key(|&idx| codes[idx]);

        let leaf_bounds: Vec<Region> = order
            .chunks(node_capacity)
            .map(|chunk| {
                chunk.iter().fold(Region::empty(), |acc, &idx| {
                    acc.expand_to_include(&items[idx].region)
                })
            })
            .collect();

        let mut layers = vec![Layer { bounds: leaf_bounds }];
        while layers.last().unwrap().bounds.len() > 1 {
            let prev = &layers.last().unwrap().bounds;
            let next: Vec<Region> = prev
                .chunks(node_capacity)
                .map(|chunk| {
                    chunk
                        .iter()
                        .fold(Region::empty(), |acc, b| acc.expand_to_include(b))
                })
                .collect();
            layers.push(Layer { bounds: next });
        }

        BuiltIndex { order, layers }
    }

    /// range query; triggers the lazy one-shot build on first call.
    pub fn query(&mut self, region: &Region) -> Vec<&T> {
        self.build();
        let mut results = Vec::new();
        let built = self.built.as_ref().unwrap();
        let top_bounds_empty = built
            .layers
            .last()
            .map(|l| l.bounds.is_empty())
            .unwrap_or(true);
        if top_bounds_empty {
            return results;
        }
        let top = built.layers.len() - 1;
        Self::query_node(built, top, 0, region, &self.items, self.node_capacity, &mut results);
        results
    }

    fn query_node<'a>(
        built: &BuiltIndex,
        layer_idx: usize,
        node_idx: usize,
        query_region: &Region,
        items: &'a [Item<T>],
        node_capacity: usize,
        results: &mut Vec<&'a T>,
    ) {
        let bounds = match built.layers[layer_idx].bounds.get(node_idx) {
            Some(b) => b,
            None => return,
        };
        if !bounds.intersects(query_region) {
            return;
        }
        if layer_idx == 0 {
            let start = node_idx * node_capacity;
            let end = (start + node_capacity).min(built.order.len());
            for &idx in &built.order[start..end] {
                let item = &items[idx];
                if item.region.intersects(query_region) {
                    results.push(&item.payload);
                }
            }
            return;
        }
        let child_layer = layer_idx - 1;
        let child_start = node_idx * node_capacity;
        let child_count = built.layers[child_layer]
            .bounds
            .len()
            .saturating_sub(child_start)
            .min(node_capacity);
        for offset in 0..child_count {
            Self::query_node(
                built,
                child_layer,
                child_start + offset,
                query_region,
                items,
                node_capacity,
                results,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_after_build_fails() {
        let mut tree: HilbertRTree<usize> = HilbertRTree::new();
        tree.insert(Region::new(0.0, 0.0, 1.0, 1.0), 0).unwrap();
        tree.build();
        let err = tree.insert(Region::new(1.0, 1.0, 2.0, 2.0), 1).unwrap_err();
        assert_eq!(err, IndexError::Sealed);
    }

    #[test]
    fn test_delete_unsupported() {
        let mut tree: HilbertRTree<usize> = HilbertRTree::new();
        assert_eq!(tree.delete().unwrap_err(), IndexError::Unsupported);
    }

    #[test]
    fn test_unit_square_grid_query_counts() {
        let mut tree: HilbertRTree<usize> = HilbertRTree::new();
        for i in 0..100 {
            let f = i as f64;
            tree.insert(Region::new(f, f, f + 1.0, f + 1.0), i).unwrap();
        }
        assert_eq!(tree.query(&Region::new(5.0, 5.0, 6.0, 6.0)).len(), 3);
        assert_eq!(tree.query(&Region::new(0.0, 0.0, 10.0, 10.0)).len(), 11);
    }

    #[test]
    fn test_query_on_empty_tree() {
        let mut tree: HilbertRTree<usize> = HilbertRTree::new();
        assert!(tree.query(&Region::new(0.0, 0.0, 1.0, 1.0)).is_empty());
    }

    #[test]
    fn test_no_false_negatives_against_brute_force() {
        let mut tree: HilbertRTree<usize> = HilbertRTree::new();
        let regions: Vec<Region> = (0..250)
            .map(|i| {
                let f = (i % 17) as f64 * 3.0;
                Region::new(f, f - 1.0, f + 2.0, f + 1.0)
            })
            .collect();
        for (i, r) in regions.iter().enumerate() {
            tree.insert(*r, i).unwrap();
        }
        let query_region = Region::new(10.0, 9.0, 14.0, 11.0);
        let expected: std::collections::HashSet<usize> = regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.intersects(&query_region))
            .map(|(i, _)| i)
            .collect();
        let found: std::collections::HashSet<usize> =
            tree.query(&query_region).into_iter().copied().collect();
        assert_eq!(found, expected);
    }
}
