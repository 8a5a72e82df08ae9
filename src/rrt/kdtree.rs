use crate::geometry::Vector;

/// A node of the search tree.
#[derive(Clone, Debug)]
pub struct Node {
    /// The position in the field plane.
    position: Vector,
    /// Whether the node lies inside an obstacle or outside the playfield.
    in_obstacle: bool,
    /// The node this one was extended from (None for the root).
    previous: Option<usize>,
    /// The splitting axis, alternates between 0 (x) and 1 (y) with depth.
    axis: usize,
    parent: Option<usize>,
    children: [Option<usize>; 2],
}

impl Node {
    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn in_obstacle(&self) -> bool {
        self.in_obstacle
    }

    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    /// Index of the child on the same side of the splitting plane as `position`.
    fn near_side(&self, position: &Vector) -> usize {
        (position[self.axis] > self.position[self.axis]) as usize
    }
}

/// A two-dimensional k-d tree holding the nodes of one RRT.
///
/// Nodes live in an arena and refer to each other by index. The tree is never
/// rebalanced, it is rebuilt from scratch for every planning call.
#[derive(Clone, Debug)]
pub struct KdTree {
    nodes: Vec<Node>,
}

impl KdTree {
    /// Creates a tree containing only the root node.
    ///
    /// Parameters:
    /// - `position`: The position of the root node.
    /// - `in_obstacle`: Whether the root lies inside an obstacle.
    pub fn new(position: Vector, in_obstacle: bool) -> Self {
        Self {
            nodes: vec![Node {
                position,
                in_obstacle,
                previous: None,
                axis: 0,
                parent: None,
                children: [None, None],
            }],
        }
    }

    /// Index of the root node.
    pub fn root(&self) -> usize {
        0
    }

    /// Inserts a new node.
    ///
    /// Parameters:
    /// - `position`: Position of the new node.
    /// - `in_obstacle`: Whether the new node is inside an obstacle.
    /// - `previous`: The node the new one was extended from.
    ///
    /// Returns:
    /// The index of the newly created node.
    pub fn insert(&mut self, position: Vector, in_obstacle: bool, previous: Option<usize>) -> usize {
        let mut parent = self.root();
        let side = loop {
            let side = self.nodes[parent].near_side(&position);
            match self.nodes[parent].children[side] {
                Some(child) => parent = child,
                None => break side,
            }
        };

        let index = self.nodes.len();
        self.nodes.push(Node {
            position,
            in_obstacle,
            previous,
            axis: self.nodes[parent].axis ^ 1,
            parent: Some(parent),
            children: [None, None],
        });
        self.nodes[parent].children[side] = Some(index);
        index
    }

    /// Searches the node closest to `position`.
    ///
    /// Ties are resolved in favor of the node visited first.
    pub fn nearest(&self, position: Vector) -> usize {
        let mut best = Nearest {
            index: self.root(),
            distance: f32::INFINITY,
            distance_squared: f32::INFINITY,
        };
        self.nearest_in_subtree(&position, self.root(), &mut best);
        best.index
    }

    fn nearest_in_subtree(&self, position: &Vector, subtree_root: usize, best: &mut Nearest) {
        // descend to the leaf on the query side
        let mut current = subtree_root;
        while let Some(child) = self.nodes[current].children[self.nodes[current].near_side(position)] {
            current = child;
        }

        loop {
            let node = &self.nodes[current];
            let distance_squared = node.position.distance_squared(position);
            if distance_squared < best.distance_squared {
                best.distance_squared = distance_squared;
                best.distance = distance_squared.sqrt();
                best.index = current;
            }

            let axis = node.axis;
            if (position[axis] - node.position[axis]).abs() <= best.distance {
                let far_side = node.near_side(position) ^ 1;
                if let Some(far_child) = node.children[far_side] {
                    self.nearest_in_subtree(position, far_child, best);
                }
            }

            // stop unwinding at the root of the searched subtree
            if current == subtree_root {
                break;
            }
            match node.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
    }

    pub fn position(&self, node: usize) -> Vector {
        self.nodes[node].position
    }

    pub fn in_obstacle(&self, node: usize) -> bool {
        self.nodes[node].in_obstacle
    }

    pub fn previous(&self, node: usize) -> Option<usize> {
        self.nodes[node].previous
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order, the root first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of levels of the tree.
    pub fn depth(&self) -> usize {
        self.subtree_depth(self.root())
    }

    fn subtree_depth(&self, node: usize) -> usize {
        let children = self.nodes[node].children;
        1 + children
            .iter()
            .flatten()
            .map(|&child| self.subtree_depth(child))
            .max()
            .unwrap_or(0)
    }

    /// Follows the `previous` links from `node` back to the node without predecessor.
    pub fn chain(&self, node: usize) -> Chain<'_> {
        Chain {
            tree: self,
            next: Some(node),
        }
    }
}

struct Nearest {
    index: usize,
    distance: f32,
    distance_squared: f32,
}

/// Iterator over a `previous` chain of a `KdTree`.
pub struct Chain<'a> {
    tree: &'a KdTree,
    next: Option<usize>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.tree.previous(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force_nearest(tree: &KdTree, query: Vector) -> f32 {
        tree.nodes()
            .iter()
            .map(|node| node.position().distance_squared(&query))
            .fold(f32::INFINITY, f32::min)
    }

    #[test]
    fn single_node() {
        let tree = KdTree::new(Vector::new(1.0, 2.0), true);
        assert_eq!(tree.nearest(Vector::new(-100.0, 50.0)), 0);
        assert!(tree.in_obstacle(0));
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn insertion_alternates_axes() {
        let mut tree = KdTree::new(Vector::new(0.0, 0.0), false);
        let right = tree.insert(Vector::new(1.0, 0.0), false, Some(0));
        let right_up = tree.insert(Vector::new(2.0, 1.0), false, Some(right));
        let left = tree.insert(Vector::new(-1.0, 5.0), false, Some(0));
        assert_eq!(tree.nodes()[right].axis, 1);
        assert_eq!(tree.nodes()[right_up].axis, 0);
        assert_eq!(tree.nodes()[left].axis, 1);
        assert_eq!(tree.nodes()[0].children, [Some(left), Some(right)]);
        assert_eq!(tree.nodes()[right].children, [None, Some(right_up)]);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn chain_follows_previous_links() {
        let mut tree = KdTree::new(Vector::new(0.0, 0.0), false);
        let a = tree.insert(Vector::new(0.1, 0.0), false, Some(0));
        let b = tree.insert(Vector::new(0.2, 0.0), false, Some(a));
        let c = tree.insert(Vector::new(0.0, 0.3), false, Some(0));
        assert_eq!(tree.chain(b).collect::<Vec<_>>(), vec![b, a, 0]);
        assert_eq!(tree.chain(c).collect::<Vec<_>>(), vec![c, 0]);
    }

    #[test]
    fn nearest_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(7);
        for size in [1usize, 2, 3, 10, 100, 1000] {
            let mut tree = KdTree::new(
                Vector::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0)),
                false,
            );
            for _ in 1..size {
                let p = Vector::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
                tree.insert(p, false, None);
            }
            for _ in 0..200 {
                let query = Vector::new(rng.gen_range(-7.0..7.0), rng.gen_range(-7.0..7.0));
                let found = tree.position(tree.nearest(query)).distance_squared(&query);
                assert_eq!(found, brute_force_nearest(&tree, query));
            }
        }
    }

    #[test]
    fn nearest_on_degenerate_insertion_order() {
        // sorted input degrades to a list but must stay correct
        let mut tree = KdTree::new(Vector::new(0.0, 0.0), false);
        for i in 1..200 {
            tree.insert(Vector::new(i as f32 * 0.1, i as f32 * 0.1), false, None);
        }
        let query = Vector::new(10.04, 9.97);
        let nearest = tree.position(tree.nearest(query));
        assert!((nearest.x - 10.0).abs() < 1e-4);
        assert!((nearest.y - 10.0).abs() < 1e-4);
    }
}
