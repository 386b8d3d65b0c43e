//! Axis-aligned bounding boxes and a bounding-volume hierarchy over elements.

use gm_core::Real;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::part::Part;

const LEAF_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<Real>,
    pub max: Point3<Real>,
}

impl BoundingBox {
    /// A box containing nothing; `include` and `union` grow it.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(Real::INFINITY, Real::INFINITY, Real::INFINITY),
            max: Point3::new(Real::NEG_INFINITY, Real::NEG_INFINITY, Real::NEG_INFINITY),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point3<Real>>) -> Self {
        points.into_iter().fold(Self::empty(), |mut b, p| {
            b.include(&p);
            b
        })
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn include(&mut self, p: &Point3<Real>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn center(&self) -> Point3<Real> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<Real> {
        if self.is_valid() {
            self.max - self.min
        } else {
            Vector3::zeros()
        }
    }

    pub fn contains(&self, p: &Point3<Real>, tol: Real) -> bool {
        (0..3).all(|a| p[a] >= self.min[a] - tol && p[a] <= self.max[a] + tol)
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        (0..3).all(|a| self.min[a] <= other.max[a] && other.min[a] <= self.max[a])
    }
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        bbox: BoundingBox,
        start: usize,
        end: usize,
    },
    Branch {
        bbox: BoundingBox,
        left: usize,
        right: usize,
    },
}

impl TreeNode {
    fn bbox(&self) -> &BoundingBox {
        match self {
            TreeNode::Leaf { bbox, .. } | TreeNode::Branch { bbox, .. } => bbox,
        }
    }
}

/// Spatial index over element bounding boxes.
#[derive(Debug, Clone, Default)]
pub struct ElementSearchTree {
    nodes: Vec<TreeNode>,
    /// Element indices, permuted so every leaf owns a contiguous range.
    order: Vec<usize>,
    boxes: Vec<BoundingBox>,
}

impl ElementSearchTree {
    pub fn build(part: &Part) -> Self {
        let boxes: Vec<BoundingBox> = (0..part.element_count())
            .into_par_iter()
            .map(|e| part.element_bounding_box(e))
            .collect();
        let tree = Self::from_boxes(boxes);
        debug!(part = %part.name(), nodes = tree.nodes.len(), "element search tree built");
        tree
    }

    pub fn from_boxes(boxes: Vec<BoundingBox>) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            order: (0..boxes.len()).collect(),
            boxes,
        };
        if !tree.order.is_empty() {
            tree.split(0, tree.order.len());
        }
        tree
    }

    fn split(&mut self, start: usize, end: usize) -> usize {
        let bbox = self.order[start..end]
            .iter()
            .fold(BoundingBox::empty(), |b, &e| b.union(&self.boxes[e]));
        let slot = self.nodes.len();

        if end - start <= LEAF_SIZE {
            self.nodes.push(TreeNode::Leaf { bbox, start, end });
            return slot;
        }

        let ext = bbox.extent();
        let axis = if ext.x >= ext.y && ext.x >= ext.z {
            0
        } else if ext.y >= ext.z {
            1
        } else {
            2
        };
        let mid = start + (end - start) / 2;
        let boxes = &self.boxes;
        self.order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            boxes[a].center()[axis].total_cmp(&boxes[b].center()[axis])
        });

        // Reserve the slot, children are appended after it.
        self.nodes.push(TreeNode::Leaf { bbox, start, end });
        let left = self.split(start, mid);
        let right = self.split(mid, end);
        self.nodes[slot] = TreeNode::Branch { bbox, left, right };
        slot
    }

    pub fn element_count(&self) -> usize {
        self.boxes.len()
    }

    /// Elements whose bounding box intersects `query`, in ascending order.
    pub fn find_intersecting(&self, query: &BoundingBox) -> Vec<usize> {
        let mut hits = Vec::new();
        if self.nodes.is_empty() {
            return hits;
        }
        let mut stack = vec![0usize];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if !node.bbox().intersects(query) {
                continue;
            }
            match *node {
                TreeNode::Leaf { start, end, .. } => hits.extend(
                    self.order[start..end]
                        .iter()
                        .copied()
                        .filter(|&e| self.boxes[e].intersects(query)),
                ),
                TreeNode::Branch { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        hits.sort_unstable();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(x: Real) -> BoundingBox {
        BoundingBox::from_points([Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0)])
    }

    #[test]
    fn bbox_basics() {
        let b = unit_box_at(0.0);
        assert!(b.is_valid());
        assert!(!BoundingBox::empty().is_valid());
        assert!(b.contains(&Point3::new(0.5, 0.5, 0.5), 0.0));
        assert!(!b.contains(&Point3::new(1.5, 0.5, 0.5), 0.0));
        assert!(b.intersects(&unit_box_at(1.0)));
        assert!(!b.intersects(&unit_box_at(2.5)));
        assert_eq!(b.center(), Point3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn tree_finds_same_hits_as_brute_force() {
        let boxes: Vec<_> = (0..100).map(|i| unit_box_at(i as Real * 0.75)).collect();
        let tree = ElementSearchTree::from_boxes(boxes.clone());
        for q in [0.1, 10.0, 37.3, 74.9, 200.0] {
            let query = BoundingBox::from_points([Point3::new(q, 0.5, 0.5)]);
            let expected: Vec<usize> = (0..boxes.len())
                .filter(|&i| boxes[i].intersects(&query))
                .collect();
            assert_eq!(tree.find_intersecting(&query), expected);
        }
    }

    #[test]
    fn empty_tree_has_no_hits() {
        let tree = ElementSearchTree::from_boxes(Vec::new());
        assert!(tree.find_intersecting(&unit_box_at(0.0)).is_empty());
    }
}
