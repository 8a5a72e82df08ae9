use crate::geometry::Vector;
use crate::obstacles::Obstacle;
use crate::rrt::kdtree::KdTree;
use crate::rrt::path::Path;
use crate::rrt::world::Boundary;
use json::JsonValue;

pub fn vector_to_json_array(vector: &Vector) -> JsonValue {
    JsonValue::Array(vec![vector.x.into(), vector.y.into()])
}

pub fn boundary_to_json(boundary: &Boundary) -> JsonValue {
    json::object! {
        bottom_left: vector_to_json_array(&boundary.bottom_left),
        top_right: vector_to_json_array(&boundary.top_right),
    }
}

pub fn obstacle_to_json(obstacle: &Obstacle) -> JsonValue {
    match obstacle {
        Obstacle::Circle(circle) => json::object! {
            kind: "circle",
            center: vector_to_json_array(&circle.center()),
            radius: circle.radius(),
        },
        Obstacle::Capsule(capsule) => json::object! {
            kind: "line",
            start: vector_to_json_array(&capsule.segment().start()),
            end: vector_to_json_array(&capsule.segment().end()),
            width: capsule.width(),
        },
        Obstacle::Rect(rect) => json::object! {
            kind: "rect",
            bottom_left: vector_to_json_array(&rect.bottom_left()),
            top_right: vector_to_json_array(&rect.top_right()),
        },
    }
}

/// Exports the tree as a list of `[from, to]` edges following the `previous` links.
pub fn tree_to_json(tree: &KdTree) -> JsonValue {
    let edges = tree
        .nodes()
        .iter()
        .filter_map(|node| {
            let previous = node.previous()?;
            Some(JsonValue::Array(vec![
                vector_to_json_array(&tree.position(previous)),
                vector_to_json_array(&node.position()),
            ]))
        })
        .collect();
    JsonValue::Array(edges)
}

fn optional_tree_to_json(tree: Option<&KdTree>) -> JsonValue {
    tree.map(tree_to_json).unwrap_or(JsonValue::Null)
}

impl Path {
    /// Snapshot of the planner state for visualization: world, both trees and the last path.
    pub fn debug_json(&self) -> JsonValue {
        let world = self.world();
        json::object! {
            boundary: boundary_to_json(world.boundary()),
            radius: world.radius(),
            obstacles: JsonValue::Array(world.obstacles().iter().map(obstacle_to_json).collect()),
            sample_rect: boundary_to_json(self.sample_rect()),
            tree_start: optional_tree_to_json(self.tree_start()),
            tree_end: optional_tree_to_json(self.tree_end()),
            path: JsonValue::Array(self.last_path().iter().map(vector_to_json_array).collect()),
            cached_waypoints: self.waypoint_cache().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn exports_world_and_path() {
        let mut path = Path::new();
        path.set_boundary(-2.0, -2.0, 2.0, 2.0);
        path.set_radius(0.1);
        path.add_circle(0.0, 1.5, 0.2).unwrap();
        path.add_line(-1.0, -1.5, 1.0, -1.5, 0.1).unwrap();
        path.add_rect(1.5, 1.5, 1.8, 1.8).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        path.get(-1.0, 0.0, 1.0, 0.0, &mut rng).unwrap();

        let debug = path.debug_json();
        assert_eq!(debug["obstacles"].len(), 3);
        assert_eq!(debug["obstacles"][0]["kind"], "circle");
        assert_eq!(debug["obstacles"][1]["kind"], "line");
        assert_eq!(debug["path"].len(), 2);
        assert_eq!(debug["path"][0][0], -1.0);
        // every non-root node contributes one edge
        let tree_len = path.tree_start().unwrap().len();
        assert_eq!(debug["tree_start"].len(), tree_len - 1);
        assert!(debug["tree_end"].is_array());
    }

    #[test]
    fn exports_null_trees_before_planning() {
        let path = Path::new();
        let debug = path.debug_json();
        assert!(debug["tree_start"].is_null());
        assert_eq!(debug["path"].len(), 0);
    }
}
