pub mod line_segment;
pub mod vector;

pub use line_segment::LineSegment;
pub use vector::Vector;
