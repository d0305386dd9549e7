//! Axis aligned rectangles in map coordinates, used for analysis extents.

use geo_types::CoordNum;

use crate::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect<T>
where
    T: Copy + CoordNum,
{
    top_left: Point<T>,
    bottom_right: Point<T>,
}

impl<T> Rect<T>
where
    T: Copy + CoordNum,
{
    /// Creates the rectangle spanned by two arbitrary corner points.
    pub fn from_points(p1: Point<T>, p2: Point<T>) -> Self {
        let top_left = Point::new(min(p1.x(), p2.x()), max(p1.y(), p2.y()));
        let bottom_right = Point::new(max(p1.x(), p2.x()), min(p1.y(), p2.y()));

        Rect { top_left, bottom_right }
    }

    pub fn from_bounds(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self::from_points(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    pub fn top_left(&self) -> Point<T> {
        self.top_left
    }

    pub fn bottom_right(&self) -> Point<T> {
        self.bottom_right
    }

    /// True if the point lies inside the rectangle or on its border
    pub fn contains_point(&self, point: Point<T>) -> bool {
        point.x() >= self.top_left.x()
            && point.x() <= self.bottom_right.x()
            && point.y() <= self.top_left.y()
            && point.y() >= self.bottom_right.y()
    }
}

fn min<T: PartialOrd>(a: T, b: T) -> T {
    if a < b { a } else { b }
}

fn max<T: PartialOrd>(a: T, b: T) -> T {
    if b > a { b } else { a }
}
