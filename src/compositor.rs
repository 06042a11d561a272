//! Painter's-order merge of wall columns and sprites.
//!
//! Rays and entities are sorted separately, farthest first, then merged:
//! before each column is painted, every pending entity strictly farther
//! than that column is painted. Anything without a plane distance is
//! left out.

use crate::entity::Entity;
use crate::ray::Ray;

/// Anything with a perpendicular distance to the viewpoint.
pub trait Depth {
    fn plane_dist(&self) -> Option<f32>;
}

impl Depth for Ray {
    fn plane_dist(&self) -> Option<f32> {
        Ray::plane_dist(self)
    }
}

impl Depth for Entity {
    fn plane_dist(&self) -> Option<f32> {
        self.projection().map(|p| p.plane_dist)
    }
}

impl<T: Depth + ?Sized> Depth for &T {
    fn plane_dist(&self) -> Option<f32> {
        (**self).plane_dist()
    }
}

impl Depth for Option<f32> {
    fn plane_dist(&self) -> Option<f32> {
        *self
    }
}

/// One paint operation, indexing into the slices given to [`draw_order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawItem {
    Column(usize),
    Object(usize),
}

/// Far-to-near paint order for a ray fan and a set of objects.
///
/// Equal distances keep their input order, and an object at exactly a
/// column's distance is painted after that column.
pub fn draw_order<R: Depth, O: Depth>(rays: &[R], objects: &[O]) -> Vec<DrawItem> {
    let columns = far_to_near(rays);
    let mut pending = far_to_near(objects).into_iter().peekable();
    let mut order = Vec::with_capacity(columns.len() + pending.len());

    for (column, dist) in columns {
        while let Some((object, _)) = pending.next_if(|&(_, d)| d > dist) {
            order.push(DrawItem::Object(object));
        }
        order.push(DrawItem::Column(column));
    }
    order.extend(pending.map(|(object, _)| DrawItem::Object(object)));
    order
}

// sorted copy of (index, distance); the caller's slice is never reordered
fn far_to_near<T: Depth>(items: &[T]) -> Vec<(usize, f32)> {
    let mut sorted: Vec<(usize, f32)> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| item.plane_dist().map(|d| (i, d)))
        .collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
    sorted
}
