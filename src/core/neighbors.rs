// Neighbour index: which points each point draws lines to.
//
// The selection rule is approximate and order dependent. The first
// `k` other points fill the list in encounter order; after that each
// candidate replaces the *first* entry that is farther away than it (not
// the farthest one), at most once. The result is usually, but not always,
// the true k nearest. Rendering depends on this exact output, so keep it.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::field::{dist_sq, Point};

/// Neighbour list for point `i`. Never contains `i`; length is
/// `min(k, points.len() - 1)`.
pub fn neighbors_of(points: &[Point], i: usize, k: usize) -> Vec<usize> {
    let p1 = points[i].pos();
    let mut closest: Vec<usize> = Vec::with_capacity(k);

    for (j, p2) in points.iter().enumerate() {
        if j == i {
            continue;
        }
        if closest.len() < k {
            closest.push(j);
            continue;
        }
        let d = dist_sq(p1, p2.pos());
        if let Some(slot) = closest
            .iter()
            .position(|&c| d < dist_sq(p1, points[c].pos()))
        {
            closest[slot] = j;
        }
    }
    closest
}

/// Assign every point its neighbour list, using current positions.
pub fn build_neighbor_index(points: &mut [Point], k: usize) {
    let view: &[Point] = points;

    #[cfg(feature = "parallel")]
    let lists: Vec<Vec<usize>> = (0..view.len())
        .into_par_iter()
        .map(|i| neighbors_of(view, i, k))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let lists: Vec<Vec<usize>> = (0..view.len())
        .map(|i| neighbors_of(view, i, k))
        .collect();

    for (p, closest) in points.iter_mut().zip(lists) {
        p.closest = closest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::field::Field;
    use crate::prng::Prng;

    fn line(xs: &[f64]) -> Vec<Point> {
        xs.iter().map(|&x| Point::new(x, 0.0, 2.0)).collect()
    }

    #[test]
    fn six_points_take_everyone_else_in_order() {
        let mut pts = line(&[0.0, 5.0, 1.0, 9.0, 3.0, 7.0]);
        build_neighbor_index(&mut pts, 5);
        assert_eq!(pts[0].closest, vec![1, 2, 3, 4, 5]);
        assert_eq!(pts[3].closest, vec![0, 1, 2, 4, 5]);
    }

    #[test]
    fn golden_replacement_is_first_farther_slot() {
        // Point 0 at the origin sees distances 4, 9, 100, 121, 144, then 1.
        // The late close point evicts slot 0 (d=4), not the farthest (d=144).
        let mut pts = line(&[0.0, 2.0, 3.0, 10.0, 11.0, 12.0, 1.0]);
        build_neighbor_index(&mut pts, 5);

        assert_eq!(pts[0].closest, vec![6, 2, 3, 4, 5]);
        // Point 6 (x=1): the sixth candidate (x=12) is farther than all slots.
        assert_eq!(pts[6].closest, vec![0, 1, 2, 3, 4]);
        // Point 5 (x=12): x=1 (d=121) evicts x=0 (d=144) in slot 0.
        assert_eq!(pts[5].closest, vec![6, 1, 2, 3, 4]);
    }

    #[test]
    fn small_fields_get_all_other_points() {
        let mut pts = line(&[0.0, 1.0, 2.0]);
        build_neighbor_index(&mut pts, 5);
        assert_eq!(pts[1].closest, vec![0, 2]);

        let mut single = line(&[4.0]);
        build_neighbor_index(&mut single, 5);
        assert!(single[0].closest.is_empty());
    }

    #[test]
    fn generated_field_lists_have_expected_shape() {
        let cfg = FieldConfig::default();
        let field = Field::generate(1280.0, 720.0, &cfg, &mut Prng::new(99), 0);
        let n = field.len();
        assert!(n > 6);
        for (i, p) in field.points.iter().enumerate() {
            assert_eq!(p.closest.len(), cfg.neighbor_count.min(n - 1));
            assert!(!p.closest.contains(&i));
            assert!(p.closest.iter().all(|&j| j < n));
        }
    }
}
