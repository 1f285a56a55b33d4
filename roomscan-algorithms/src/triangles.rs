//! Triangle rules for room measurement
//!
//! A rectangular room is checked with the classical 3-4-5 rule: two legs and
//! the diagonal must satisfy c² = a² + b². Floor plans with more corners are
//! split into triangles for area computation.

/// Relative tolerance on c² for a triangle to count as right-angled
pub const RIGHT_ANGLE_TOLERANCE: f32 = 0.02;

/// True when legs `a`, `b` and hypotenuse `c` form a right triangle within
/// [`RIGHT_ANGLE_TOLERANCE`]. `c` must be the longest side.
pub fn is_right_triangle_345(a: f32, b: f32, c: f32) -> bool {
    if a <= 0.0 || b <= 0.0 || c <= 0.0 {
        return false;
    }
    if c < a || c < b {
        return false;
    }
    let expected = a * a + b * b;
    let relative = (c * c - expected).abs() / expected.max(1e-10);
    relative <= RIGHT_ANGLE_TOLERANCE
}

/// Rescale a near-right triangle so the hypotenuse is exactly 5
pub fn scale_to_345(a: f32, b: f32, c: f32) -> Option<(f32, f32, f32)> {
    if !is_right_triangle_345(a, b, c) {
        return None;
    }
    let k = 5.0 / c;
    Some((k * a, k * b, 5.0))
}

/// Rescale length and width uniformly so their diagonal matches a measured
/// one. Inputs that already agree (or are non-positive) are returned as is.
pub fn refine_length_width_by_diagonal(length_m: f32, width_m: f32, diagonal_m: f32) -> (f32, f32) {
    if length_m <= 0.0 || width_m <= 0.0 || diagonal_m <= 0.0 {
        return (length_m, width_m);
    }
    let current = length_m * length_m + width_m * width_m;
    let target = diagonal_m * diagonal_m;
    if (current - target).abs() < 1e-6 * current.max(target) {
        return (length_m, width_m);
    }
    let scale = diagonal_m / current.sqrt();
    (length_m * scale, width_m * scale)
}

/// Length and width (larger first) of a rectangle from two adjacent sides and
/// a measured diagonal
pub fn room_rect_from_diagonals_and_sides(side_a_m: f32, side_b_m: f32, diagonal_m: f32) -> Option<(f32, f32)> {
    if side_a_m <= 0.0 || side_b_m <= 0.0 || diagonal_m <= 0.0 {
        return None;
    }
    let (l, w) = refine_length_width_by_diagonal(side_a_m.max(side_b_m), side_a_m.min(side_b_m), diagonal_m);
    Some((l.max(w), l.min(w)))
}

/// Side lengths `(|p1-p0|, |p2-p1|, |p0-p2|)` of a triangle in X/Z
pub fn triangle_sides_from_corners(corners: &[[f32; 2]; 3]) -> (f32, f32, f32) {
    let dist = |p: [f32; 2], q: [f32; 2]| ((q[0] - p[0]).powi(2) + (q[1] - p[1]).powi(2)).sqrt();
    (
        dist(corners[0], corners[1]),
        dist(corners[1], corners[2]),
        dist(corners[2], corners[0]),
    )
}

/// Fan triangulation of a convex polygon from its first vertex
pub fn triangulate_floor_plan(corner_count: usize) -> Vec<[usize; 3]> {
    if corner_count < 3 {
        return Vec::new();
    }
    (1..corner_count - 1).map(|i| [0, i, i + 1]).collect()
}

/// Heron's formula; zero for degenerate or invalid triangles
pub fn triangle_area_heron(a: f32, b: f32, c: f32) -> f32 {
    if a <= 0.0 || b <= 0.0 || c <= 0.0 {
        return 0.0;
    }
    let p = (a + b + c) / 2.0;
    if p <= a || p <= b || p <= c {
        return 0.0;
    }
    (p * (p - a) * (p - b) * (p - c)).sqrt()
}

/// Area of a convex X/Z floor plan as the sum of its fan triangles
pub fn floor_plan_area(corners: &[[f32; 2]]) -> f32 {
    triangulate_floor_plan(corners.len())
        .into_iter()
        .map(|[i, j, k]| {
            let (a, b, c) = triangle_sides_from_corners(&[corners[i], corners[j], corners[k]]);
            triangle_area_heron(a, b, c)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_right_triangle_check() {
        assert!(is_right_triangle_345(3.0, 4.0, 5.0));
        assert!(is_right_triangle_345(3.0, 4.0, 5.04));
        assert!(!is_right_triangle_345(3.0, 4.0, 5.2));
        // Hypotenuse must be the longest side
        assert!(!is_right_triangle_345(5.0, 4.0, 3.0));
        assert!(!is_right_triangle_345(0.0, 4.0, 5.0));
    }

    #[test]
    fn test_scale_to_345() {
        let (a, b, c) = scale_to_345(6.0, 8.0, 10.0).unwrap();
        assert_relative_eq!(a, 3.0, epsilon = 1e-6);
        assert_relative_eq!(b, 4.0, epsilon = 1e-6);
        assert_eq!(c, 5.0);
        assert!(scale_to_345(1.0, 1.0, 3.0).is_none());
    }

    #[test]
    fn test_refine_by_diagonal_preserves_ratio() {
        assert_eq!(refine_length_width_by_diagonal(4.0, 3.0, 5.0), (4.0, 3.0));

        let (l, w) = refine_length_width_by_diagonal(4.0, 3.0, 10.0);
        assert_relative_eq!(l, 8.0, epsilon = 1e-5);
        assert_relative_eq!(w, 6.0, epsilon = 1e-5);

        assert_eq!(refine_length_width_by_diagonal(4.0, 0.0, 10.0), (4.0, 0.0));
    }

    #[test]
    fn test_room_rect_orders_sides() {
        let (l, w) = room_rect_from_diagonals_and_sides(3.0, 4.0, 5.0).unwrap();
        assert_eq!((l, w), (4.0, 3.0));
        assert!(room_rect_from_diagonals_and_sides(3.0, -1.0, 5.0).is_none());
    }

    #[test]
    fn test_fan_triangulation() {
        assert!(triangulate_floor_plan(2).is_empty());
        assert_eq!(triangulate_floor_plan(5), vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    }

    #[test]
    fn test_heron_and_polygon_area() {
        assert_relative_eq!(triangle_area_heron(3.0, 4.0, 5.0), 6.0, epsilon = 1e-5);
        assert_eq!(triangle_area_heron(1.0, 1.0, 2.0), 0.0);

        let square = [[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 3.0]];
        assert_relative_eq!(floor_plan_area(&square), 12.0, epsilon = 1e-4);
    }
}
