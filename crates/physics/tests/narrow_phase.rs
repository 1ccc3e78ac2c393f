use approx::assert_abs_diff_eq;
use glam::Vec2;
use physics2d::collision::gjk::MAX_ITERATIONS;
use physics2d::{detect, distance, epa, gjk, Body, Shape};

fn circle(id: u32, x: f32, y: f32, radius: f32) -> Body {
    let mut body = Body::new(id, Shape::Circle { radius }, 1.0);
    body.position = Vec2::new(x, y);
    body
}

#[test]
fn gjk_is_sound_for_circle_pairs() {
    // Two circles overlap exactly when center distance < r1 + r2.
    for i in 0..40u8 {
        let d = 0.1 * f32::from(i);
        let a = circle(0, 0.0, 0.0, 1.0);
        let b = circle(1, d, 0.0, 1.0);
        let (hit, _) = gjk(&a, &b, MAX_ITERATIONS);
        let expected = d < 2.0;
        assert_eq!(hit, expected, "distance {d}");
    }
}

#[test]
fn epa_depth_matches_circle_overlap() {
    let a = circle(0, 0.0, 0.0, 1.0);
    let b = circle(1, 1.5, 0.0, 1.0);
    let (hit, simplex) = gjk(&a, &b, MAX_ITERATIONS);
    assert!(hit);
    let pen = epa(&a, &b, &simplex, MAX_ITERATIONS);
    assert_abs_diff_eq!(pen.depth, 0.5, epsilon = 1e-3);
    // Normal points from b into a.
    assert!((pen.normal - Vec2::new(-1.0, 0.0)).length() < 1e-2);
}

#[test]
fn epa_depth_under_diagonal_offset() {
    let a = circle(0, 0.0, 0.0, 1.0);
    let b = circle(1, 1.0, 1.0, 1.0);
    let (hit, simplex) = gjk(&a, &b, MAX_ITERATIONS);
    assert!(hit);
    let pen = epa(&a, &b, &simplex, MAX_ITERATIONS);
    let expected = 2.0 - std::f32::consts::SQRT_2;
    assert_abs_diff_eq!(pen.depth, expected, epsilon = 1e-2);
}

#[test]
fn distance_witness_points_sit_on_the_surfaces() {
    let a = circle(0, 0.0, 0.0, 1.0);
    let b = circle(1, 5.0, 0.0, 2.0);
    let (pa, pb) = distance(&a, &b, MAX_ITERATIONS);
    assert!((pa - Vec2::new(1.0, 0.0)).length() < 1e-3);
    assert!((pb - Vec2::new(3.0, 0.0)).length() < 1e-3);
    assert_abs_diff_eq!((pb - pa).length(), 2.0, epsilon = 1e-3);
}

#[test]
fn distance_between_rectangle_and_circle() {
    let mut a = Body::new(0, Shape::rectangle(2.0, 2.0), 1.0);
    a.position = Vec2::ZERO;
    let b = circle(1, 4.0, 0.0, 1.0);
    let (pa, pb) = distance(&a, &b, MAX_ITERATIONS);
    assert!((pa.x - 1.0).abs() < 1e-2, "pa {pa:?}");
    assert!((pb.x - 3.0).abs() < 1e-2, "pb {pb:?}");
}

#[test]
fn two_circle_end_to_end_manifold() {
    let a = circle(0, 0.0, 0.0, 1.0);
    let b = circle(1, 1.5, 0.0, 1.0);
    let collision = detect(&a, &b).expect("overlapping circles must collide");

    assert_abs_diff_eq!(collision.penetration, 0.5, epsilon = 1e-3);
    assert!(
        (collision.normal - Vec2::new(-1.0, 0.0)).length() < 1e-2,
        "normal {:?}",
        collision.normal
    );
    assert_eq!(collision.pairs.len(), 1);
    let (pa, pb) = collision.pairs[0];
    let midpoint = (pa + pb) * 0.5;
    assert!((midpoint - Vec2::new(0.75, 0.0)).length() < 1e-2, "mid {midpoint:?}");
}

#[test]
fn detector_handles_mixed_shape_pairs() {
    // Circle against rectangle uses the witness-point fallback.
    let mut a = Body::new(0, Shape::rectangle(2.0, 2.0), 1.0);
    a.position = Vec2::ZERO;
    let b = circle(1, 1.5, 0.0, 1.0);
    let collision = detect(&a, &b).expect("overlap expected");
    assert_eq!(collision.pairs.len(), 1);
    assert_abs_diff_eq!(collision.penetration, 0.5, epsilon = 1e-2);
}

#[test]
fn touching_bodies_report_no_collision() {
    let a = circle(0, 0.0, 0.0, 1.0);
    let b = circle(1, 2.0, 0.0, 1.0);
    assert!(detect(&a, &b).is_none());

    let mut c = Body::new(2, Shape::rectangle(2.0, 2.0), 1.0);
    let mut d = Body::new(3, Shape::rectangle(2.0, 2.0), 1.0);
    c.position = Vec2::ZERO;
    d.position = Vec2::new(2.0, 0.0);
    assert!(detect(&c, &d).is_none());
}

#[test]
fn ellipse_contact_uses_the_witness_fallback() {
    let mut a = Body::new(
        0,
        Shape::Ellipse {
            half_width: 2.0,
            half_height: 1.0,
        },
        1.0,
    );
    a.position = Vec2::ZERO;
    let mut b = Body::new(1, Shape::rectangle(2.0, 2.0), 1.0);
    b.position = Vec2::new(2.5, 0.0);

    let collision = detect(&a, &b).expect("overlap expected");
    assert_eq!(collision.pairs.len(), 1, "ellipse pairs never go through clipping");
    assert_abs_diff_eq!(collision.penetration, 0.5, epsilon = 1e-2);
    assert!(collision.normal.x.abs() > 0.99, "normal {:?}", collision.normal);
}

#[test]
fn capsule_contact_uses_the_witness_fallback() {
    let mut a = Body::new(
        0,
        Shape::Capsule {
            half_length: 1.0,
            radius: 0.5,
        },
        1.0,
    );
    a.position = Vec2::ZERO;
    let mut b = Body::new(1, Shape::rectangle(4.0, 1.0), 1.0);
    b.position = Vec2::new(0.0, -0.75);

    let collision = detect(&a, &b).expect("overlap expected");
    assert_eq!(collision.pairs.len(), 1);
    assert_abs_diff_eq!(collision.penetration, 0.25, epsilon = 1e-2);
    assert!(collision.normal.y > 0.99, "normal {:?}", collision.normal);
}

#[test]
fn point_body_inside_a_box_is_detected() {
    let mut a = Body::new(0, Shape::rectangle(2.0, 2.0), 1.0);
    a.position = Vec2::ZERO;
    let mut b = Body::new(1, Shape::Point, 1.0);
    b.position = Vec2::new(0.2, 0.0);

    let collision = detect(&a, &b).expect("point inside the box must collide");
    assert_eq!(collision.pairs.len(), 1);
    // Depth to the nearest face.
    assert_abs_diff_eq!(collision.penetration, 0.8, epsilon = 1e-2);
    let (_, pb) = collision.pairs[0];
    assert!((pb - b.position).length() < 1e-3, "witness on the point body: {pb:?}");
}

#[test]
fn deep_overlap_still_terminates() {
    // Nearly concentric bodies exercise the iteration budget; the result is
    // best effort but must be a valid overlap report.
    let a = circle(0, 0.0, 0.0, 1.0);
    let b = circle(1, 0.01, 0.0, 1.0);
    let collision = detect(&a, &b).expect("deep overlap must collide");
    assert!(collision.penetration > 1.5);
    assert!(collision.normal.is_finite());
}
