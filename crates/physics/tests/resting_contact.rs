use approx::assert_abs_diff_eq;
use glam::Vec2;
use physics2d::{PhysicsWorld, Shape};

const DT: f32 = 1.0 / 60.0;

/// A 1x1 dynamic box resting on a wide static floor.
fn box_on_floor() -> (PhysicsWorld, u32, u32) {
    let mut world = PhysicsWorld::new();
    let floor = world
        .add_static_body(Shape::rectangle(20.0, 1.0), Vec2::ZERO)
        .unwrap();
    let cube = world.add_body(Shape::rectangle(1.0, 1.0), 1.0).unwrap();
    world.body_mut(cube).unwrap().position = Vec2::new(0.0, 1.0);
    (world, floor, cube)
}

#[test]
fn box_comes_to_rest_on_the_floor() {
    let (mut world, _, cube) = box_on_floor();
    for _ in 0..180 {
        world.step(DT);
    }
    let body = world.body(cube).unwrap();
    assert!(
        body.velocity.y.abs() < 1e-2,
        "vertical velocity did not settle: {}",
        body.velocity.y
    );
    // The box must neither sink into the floor nor bounce away.
    assert_abs_diff_eq!(body.position.y, 1.0, epsilon = 0.05);
}

#[test]
fn resting_normal_impulse_balances_gravity() {
    let (mut world, floor, cube) = box_on_floor();
    for _ in 0..180 {
        world.step(DT);
    }
    let constraint = world.contacts().get(floor, cube).expect("resting contact");
    let total: f32 = constraint.points.iter().map(|p| p.normal_impulse).sum();
    let expected = 1.0 * 9.8 * DT;
    assert_abs_diff_eq!(total, expected, epsilon = 0.2 * expected);
}

#[test]
fn friction_impulses_stay_inside_the_cone() {
    let (mut world, _, cube) = box_on_floor();
    world.body_mut(cube).unwrap().velocity = Vec2::new(3.0, 0.0);
    for _ in 0..120 {
        world.step(DT);
        for constraint in world.contacts().iter() {
            for point in &constraint.points {
                assert!(
                    point.tangent_impulse.abs()
                        <= constraint.friction * point.normal_impulse + 1e-4,
                    "friction cone violated"
                );
            }
        }
    }
}

#[test]
fn friction_slows_a_sliding_box() {
    let (mut world, _, cube) = box_on_floor();
    world.body_mut(cube).unwrap().velocity = Vec2::new(3.0, 0.0);
    for _ in 0..300 {
        world.step(DT);
    }
    let body = world.body(cube).unwrap();
    assert!(
        body.velocity.x.abs() < 0.5,
        "box kept sliding: {}",
        body.velocity.x
    );
}

#[test]
fn stack_of_two_boxes_settles() {
    let mut world = PhysicsWorld::new();
    world
        .add_static_body(Shape::rectangle(20.0, 1.0), Vec2::ZERO)
        .unwrap();
    let lower = world.add_body(Shape::rectangle(1.0, 1.0), 1.0).unwrap();
    let upper = world.add_body(Shape::rectangle(1.0, 1.0), 1.0).unwrap();
    world.body_mut(lower).unwrap().position = Vec2::new(0.0, 1.0);
    world.body_mut(upper).unwrap().position = Vec2::new(0.0, 2.0);

    for _ in 0..300 {
        world.step(DT);
    }
    let lower_y = world.body(lower).unwrap().position.y;
    let upper_y = world.body(upper).unwrap().position.y;
    assert!((lower_y - 1.0).abs() < 0.08, "lower {lower_y}");
    assert!((upper_y - 2.0).abs() < 0.12, "upper {upper_y}");
    assert!(world.body(upper).unwrap().velocity.length() < 0.05);
}

#[test]
fn ellipse_comes_to_rest_on_the_floor() {
    // Ellipse contacts have no clip edges, so resting support runs entirely
    // through the single witness-point manifold.
    let mut world = PhysicsWorld::new();
    world
        .add_static_body(Shape::rectangle(20.0, 1.0), Vec2::ZERO)
        .unwrap();
    let blob = world
        .add_body(
            Shape::Ellipse {
                half_width: 1.0,
                half_height: 0.5,
            },
            1.0,
        )
        .unwrap();
    world.body_mut(blob).unwrap().position = Vec2::new(0.0, 1.2);

    for _ in 0..300 {
        world.step(DT);
    }
    let body = world.body(blob).unwrap();
    assert!(
        body.velocity.y.abs() < 0.05,
        "vertical velocity did not settle: {}",
        body.velocity.y
    );
    assert_abs_diff_eq!(body.position.y, 1.0, epsilon = 0.05);
}

#[test]
fn restitution_bounces_a_falling_circle() {
    let mut world = PhysicsWorld::new();
    world
        .add_static_body(Shape::rectangle(20.0, 1.0), Vec2::ZERO)
        .unwrap();
    let ball = world.add_body(Shape::Circle { radius: 0.5 }, 1.0).unwrap();
    {
        let body = world.body_mut(ball).unwrap();
        body.position = Vec2::new(0.0, 3.0);
        body.restitution = 0.8;
    }
    // Restitution of the pair is the minimum; raise the floor's too.
    let floor = world.bodies().find(|b| b.id != ball).unwrap().id;
    world.body_mut(floor).unwrap().restitution = 0.8;

    let mut bounced = false;
    for _ in 0..240 {
        world.step(DT);
        if world.body(ball).unwrap().velocity.y > 1.0 {
            bounced = true;
            break;
        }
    }
    assert!(bounced, "ball never bounced");
}
