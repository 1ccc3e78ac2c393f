use glam::Vec2;
use physics2d::{Aabb, BodyType, PhysicsError, PhysicsWorld, Shape, WorldConfig};

#[test]
fn body_lifecycle_and_id_reuse() {
    let mut world = PhysicsWorld::new();
    let a = world.add_body(Shape::Circle { radius: 1.0 }, 1.0).unwrap();
    let b = world.add_body(Shape::Circle { radius: 1.0 }, 1.0).unwrap();
    assert_ne!(a, b);

    world.remove_body(a).unwrap();
    let c = world.add_body(Shape::Circle { radius: 1.0 }, 1.0).unwrap();
    assert_eq!(c, a, "freed ids are recycled");
    assert_eq!(world.len(), 2);
}

#[test]
fn invalid_bodies_are_rejected_up_front() {
    let mut world = PhysicsWorld::new();
    assert!(matches!(
        world.add_body(Shape::Polygon { vertices: vec![] }, 1.0),
        Err(PhysicsError::DegenerateShape(_))
    ));
    assert!(matches!(
        world.add_body(Shape::Circle { radius: 1.0 }, -2.0),
        Err(PhysicsError::InvalidMass(_))
    ));
    assert!(matches!(
        world.remove_body(42),
        Err(PhysicsError::UnknownBody(42))
    ));
    assert!(world.is_empty());
}

#[test]
fn removing_a_body_mid_simulation_is_clean() {
    let mut world = PhysicsWorld::new();
    world
        .add_static_body(Shape::rectangle(20.0, 1.0), Vec2::ZERO)
        .unwrap();
    let cube = world.add_body(Shape::rectangle(1.0, 1.0), 1.0).unwrap();
    world.body_mut(cube).unwrap().position = Vec2::new(0.0, 1.0);

    for _ in 0..30 {
        world.step(1.0 / 60.0);
    }
    world.remove_body(cube).unwrap();
    // The next steps must not touch the removed body's contacts.
    for _ in 0..10 {
        world.step(1.0 / 60.0);
    }
    assert!(world.contacts().is_empty());
}

#[test]
fn world_queries_see_current_poses() {
    let mut world = PhysicsWorld::new();
    let id = world.add_body(Shape::Circle { radius: 0.5 }, 1.0).unwrap();
    world.body_mut(id).unwrap().position = Vec2::new(10.0, 0.0);
    world.step(1.0 / 60.0);

    let hits = world.query_aabb(&Aabb::new(Vec2::new(10.0, 0.0), 1.0, 1.0));
    assert_eq!(hits, vec![id]);
    assert_eq!(world.raycast(Vec2::ZERO, Vec2::X), vec![id]);
    assert!(world.raycast(Vec2::ZERO, Vec2::Y).is_empty());
}

#[test]
fn kinematic_bodies_move_but_ignore_gravity() {
    let mut world = PhysicsWorld::new();
    let id = world.add_body(Shape::Circle { radius: 0.5 }, 1.0).unwrap();
    {
        let body = world.body_mut(id).unwrap();
        body.set_body_type(BodyType::Kinematic);
        body.velocity = Vec2::new(1.0, 0.0);
    }
    for _ in 0..60 {
        world.step(1.0 / 60.0);
    }
    let body = world.body(id).unwrap();
    assert!((body.position.x - 1.0).abs() < 1e-3);
    assert!(body.position.y.abs() < 1e-6, "gravity leaked into kinematic");
}

#[test]
fn sleeping_bodies_are_left_alone() {
    let mut world = PhysicsWorld::new();
    let id = world.add_body(Shape::Circle { radius: 0.5 }, 1.0).unwrap();
    world.body_mut(id).unwrap().sleeping = true;
    for _ in 0..30 {
        world.step(1.0 / 60.0);
    }
    let body = world.body(id).unwrap();
    assert_eq!(body.position, Vec2::ZERO);
    assert_eq!(body.velocity, Vec2::ZERO);
}

#[test]
fn custom_config_is_honored() {
    let config = WorldConfig {
        gravity: Vec2::new(0.0, -1.0),
        ..WorldConfig::default()
    };
    let mut world = PhysicsWorld::with_config(config);
    let id = world.add_body(Shape::Circle { radius: 0.5 }, 1.0).unwrap();
    world.step(1.0);
    let vy = world.body(id).unwrap().velocity.y;
    assert!((vy + 1.0).abs() < 1e-2, "vy {vy}");
}
