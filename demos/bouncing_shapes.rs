//! A ball, two crates and a wedge dropped into a 500 x 500 canvas.
//!
//! Run with `RUST_LOG=debug` to see per-step profiles.

use impulse2d::*;

fn main() -> Result<(), PhysicsError> {
    env_logger::init();

    let mut world = World::default();
    let canvas = Aabb::from_min_max(0.0, 0.0, 500.0, 500.0);

    let ball = world.add_body(
        BodyDesc::circle(50.0)
            .position(50.0, 30.0)
            .velocity(0.2, 0.01)
            .restitution(0.9)
            .friction(0.8),
    )?;
    let small_crate = world.add_body(
        BodyDesc::rectangle(100.0, 50.0)
            .position(300.0, 30.0)
            .velocity(0.2, 0.5)
            .restitution(0.9),
    )?;
    let big_crate = world.add_body(
        BodyDesc::rectangle(150.0, 150.0)
            .position(250.0, 200.0)
            .velocity(0.2, 0.5)
            .restitution(0.9),
    )?;
    let wedge = world.add_body(
        BodyDesc::polygon(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(80.0, 0.0),
            Vec2::new(40.0, 60.0),
        ])
        .position(420.0, 380.0)
        .velocity(-0.1, -0.2),
    )?;

    world.add_behavior(BehaviorSpec::gravity(Vec2::new(0.0, 0.0004)))?;
    world.add_behavior(BehaviorSpec::edges(canvas, 0.99, 0.99))?;
    world.add_behavior(BehaviorSpec::collision_detection())?;
    world.add_behavior(BehaviorSpec::impulse_response())?;
    world.add_behavior(BehaviorSpec::sweep_prune())?;

    let names = [
        (ball, "ball"),
        (small_crate, "crate"),
        (big_crate, "big crate"),
        (wedge, "wedge"),
    ];

    // Drive the world the way a 60 Hz render loop would.
    let mut now = 0.0;
    for frame in 0..=300 {
        let report = world.step(now)?;
        if frame % 30 == 0 {
            println!(
                "t = {:>5.0} ms  substeps {}  contacts {}",
                now, report.frame.substeps, report.contacts
            );
            for (handle, name) in names {
                let body = world.body(handle)?;
                println!(
                    "  {name:<9} pos ({:>6.1}, {:>6.1})  vel ({:>6.3}, {:>6.3})  angle {:>6.2}",
                    body.position().x,
                    body.position().y,
                    body.velocity().x,
                    body.velocity().y,
                    body.angle()
                );
            }
        }
        for event in world.collisions() {
            log::info!(
                "contact {} / {} depth {:.3}",
                event.body_a,
                event.body_b,
                event.depth
            );
        }
        now += 1000.0 / 60.0;
    }
    Ok(())
}
