extern crate control_model;

use control_model::{Command, CommandMap, Fidelity, VehicleModel, VehicleParameters, VehicleState};

fn rollout(
    model: &dyn VehicleModel,
    start: VehicleState,
    command: Command,
    n: usize,
) -> Vec<VehicleState> {
    let mut states = vec![start];
    for _ in 0..n {
        let next = model.step(states.last().unwrap(), &command);
        states.push(next);
    }
    states
}

fn models() -> (Box<dyn VehicleModel + Send + Sync>, Box<dyn VehicleModel + Send + Sync>) {
    let params = VehicleParameters::default();
    (
        Fidelity::Dynamic.model(params, CommandMap::Stepped),
        Fidelity::Kinematic.model(params, CommandMap::Stepped),
    )
}

#[test]
fn fidelities_agree_without_steering() {
    let (dynamic, kinematic) = models();
    let start = VehicleState::new(0.0, 0.0, 0.0, 6.0, 0.0, 0.0);

    // Short enough that braking never reverses the vehicle.
    for &throttle in [0.6, 0.0, -0.2].iter() {
        let command = Command::new(throttle, 0.0);
        let a = rollout(&*dynamic, start, command, 30);
        let b = rollout(&*kinematic, start, command, 30);
        for (a, b) in a.iter().zip(b.iter()) {
            assert!(a.v_x > 0.0);
            assert_eq!(a.x, b.x);
            assert_eq!(a.v_x, b.v_x);
            assert_eq!(a.y, 0.0);
            assert_eq!(b.y, 0.0);
            assert_eq!(a.yaw_rate, 0.0);
            assert_eq!(b.yaw_rate, 0.0);
        }
    }
}

#[test]
fn fidelities_turn_the_same_way() {
    let (dynamic, kinematic) = models();
    let start = VehicleState::new(0.0, 0.0, 0.0, 6.0, 0.0, 0.0);

    for &steer in [0.05, -0.05].iter() {
        let command = Command::new(0.2, steer);
        let a = rollout(&*dynamic, start, command, 40);
        let b = rollout(&*kinematic, start, command, 40);
        let (a, b) = (a.last().unwrap(), b.last().unwrap());
        assert!(a.is_finite() && b.is_finite());
        assert_eq!(a.yaw.signum(), steer.signum());
        assert_eq!(b.yaw.signum(), steer.signum());
        assert_eq!(a.y.signum(), steer.signum());
        assert_eq!(b.y.signum(), steer.signum());
    }
}
