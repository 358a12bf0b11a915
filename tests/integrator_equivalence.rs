mod common;

use approx::assert_abs_diff_eq;

use dynaframe::callbacks::Callbacks;
use dynaframe::model::Integrator;
use dynaframe::simulation::Simulation;

/// Two-link pendulum with joint damping and no actuators. Stepping Euler
/// ten times and stepping implicit ten times from the same starting state
/// (at rest, so the velocity-dependent Coriolis coupling stays negligible
/// over the run) must land on `qpos` vectors that differ from each other,
/// since Euler's damping treatment is only a diagonal approximation while
/// implicit linearizes the full smooth dynamics, but stay close, since both
/// are integrating the same underlying physical system.
#[test]
fn euler_and_implicit_agree_closely_under_joint_damping() {
    let (chain_euler, model) = common::double_link_chain();
    let model = common::with_damping(model, 0.3);
    let model_euler = common::with_integrator(model.clone(), Integrator::Euler);
    let mut sim_euler = Simulation::new(&model_euler, chain_euler);
    sim_euler.data.qpos[0] = 0.3;
    sim_euler.data.qpos[1] = -0.15;

    let (chain_implicit, _) = common::double_link_chain();
    let model_implicit = common::with_integrator(model, Integrator::Implicit);
    let mut sim_implicit = Simulation::new(&model_implicit, chain_implicit);
    sim_implicit.data.qpos[0] = 0.3;
    sim_implicit.data.qpos[1] = -0.15;

    let callbacks = Callbacks::none();
    for _ in 0..10 {
        sim_euler.step(&callbacks).unwrap();
        sim_implicit.step(&callbacks).unwrap();
    }

    let diff0 = (sim_euler.data.qpos[0] - sim_implicit.data.qpos[0]).abs();
    let diff1 = (sim_euler.data.qpos[1] - sim_implicit.data.qpos[1]).abs();
    assert!(diff0 > 0.0 && diff1 > 0.0, "Euler and implicit must not match exactly under damping");
    assert!(diff0 < 1e-6 && diff1 < 1e-6, "qpos diverged too far: {diff0}, {diff1}");
}

/// A single-link pendulum has no velocity-dependent bias term (nothing to
/// couple against) and no damping, so the implicit integrator's correction
/// collapses to the explicit mass matrix exactly: Euler and the fully
/// implicit integrator must agree to floating-point precision.
#[test]
fn euler_and_implicit_agree_without_damping_or_coupling() {
    let (chain_euler, model) = common::single_link_chain();
    let model_euler = common::with_integrator(model.clone(), Integrator::Euler);
    let mut sim_euler = Simulation::new(&model_euler, chain_euler);
    sim_euler.data.qpos[0] = 0.7;

    let (chain_implicit, _) = common::single_link_chain();
    let model_implicit = common::with_integrator(model, Integrator::Implicit);
    let mut sim_implicit = Simulation::new(&model_implicit, chain_implicit);
    sim_implicit.data.qpos[0] = 0.7;

    let callbacks = Callbacks::none();
    for _ in 0..50 {
        sim_euler.step(&callbacks).unwrap();
        sim_implicit.step(&callbacks).unwrap();
    }

    assert_abs_diff_eq!(sim_euler.data.qpos[0], sim_implicit.data.qpos[0], epsilon = 1e-9);
    assert_abs_diff_eq!(sim_euler.data.qvel[0], sim_implicit.data.qvel[0], epsilon = 1e-9);
}

/// `step2` downgrades `Integrator::Rk4` to semi-implicit Euler, since the
/// split `step1`/`step2` API can't re-run the forward pipeline at
/// intermediate Runge-Kutta stages. Calling `step1`+`step2` with RK4
/// selected should therefore match calling them with `Euler` selected,
/// given the same starting state.
#[test]
fn step2_downgrades_rk4_to_euler() {
    let (chain_rk4, model) = common::single_link_chain();
    let model_rk4 = common::with_integrator(model.clone(), Integrator::Rk4);
    let mut sim_rk4 = Simulation::new(&model_rk4, chain_rk4);
    sim_rk4.data.qpos[0] = 0.3;
    sim_rk4.data.qvel[0] = 0.2;

    let (chain_euler, _) = common::single_link_chain();
    let model_euler = common::with_integrator(model, Integrator::Euler);
    let mut sim_euler = Simulation::new(&model_euler, chain_euler);
    sim_euler.data.qpos[0] = 0.3;
    sim_euler.data.qvel[0] = 0.2;

    let callbacks = Callbacks::none();
    sim_rk4.step1();
    sim_rk4.step2(&callbacks).unwrap();
    sim_euler.step1();
    sim_euler.step2(&callbacks).unwrap();

    assert_abs_diff_eq!(sim_rk4.data.qpos[0], sim_euler.data.qpos[0], epsilon = 1e-12);
    assert_abs_diff_eq!(sim_rk4.data.qvel[0], sim_euler.data.qvel[0], epsilon = 1e-12);
}
