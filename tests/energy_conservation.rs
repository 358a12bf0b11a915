mod common;

use dynaframe::callbacks::Callbacks;
use dynaframe::collab::IoCollaborators;
use dynaframe::model::Integrator;
use dynaframe::simulation::Simulation;

fn total_energy(sim: &Simulation<'_, dynaframe::collab::chain::Chain>) -> f64 {
    let [k, p] = sim.collab.energy(sim.model, &sim.data);
    k + p
}

fn run(integrator: Integrator, steps: usize) -> f64 {
    let (chain, model) = common::double_link_chain();
    let model = common::with_integrator(model, integrator);
    let mut sim = Simulation::new(&model, chain);
    sim.data.qpos[0] = 1.0;
    sim.data.qpos[1] = 0.5;
    let e0 = total_energy(&sim);

    let callbacks = Callbacks::none();
    for _ in 0..steps {
        sim.step(&callbacks).expect("undamped chain never hits a fatal error");
    }
    total_energy(&sim) - e0
}

/// An unforced, undamped pendulum has no energy source or sink; semi-
/// implicit Euler doesn't conserve energy exactly, but it should stay
/// bounded near the initial value rather than drifting away monotonically.
#[test]
fn semi_implicit_euler_bounds_energy_over_many_steps() {
    let (chain, model) = common::double_link_chain();
    let model = common::with_timestep(model, 0.001);

    let mut sim = Simulation::new(&model, chain);
    sim.data.qpos[0] = 1.0;
    sim.data.qpos[1] = 0.5;

    let e0 = total_energy(&sim);

    let callbacks = Callbacks::none();
    let mut max_drift: f64 = 0.0;
    for _ in 0..2000 {
        sim.step(&callbacks).expect("undamped chain never hits a fatal error");
        max_drift = max_drift.max((total_energy(&sim) - e0).abs());
    }

    assert!(
        max_drift < 0.05 * e0.abs().max(1.0),
        "energy drifted by {max_drift}, starting from {e0}"
    );
}

/// Frictionless pendulum, 500 steps: RK4's fourth-order accuracy leaves the
/// smallest energy drift, the fully implicit integrator's numerical damping
/// leaves less drift than semi-implicit Euler's, and none of the three
/// integrators conserves energy exactly.
#[test]
fn energy_drift_orders_rk4_below_implicit_below_euler() {
    let e_rk4 = run(Integrator::Rk4, 500).abs();
    let e_implicit = run(Integrator::Implicit, 500).abs();
    let e_euler = run(Integrator::Euler, 500).abs();

    assert!(e_rk4 > 0.0 && e_implicit > 0.0 && e_euler > 0.0);
    assert!(
        e_rk4 < e_implicit && e_implicit < e_euler,
        "expected |E_RK4| < |E_IMPLICIT| < |E_EULER|, got {e_rk4} / {e_implicit} / {e_euler}"
    );
}
