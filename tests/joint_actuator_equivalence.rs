mod common;

use approx::assert_abs_diff_eq;

use dynaframe::callbacks::Callbacks;
use dynaframe::simulation::Simulation;

/// A direct-drive actuator (fixed gain 1, no bias, stateless) applying
/// `ctrl[0] = tau` should produce exactly the acceleration that applying
/// `tau` through `qfrc_applied` on an unactuated model would, since both
/// paths feed the same joint-space force into `qfrc_smooth`.
#[test]
fn direct_actuator_matches_equivalent_applied_force() {
    let tau = 0.8;

    let (chain_act, model_act) = common::single_link_with_direct_actuator();
    let mut sim_act = Simulation::new(&model_act, chain_act);
    sim_act.data.qpos[0] = 0.4;
    sim_act.data.ctrl[0] = tau;

    let (chain_applied, model_applied) = common::single_link_chain();
    let mut sim_applied = Simulation::new(&model_applied, chain_applied);
    sim_applied.data.qpos[0] = 0.4;
    sim_applied.data.qfrc_applied[0] = tau;

    let callbacks = Callbacks::none();
    sim_act.forward(&callbacks).unwrap();
    sim_applied.forward(&callbacks).unwrap();

    assert_abs_diff_eq!(sim_act.data.qacc[0], sim_applied.data.qacc[0], epsilon = 1e-12);
}
