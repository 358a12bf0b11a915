use dynaframe::collab::chain::Chain;
use dynaframe::model::{ActuatorDef, BiasType, DynType, GainType, Integrator, Model, Options};

pub const GRAVITY: f64 = 9.81;

/// A chain with no actuators, suitable for unforced-dynamics tests.
pub fn unforced_chain(lengths: Vec<f64>, masses: Vec<f64>) -> (Chain, Model) {
    let chain = Chain::new(lengths, masses, GRAVITY);
    let model = chain.model(Vec::new());
    (chain, model)
}

/// A single-link pendulum: the only configuration where the chain's bias
/// force has no velocity dependence at all (no other link to couple
/// against), making Euler and the implicit integrator's correction term
/// exactly equivalent when damping is also zero.
pub fn single_link_chain() -> (Chain, Model) {
    unforced_chain(vec![1.0], vec![1.0])
}

pub fn double_link_chain() -> (Chain, Model) {
    unforced_chain(vec![1.0, 1.0], vec![1.0, 1.0])
}

/// A single-link chain with one direct-drive joint actuator: `ctrl[0]` is
/// applied as a joint torque with no gain/bias shaping, so it should be
/// interchangeable with `qfrc_applied`.
pub fn single_link_with_direct_actuator() -> (Chain, Model) {
    let chain = Chain::new(vec![1.0], vec![1.0], GRAVITY);
    let model = chain.model(vec![ActuatorDef {
        gaintype: GainType::Fixed,
        gainprm: {
            let mut p = [0.0; 10];
            p[0] = 1.0;
            p
        },
        biastype: BiasType::None,
        dyntype: DynType::None,
        ..Default::default()
    }]);
    (chain, model)
}

/// A single-link chain with one integrator-type (stateful) actuator whose
/// activation is range-limited to `[-0.5, 0.5]`.
pub fn single_link_with_limited_actuator() -> (Chain, Model) {
    let chain = Chain::new(vec![1.0], vec![1.0], GRAVITY);
    let model = chain.model(vec![ActuatorDef {
        gaintype: GainType::Fixed,
        gainprm: {
            let mut p = [0.0; 10];
            p[0] = 1.0;
            p
        },
        biastype: BiasType::None,
        dyntype: DynType::Integrator,
        actlimited: true,
        actrange: [-0.5, 0.5],
        ..Default::default()
    }]);
    (chain, model)
}

pub fn with_integrator(mut model: Model, integrator: Integrator) -> Model {
    model.opt = Options { integrator, ..model.opt };
    model
}

pub fn with_timestep(mut model: Model, timestep: f64) -> Model {
    model.opt = Options { timestep, ..model.opt };
    model
}

pub fn with_damping(mut model: Model, damping: f64) -> Model {
    model.dof_damping = vec![damping; model.nv];
    model
}
