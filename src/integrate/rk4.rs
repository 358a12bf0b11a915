//! Explicit Runge-Kutta integration, generalized over a [`RkTableau`] but
//! with only the classic fourth-order tableau provided.
//!
//! Unlike [`super::euler`]/[`super::implicit`], RK4 needs to re-run the
//! *entire* forward pipeline at each intermediate stage (each stage's
//! `qacc`/`act_dot` depend on that stage's own `qpos`/`qvel`), so it takes
//! the full evaluation as a closure rather than assuming `qacc`/`act_dot`
//! are already current for `data`'s state. Stage `0` is the exception: its
//! `qacc`/`act_dot` are assumed already valid from a `forward` the caller
//! ran before calling `step`, so `eval` only runs for stages `1..N`.

use crate::collab::PositionCollaborators;
use crate::data::Data;
use crate::error::FatalError;
use crate::integrate::{clamp_act, stateful_actuator_defs};
use crate::math::Vector;
use crate::model::Model;

/// An explicit Runge-Kutta Butcher tableau: nodes `c`, a strictly
/// lower-triangular coefficient matrix `a`, and weights `b`.
#[derive(Clone, Debug)]
pub struct RkTableau {
    pub order: usize,
    pub nodes: Vec<f64>,
    pub matrix: Vec<Vec<f64>>,
    pub weights: Vec<f64>,
}

impl RkTableau {
    /// The classic fourth-order tableau. The only constructor provided;
    /// `step` below rejects any other order rather than guess at a scheme
    /// nothing calls for yet.
    pub fn rk4() -> Self {
        RkTableau {
            order: 4,
            nodes: vec![0.0, 0.5, 0.5, 1.0],
            matrix: vec![
                vec![],
                vec![0.5],
                vec![0.0, 0.5],
                vec![0.0, 0.0, 1.0],
            ],
            weights: vec![1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
        }
    }
}

/// Advance `data` by `dt` using `tableau`, calling `eval` once per stage
/// `1..N` to refresh `data.qacc`/`data.act_dot` at that stage's
/// `qpos`/`qvel`/`act`/`time`. `eval` is expected to re-run the full
/// forward pipeline, including re-invoking the control callback, so every
/// RK stage sees a fresh control evaluation.
///
/// Positions are advanced through `collab.integrate_pos` using the
/// weighted sum of stage velocities as the rate, not by summing `qpos`
/// linearly, the same distinction the semi-implicit integrators don't
/// need to make, since a collaborator with quaternion-valued joints must
/// renormalize rather than add.
pub fn step<C: PositionCollaborators>(
    tableau: &RkTableau,
    model: &Model,
    data: &mut Data,
    collab: &mut C,
    mut eval: impl FnMut(&Model, &mut Data, &mut C),
) -> Result<(), FatalError> {
    if tableau.order != 4 {
        return Err(FatalError::UnsupportedRkOrder(tableau.order));
    }

    let dt = model.opt.timestep;
    let n = tableau.nodes.len();
    let qpos0 = data.qpos.clone();
    let qvel0 = data.qvel.clone();
    let act0 = data.act.clone();
    let time0 = data.time;

    let mut k_qvel: Vec<Vector> = Vec::with_capacity(n);
    let mut k_qacc: Vec<Vector> = Vec::with_capacity(n);
    let mut k_actdot: Vec<Vector> = Vec::with_capacity(n);

    // Stage 0: X[0]/F[0] are exactly what `data` already holds (the caller
    // ran `forward`), so no `eval` call and no state reconstruction.
    k_qvel.push(qvel0.clone());
    k_qacc.push(data.qacc.clone());
    k_actdot.push(data.act_dot.clone());

    for i in 1..n {
        let mut dvel = Vector::zeros(qvel0.len());
        let mut qvel = qvel0.clone();
        let mut act = act0.clone();
        for j in 0..i {
            let a = tableau.matrix[i][j];
            if a != 0.0 {
                dvel += a * &k_qvel[j];
                qvel += dt * a * &k_qacc[j];
                act += dt * a * &k_actdot[j];
            }
        }

        let mut qpos = qpos0.clone();
        collab.integrate_pos(model, &mut qpos, &dvel, dt);

        data.qpos = qpos;
        data.qvel = qvel;
        data.act = act;
        data.time = time0 + dt * tableau.nodes[i];

        eval(model, data, collab);

        k_qvel.push(data.qvel.clone());
        k_qacc.push(data.qacc.clone());
        k_actdot.push(data.act_dot.clone());
    }

    let mut dvel = Vector::zeros(qvel0.len());
    let mut qvel = qvel0;
    let mut act = act0;
    for i in 0..n {
        let w = tableau.weights[i];
        dvel += w * &k_qvel[i];
        qvel += dt * w * &k_qacc[i];
        act += dt * w * &k_actdot[i];
    }

    let mut qpos = qpos0;
    collab.integrate_pos(model, &mut qpos, &dvel, dt);

    data.qpos = qpos;
    data.qvel = qvel;
    data.act = act;
    data.time = time0 + dt;

    for (j, def) in stateful_actuator_defs(model) {
        data.act[j] = clamp_act(def, data.act[j]);
    }

    Ok(())
}
