//! Semi-implicit (symplectic) Euler (`mj_Euler`): the default integrator.
//!
//! Plain explicit Euler is unconditionally unstable for any meaningful
//! joint damping, so when `model.dof_damping` has any nonzero entry the
//! mass matrix is refactored as `M + dt * diag(damping)` and `qacc` is
//! resolved against that before advancing velocity, an implicit treatment
//! of damping alone, not of the full dynamics. The refactorization is
//! scratch: the undamped factorization is restored before returning so a
//! subsequent `forward_skip` call sees exactly what the position stage
//! left behind.

use crate::collab::PositionCollaborators;
use crate::data::Data;
use crate::integrate::{clamp_act, stateful_actuator_defs};
use crate::model::Model;
use crate::scratch::Scratch;

pub fn step(model: &Model, data: &mut Data, collab: &mut impl PositionCollaborators, scratch: &mut Scratch) {
    let dt = model.opt.timestep;
    let has_damping = model.dof_damping.iter().any(|&d| d != 0.0);

    if has_damping {
        let saved_qld = data.qld.clone();
        let saved_diag_inv = data.qld_diag_inv.clone();
        let saved_diag_sqrt_inv = data.qld_diag_sqrt_inv.clone();

        // `added` is a scratch temporary: it only feeds the refactor below
        // and is gone again before this function returns.
        scratch.scoped(|scratch| {
            let mut added = scratch.alloc(model.nv);
            for (i, slot) in added.iter_mut().enumerate() {
                *slot = dt * model.dof_damping[i];
            }
            collab.factor_with_added_diagonal(model, data, &added);
        });
        let rhs = &data.qfrc_smooth + &data.qfrc_constraint;
        data.qacc = collab.solve_mass(model, data, &rhs);

        data.qld = saved_qld;
        data.qld_diag_inv = saved_diag_inv;
        data.qld_diag_sqrt_inv = saved_diag_sqrt_inv;
    }

    data.qvel = &data.qvel + dt * &data.qacc;
    let qvel = data.qvel.clone();
    collab.integrate_pos(model, &mut data.qpos, &qvel, dt);

    data.act = &data.act + dt * &data.act_dot;
    for (j, def) in stateful_actuator_defs(model) {
        data.act[j] = clamp_act(def, data.act[j]);
    }

    data.time += dt;
}
