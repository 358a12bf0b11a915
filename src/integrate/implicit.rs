//! Fully implicit integration (`mj_implicit`): factor `M - dt *
//! d(qfrc_smooth)/d(qvel)` and solve for `qacc` against that instead of the
//! explicit mass matrix, trading one analytical-Jacobian collaborator call
//! per step for unconditional stability against stiff damping and muscle
//! dynamics.

use crate::collab::{ImplicitCollaborators, PositionCollaborators};
use crate::data::Data;
use crate::model::Model;
use crate::scratch::Scratch;

pub fn step<C: PositionCollaborators + ImplicitCollaborators>(
    model: &Model,
    data: &mut Data,
    collab: &mut C,
    scratch: &mut Scratch,
) {
    let dt = model.opt.timestep;

    scratch.scoped(|scratch| {
        let mut deriv = scratch.alloc(model.nd);
        collab.smooth_derivative(model, data, &mut deriv);
        data.q_deriv.copy_from_slice(&deriv);
    });

    collab.factor_implicit(model, data, dt);
    let rhs = &data.qfrc_smooth + &data.qfrc_constraint;
    data.qacc = collab.solve_implicit(model, data, &rhs);

    data.qvel = &data.qvel + dt * &data.qacc;
    let qvel = data.qvel.clone();
    collab.integrate_pos(model, &mut data.qpos, &qvel, dt);

    // Unlike Euler/RK4, `act` advances but is not clamped to `actrange`
    // here; see the design notes.
    data.act = &data.act + dt * &data.act_dot;

    data.time += dt;
}
