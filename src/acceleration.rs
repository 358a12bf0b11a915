//! Acceleration-stage driver (`mj_fwdAcceleration`): assembles the smooth
//! force `qfrc_smooth` and solves `M * qacc_smooth = qfrc_smooth` using the
//! factorization the position stage already computed.

use crate::collab::PositionCollaborators;
use crate::data::Data;
use crate::diagnostics::{Diagnostics, TimerKind};
use crate::model::Model;
use crate::scratch::Scratch;

/// Joint-space force from a per-DoF `xfrc_applied` wrench, added on top of
/// `qfrc_applied`, using `scratch` for the per-call accumulator rather than
/// allocating a fresh buffer every step. The reference chain collaborator
/// treats each DoF as already being in generalized coordinates, so this is a
/// direct sum; a collaborator with real Cartesian bodies would map through
/// its own Jacobian instead, which is why this lives in the driver and not
/// in `crate::collab`: it is a fixed, representation-independent
/// combination.
fn total_applied_force(data: &Data, scratch: &mut Scratch) -> crate::math::Vector {
    scratch.scoped(|scratch| {
        let mut acc = scratch.alloc(data.qfrc_applied.len());
        for (i, slot) in acc.iter_mut().enumerate() {
            *slot = data.qfrc_applied[i];
        }
        for (i, w) in data.xfrc_applied.iter().enumerate() {
            acc[i] += w.force.iter().sum::<f64>() + w.torque.iter().sum::<f64>();
        }
        crate::math::Vector::from_column_slice(&acc)
    })
}

/// `mj_fwdAcceleration`: `qfrc_smooth = qfrc_actuator + qfrc_passive +
/// (qfrc_applied + xfrc_applied) - qfrc_bias`, then `qacc_smooth = M^-1 *
/// qfrc_smooth` via the Cholesky-like factorization left in
/// `data.qld`/`data.qld_diag_inv` by the position stage.
pub fn fwd_acceleration(
    model: &Model,
    data: &mut Data,
    collab: &impl PositionCollaborators,
    diag: &mut Diagnostics,
    scratch: &mut Scratch,
) {
    let _span = tracy_client::span!("fwd_acceleration");
    diag.timed(TimerKind::Acceleration, || {
        let applied = total_applied_force(data, scratch);
        data.qfrc_smooth = &data.qfrc_actuator + &data.qfrc_passive + &applied - &data.qfrc_bias;
        data.qacc_smooth = collab.solve_mass(model, data, &data.qfrc_smooth.clone());
    });
}
