//! Velocity-stage driver (`mj_fwdVelocity`): tendon/actuator velocities and
//! the RNE bias force.
//!
//! `mj_checkVel` runs before this stage, not inside it. See
//! `crate::position` and `Simulation::step1`.

use crate::collab::VelocityCollaborators;
use crate::data::Data;
use crate::diagnostics::{Diagnostics, TimerKind};
use crate::model::Model;

pub fn fwd_velocity(model: &Model, data: &mut Data, collab: &mut impl VelocityCollaborators, diag: &mut Diagnostics) {
    let _span = tracy_client::span!("fwd_velocity");
    diag.timed(TimerKind::Velocity, || {
        // Fixed matrix-vector products against the Jacobians the position
        // stage already cached, not a named collaborator operation.
        // `ten_velocity` takes whichever representation `ten_j` happens to
        // hold (`Model::is_sparse` decides that when the position-stage
        // collaborator builds it); `actuator_moment` is always dense.
        data.ten_velocity = data.ten_j.mul_vec(&data.qvel);
        data.actuator_velocity = data.actuator_moment.mul_vec(&data.qvel);

        collab.com_vel(model, data);
        fwd_passive(model, data);
        collab.passive(model, data);
        collab.reference_constraint(model, data);
        collab.rne(model, data);
    });
}

/// `mj_fwdPassive`: joint damping is the only passive force the driver
/// models itself (springs, friction loss, and tendon passive forces are all
/// collaborator territory, since they depend on transmission data the
/// driver has no opinion about).
fn fwd_passive(model: &Model, data: &mut Data) {
    for i in 0..model.nv {
        data.qfrc_passive[i] = -model.dof_damping[i] * data.qvel[i];
    }
}
