//! Position-stage driver (`mj_fwdPosition`): kinematics, mass matrix
//! factorization, tendon and actuator transmission lengths.
//!
//! The value-sanity checks (`mj_checkPos`/`mj_checkVel`) are *not* run
//! here: they run together at the top of a step, before this stage starts,
//! not interleaved with it. Running `check_vel` after this stage has
//! already cached `qm`/`ten_J`/etc. from a since-reset `qpos` would leave
//! those caches inconsistent with the reset state. See `Simulation::step1`.

use crate::collab::{ConstraintCollaborators, PositionCollaborators};
use crate::data::Data;
use crate::diagnostics::{Diagnostics, TimerKind};
use crate::model::Model;

/// Run every position-stage collaborator in the fixed order the rest of the
/// pipeline assumes: kinematics first (everything else reads body
/// transforms from it), then tendon and transmission, then mass matrix
/// composition and factorization, then collision/constraint detection last.
///
/// `collab.detect` (`makeConstraint`/`projectConstraint`) runs here, not in
/// `fwd_constraint`, because `nefc` is a function of positions only and
/// must not change between this stage and the constraint stage later in
/// the same step. Fixing it here, once, is what lets the velocity stage's
/// `referenceConstraint` write into `data.efc_aref` with the right length
/// before the constraint stage ever runs.
pub fn fwd_position<C: PositionCollaborators + ConstraintCollaborators>(
    model: &Model,
    data: &mut Data,
    collab: &mut C,
    diag: &mut Diagnostics,
) {
    let _span = tracy_client::span!("fwd_position");
    diag.timed(TimerKind::Position, || {
        collab.kinematics(model, data);
        collab.tendon(model, data);
        collab.transmission(model, data);
        collab.crb_and_factor(model, data);
        collab.detect(model, data);
    });
}
