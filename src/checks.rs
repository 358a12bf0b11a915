//! Non-finite-value checks run at the top of each stage
//! (`mj_checkPos`/`mj_checkVel`/`mj_checkAcc`). `check_pos`/`check_vel` find
//! the stage's own full recovery (reset `D` to model defaults) since both
//! have everything they need to do it (`model`, `data`) at their call site
//! in `fwd_position`/`fwd_velocity`. `check_acc` only reports whether
//! recovery is needed: resetting `qacc` and re-running `forward` has to
//! happen one level up, in `Simulation::forward_skip`, which is the only
//! place that can actually re-run the pipeline.

use crate::data::Data;
use crate::diagnostics::Diagnostics;
use crate::error::Warning;
use crate::math::Vector;
use crate::model::Model;

pub fn is_bad(x: f64) -> bool {
    !x.is_finite()
}

fn first_bad(v: &Vector) -> Option<usize> {
    (0..v.len()).find(|&i| is_bad(v[i]))
}

/// `mj_checkPos`: reset `data` to `model`'s defaults on the first
/// non-finite `qpos` entry.
pub fn check_pos(model: &Model, data: &mut Data, diag: &mut Diagnostics) {
    if let Some(i) = first_bad(&data.qpos) {
        diag.record(Warning::BadQpos(i));
        data.reset_to_defaults(model);
    }
}

/// `mj_checkVel`: reset `data` to `model`'s defaults on the first
/// non-finite `qvel` entry.
pub fn check_vel(model: &Model, data: &mut Data, diag: &mut Diagnostics) {
    if let Some(i) = first_bad(&data.qvel) {
        diag.record(Warning::BadQvel(i));
        data.reset_to_defaults(model);
    }
}

/// `mj_checkAcc`: records the warning and reports whether `qacc` was bad,
/// but does not reset or re-run anything itself; the caller owns that.
pub fn check_acc(data: &Data, diag: &mut Diagnostics) -> bool {
    if let Some(i) = first_bad(&data.qacc) {
        diag.record(Warning::BadQacc(i));
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::chain::Chain;

    #[test]
    fn detects_first_nan_and_resets() {
        let chain = Chain::new(vec![1.0, 1.0], vec![1.0, 1.0], 9.81);
        let model = chain.model(Vec::new());
        let mut data = Data::new(&model);
        data.qpos = Vector::from_vec(vec![1.0, f64::NAN]);
        data.qvel = Vector::from_vec(vec![2.0, 3.0]);

        let mut diag = Diagnostics::new();
        check_pos(&model, &mut data, &mut diag);

        assert_eq!(diag.warning(crate::error::WarningKind::BadQpos).number, 1);
        assert_eq!(diag.warning(crate::error::WarningKind::BadQpos).lastinfo, 1);
        assert_eq!(data.qpos[0], 0.0);
        assert_eq!(data.qvel[0], 0.0);
    }

    #[test]
    fn check_acc_reports_without_mutating() {
        let mut diag = Diagnostics::new();
        let mut data_qacc = Vector::from_vec(vec![0.0, f64::INFINITY]);
        let data = {
            let chain = Chain::new(vec![1.0, 1.0], vec![1.0, 1.0], 9.81);
            let model = chain.model(Vec::new());
            let mut d = Data::new(&model);
            d.qacc = std::mem::take(&mut data_qacc);
            d
        };
        assert!(check_acc(&data, &mut diag));
        assert_eq!(diag.warning(crate::error::WarningKind::BadQacc).lastinfo, 1);
    }
}
