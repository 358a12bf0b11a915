//! Actuation-stage driver (`mj_fwdActuation`): turns `ctrl`/`act` into
//! `qfrc_actuator`, and advances stateful actuators' `act_dot`.

use crate::callbacks::Callbacks;
use crate::checks::is_bad;
use crate::collab::ActuationCollaborators;
use crate::data::Data;
use crate::diagnostics::{Diagnostics, TimerKind};
use crate::error::Warning;
use crate::model::{BiasType, DynType, GainType, Model, MINVAL};
use crate::scratch::Scratch;

fn clip(x: f64, range: [f64; 2]) -> f64 {
    x.clamp(range[0], range[1])
}

/// Gain for actuator `i`, dispatching on its `GainType`.
fn gain(
    model: &Model,
    data: &Data,
    collab: &impl ActuationCollaborators,
    callbacks: &Callbacks,
    i: usize,
) -> f64 {
    let act = &model.actuators[i];
    match act.gaintype {
        GainType::Fixed => act.gainprm[0],
        GainType::Muscle => collab.muscle_gain(model, data, i),
        GainType::User => callbacks
            .act_gain
            .as_ref()
            .map(|f| f(model, data, i))
            .unwrap_or(1.0),
    }
}

/// Bias for actuator `i`, dispatching on its `BiasType`.
fn bias(
    model: &Model,
    data: &Data,
    collab: &impl ActuationCollaborators,
    callbacks: &Callbacks,
    i: usize,
) -> f64 {
    let act = &model.actuators[i];
    match act.biastype {
        BiasType::None => 0.0,
        BiasType::Affine => {
            act.biasprm[0]
                + act.biasprm[1] * data.actuator_length[i]
                + act.biasprm[2] * data.actuator_velocity[i]
        }
        BiasType::Muscle => collab.muscle_bias(model, data, i),
        BiasType::User => callbacks
            .act_bias
            .as_ref()
            .map(|f| f(model, data, i))
            .unwrap_or(0.0),
    }
}

/// `mj_fwdActuation`: if any `ctrl` entry is non-finite, the *entire*
/// control vector is zeroed for this step, not just the offending entry.
pub fn fwd_actuation(
    model: &Model,
    data: &mut Data,
    collab: &mut impl ActuationCollaborators,
    callbacks: &Callbacks,
    diag: &mut Diagnostics,
    scratch: &mut Scratch,
) {
    let _span = tracy_client::span!("fwd_actuation");
    diag.timed(TimerKind::Actuation, || {
        if let Some(bad) = (0..model.nu).find(|&i| is_bad(data.ctrl[i])) {
            data.ctrl.fill(0.0);
            diag.record(Warning::BadCtrl(bad));
        }

        if model.opt.disable.actuation {
            data.qfrc_actuator.fill(0.0);
            data.actuator_force.fill(0.0);
            return;
        }

        if !model.opt.disable.clampctrl {
            for i in 0..model.nu {
                let act = &model.actuators[i];
                if act.ctrllimited {
                    data.ctrl[i] = clip(data.ctrl[i], act.ctrlrange);
                }
            }
        }

        // `force` is a per-call temporary (fed straight into the moment-arm
        // product below and then discarded), so it comes from the scratch
        // arena rather than a fresh heap allocation every step.
        let force_vec = scratch.scoped(|scratch| {
            let mut force = scratch.alloc(model.nu);
            for (i, (act, f_slot)) in itertools::izip!(model.actuators.iter(), force.iter_mut()).enumerate() {
                let g = gain(model, data, collab, callbacks, i);
                let b = bias(model, data, collab, callbacks, i);

                let drive = if matches!(act.dyntype, DynType::None) {
                    data.ctrl[i]
                } else {
                    data.act[model.stateful_actuator_index(i)]
                };

                let mut f = g * drive + b;
                if act.forcelimited {
                    f = clip(f, act.forcerange);
                }
                *f_slot = f;
                data.actuator_force[i] = f;
            }
            crate::math::Vector::from_column_slice(&force)
        });
        data.qfrc_actuator = match &data.actuator_moment {
            crate::math::RowMatrix::Dense(m) => m.transpose() * &force_vec,
            crate::math::RowMatrix::Sparse(s) => {
                // transpose of a row-sparse actuator-by-dof matrix, done as
                // a scatter rather than building the transpose explicitly.
                let mut out = crate::math::Vector::zeros(model.nv);
                for row in 0..s.nrows {
                    let start = s.rowadr[row];
                    let end = start + s.rownnz[row];
                    for k in start..end {
                        out[s.colind[k]] += s.data[k] * force_vec[row];
                    }
                }
                out
            }
        };

        for i in (model.nu - model.na)..model.nu {
            let j = model.stateful_actuator_index(i);
            let act = &model.actuators[i];
            data.act_dot[j] = match act.dyntype {
                DynType::None => 0.0,
                DynType::Integrator => data.ctrl[i],
                DynType::Filter => (data.ctrl[i] - data.act[j]) / act.dynprm[0].max(MINVAL),
                DynType::Muscle => collab.muscle_dynamics(model, data, i),
                DynType::User => callbacks
                    .act_dyn
                    .as_ref()
                    .map(|f| f(model, data, i))
                    .unwrap_or(0.0),
            };
        }
    });
}
