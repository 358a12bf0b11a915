//! Constraint-stage driver (`mj_fwdConstraint`): warmstart seeding, the
//! inner solver, and the optional no-slip pass. Constraint *detection*
//! (`collab.detect`, `makeConstraint`/`projectConstraint`) already ran in
//! the position stage (see `crate::position::fwd_position`) and reference
//! acceleration (`collab.reference_constraint`) in the velocity stage; by
//! the time this stage runs, `data.nefc`/`data.efc_aref` are already fixed
//! for the step.
//!
//! Warmstart and its cost comparison are the one piece of this stage that
//! is genuinely core (not collaborator territory): which starting point the
//! inner solver gets handed measurably changes both its convergence speed
//! and, for non-convergent runs, its answer. `mulJacVec` and
//! `constraintUpdate` are still external collaborator operations (see
//! `crate::collab::ConstraintCollaborators`), but the decision of *which*
//! candidate to seed, and whether to fall back to the unconstrained
//! solution, belongs here.

use crate::collab::{ConstraintCollaborators, PositionCollaborators};
use crate::data::Data;
use crate::diagnostics::{Diagnostics, TimerKind};
use crate::error::FatalError;
use crate::model::{Model, Solver};

/// `mj_fwdConstraint`. With `nefc == 0` (no active constraints this step)
/// the solver never runs and `qfrc_constraint` is left zeroed; this is the
/// common case exercised by the reference chain collaborator, which never
/// reports a constraint.
///
/// `collab` is bounded by both `ConstraintCollaborators` and
/// `PositionCollaborators`: the solver contract only fills `efc_force`/
/// `qfrc_constraint` (force-space), so this stage still needs
/// `solve_mass` to turn that into the final `qacc` the rest of the
/// pipeline (and next step's warmstart seed) actually reads.
pub fn fwd_constraint<C: ConstraintCollaborators + PositionCollaborators>(
    model: &Model,
    data: &mut Data,
    collab: &mut C,
    diag: &mut Diagnostics,
) -> Result<(), FatalError> {
    let _span = tracy_client::span!("fwd_constraint");
    diag.timed(TimerKind::Constraint, || {
        if data.nefc == 0 {
            data.qfrc_constraint.fill(0.0);
            data.qacc = data.qacc_smooth.clone();
            data.qacc_warmstart = data.qacc_smooth.clone();
            data.solver_iter = 0;
            return Ok(());
        }

        data.efc_b = collab.mul_jac(model, data, &data.qacc_smooth) - &data.efc_aref;

        warmstart(model, data, collab);

        collab.solve(model, data)?;
        diag.solver_iter = data.solver_iter;

        // `solve` only fills `efc_force`/`qfrc_constraint` (force-space);
        // reassemble the final `qacc` by superposition before recording it
        // as this step's warmstart seed, rather than leaving `qacc` at
        // whichever candidate `warmstart` happened to pick as its seed.
        let correction = collab.solve_mass(model, data, &data.qfrc_constraint.clone());
        data.qacc = &data.qacc_smooth + &correction;
        data.qacc_warmstart = data.qacc.clone();

        if model.opt.noslip_iterations > 0 {
            collab.no_slip(model, data, model.opt.noslip_iterations);
        }
        Ok(())
    })
}

/// Seed the solver's starting point from `qacc_warmstart` rather than from
/// the unconstrained `qacc_smooth`, falling back to `qacc_smooth` whenever
/// it turns out to be the cheaper candidate. `PGS` iterates in force space,
/// so its fallback check resets `efc_force`/`qfrc_constraint` instead of
/// `qacc`; `CG`/`Newton` iterate in acceleration space, so theirs resets
/// `qacc` instead.
fn warmstart(model: &Model, data: &mut Data, collab: &mut impl ConstraintCollaborators) {
    if model.opt.disable.warmstart {
        data.qacc = data.qacc_smooth.clone();
        data.efc_force.fill(0.0);
        return;
    }

    data.qacc = data.qacc_warmstart.clone();
    let jar = collab.mul_jac(model, data, &data.qacc_warmstart) - &data.efc_aref;
    let mut cost_warmstart = collab.constraint_update(model, data, &jar);

    match model.opt.solver {
        Solver::Pgs => {
            let ar_force = data.efc_ar.mul_vec(&data.efc_force);
            let phi = data.efc_force.dot(&data.efc_b) + 0.5 * data.efc_force.dot(&ar_force);
            if phi > 0.0 {
                data.efc_force.fill(0.0);
                data.qfrc_constraint.fill(0.0);
            }
        }
        Solver::Cg | Solver::Newton => {
            let m_qacc_warmstart = collab.mul_m(model, data, &data.qacc_warmstart);
            let gauss_lhs = &m_qacc_warmstart - &data.qfrc_smooth;
            let gauss_rhs = &data.qacc_warmstart - &data.qacc_smooth;
            cost_warmstart += 0.5 * gauss_lhs.dot(&gauss_rhs);

            let efc_b = data.efc_b.clone();
            let cost_smooth = collab.constraint_update(model, data, &efc_b);
            if cost_warmstart > cost_smooth {
                data.qacc = data.qacc_smooth.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{RowMatrix, Vector};
    use crate::model::{DisableFlags, EnableFlags, Integrator, Options};

    /// A stub reporting one active constraint row, to exercise the
    /// `nefc > 0` branch of `fwd_constraint` (warmstart + solver dispatch)
    /// without needing a real contact/limit detector.
    struct OneRowStub;

    impl ConstraintCollaborators for OneRowStub {
        fn detect(&mut self, model: &Model, data: &mut Data) {
            data.resize_efc(1, model.nv);
            data.efc_ar = RowMatrix::dense_zeros(1, model.nv);
        }

        fn mul_jac(&self, _model: &Model, _data: &Data, v: &Vector) -> Vector {
            Vector::from_vec(vec![v[0]])
        }

        fn constraint_update(&mut self, _model: &Model, _data: &Data, jar: &Vector) -> f64 {
            0.5 * jar[0] * jar[0]
        }

        fn solve(&mut self, _model: &Model, data: &mut Data) -> Result<(), FatalError> {
            data.efc_force[0] = 0.0;
            data.qfrc_constraint.fill(0.0);
            data.solver_iter = 3;
            Ok(())
        }

        fn no_slip(&mut self, _model: &Model, _data: &mut Data, _iterations: usize) {}
    }

    /// Identity mass matrix for `OneRowStub`/`NoRows`, so `solve_mass` is
    /// just the identity and the assembled `qacc` is easy to reason about
    /// by hand in these tests; nothing here exercises kinematics, tendons,
    /// or transmission, so those panic if ever called.
    impl PositionCollaborators for OneRowStub {
        fn kinematics(&mut self, _model: &Model, _data: &Data) {}
        fn crb_and_factor(&mut self, _model: &Model, _data: &mut Data) {}
        fn tendon(&mut self, _model: &Model, _data: &mut Data) {}
        fn transmission(&mut self, _model: &Model, _data: &mut Data) {}
        fn factor_with_added_diagonal(&mut self, _model: &Model, _data: &mut Data, _added: &[f64]) {}
        fn mul_m(&self, _model: &Model, _data: &Data, v: &Vector) -> Vector {
            v.clone()
        }
        fn solve_mass(&self, _model: &Model, _data: &Data, b: &Vector) -> Vector {
            b.clone()
        }
        fn integrate_pos(&self, _model: &Model, qpos: &mut Vector, qvel: &Vector, dt: f64) {
            *qpos += dt * qvel;
        }
    }

    fn test_model(nv: usize) -> Model {
        Model {
            nq: nv,
            nv,
            nu: 0,
            na: 0,
            nm: nv * nv,
            nd: nv * nv,
            ntendon: 0,
            opt: Options {
                integrator: Integrator::Euler,
                solver: crate::model::Solver::Pgs,
                timestep: 0.01,
                iterations: 50,
                noslip_iterations: 0,
                disable: DisableFlags::default(),
                enable: EnableFlags::default(),
                sparse: false,
            },
            dof_damping: vec![0.0; nv],
            dof_madr: (0..nv).collect(),
            actuators: Vec::new(),
            name: None,
        }
    }

    #[test]
    fn nonzero_nefc_path_runs_warmstart_and_solver() {
        let model = test_model(2);
        let mut data = Data::new(&model);
        data.qacc_warmstart = crate::math::Vector::from_vec(vec![1.0, 2.0]);
        let mut diag = Diagnostics::new();
        let mut collab = OneRowStub;
        // Normally run by `fwd_position`; called directly here since this
        // test exercises `fwd_constraint` in isolation.
        collab.detect(&model, &mut data);

        fwd_constraint(&model, &mut data, &mut collab, &mut diag).unwrap();

        assert_eq!(data.nefc, 1);
        assert_eq!(diag.solver_iter, 3);
        assert_eq!(data.qfrc_constraint[0], 0.0);
        assert_eq!(data.qacc_warmstart[0], data.qacc[0]);
    }

    #[test]
    fn zero_nefc_path_carries_qacc_smooth_into_warmstart() {
        let model = test_model(2);
        let mut data = Data::new(&model);
        data.qacc_smooth = crate::math::Vector::from_vec(vec![3.0, -1.0]);
        let mut diag = Diagnostics::new();

        struct NoRows;
        impl ConstraintCollaborators for NoRows {
            fn detect(&mut self, model: &Model, data: &mut Data) {
                data.resize_efc(0, model.nv);
            }
            fn mul_jac(&self, _model: &Model, _data: &Data, v: &Vector) -> Vector {
                v.clone()
            }
            fn constraint_update(&mut self, _model: &Model, _data: &Data, _jar: &Vector) -> f64 {
                0.0
            }
            fn solve(&mut self, _model: &Model, _data: &mut Data) -> Result<(), FatalError> {
                unreachable!("solve must not run when nefc == 0")
            }
            fn no_slip(&mut self, _model: &Model, _data: &mut Data, _iterations: usize) {}
        }
        impl PositionCollaborators for NoRows {
            fn kinematics(&mut self, _model: &Model, _data: &Data) {}
            fn crb_and_factor(&mut self, _model: &Model, _data: &mut Data) {}
            fn tendon(&mut self, _model: &Model, _data: &mut Data) {}
            fn transmission(&mut self, _model: &Model, _data: &mut Data) {}
            fn factor_with_added_diagonal(&mut self, _model: &Model, _data: &mut Data, _added: &[f64]) {}
            fn mul_m(&self, _model: &Model, _data: &Data, v: &Vector) -> Vector {
                v.clone()
            }
            fn solve_mass(&self, _model: &Model, _data: &Data, b: &Vector) -> Vector {
                b.clone()
            }
            fn integrate_pos(&self, _model: &Model, qpos: &mut Vector, qvel: &Vector, dt: f64) {
                *qpos += dt * qvel;
            }
        }

        fwd_constraint(&model, &mut data, &mut NoRows, &mut diag).unwrap();

        assert_eq!(data.qacc_warmstart[0], 3.0);
        assert_eq!(data.qacc_warmstart[1], -1.0);
        assert_eq!(data.solver_iter, 0);
    }

    #[test]
    fn disabled_warmstart_seeds_from_smooth_acceleration() {
        let model = {
            let mut m = test_model(2);
            m.opt.disable.warmstart = true;
            m
        };
        let mut data = Data::new(&model);
        data.qacc_smooth = crate::math::Vector::from_vec(vec![5.0, 6.0]);
        data.qacc_warmstart = crate::math::Vector::from_vec(vec![1.0, 1.0]);
        let mut diag = Diagnostics::new();
        let mut collab = OneRowStub;
        // Normally run by `fwd_position`; called directly here since this
        // test exercises `fwd_constraint` in isolation.
        collab.detect(&model, &mut data);
        data.efc_force = crate::math::Vector::from_vec(vec![9.0]);

        fwd_constraint(&model, &mut data, &mut collab, &mut diag).unwrap();

        // warmstart() seeds qacc from qacc_smooth and zeroes efc_force
        // before solve() runs (solve() here also zeroes efc_force, so this
        // mainly pins down that qacc_smooth was used as the seed).
        assert_eq!(data.qacc_warmstart[0], 5.0);
        assert_eq!(data.qacc_warmstart[1], 6.0);
    }
}
