//! A minimal, concrete [`Collaborators`] implementation for planar serial
//! chains of point masses with no contacts (`nefc` is always `0`).
//!
//! This is a reference implementation only, grounded in the classical
//! Lagrangian dynamics of the planar n-pendulum (absolute joint angles
//! measured from the downward vertical), not part of the driver itself. Its
//! only job is to give the stage pipeline and integrators something real to
//! run against in tests, since the driver's own code never computes
//! kinematics, mass matrices, or bias forces.

use nalgebra as na;

use crate::collab::{
    ActuationCollaborators, ConstraintCollaborators, ImplicitCollaborators, IoCollaborators,
    PositionCollaborators, VelocityCollaborators,
};
use crate::data::Data;
use crate::error::FatalError;
use crate::math::{Matrix, RowMatrix, Vector};
use crate::model::{ActuatorDef, DynType, Model, Options};

/// A chain of `n` point masses connected by massless rigid links, joint
/// angles `qpos[i]` measured absolutely from the downward vertical (not
/// relative to the parent link). One revolute joint per mass, so
/// `nq == nv == lengths.len()`.
pub struct Chain {
    pub lengths: Vec<f64>,
    pub masses: Vec<f64>,
    pub gravity: f64,
    cholesky: Option<na::linalg::Cholesky<f64, na::Dyn>>,
    implicit_lu: Option<na::linalg::LU<f64, na::Dyn, na::Dyn>>,
}

impl Chain {
    pub fn new(lengths: Vec<f64>, masses: Vec<f64>, gravity: f64) -> Self {
        assert_eq!(lengths.len(), masses.len());
        Chain {
            lengths,
            masses,
            gravity,
            cholesky: None,
            implicit_lu: None,
        }
    }

    pub fn nv(&self) -> usize {
        self.lengths.len()
    }

    /// A [`Model`] consistent with this chain: `nq == nv == n`, one
    /// unactuated DoF per joint unless `actuators` overrides that, dense
    /// mass storage (`nm == nv * nv`), no tendons.
    pub fn model(&self, actuators: Vec<ActuatorDef>) -> Model {
        let n = self.nv();
        Model {
            nq: n,
            nv: n,
            nu: actuators.len(),
            na: actuators
                .iter()
                .filter(|a| !matches!(a.dyntype, DynType::None))
                .count(),
            nm: n * n,
            nd: n * n,
            ntendon: 0,
            opt: Options::default(),
            dof_damping: vec![0.0; n],
            dof_madr: (0..n).collect(),
            actuators,
            name: Some("chain".to_string()),
        }
    }

    /// Total mass of link `k` and everything distal to it.
    fn mass_sum(&self, k: usize) -> f64 {
        self.masses[k..].iter().sum()
    }

    /// The dense mass matrix at the current `qpos`.
    fn mass_matrix(&self, qpos: &Vector) -> Matrix {
        let n = self.nv();
        let mut m = Matrix::zeros(n, n);
        for j in 0..n {
            for k in 0..n {
                let msum = self.mass_sum(j.max(k));
                m[(j, k)] = self.lengths[j] * self.lengths[k] * (qpos[j] - qpos[k]).cos() * msum;
            }
        }
        m
    }

    /// `C(q, qdot) * qdot + G(q)`: the classical n-pendulum bias force.
    fn bias_force(&self, qpos: &Vector, qvel: &Vector) -> Vector {
        let n = self.nv();
        let mut bias = Vector::zeros(n);
        for j in 0..n {
            let mut acc = self.gravity * self.lengths[j] * qpos[j].sin() * self.mass_sum(j);
            for k in 0..n {
                if k == j {
                    continue;
                }
                let msum = self.mass_sum(j.max(k));
                acc += self.lengths[j]
                    * self.lengths[k]
                    * (qpos[j] - qpos[k]).sin()
                    * msum
                    * qvel[k]
                    * qvel[k];
            }
            bias[j] = acc;
        }
        bias
    }

    fn flatten_row_major(m: &Matrix) -> Vec<f64> {
        let (r, c) = m.shape();
        let mut out = vec![0.0; r * c];
        for i in 0..r {
            for j in 0..c {
                out[i * c + j] = m[(i, j)];
            }
        }
        out
    }
}

impl PositionCollaborators for Chain {
    fn kinematics(&mut self, _model: &Model, _data: &Data) {
        // Absolute-angle formulation: body transforms are a pure function
        // of `qpos` recomputed inline wherever needed (`mass_matrix`,
        // `bias_force`), so there is no cached kinematic state here.
    }

    fn crb_and_factor(&mut self, _model: &Model, data: &mut Data) {
        let m = self.mass_matrix(&data.qpos);
        data.qm.as_mut_slice().copy_from_slice(&Self::flatten_row_major(&m));
        self.factor_and_store(data, m);
    }

    fn tendon(&mut self, _model: &Model, _data: &mut Data) {
        // No tendons in this reference model.
    }

    fn transmission(&mut self, _model: &Model, data: &mut Data) {
        // Direct joint actuators: transmission is the identity map, one
        // actuator per DoF, moment arm 1.0 on its own joint.
        let n = self.nv();
        let nu = data.actuator_moment.nrows();
        let mut moment = Matrix::zeros(nu, n);
        for i in 0..nu.min(n) {
            moment[(i, i)] = 1.0;
            data.actuator_length[i] = data.qpos[i];
        }
        data.actuator_moment = RowMatrix::Dense(moment);
    }

    fn factor_with_added_diagonal(&mut self, _model: &Model, data: &mut Data, added: &[f64]) {
        let mut m = self.mass_matrix(&data.qpos);
        for i in 0..self.nv() {
            m[(i, i)] += added[i];
        }
        self.factor_and_store(data, m);
    }

    fn mul_m(&self, _model: &Model, data: &Data, v: &Vector) -> Vector {
        self.mass_matrix(&data.qpos) * v
    }

    fn solve_mass(&self, _model: &Model, _data: &Data, b: &Vector) -> Vector {
        self.cholesky
            .as_ref()
            .expect("crb_and_factor must run before solve_mass")
            .solve(b)
    }

    fn integrate_pos(&self, _model: &Model, qpos: &mut Vector, qvel: &Vector, dt: f64) {
        // Every joint in the chain is a plain revolute angle, already in
        // the tangent space, so integration is ordinary vector addition.
        *qpos += dt * qvel;
    }
}

impl Chain {
    /// Cholesky-factor `m` and write the result into `data.qld`/
    /// `data.qld_diag_inv`/`data.qld_diag_sqrt_inv`, caching the
    /// factorization for subsequent mass-matrix solves.
    fn factor_and_store(&mut self, data: &mut Data, m: Matrix) {
        let chol = na::linalg::Cholesky::new(m)
            .expect("chain mass matrix must stay positive definite");
        let l = chol.l();
        data.qld.as_mut_slice().copy_from_slice(&Self::flatten_row_major(&l));
        for i in 0..self.nv() {
            let d = l[(i, i)];
            data.qld_diag_inv[i] = 1.0 / d;
            data.qld_diag_sqrt_inv[i] = 1.0 / d.sqrt();
        }
        self.cholesky = Some(chol);
    }
}

impl VelocityCollaborators for Chain {
    fn com_vel(&mut self, _model: &Model, _data: &Data) {
        // Absolute-angle formulation: no COM velocity cache needed, same
        // reasoning as `kinematics` above.
    }

    fn passive(&mut self, _model: &Model, _data: &mut Data) {
        // No springs, fluid drag, or tendon passive forces in this
        // reference model; joint damping alone is already applied by
        // `crate::velocity::fwd_passive` before this runs.
    }

    fn reference_constraint(&mut self, _model: &Model, _data: &mut Data) {
        // `detect` always reports zero active rows for this chain, so
        // `efc_aref` is always the empty vector `resize_efc` already left
        // it as; nothing to fill in.
    }

    fn rne(&mut self, _model: &Model, data: &mut Data) {
        let bias = self.bias_force(&data.qpos, &data.qvel);
        data.qfrc_bias.copy_from(&bias);
    }
}

impl ConstraintCollaborators for Chain {
    fn detect(&mut self, model: &Model, data: &mut Data) {
        // No contacts or limits in this reference model: `nefc` is always
        // zero, so none of the other `ConstraintCollaborators` methods are
        // ever actually exercised by `fwd_constraint`.
        data.resize_efc(0, model.nv);
    }

    fn mul_jac(&self, _model: &Model, _data: &Data, _v: &Vector) -> Vector {
        Vector::zeros(0)
    }

    fn constraint_update(&mut self, _model: &Model, _data: &Data, _jar: &Vector) -> f64 {
        0.0
    }

    fn solve(&mut self, _model: &Model, data: &mut Data) -> Result<(), FatalError> {
        data.qfrc_constraint.fill(0.0);
        data.solver_iter = 0;
        Ok(())
    }

    fn no_slip(&mut self, _model: &Model, _data: &mut Data, _iterations: usize) {}
}

impl ActuationCollaborators for Chain {
    fn muscle_gain(&self, _model: &Model, _data: &Data, _actuator: usize) -> f64 {
        1.0
    }

    fn muscle_bias(&self, _model: &Model, _data: &Data, _actuator: usize) -> f64 {
        0.0
    }

    fn muscle_dynamics(&self, _model: &Model, _data: &Data, _actuator: usize) -> f64 {
        0.0
    }
}

impl ImplicitCollaborators for Chain {
    fn smooth_derivative(&mut self, _model: &Model, data: &Data, out: &mut [f64]) {
        // Central finite difference of qfrc_bias w.r.t. qvel; adequate for
        // a reference implementation, not a production analytical Jacobian.
        let n = self.nv();
        let h = 1e-6;
        let mut qvel = data.qvel.clone();
        for k in 0..n {
            let orig = qvel[k];
            qvel[k] = orig + h;
            let plus = self.bias_force(&data.qpos, &qvel);
            qvel[k] = orig - h;
            let minus = self.bias_force(&data.qpos, &qvel);
            qvel[k] = orig;
            for j in 0..n {
                // d(qfrc_smooth)/d(qvel) = -d(qfrc_bias)/d(qvel)
                out[j * n + k] = -(plus[j] - minus[j]) / (2.0 * h);
            }
        }
    }

    fn factor_implicit(&mut self, _model: &Model, data: &mut Data, timestep: f64) {
        let n = self.nv();
        let mut a = Matrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                a[(i, j)] = data.qm[i * n + j] - timestep * data.q_deriv[i * n + j];
            }
        }
        self.implicit_lu = Some(na::linalg::LU::new(a));
    }

    fn solve_implicit(&self, _model: &Model, _data: &Data, b: &Vector) -> Vector {
        self.implicit_lu
            .as_ref()
            .expect("factor_implicit must run before solve_implicit")
            .solve(b)
            .expect("implicit system must stay solvable for a physically valid chain")
    }
}

impl IoCollaborators for Chain {
    fn energy(&self, _model: &Model, data: &Data) -> [f64; 2] {
        let n = self.nv();
        let m = self.mass_matrix(&data.qpos);
        let kinetic = 0.5 * (data.qvel.transpose() * &m * &data.qvel)[(0, 0)];
        let mut potential = 0.0;
        for k in 0..n {
            potential -= self.gravity * self.lengths[k] * data.qpos[k].cos() * self.mass_sum(k);
        }
        [kinetic, potential]
    }

    fn sensors(&mut self, _model: &Model, _data: &Data) {
        // No sensors defined for this reference model.
    }
}
