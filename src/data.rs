//! `Data`: the mutable simulation state advanced by each step.
//!
//! Every array here is sized once from a [`Model`](crate::model::Model) at
//! construction and never resized again; stages write into existing slots
//! rather than growing or shrinking buffers.

use crate::math::{RowMatrix, Vector};
use crate::model::Model;

/// A Cartesian force/torque pair applied at a body's local origin, used for
/// both `qfrc_applied`-style joint-space forces and `xfrc_applied`-style
/// world forces.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct CartesianWrench {
    pub force: [f64; 3],
    pub torque: [f64; 3],
}

/// Mutable simulation state. Fields are grouped the way the stage pipeline
/// touches them: position state, velocity state, actuation state, the
/// smooth/constraint force split, and the constraint solver's own working
/// set.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Data {
    // -- time and position state --
    pub time: f64,
    pub qpos: Vector,
    pub qvel: Vector,
    pub act: Vector,

    // -- user input --
    pub ctrl: Vector,
    pub qfrc_applied: Vector,
    pub xfrc_applied: Vec<CartesianWrench>,

    // -- tendon state, valid once position stage has run --
    pub ten_length: Vector,
    pub ten_velocity: Vector,
    pub ten_j: RowMatrix,

    // -- actuator state, valid once actuation stage has run --
    pub actuator_length: Vector,
    pub actuator_velocity: Vector,
    pub actuator_moment: RowMatrix,
    pub actuator_force: Vector,
    pub act_dot: Vector,

    // -- mass matrix, factorized by position-stage collaborators --
    pub qm: Vector,
    pub qld: Vector,
    pub qld_diag_inv: Vector,
    pub qld_diag_sqrt_inv: Vector,

    // -- force accumulators --
    pub qfrc_passive: Vector,
    pub qfrc_bias: Vector,
    pub qfrc_actuator: Vector,
    pub qfrc_smooth: Vector,
    pub qfrc_constraint: Vector,
    pub qacc_smooth: Vector,
    pub qacc: Vector,
    pub qacc_warmstart: Vector,

    // -- constraint solver working set --
    pub nefc: usize,
    pub efc_aref: Vector,
    pub efc_b: Vector,
    pub efc_force: Vector,
    pub efc_ar: RowMatrix,
    pub solver_iter: usize,

    // -- implicit-integrator derivative storage --
    pub d_rownnz: Vec<usize>,
    pub d_rowadr: Vec<usize>,
    pub d_colind: Vec<usize>,
    pub q_deriv: Vec<f64>,
    pub q_lu: Vec<f64>,

    /// `[kinetic, potential]`, written by [`crate::collab::IoCollaborators::energy`]
    /// when `model.opt.enable.energy` is set; `[0.0, 0.0]` otherwise.
    pub energy: [f64; 2],
}

impl Data {
    /// Allocate a zeroed `Data` sized for `model`. Every array is given its
    /// final size here; later stages only ever write into existing slots.
    pub fn new(model: &Model) -> Self {
        let nq = model.nq;
        let nv = model.nv;
        let nu = model.nu;
        let na = model.na;
        let nm = model.nm;
        let nd = model.nd;
        let ntendon = model.ntendon;

        Data {
            time: 0.0,
            qpos: Vector::zeros(nq),
            qvel: Vector::zeros(nv),
            act: Vector::zeros(na),

            ctrl: Vector::zeros(nu),
            qfrc_applied: Vector::zeros(nv),
            xfrc_applied: vec![CartesianWrench::default(); nv],

            ten_length: Vector::zeros(ntendon),
            ten_velocity: Vector::zeros(ntendon),
            ten_j: RowMatrix::dense_zeros(ntendon, nv),

            actuator_length: Vector::zeros(nu),
            actuator_velocity: Vector::zeros(nu),
            actuator_moment: RowMatrix::dense_zeros(nu, nv),
            actuator_force: Vector::zeros(nu),
            act_dot: Vector::zeros(na),

            qm: Vector::zeros(nm),
            qld: Vector::zeros(nm),
            qld_diag_inv: Vector::zeros(nv),
            qld_diag_sqrt_inv: Vector::zeros(nv),

            qfrc_passive: Vector::zeros(nv),
            qfrc_bias: Vector::zeros(nv),
            qfrc_actuator: Vector::zeros(nv),
            qfrc_smooth: Vector::zeros(nv),
            qfrc_constraint: Vector::zeros(nv),
            qacc_smooth: Vector::zeros(nv),
            qacc: Vector::zeros(nv),
            qacc_warmstart: Vector::zeros(nv),

            nefc: 0,
            efc_aref: Vector::zeros(0),
            efc_b: Vector::zeros(0),
            efc_force: Vector::zeros(0),
            efc_ar: RowMatrix::dense_zeros(0, nv),
            solver_iter: 0,

            d_rownnz: vec![0; nv],
            d_rowadr: vec![0; nv],
            d_colind: Vec::new(),
            q_deriv: vec![0.0; nd],
            q_lu: vec![0.0; nd],

            energy: [0.0, 0.0],
        }
    }

    /// Reset every field to the zeroed defaults `Data::new` would produce
    /// for `model` (`mj_resetData`). Used by the value-sanity checks when
    /// they find a non-finite `qpos`/`qvel`/`qacc`: the whole step's
    /// working state is discarded, not just the offending array, since
    /// everything downstream of a corrupted stage is suspect too.
    pub fn reset_to_defaults(&mut self, model: &Model) {
        *self = Data::new(model);
    }

    /// Resize the constraint working set to `nefc` active rows. Called by
    /// the collision/limit collaborators once they know how many rows are
    /// active this step; nothing downstream resizes these again.
    pub fn resize_efc(&mut self, nefc: usize, nv: usize) {
        self.nefc = nefc;
        self.efc_aref = Vector::zeros(nefc);
        self.efc_b = Vector::zeros(nefc);
        self.efc_force = Vector::zeros(nefc);
        self.efc_ar = RowMatrix::dense_zeros(nefc, nv);
    }
}
