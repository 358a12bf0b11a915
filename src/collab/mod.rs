//! Collaborator contracts: the subsystems the driver calls through but does
//! not implement itself (kinematics, inertia composition, collision
//! detection, the inner constraint solvers, sensors, energy, analytical
//! derivatives). Grouped by the stage that calls them, the same grouping
//! the stage drivers in `crate::{position,velocity,actuation,constraint}`
//! use to decide what they need.
//!
//! [`chain`] is a minimal, concrete implementation for planar serial
//! kinematic chains with no contacts. It exists to make the driver
//! testable end to end; it is not part of the driver itself and nothing
//! in `crate::simulation` depends on it.

pub mod chain;

use crate::data::Data;
use crate::math::Vector;
use crate::model::Model;

/// Kinematics, mass matrix composition and factorization, tendon lengths
/// and moment arms, passive forces: everything `fwd_position` needs.
pub trait PositionCollaborators {
    /// Forward kinematics: populate whatever body/joint transform state
    /// this collaborator keeps, from `data.qpos`. Kinematics aren't part of
    /// the data model itself; a collaborator is free to cache them however
    /// it likes.
    fn kinematics(&mut self, model: &Model, data: &Data);

    /// Compose and factorize the joint-space mass matrix into
    /// `data.qm`/`data.qld`/`data.qld_diag_inv`/`data.qld_diag_sqrt_inv`.
    fn crb_and_factor(&mut self, model: &Model, data: &mut Data);

    /// Tendon lengths, velocities-independent Jacobian, into
    /// `data.ten_length`/`data.ten_j`.
    fn tendon(&mut self, model: &Model, data: &mut Data);

    /// Actuator transmission lengths and moment arms, into
    /// `data.actuator_length`/`data.actuator_moment`.
    fn transmission(&mut self, model: &Model, data: &mut Data);

    /// Refactor `M + diag(added)` into `data.qld`/`data.qld_diag_inv`/
    /// `data.qld_diag_sqrt_inv`, leaving `data.qm` unchanged. Used only by
    /// the semi-implicit Euler integrator's damping term, which needs a
    /// cheap diagonal-only implicit correction rather than the full
    /// analytical Jacobian [`ImplicitCollaborators::factor_implicit`] uses.
    /// Callers are responsible for saving and restoring the factorization
    /// fields they overwrite here if the undamped factorization is needed
    /// again afterward.
    fn factor_with_added_diagonal(&mut self, model: &Model, data: &mut Data, added: &[f64]);

    /// `M * v`, the forward product used by the constraint warmstart's
    /// Gauss-term comparison (`mulM`). Distinct from [`Self::solve_mass`],
    /// which is the factorized *inverse* product.
    fn mul_m(&self, model: &Model, data: &Data, v: &Vector) -> Vector;

    /// Solve `M * x = b` (or the diagonally-corrected factorization left by
    /// the most recent [`factor_with_added_diagonal`] call) against the
    /// factorization currently cached from the last `crb_and_factor` or
    /// `factor_with_added_diagonal` call.
    ///
    /// [`factor_with_added_diagonal`]: PositionCollaborators::factor_with_added_diagonal
    fn solve_mass(&self, model: &Model, data: &Data, b: &Vector) -> Vector;

    /// Advance `qpos` by `qvel * dt`. A plain vector sum is correct for
    /// joints whose position coordinate is already in the tangent space
    /// (revolute, slide); collaborators with quaternion-valued joints must
    /// override this to renormalize instead of simply adding.
    fn integrate_pos(&self, model: &Model, qpos: &mut Vector, qvel: &Vector, dt: f64);
}

/// Velocity-dependent quantities `fwd_velocity` needs beyond the two fixed
/// matrix-vector products (`ten_velocity = ten_J * qvel`,
/// `actuator_velocity = actuator_moment * qvel`) it computes itself. Those
/// are plain products against matrices the position stage already cached,
/// not named as external collaborator operations, so they live in
/// `crate::velocity` rather than here.
pub trait VelocityCollaborators {
    /// Center-of-mass velocity propagation (`comVel`): cached kinematic
    /// state a collaborator with real Cartesian bodies needs before `rne`
    /// can run, analogous to [`PositionCollaborators::kinematics`] one
    /// stage earlier. A collaborator with no such cache (like
    /// [`chain::Chain`], whose bias force is a pure function of `qpos`/
    /// `qvel`) can leave this empty.
    fn com_vel(&mut self, model: &Model, data: &Data);

    /// Passive forces beyond joint damping: springs, fluid drag, tendon
    /// passive forces, added on top of `crate::velocity::fwd_passive`'s
    /// `-dof_damping * qvel` term into `data.qfrc_passive`. Joint damping
    /// stays driver-owned since it needs nothing beyond `Model`/`Data`
    /// fields already in hand; everything else here depends on
    /// transmission data the driver has no opinion about. A collaborator
    /// with no additional passive forces (like [`chain::Chain`]) leaves
    /// `data.qfrc_passive` as `fwd_passive` set it.
    fn passive(&mut self, model: &Model, data: &mut Data);

    /// Reference acceleration the constraint solver drives each active row
    /// toward (`referenceConstraint`), into `data.efc_aref`. Runs once
    /// `data.nefc`/`data.efc_aref` have been sized by
    /// [`ConstraintCollaborators::detect`] earlier in the same step,
    /// since this stage itself never changes `nefc`.
    fn reference_constraint(&mut self, model: &Model, data: &mut Data);

    /// Recursive Newton-Euler bias force (Coriolis, centrifugal, gravity),
    /// into `data.qfrc_bias`. Sign convention: this is the force that must
    /// be *subtracted* from applied force to get acceleration, matching
    /// `qfrc_smooth = qfrc_applied_total - qfrc_bias` in `fwd_acceleration`.
    fn rne(&mut self, model: &Model, data: &mut Data);
}

/// Constraint detection and the inner solver. Everything that decides
/// `nefc` and fills the `efc_*` arrays, plus the solver that turns them
/// into `qfrc_constraint`.
pub trait ConstraintCollaborators {
    /// Detect active constraints (contacts, limits, equality rows) and
    /// resize/fill `data`'s `efc_*` arrays via [`Data::resize_efc`].
    /// Called once, from `crate::position::fwd_position`
    /// (`makeConstraint`/`projectConstraint`): `nefc` is a function of
    /// positions only and must not change again for the rest of the step,
    /// so nothing later re-detects.
    ///
    /// [`Data::resize_efc`]: crate::data::Data::resize_efc
    fn detect(&mut self, model: &Model, data: &mut Data);

    /// `J * v` (`mulJacVec`): the constraint Jacobian applied to a
    /// generalized-coordinate vector, producing a constraint-space vector
    /// of length `data.nefc`. Used by warmstart to build `jar`/`efc_b`
    /// without the driver needing its own copy of `J`.
    fn mul_jac(&self, model: &Model, data: &Data, v: &Vector) -> Vector;

    /// `constraintUpdate`: the scalar cost of the constraint-space residual
    /// `jar`, evaluated without writing a gradient (used only for the
    /// warmstart-vs-smooth cost comparison, never for an actual solver
    /// step).
    fn constraint_update(&mut self, model: &Model, data: &Data, jar: &Vector) -> f64;

    /// Run the inner solver (PGS/CG/Newton, dispatched on
    /// `model.opt.solver`) to convergence, filling `data.efc_force` and
    /// `data.qfrc_constraint`, and recording the iteration count it took in
    /// `data.solver_iter`.
    fn solve(&mut self, model: &Model, data: &mut Data) -> Result<(), crate::error::FatalError>;

    /// `solNoSlip`: an optional post-pass that corrects tangential slip
    /// left behind by the main solver, run for `iterations` passes when
    /// `model.opt.noslip_iterations > 0`.
    fn no_slip(&mut self, model: &Model, data: &mut Data, iterations: usize);
}

/// Everything `fwd_actuation` needs beyond the gain/bias/dynamics models
/// already captured on `ActuatorDef`, namely muscle force-length-velocity
/// curves (`GainType::Muscle`/`BiasType::Muscle`/`DynType::Muscle`).
pub trait ActuationCollaborators {
    fn muscle_gain(&self, model: &Model, data: &Data, actuator: usize) -> f64;
    fn muscle_bias(&self, model: &Model, data: &Data, actuator: usize) -> f64;
    fn muscle_dynamics(&self, model: &Model, data: &Data, actuator: usize) -> f64;
}

/// Analytical derivatives of the smooth dynamics with respect to velocity,
/// used only by the implicit integrator to assemble `data.q_deriv`.
pub trait ImplicitCollaborators {
    /// Fill `data.q_deriv` (flat storage, `model.nd` entries, addressed the
    /// same way as `qm`) with `d(qfrc_smooth)/d(qvel)` at the current
    /// state.
    fn smooth_derivative(&mut self, model: &Model, data: &Data, out: &mut [f64]);

    /// Factorize `qm - timestep * q_deriv` into `data.q_lu`, used to solve
    /// for `qacc` in place of the explicit mass-matrix solve.
    fn factor_implicit(&mut self, model: &Model, data: &mut Data, timestep: f64);

    /// Solve the factorized implicit system against right-hand side `b`.
    fn solve_implicit(&self, model: &Model, data: &Data, b: &Vector) -> Vector;
}

/// Sensors, energy accounting, and inverse dynamics: quantities the driver
/// never needs for stepping but exposes because downstream code (tests,
/// host applications) reads them.
pub trait IoCollaborators {
    /// Total kinetic + potential energy, only computed when
    /// `model.opt.enable.energy` is set.
    fn energy(&self, model: &Model, data: &Data) -> [f64; 2];

    /// Populate whatever sensor outputs this collaborator defines. Sensors
    /// are entirely collaborator-defined; the driver has no sensor model of
    /// its own.
    fn sensors(&mut self, model: &Model, data: &Data);

    /// `compareFwdInv`: compare the forward-computed constraint force
    /// against what an inverse-dynamics pass would demand for the same
    /// state, for diagnostic use. Gated by `model.opt.enable.fwdinv`, never
    /// called by the driver otherwise. Inverse dynamics itself is out of
    /// scope for this crate, so the default implementation is a no-op;
    /// collaborators that implement inverse dynamics override it.
    fn compare_fwd_inv(&mut self, _model: &Model, _data: &Data) {}
}

/// Blanket contract a `Simulation` requires: every stage's collaborators at
/// once. Implemented automatically for anything implementing all five
/// stage traits, so a single concrete type (like [`chain::Chain`]) can
/// satisfy `Simulation`'s bound without restating the supertrait list.
pub trait Collaborators:
    PositionCollaborators
    + VelocityCollaborators
    + ConstraintCollaborators
    + ActuationCollaborators
    + ImplicitCollaborators
    + IoCollaborators
{
}

impl<T> Collaborators for T where
    T: PositionCollaborators
        + VelocityCollaborators
        + ConstraintCollaborators
        + ActuationCollaborators
        + ImplicitCollaborators
        + IoCollaborators
{
}
