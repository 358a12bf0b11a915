//! `Model`: the immutable, read-only-to-the-driver description of an
//! articulated system and the options that govern how it is stepped.

use crate::math::Vector;

/// Width of each actuator parameter block, matching the source engine's
/// `mjNGAIN`/`mjNBIAS`/`mjNDYN`.
pub const NGAIN: usize = 10;
pub const NBIAS: usize = 10;
pub const NDYN: usize = 10;

/// Floor applied wherever the source divides by a user-supplied parameter
/// that could be zero (currently only the `FILTER` activation dynamics'
/// time constant), matching the source engine's `mjMINVAL`.
pub const MINVAL: f64 = 1e-15;

/// Which integrator `Simulation::step` dispatches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum Integrator {
    Euler,
    Rk4,
    Implicit,
}

/// Which constraint solver `fwd_constraint` dispatches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum Solver {
    Pgs,
    Cg,
    Newton,
}

/// Actuator gain model (`force[i] = gain * drive + bias`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum GainType {
    Fixed,
    Muscle,
    /// Dispatches to `Callbacks::act_gain`, defaulting to `1.0` if unset.
    User,
}

/// Actuator bias model, added to `gain * drive`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum BiasType {
    None,
    Affine,
    Muscle,
    /// Dispatches to `Callbacks::act_bias`, defaulting to `0.0` if unset.
    User,
}

/// Actuator activation dynamics (`act_dot[j] = f(ctrl, act, prm)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum DynType {
    /// `dyntype == None` actuators are stateless: their drive signal is
    /// `ctrl` directly and they occupy none of the final `na` slots.
    None,
    Integrator,
    Filter,
    Muscle,
    /// Dispatches to `Callbacks::act_dyn`, defaulting to `0.0` if unset.
    User,
}

/// `mjDSBL_*`-equivalent disable flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct DisableFlags {
    pub actuation: bool,
    pub clampctrl: bool,
    pub warmstart: bool,
}

/// `mjENBL_*`-equivalent enable flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct EnableFlags {
    pub energy: bool,
    pub fwdinv: bool,
}

/// Per-actuator static configuration. One entry per actuator, indexed the
/// same way as every other `actuator_*` array in the data model.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct ActuatorDef {
    pub ctrllimited: bool,
    pub ctrlrange: [f64; 2],
    pub forcelimited: bool,
    pub forcerange: [f64; 2],
    /// Only meaningful for actuators with `dyntype != None`; indexed by `iu`
    /// the same way `ctrlrange` is, not by the stateful-actuator index `j`.
    pub actlimited: bool,
    pub actrange: [f64; 2],
    pub gaintype: GainType,
    pub biastype: BiasType,
    pub dyntype: DynType,
    pub gainprm: [f64; NGAIN],
    pub biasprm: [f64; NBIAS],
    pub dynprm: [f64; NDYN],
    pub lengthrange: [f64; 2],
    pub acc0: f64,
}

impl Default for ActuatorDef {
    fn default() -> Self {
        ActuatorDef {
            ctrllimited: false,
            ctrlrange: [0.0, 0.0],
            forcelimited: false,
            forcerange: [0.0, 0.0],
            actlimited: false,
            actrange: [0.0, 0.0],
            gaintype: GainType::Fixed,
            biastype: BiasType::None,
            dyntype: DynType::None,
            gainprm: [0.0; NGAIN],
            biasprm: [0.0; NBIAS],
            dynprm: [0.0; NDYN],
            lengthrange: [0.0, 0.0],
            acc0: 0.0,
        }
    }
}

/// Numerical options, mirroring `mjOption`.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Options {
    pub integrator: Integrator,
    pub solver: Solver,
    pub timestep: f64,
    pub iterations: usize,
    pub noslip_iterations: usize,
    pub disable: DisableFlags,
    pub enable: EnableFlags,
    /// Selects the dense/sparse representation for `ten_J` and `efc_AR`
    /// throughout the step. See [`Model::is_sparse`].
    pub sparse: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            integrator: Integrator::Euler,
            solver: Solver::Pgs,
            timestep: 0.01,
            iterations: 50,
            noslip_iterations: 0,
            disable: DisableFlags::default(),
            enable: EnableFlags::default(),
            sparse: false,
        }
    }
}

/// Immutable description of an articulated system. The driver never
/// resizes or reallocates anything derived from `Model`; all of `Data`'s
/// arrays are sized from these dimensions once, up front.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Model {
    pub nq: usize,
    pub nv: usize,
    pub nu: usize,
    pub na: usize,
    /// Length of the flat mass-matrix storage `qM`/`qLD`; opaque to the
    /// driver beyond being the buffer size the factorization collaborators
    /// operate on.
    pub nm: usize,
    /// Length of the flat implicit-derivative storage `qDeriv`/`qLU`.
    pub nd: usize,
    pub ntendon: usize,

    pub opt: Options,

    /// Per-DoF linear damping coefficient, `>= 0`.
    pub dof_damping: Vec<f64>,
    /// Per-DoF address of the diagonal entry of that DoF within the flat
    /// `qM` buffer (`nv` entries into a buffer of length `nm`).
    pub dof_madr: Vec<usize>,

    /// One entry per actuator (`nu` total); the final `na` are the
    /// stateful ones, see [`Model::stateful_actuator_index`].
    pub actuators: Vec<ActuatorDef>,

    /// Optional human-readable name, not read by the driver itself.
    pub name: Option<String>,
}

impl Model {
    /// Whether `ten_J` and `efc_AR` products should take the sparse path.
    /// The single predicate the design notes call for: every sparse/dense
    /// branch in the driver goes through this.
    pub fn is_sparse(&self) -> bool {
        self.opt.sparse
    }

    /// Map a global actuator index `i` in `[nu - na, nu)` to its activation
    /// slot `j = i - (nu - na)`. Centralizing this avoids the off-by-one the
    /// design notes warn about; every call site uses this helper rather than
    /// repeating the subtraction.
    pub fn stateful_actuator_index(&self, i: usize) -> usize {
        debug_assert!(i >= self.nu - self.na && i < self.nu);
        i - (self.nu - self.na)
    }
}

/// Builds a [`Model`] with dense mass/implicit-derivative storage
/// (`nm == nd == nv * nv`) and no tendons, filling in the damping/actuator
/// arrays and options as they're set. For anything with its own notion of
/// sparsity or tendons, construct a `Model` directly instead.
pub struct ModelBuilder {
    nq: usize,
    nv: usize,
    actuators: Vec<ActuatorDef>,
    dof_damping: Vec<f64>,
    opt: Options,
    name: Option<String>,
}

impl ModelBuilder {
    pub fn new(nq: usize, nv: usize) -> Self {
        ModelBuilder {
            nq,
            nv,
            actuators: Vec::new(),
            dof_damping: vec![0.0; nv],
            opt: Options::default(),
            name: None,
        }
    }

    pub fn actuator(mut self, def: ActuatorDef) -> Self {
        self.actuators.push(def);
        self
    }

    pub fn dof_damping(mut self, damping: Vec<f64>) -> Self {
        assert_eq!(damping.len(), self.nv);
        self.dof_damping = damping;
        self
    }

    pub fn options(mut self, opt: Options) -> Self {
        self.opt = opt;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> Model {
        let nu = self.actuators.len();
        let na = self
            .actuators
            .iter()
            .filter(|a| !matches!(a.dyntype, DynType::None))
            .count();
        Model {
            nq: self.nq,
            nv: self.nv,
            nu,
            na,
            nm: self.nv * self.nv,
            nd: self.nv * self.nv,
            ntendon: 0,
            opt: self.opt,
            dof_damping: self.dof_damping,
            dof_madr: (0..self.nv).collect(),
            actuators: self.actuators,
            name: self.name,
        }
    }
}
