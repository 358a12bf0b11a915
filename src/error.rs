//! The two error kinds described in the driver's error handling design:
//! recoverable value warnings and unrecoverable fatal errors.

use thiserror::Error;

/// A non-finite value was detected in simulation state. Each variant carries
/// the index of the first offending entry (`lastinfo` in the diagnostics
/// block). The driver's response to each is fixed: see
/// `crate::checks` and `crate::actuation`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    #[error("non-finite value in qpos[{0}]")]
    BadQpos(usize),
    #[error("non-finite value in qvel[{0}]")]
    BadQvel(usize),
    #[error("non-finite value in qacc[{0}]")]
    BadQacc(usize),
    #[error("non-finite value in ctrl[{0}]")]
    BadCtrl(usize),
}

impl Warning {
    /// The index this warning was raised about (`lastinfo`).
    pub fn index(&self) -> usize {
        match self {
            Warning::BadQpos(i) | Warning::BadQvel(i) | Warning::BadQacc(i) | Warning::BadCtrl(i) => {
                *i
            }
        }
    }

    /// Which counter in `Diagnostics::warnings` this warning increments.
    pub fn kind(&self) -> WarningKind {
        match self {
            Warning::BadQpos(_) => WarningKind::BadQpos,
            Warning::BadQvel(_) => WarningKind::BadQvel,
            Warning::BadQacc(_) => WarningKind::BadQacc,
            Warning::BadCtrl(_) => WarningKind::BadCtrl,
        }
    }
}

/// Discriminant for indexing the per-kind warning counters, independent of
/// the `lastinfo` payload carried by [`Warning`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum WarningKind {
    BadQpos,
    BadQvel,
    BadQacc,
    BadCtrl,
}

impl WarningKind {
    pub const ALL: [WarningKind; 4] = [
        WarningKind::BadQpos,
        WarningKind::BadQvel,
        WarningKind::BadQacc,
        WarningKind::BadCtrl,
    ];
}

/// Unrecoverable configuration errors, surfaced as `Result::Err` from the
/// step that hit them. State is left exactly as the stage that raised the
/// error left it; the step is not retried or rolled back.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalError {
    #[error("unknown constraint solver")]
    UnknownSolver,
    #[error("unsupported Runge-Kutta order (only 4 is implemented)")]
    UnsupportedRkOrder(usize),
}
