//! Explicit, non-global user callback record.
//!
//! The source engine dispatches `mjcb_control`/`mjcb_act_gain`/
//! `mjcb_act_bias`/`mjcb_act_dyn` through process-wide function pointers,
//! which the design notes flag as a thread-safety hazard for anything
//! stepping more than one simulation per process. Here the same four
//! extension points are fields on a value the caller passes in per call,
//! so two simulations on two threads each get their own.

use crate::data::Data;
use crate::model::Model;

/// User-supplied control law, invoked once per step between `step1` and
/// `step2` (or once per `forward` call outside stepping). Writes into
/// `data.ctrl` in place; nothing about the signature implies it is pure.
pub type ControlFn<'a> = dyn FnMut(&Model, &mut Data) + 'a;

/// Overrides the gain term for actuators with `GainType::User`. Returns the
/// scalar gain; the driver defaults to `1.0` when no callback is set.
pub type ActGainFn<'a> = dyn Fn(&Model, &Data, usize) -> f64 + 'a;

/// Overrides the bias term for actuators with `BiasType::User`. Returns the
/// scalar bias; the driver defaults to `0.0` when no callback is set.
pub type ActBiasFn<'a> = dyn Fn(&Model, &Data, usize) -> f64 + 'a;

/// Overrides activation dynamics for actuators with `DynType::User`. Returns
/// `act_dot[j]`; the driver defaults to `0.0` when no callback is set.
pub type ActDynFn<'a> = dyn Fn(&Model, &Data, usize) -> f64 + 'a;

/// A borrowed bundle of optional callbacks, passed explicitly to every
/// `Simulation` entry point that might need one rather than read from a
/// global. An empty `Callbacks::none()` is a complete, valid value: every
/// extension point has a defined default behavior when unset.
#[derive(Default)]
pub struct Callbacks<'a> {
    pub control: Option<Box<ControlFn<'a>>>,
    pub act_gain: Option<Box<ActGainFn<'a>>>,
    pub act_bias: Option<Box<ActBiasFn<'a>>>,
    pub act_dyn: Option<Box<ActDynFn<'a>>>,
}

impl<'a> Callbacks<'a> {
    pub fn none() -> Self {
        Callbacks::default()
    }

    pub fn with_control(mut self, f: impl FnMut(&Model, &mut Data) + 'a) -> Self {
        self.control = Some(Box::new(f));
        self
    }

    pub fn with_act_gain(mut self, f: impl Fn(&Model, &Data, usize) -> f64 + 'a) -> Self {
        self.act_gain = Some(Box::new(f));
        self
    }

    pub fn with_act_bias(mut self, f: impl Fn(&Model, &Data, usize) -> f64 + 'a) -> Self {
        self.act_bias = Some(Box::new(f));
        self
    }

    pub fn with_act_dyn(mut self, f: impl Fn(&Model, &Data, usize) -> f64 + 'a) -> Self {
        self.act_dyn = Some(Box::new(f));
        self
    }
}
