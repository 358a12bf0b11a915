//! `Simulation`: the public entry point wiring a [`Model`], a [`Data`], and
//! a set of collaborators into the staged forward-dynamics pipeline.

use crate::acceleration::fwd_acceleration;
use crate::actuation::fwd_actuation;
use crate::callbacks::Callbacks;
use crate::checks::{check_acc, check_pos, check_vel};
use crate::collab::{Collaborators, PositionCollaborators};
use crate::constraint::fwd_constraint;
use crate::data::Data;
use crate::diagnostics::Diagnostics;
use crate::error::FatalError;
use crate::integrate::{euler, implicit, rk4, RkTableau};
use crate::model::{Integrator, Model};
use crate::position::fwd_position;
use crate::scratch::Scratch;
use crate::stage::Stage;
use crate::velocity::fwd_velocity;

/// Owns the mutable [`Data`] and the collaborators that give a [`Model`]
/// its physical content, and exposes the driver's staged entry points:
/// [`Simulation::forward`]/[`Simulation::forward_skip`] for recomputing
/// derived quantities without advancing time, and
/// [`Simulation::step`]/[`Simulation::step1`]/[`Simulation::step2`] for
/// advancing it.
pub struct Simulation<'m, C: Collaborators> {
    pub model: &'m Model,
    pub data: Data,
    pub collab: C,
    pub diagnostics: Diagnostics,
    /// Scoped scratch arena for the per-call temporaries the stage drivers
    /// and integrators need (`fwd_actuation`, `fwd_acceleration`, `Euler`,
    /// the implicit integrator). Lives as long as the `Simulation` so its
    /// backing buffer is allocated at most once and reused every step.
    pub scratch: Scratch,
}

impl<'m, C: Collaborators> Simulation<'m, C> {
    pub fn new(model: &'m Model, collab: C) -> Self {
        Simulation {
            model,
            data: Data::new(model),
            collab,
            diagnostics: Diagnostics::new(),
            scratch: Scratch::new(),
        }
    }

    /// Recompute every forward-pipeline quantity at the current `qpos`/
    /// `qvel`/`ctrl`, without advancing `time`. `forward_skip(Stage::None,
    /// skip_sensor)` recomputes everything; a caller that already knows
    /// position- or velocity-stage quantities are valid for the current
    /// state can skip ahead. Actuation, acceleration and constraint always
    /// run unconditionally: they need to see `ctrl` fresh regardless of
    /// which earlier stage was skipped. `skip_sensor` suppresses the
    /// collaborator's sensor/energy hooks, e.g. for the intermediate stages
    /// of an RK4 sub-step where reading them would be wasted work.
    ///
    /// `mj_checkAcc` runs at the end: if it finds a non-finite `qacc`, the
    /// whole of `data` is reset to `model`'s defaults and the pipeline is
    /// re-run once from scratch so every cached array reflects the reset
    /// state, matching the source engine's "reset and re-run forward"
    /// recovery. `compareFwdInv` runs after that recovery check, gated by
    /// `model.opt.enable.fwdinv`.
    pub fn forward_skip(&mut self, callbacks: &Callbacks, reached: Stage, skip_sensor: bool) -> Result<(), FatalError> {
        self.forward_skip_inner(callbacks, reached, skip_sensor, true)
    }

    fn forward_skip_inner(
        &mut self,
        callbacks: &Callbacks,
        reached: Stage,
        skip_sensor: bool,
        allow_recovery: bool,
    ) -> Result<(), FatalError> {
        if reached < Stage::Pos {
            fwd_position(self.model, &mut self.data, &mut self.collab, &mut self.diagnostics);
        }
        if reached < Stage::Vel {
            fwd_velocity(self.model, &mut self.data, &mut self.collab, &mut self.diagnostics);
            if self.model.opt.enable.energy {
                self.data.energy = self.collab.energy(self.model, &self.data);
            }
        }
        if let Some(f) = &callbacks.control {
            f(self.model, &mut self.data);
        }
        fwd_actuation(
            self.model,
            &mut self.data,
            &mut self.collab,
            callbacks,
            &mut self.diagnostics,
            &mut self.scratch,
        );
        fwd_acceleration(self.model, &mut self.data, &self.collab, &mut self.diagnostics, &mut self.scratch);
        fwd_constraint(self.model, &mut self.data, &mut self.collab, &mut self.diagnostics)?;
        if !skip_sensor {
            self.collab.sensors(self.model, &self.data);
        }

        if allow_recovery && check_acc(&self.data, &mut self.diagnostics) {
            self.data.reset_to_defaults(self.model);
            return self.forward_skip_inner(callbacks, Stage::None, skip_sensor, false);
        }
        if self.model.opt.enable.fwdinv {
            self.collab.compare_fwd_inv(self.model, &self.data);
        }
        Ok(())
    }

    /// `forward_skip` from scratch, i.e. `mj_forward`.
    pub fn forward(&mut self, callbacks: &Callbacks) -> Result<(), FatalError> {
        self.forward_skip(callbacks, Stage::None, false)
    }

    /// Position and velocity stages only (`mj_step1`). Leaves a window for
    /// the caller to act as its own control law, reading sensor-derived
    /// quantities and writing `self.data.ctrl`, before calling
    /// [`Simulation::step2`]. Prefer [`Simulation::step`] when there is no
    /// need for that window.
    ///
    /// `mj_checkPos`/`mj_checkVel` run here, together, before either stage
    /// driver: this is the top of the step, whether the caller reaches it
    /// via `step1` directly or via `step`. Velocity-stage sensors and
    /// energy run at the end of this call, so a controller reading
    /// `step1`'s output sees them fresh.
    pub fn step1(&mut self) {
        check_pos(self.model, &mut self.data, &mut self.diagnostics);
        check_vel(self.model, &mut self.data, &mut self.diagnostics);
        fwd_position(self.model, &mut self.data, &mut self.collab, &mut self.diagnostics);
        fwd_velocity(self.model, &mut self.data, &mut self.collab, &mut self.diagnostics);
        if self.model.opt.enable.energy {
            self.data.energy = self.collab.energy(self.model, &self.data);
        }
        self.collab.sensors(self.model, &self.data);
    }

    /// Actuation through integration (`mj_step2`). `callbacks.control` is
    /// NOT invoked here: by the time a caller reaches `step2` it has
    /// already had its chance to act as the control law, between `step1`
    /// and this call.
    ///
    /// RK4 is requested through `model.opt.integrator` but cannot be
    /// honored here: a true RK4 step needs to re-run the whole forward
    /// pipeline at intermediate states, which isn't possible once `step1`
    /// has already committed this state's derivatives. Falls back to
    /// semi-implicit Euler instead.
    pub fn step2(&mut self, callbacks: &Callbacks) -> Result<(), FatalError> {
        fwd_actuation(
            self.model,
            &mut self.data,
            &mut self.collab,
            callbacks,
            &mut self.diagnostics,
            &mut self.scratch,
        );
        fwd_acceleration(self.model, &mut self.data, &self.collab, &mut self.diagnostics, &mut self.scratch);
        fwd_constraint(self.model, &mut self.data, &mut self.collab, &mut self.diagnostics)?;
        self.collab.sensors(self.model, &self.data);

        if check_acc(&self.data, &mut self.diagnostics) {
            self.data.reset_to_defaults(self.model);
            self.forward(callbacks)?;
        }
        if self.model.opt.enable.fwdinv {
            self.collab.compare_fwd_inv(self.model, &self.data);
        }

        match self.model.opt.integrator {
            Integrator::Implicit => implicit::step(self.model, &mut self.data, &mut self.collab, &mut self.scratch),
            Integrator::Euler | Integrator::Rk4 => {
                euler::step(self.model, &mut self.data, &mut self.collab, &mut self.scratch)
            }
        }
        Ok(())
    }

    /// A full step (`mj_step`): `step1`, the control callback, and `step2`
    /// for `Euler`/`Implicit`; for `Rk4`, a single `forward` (seeding stage
    /// 0) followed by the Runge-Kutta loop, since RK4 genuinely needs the
    /// whole forward pipeline re-evaluated at each intermediate stage and
    /// `step1`/`step2` cannot provide that.
    pub fn step(&mut self, callbacks: &Callbacks) -> Result<(), FatalError> {
        match self.model.opt.integrator {
            Integrator::Rk4 => {
                check_pos(self.model, &mut self.data, &mut self.diagnostics);
                check_vel(self.model, &mut self.data, &mut self.diagnostics);
                self.step_rk4(callbacks)
            }
            Integrator::Euler | Integrator::Implicit => {
                self.step1();
                if let Some(f) = &callbacks.control {
                    f(self.model, &mut self.data);
                }
                self.step2(callbacks)
            }
        }
    }

    fn step_rk4(&mut self, callbacks: &Callbacks) -> Result<(), FatalError> {
        // Stage 0 is seeded by a full `forward`, which also runs its own
        // checkAcc recovery; the Runge-Kutta loop proper only re-evaluates
        // stages 1..N.
        self.forward(callbacks)?;

        let tableau = RkTableau::rk4();
        let model = self.model;
        let diagnostics = &mut self.diagnostics;
        let scratch = &mut self.scratch;
        let mut fatal: Option<FatalError> = None;

        rk4::step(&tableau, model, &mut self.data, &mut self.collab, |model, data, collab| {
            fwd_position(model, data, collab, diagnostics);
            fwd_velocity(model, data, collab, diagnostics);
            if let Some(f) = &callbacks.control {
                f(model, data);
            }
            fwd_actuation(model, data, collab, callbacks, diagnostics, scratch);
            fwd_acceleration(model, data, collab, diagnostics, scratch);
            if let Err(e) = fwd_constraint(model, data, collab, diagnostics) {
                fatal = Some(e);
                return;
            }
            // `fwd_constraint` already leaves `data.qacc` assembled
            // (qacc_smooth plus the mass-solved constraint correction).
            // RK4 substages are intermediate states discarded once the
            // weighted sum is taken; sensors/energy only run for the seeding
            // `forward` call above, not for every substage re-evaluation.
        })?;

        if let Some(e) = fatal {
            return Err(e);
        }
        Ok(())
    }
}
