//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// Internal
use super::{ArmCtrlError, ArmCtrlMode, Params, PostureSequencer, PostureStep};
use crate::{
    diag::CycleRecord,
    kinematics::{ArmKinematics, JointVector, NUM_JOINTS},
    prox_eval::{self, ClearanceReport, Obstacle},
    redundancy::{self, Resolution},
    traj_gen::{QuinticPoly, TrajSegment},
};
use comms_if::eqpt::arm::{JointDems, JointState, ModelStates};
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
pub struct ArmCtrl {
    params: Params,

    kin: ArmKinematics,

    mode: ArmCtrlMode,

    posture: PostureSequencer,

    /// The commanded joint configuration, integrated every tracking cycle.
    joint_pos_rad: JointVector,

    /// Segments of the oscillation, built once on init.
    segments: Option<Segments>,

    /// The segment currently being tracked.
    active_segment: Option<TrajSegment>,

    /// Number of segment switches since tracking began.
    num_switches: u64,

    /// Time since tracking began.
    ///
    /// Units: seconds
    track_time_s: f64,

    /// Secondary task state on the previous cycle, used to log activation edges.
    secondary_was_active: bool,

    report: StatusReport,
}

/// Initialisation data for ArmCtrl.
#[derive(Debug, Clone)]
pub struct InitData {
    pub params: Params,

    /// Rate at which `proc` will be called.
    ///
    /// Units: Hz
    pub cycle_rate_hz: f64,
}

/// Input data to Arm Control.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    /// Measured interval since the previous cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// The latest measured joint state, if any has been received.
    pub joint_state: Option<JointState>,

    /// The latest model states, if any have been received.
    pub model_states: Option<ModelStates>,
}

/// Status report for ArmCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatusReport {
    pub mode: ArmCtrlMode,

    /// True if the trajectory segment was replaced on this cycle.
    pub segment_switched: bool,

    /// Clearance to the obstacles, tracking cycles only.
    pub clearance: Option<ClearanceReport>,

    /// Resolved joint rates, tracking cycles only.
    pub resolution: Option<Resolution>,

    /// Diagnostic record of the cycle, tracking cycles only.
    pub record: Option<CycleRecord>,
}

/// The three oscillation segments.
#[derive(Debug, Clone)]
struct Segments {
    /// Centre out to `+amplitude` over a quarter period.
    initial: QuinticPoly,

    /// `+amplitude` to `-amplitude` over half a period.
    backward: QuinticPoly,

    /// `-amplitude` to `+amplitude` over half a period.
    forward: QuinticPoly,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ArmCtrl {
    fn default() -> Self {
        Self {
            params: Params::default(),
            kin: ArmKinematics::default(),
            mode: ArmCtrlMode::default(),
            posture: PostureSequencer::default(),
            joint_pos_rad: JointVector::zeros(),
            segments: None,
            active_segment: None,
            num_switches: 0,
            track_time_s: 0.0,
            secondary_was_active: false,
            report: StatusReport::default(),
        }
    }
}

impl State for ArmCtrl {
    type InitData = InitData;
    type InitError = ArmCtrlError;

    type InputData = InputData;
    type OutputData = Option<JointDems>;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Initialise the ArmCtrl module.
    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: Option<&Session>,
    ) -> Result<(), Self::InitError> {
        let InitData {
            params,
            cycle_rate_hz,
        } = init_data;

        params.validate()?;

        if !(cycle_rate_hz.is_finite() && cycle_rate_hz > 0.0) {
            return Err(ArmCtrlError::InvalidCycleRate(cycle_rate_hz));
        }

        // Segments are solved once here and never per cycle
        let amp = params.amplitude_m;
        let segments = Segments {
            initial: QuinticPoly::rest_to_rest(0.0, amp, params.period_s / 4.0)?,
            backward: QuinticPoly::rest_to_rest(amp, -amp, params.period_s / 2.0)?,
            forward: QuinticPoly::rest_to_rest(-amp, amp, params.period_s / 2.0)?,
        };

        self.kin = ArmKinematics::default();
        self.mode = ArmCtrlMode::AwaitingStart;
        self.posture = PostureSequencer::new(params.posture_stage_delay_s, cycle_rate_hz);
        self.joint_pos_rad = JointVector::from_column_slice(&params.start_posture_rad);
        self.segments = Some(segments);
        self.active_segment = None;
        self.num_switches = 0;
        self.track_time_s = 0.0;
        self.secondary_was_active = false;
        self.report = StatusReport::default();

        debug!(
            "ArmCtrl posture stages delayed by {} cycles",
            self.posture.delay_cycles()
        );

        self.params = params;

        Ok(())
    }

    /// Perform cyclic processing of Arm Control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !(input_data.dt_s.is_finite() && input_data.dt_s >= 0.0) {
            return Err(ArmCtrlError::InvalidInterval(input_data.dt_s));
        }

        // Clear the status report
        self.report = StatusReport::default();

        // Mode execution
        let output = match self.mode {
            ArmCtrlMode::AwaitingStart => self.mode_awaiting_start(),
            ArmCtrlMode::TrackingForward | ArmCtrlMode::TrackingBackward => {
                self.mode_tracking(input_data)?
            }
        };

        self.report.mode = self.mode;

        Ok((output, self.report))
    }
}

impl ArmCtrl {
    /// Current mode of the controller.
    pub fn mode(&self) -> ArmCtrlMode {
        self.mode
    }

    /// The commanded joint configuration.
    pub fn joint_pos_rad(&self) -> &JointVector {
        &self.joint_pos_rad
    }

    /// The segment currently being tracked, `None` before tracking begins.
    pub fn active_segment(&self) -> Option<&TrajSegment> {
        self.active_segment.as_ref()
    }

    /// Number of segment switches since tracking began.
    pub fn num_switches(&self) -> u64 {
        self.num_switches
    }

    /// Drive to the start posture, one stage at a time.
    fn mode_awaiting_start(&mut self) -> Option<JointDems> {
        let start = self.start_posture();

        match self.posture.step() {
            PostureStep::Wait => None,
            PostureStep::Command(joints) => {
                info!("Commanding start posture of joints {:?}", joints);
                Some(JointDems::subset(&start, joints))
            }
            PostureStep::Ready => {
                let initial = self.segments.as_ref().map(|s| s.initial.clone());
                self.active_segment = initial.map(TrajSegment::new);
                self.mode = ArmCtrlMode::TrackingForward;

                info!("Start posture reached, ArmCtrl tracking forward");

                None
            }
        }
    }

    /// One tracking cycle.
    fn mode_tracking(&mut self, input: &InputData) -> Result<Option<JointDems>, ArmCtrlError> {
        let frames = self.kin.joint_frames(&self.joint_pos_rad);
        let ee = frames.ee_position();

        // Switch segments at the extrema
        let extremum_error_m = self.check_extremum(ee.y, input.joint_state.as_ref());

        let segment = match self.active_segment {
            Some(ref s) => s,
            None => return Ok(None),
        };
        let phase_s = segment.phase_s();
        let traj_vel_ms = segment.velocity();

        // Proximity and resolution
        let obstacles = self.tracked_obstacles(input.model_states.as_ref());
        let clearance = prox_eval::evaluate(&self.params.prox, &frames, &obstacles);
        let res = redundancy::resolve(&self.params.resolver, &frames, &clearance, traj_vel_ms)?;

        self.log_secondary_edge(&res, &clearance);

        // Integrate and advance the clock
        self.joint_pos_rad = integrate(&self.joint_pos_rad, &res.rates_rads, input.dt_s);
        if let Some(ref mut s) = self.active_segment {
            s.advance(input.dt_s);
        }
        self.track_time_s += input.dt_s;

        trace!(
            "ArmCtrl: t = {:.3} s, phase = {:.3} s, ee = [{:.5}, {:.5}, {:.5}], clearance = {:.4} m",
            self.track_time_s,
            phase_s,
            ee.x,
            ee.y,
            ee.z,
            clearance.clearance_m
        );

        self.report.clearance = Some(clearance);
        self.report.resolution = Some(res);
        self.report.record = Some(self.make_record(
            phase_s,
            &ee,
            input.joint_state.as_ref(),
            &clearance,
            &res,
            extremum_error_m,
        ));

        let mut pos_rad = [0f64; NUM_JOINTS];
        pos_rad.copy_from_slice(self.joint_pos_rad.as_slice());

        Ok(Some(JointDems::all(&pos_rad)))
    }

    /// Replace the active segment if the end-effector has passed the threshold in the direction
    /// of travel.
    ///
    /// Returns the y error of the measured end-effector from the extremum if a switch occured
    /// and a joint state is available.
    fn check_extremum(&mut self, ee_y_m: f64, joint_state: Option<&JointState>) -> Option<f64> {
        let threshold = self.params.switch_threshold_m;
        let amp = self.params.amplitude_m;

        let (next_mode, extremum_m) = match self.mode {
            ArmCtrlMode::TrackingForward if ee_y_m > threshold => {
                (ArmCtrlMode::TrackingBackward, amp)
            }
            ArmCtrlMode::TrackingBackward if ee_y_m < -threshold => {
                (ArmCtrlMode::TrackingForward, -amp)
            }
            _ => return None,
        };

        let next_poly = match (&self.segments, next_mode) {
            (Some(s), ArmCtrlMode::TrackingBackward) => s.backward.clone(),
            (Some(s), _) => s.forward.clone(),
            (None, _) => return None,
        };

        self.active_segment = Some(TrajSegment::new(next_poly));
        self.mode = next_mode;
        self.num_switches += 1;
        self.report.segment_switched = true;

        info!(
            "ArmCtrl extremum reached at y = {:.5} m (t = {:.3} s), now {:?}",
            ee_y_m, self.track_time_s, next_mode
        );

        joint_state.map(|js| {
            let meas = self
                .kin
                .ee_position(&JointVector::from_column_slice(&js.pos_rad));
            (extremum_m - meas.y).abs()
        })
    }

    /// The tracked obstacles present in the model states, identified by their model index.
    fn tracked_obstacles(&self, model_states: Option<&ModelStates>) -> Vec<Obstacle> {
        let states = match model_states {
            Some(s) => s,
            None => return vec![],
        };

        self.params
            .tracked_model_indices
            .iter()
            .filter_map(|&i| {
                states
                    .position_of(i)
                    .map(|p| Obstacle::new(i, Vector3::new(p[0], p[1], p[2])))
            })
            .collect()
    }

    fn log_secondary_edge(&mut self, res: &Resolution, clearance: &ClearanceReport) {
        match (self.secondary_was_active, res.secondary_active) {
            (false, true) => {
                if let Some(c) = clearance.closest {
                    warn!(
                        "Model {} within {:.4} m of point {:?}, avoidance active",
                        c.obstacle_id, clearance.clearance_m, c.point
                    );
                }
            }
            (true, false) => info!(
                "Obstacle clearance restored ({:.4} m), avoidance inactive",
                clearance.clearance_m
            ),
            _ => (),
        }

        self.secondary_was_active = res.secondary_active;
    }

    fn make_record(
        &self,
        phase_s: f64,
        ee: &Vector3<f64>,
        joint_state: Option<&JointState>,
        clearance: &ClearanceReport,
        res: &Resolution,
        extremum_error_m: Option<f64>,
    ) -> CycleRecord {
        let meas = joint_state.map(|js| {
            self.kin
                .ee_position(&JointVector::from_column_slice(&js.pos_rad))
        });
        let resolver = &self.params.resolver;

        CycleRecord {
            time_s: self.track_time_s,
            mode: self.mode,
            num_switches: self.num_switches,
            phase_s,
            ee_x_m: ee.x,
            ee_y_m: ee.y,
            ee_z_m: ee.z,
            meas_ee_x_m: meas.map(|m| m.x),
            meas_ee_y_m: meas.map(|m| m.y),
            meas_ee_z_m: meas.map(|m| m.z),
            hold_error_x_m: meas.map(|m| (m.x - resolver.x_setpoint_m).abs()),
            hold_error_z_m: meas.map(|m| (m.z - resolver.z_setpoint_m).abs()),
            target_vel_x_ms: res.target_vel_ms.x,
            target_vel_y_ms: res.target_vel_ms.y,
            target_vel_z_ms: res.target_vel_ms.z,
            clearance_m: clearance.clearance_m,
            closest_point: clearance.closest.map(|c| c.point),
            secondary_active: res.secondary_active,
            extremum_error_m,
        }
    }

    fn start_posture(&self) -> [f64; NUM_JOINTS] {
        self.params.start_posture_rad
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Explicit Euler step of the joint positions, `q + qdot dt`.
pub fn integrate(pos_rad: &JointVector, rates_rads: &JointVector, dt_s: f64) -> JointVector {
    pos_rad + rates_rads * dt_s
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{ArmSim, SimParams};
    use comms_if::eqpt::arm::{JointId, ModelPose};

    const DT_S: f64 = 0.01;

    fn init_ctrl(params: Params) -> ArmCtrl {
        let mut ctrl = ArmCtrl::default();
        ctrl.init(
            InitData {
                params,
                cycle_rate_hz: 1.0 / DT_S,
            },
            None,
        )
        .unwrap();
        ctrl
    }

    /// Controller which starts tracking on its first cycle.
    fn tracking_ctrl() -> ArmCtrl {
        let mut ctrl = init_ctrl(Params {
            posture_stage_delay_s: 0.0,
            ..Default::default()
        });

        let input = InputData {
            dt_s: DT_S,
            ..Default::default()
        };
        for _ in 0..3 {
            ctrl.proc(&input).unwrap();
        }
        assert_eq!(ctrl.mode(), ArmCtrlMode::TrackingForward);

        ctrl
    }

    fn models(obstacles: &[[f64; 3]]) -> ModelStates {
        let mut poses = vec![ModelPose {
            name: String::from("ground_plane"),
            position_m: [0.0; 3],
        }];
        poses.extend(obstacles.iter().enumerate().map(|(i, p)| ModelPose {
            name: format!("obstacle_{}", i),
            position_m: *p,
        }));

        ModelStates { poses }
    }

    /// Loopback input, the measured joint state is the last commanded one.
    fn loopback(ctrl: &ArmCtrl, model_states: Option<ModelStates>) -> InputData {
        let mut pos_rad = [0f64; NUM_JOINTS];
        pos_rad.copy_from_slice(ctrl.joint_pos_rad().as_slice());

        InputData {
            dt_s: DT_S,
            joint_state: Some(JointState {
                pos_rad,
                rate_rads: None,
            }),
            model_states,
        }
    }

    #[test]
    fn test_integrate() {
        let q = JointVector::from_column_slice(&[0.0, 0.75, 0.0, 1.5, 0.0, 0.75, 0.0]);
        let v = JointVector::from_column_slice(&[0.1, -0.2, 0.3, 0.0, 1.0, -1.0, 0.5]);

        let q1 = integrate(&q, &v, 0.01);
        for i in 0..NUM_JOINTS {
            assert!((q1[i] - (q[i] + v[i] * 0.01)).abs() < 1e-15);
        }

        // Zero interval leaves the configuration untouched
        assert_eq!(integrate(&q, &v, 0.0), q);
    }

    #[test]
    fn test_init_rejects_bad_params() {
        let mut ctrl = ArmCtrl::default();

        let bad_period = InitData {
            params: Params {
                period_s: 0.0,
                ..Default::default()
            },
            cycle_rate_hz: 100.0,
        };
        assert!(matches!(
            ctrl.init(bad_period, None),
            Err(ArmCtrlError::TrajGenError(_))
        ));

        let bad_rate = InitData {
            params: Params::default(),
            cycle_rate_hz: 0.0,
        };
        assert!(matches!(
            ctrl.init(bad_rate, None),
            Err(ArmCtrlError::InvalidCycleRate(_))
        ));
    }

    #[test]
    fn test_staged_posture() {
        // Two cycles between stages
        let mut ctrl = init_ctrl(Params {
            posture_stage_delay_s: 0.02,
            ..Default::default()
        });
        let input = InputData {
            dt_s: DT_S,
            ..Default::default()
        };

        let mut outputs = vec![];
        for _ in 0..9 {
            let (o, r) = ctrl.proc(&input).unwrap();
            assert!(r.record.is_none());
            outputs.push(o);
        }

        assert!(outputs[0].is_none() && outputs[1].is_none());

        let j4 = outputs[2].as_ref().unwrap();
        assert_eq!(j4.pos_rad.len(), 1);
        assert_eq!(j4.pos_rad[&JointId::J4], 1.5);

        assert!(outputs[3].is_none() && outputs[4].is_none());

        let j26 = outputs[5].as_ref().unwrap();
        assert_eq!(j26.pos_rad.len(), 2);
        assert_eq!(j26.pos_rad[&JointId::J2], 0.75);
        assert_eq!(j26.pos_rad[&JointId::J6], 0.75);

        assert!(outputs[6].is_none() && outputs[7].is_none() && outputs[8].is_none());
        assert_eq!(ctrl.mode(), ArmCtrlMode::TrackingForward);

        // First tracking cycle commands every joint
        let (o, r) = ctrl.proc(&input).unwrap();
        assert!(o.unwrap().is_complete());
        assert!(r.record.is_some());
    }

    #[test]
    fn test_invalid_interval() {
        let mut ctrl = tracking_ctrl();
        let input = InputData {
            dt_s: -0.01,
            ..Default::default()
        };

        assert!(matches!(
            ctrl.proc(&input),
            Err(ArmCtrlError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_first_leg_reaches_amplitude() {
        let mut ctrl = tracking_ctrl();
        let kin = ArmKinematics::default();

        let mut prev_y = kin.ee_position(ctrl.joint_pos_rad()).y;
        assert!(prev_y.abs() < 1e-9);

        for cycle in 0..1000 {
            let input = loopback(&ctrl, None);
            let (o, r) = ctrl.proc(&input).unwrap();
            assert!(o.unwrap().is_complete());

            if r.segment_switched {
                let t = cycle as f64 * DT_S;

                // The quarter period is 1.25 s, the hold tasks add a little lag
                assert!(t > 1.2 && t < 1.4, "switched at t = {}", t);
                assert!((prev_y - 0.2).abs() < 1e-3, "y before switch = {}", prev_y);
                assert_eq!(r.mode, ArmCtrlMode::TrackingBackward);
                assert_eq!(ctrl.num_switches(), 1);

                // Loopback joint state so the measured error is that of the commanded arm
                let err = r.record.unwrap().extremum_error_m.unwrap();
                assert!(err < 1e-3, "extremum error {}", err);

                return;
            }

            prev_y = kin.ee_position(ctrl.joint_pos_rad()).y;

            // Never run away past the threshold without switching
            assert!(prev_y < 0.2 + 1e-3);
        }

        panic!("Segment never switched");
    }

    #[test]
    fn test_oscillation() {
        let mut ctrl = tracking_ctrl();
        let kin = ArmKinematics::default();

        let mut switch_times = vec![];
        let mut min_y = 0f64;
        let mut max_y = 0f64;

        // Initial quarter then two full periods
        for cycle in 0..1150 {
            let input = loopback(&ctrl, None);
            let (_, r) = ctrl.proc(&input).unwrap();

            if r.segment_switched {
                switch_times.push(cycle as f64 * DT_S);
            }

            let p = kin.ee_position(ctrl.joint_pos_rad());
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);

            // x and z are held
            assert!((p.x - 0.6043).abs() < 5e-3, "x = {}", p.x);
            assert!((p.z - 0.1508).abs() < 5e-3, "z = {}", p.z);
        }

        assert!(switch_times.len() >= 4, "switches at {:?}", switch_times);

        // Each later leg lasts about half a period
        for w in switch_times.windows(2) {
            let leg = w[1] - w[0];
            assert!(leg > 2.4 && leg < 2.7, "leg lasted {} s", leg);
        }

        assert!(max_y > 0.2 && max_y < 0.201);
        assert!(min_y < -0.2 && min_y > -0.201);
    }

    #[test]
    fn test_obstacle_avoidance_edge() {
        let mut ctrl = tracking_ctrl();

        // Obstacle 0.09 m to the side of point A, 0.04 m of clearance
        let frames = ArmKinematics::default().joint_frames(ctrl.joint_pos_rad());
        let a = crate::kinematics::CritPointId::A.point().position(&frames);
        let near = models(&[[a.x, a.y + 0.09, 0.0], [a.x, 2.0, 0.0]]);

        let (_, r) = ctrl.proc(&loopback(&ctrl, Some(near))).unwrap();
        let res = r.resolution.unwrap();
        let clearance = r.clearance.unwrap();

        assert!((clearance.clearance_m - 0.04).abs() < 1e-6);
        assert_eq!(clearance.closest.unwrap().obstacle_id, 1);
        assert!(res.secondary_active);
        assert!(res.secondary_rates_rads.norm() > 1e-3);

        // No effect on the end-effector velocity
        let jac = frames.ee_jacobian();
        assert!((jac * res.secondary_rates_rads).norm() < 1e-9);

        // Removing the obstacle drops the secondary term to exactly zero on the next cycle
        let far = models(&[[a.x, 2.0, 0.0], [a.x, -2.0, 0.0]]);
        let (_, r) = ctrl.proc(&loopback(&ctrl, Some(far))).unwrap();
        let res = r.resolution.unwrap();

        assert!(!res.secondary_active);
        assert_eq!(res.secondary_rates_rads, JointVector::zeros());
        assert_eq!(res.rates_rads, res.primary_rates_rads);
        assert_eq!(r.record.unwrap().clearance_m, 1.0);
    }

    #[test]
    fn test_obstacle_reported_by_model_index() {
        // Model 5 is never present, so model 3 is first in the evaluated list
        let mut ctrl = init_ctrl(Params {
            posture_stage_delay_s: 0.0,
            tracked_model_indices: vec![5, 3],
            ..Default::default()
        });
        let input = InputData {
            dt_s: DT_S,
            ..Default::default()
        };
        for _ in 0..3 {
            ctrl.proc(&input).unwrap();
        }

        let frames = ArmKinematics::default().joint_frames(ctrl.joint_pos_rad());
        let a = crate::kinematics::CritPointId::A.point().position(&frames);
        let states = models(&[[a.x, 2.0, 0.0], [a.x, -2.0, 0.0], [a.x, a.y + 0.09, 0.0]]);

        let (_, r) = ctrl.proc(&loopback(&ctrl, Some(states))).unwrap();
        let closest = r.clearance.unwrap().closest.unwrap();

        assert_eq!(closest.obstacle_id, 3);
        assert_eq!(closest.point, crate::kinematics::CritPointId::A);
        assert!(r.resolution.unwrap().secondary_active);
    }

    /// Minimum clearance over 30 s of the default loopback simulation.
    fn sim_min_clearance(secondary_gain: f64) -> f64 {
        let mut params = Params {
            posture_stage_delay_s: 0.0,
            ..Default::default()
        };
        params.resolver.secondary_gain = secondary_gain;
        let start = params.start_posture_rad;

        let mut ctrl = init_ctrl(params);
        let mut sim = ArmSim::new(SimParams::default(), start);
        let mut min_clearance = std::f64::INFINITY;

        for _ in 0..3000 {
            sim.step(DT_S);
            let input = InputData {
                dt_s: DT_S,
                joint_state: Some(sim.joint_state()),
                model_states: Some(sim.model_states()),
            };

            let (dems, r) = ctrl.proc(&input).unwrap();
            if let Some(d) = dems {
                sim.apply_demands(&d);
            }
            if let Some(c) = r.clearance {
                min_clearance = min_clearance.min(c.clearance_m);
            }
        }

        min_clearance
    }

    #[test]
    fn test_avoidance_improves_clearance() {
        let avoiding = sim_min_clearance(Params::default().resolver.secondary_gain);
        let ignoring = sim_min_clearance(0.0);

        // Without avoidance the swept arm runs into an obstacle, with it the arm stays clear
        assert!(ignoring < 0.0, "min clearance without avoidance {}", ignoring);
        assert!(avoiding > 0.0, "min clearance with avoidance {}", avoiding);
        assert!(avoiding > ignoring + 0.01);
    }

    #[test]
    fn test_untracked_models_ignored() {
        let mut ctrl = tracking_ctrl();
        let frames = ArmKinematics::default().joint_frames(ctrl.joint_pos_rad());
        let a = crate::kinematics::CritPointId::A.point().position(&frames);

        // Model 0 is not tracked, even though it is right on the arm
        let mut states = models(&[]);
        states.poses[0].position_m = [a.x, a.y, a.z];

        let (_, r) = ctrl.proc(&loopback(&ctrl, Some(states))).unwrap();
        assert_eq!(r.clearance.unwrap().closest, None);
        assert!(!r.resolution.unwrap().secondary_active);
    }
}
