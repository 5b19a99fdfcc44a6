//! Main arm-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - System input acquisition:
//!             - Joint states
//!             - Model states
//!         - Arm control processing
//!         - Joint demands output
//!         - Diagnostics
//!
//! # Modules
//!
//! All modules (e.g. `arm_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use arm_lib::{
    arm_ctrl::{self, ArmCtrlMode},
    data_store::DataStore,
    diag::{ArchiveObserver, CycleObserver},
    mech_client::MechClient,
    params::ArmExecParams,
    sens_client::SensClient,
    sim::ArmSim,
};
use comms_if::{eqpt::arm::NUM_JOINTS, net::NetParams};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec", about = "xArm7 oscillation and obstacle avoidance controller")]
struct Opt {
    /// Run against the in-process loopback simulation rather than the arm middleware
    #[structopt(long)]
    sim: bool,

    /// Stop after this many seconds, otherwise run until interrupted
    #[structopt(long)]
    duration_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Where sensor data comes from and demands go to.
enum ArmIo {
    Sim(ArmSim),
    Net {
        sens_client: SensClient,
        mech_client: MechClient,
    },
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("xArm7 Arm Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // Shutdown takes effect between cycles
    let running = Arc::new(AtomicBool::new(true));
    let running_handle = running.clone();
    ctrlc::set_handler(move || {
        running_handle.store(false, Ordering::Relaxed);
    })
    .wrap_err("Failed to set the interrupt handler")?;

    // ---- LOAD PARAMETERS ----

    let exec_params: ArmExecParams =
        util::params::load("arm_exec.toml").wrap_err("Could not load exec params")?;
    let arm_ctrl_params: arm_ctrl::Params =
        util::params::load("arm_ctrl.toml").wrap_err("Could not load ArmCtrl params")?;

    info!("Exec parameters loaded");

    let cycle_period_s = exec_params.cycle_period_s();

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.arm_ctrl
        .init(
            arm_ctrl::InitData {
                params: arm_ctrl_params,
                cycle_rate_hz: exec_params.cycle_rate_hz,
            },
            Some(&session),
        )
        .wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl init complete");

    let mut observer: Option<Box<dyn CycleObserver>> = match exec_params.enable_archive {
        true => Some(Box::new(
            ArchiveObserver::new(&session, exec_params.diag_num_periods)
                .wrap_err("Failed to initialise the ArchiveObserver")?,
        )),
        false => None,
    };

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    let mut io = if opt.sim {
        info!("Using the loopback simulation");
        ArmIo::Sim(ArmSim::new(exec_params.sim.clone(), [0f64; NUM_JOINTS]))
    } else {
        info!("Initialising network");

        let net_params: NetParams =
            util::params::load("net.toml").wrap_err("Could not load net params")?;

        let zmq_ctx = comms_if::net::zmq::Context::new();

        let sens_client = SensClient::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise SensClient")?;
        info!("SensClient initialised");

        let mech_client = MechClient::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise MechClient")?;
        info!("MechClient initialised");

        info!("Network initialisation complete");

        ArmIo::Net {
            sens_client,
            mech_client,
        }
    };

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let loop_start_instant = Instant::now();

    while running.load(Ordering::Relaxed) {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(cycle_start_instant, cycle_period_s);

        // ---- DATA INPUT ----

        match io {
            ArmIo::Sim(ref mut sim) => {
                sim.step(ds.arm_ctrl_input.dt_s);
                ds.arm_ctrl_input.joint_state = Some(sim.joint_state());
                ds.arm_ctrl_input.model_states = Some(sim.model_states());
            }
            ArmIo::Net {
                ref sens_client, ..
            } => {
                ds.arm_ctrl_input.joint_state = sens_client.joint_state();
                ds.arm_ctrl_input.model_states = sens_client.model_states();
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        match ds.arm_ctrl.proc(&ds.arm_ctrl_input) {
            Ok((o, r)) => {
                ds.arm_ctrl_output = o;
                ds.arm_ctrl_status_rpt = r;
            }
            Err(e) => warn!("Error during ArmCtrl processing: {}", e),
        };

        // ---- DEMANDS OUTPUT ----

        if let Some(ref dems) = ds.arm_ctrl_output {
            match io {
                ArmIo::Sim(ref mut sim) => sim.apply_demands(dems),
                ArmIo::Net {
                    ref mut mech_client,
                    ..
                } => {
                    if let Err(e) = mech_client.send_demands(dems) {
                        warn!("MechClient processing error: {}", e)
                    }
                }
            }
        }

        // ---- DIAGNOSTICS ----

        if let (Some(obs), Some(record)) = (observer.as_mut(), ds.arm_ctrl_status_rpt.record) {
            obs.on_cycle(&record);
        }

        // ---- CYCLE MANAGEMENT ----

        ds.num_cycles += 1;

        if let Some(d) = opt.duration_s {
            if loop_start_instant.elapsed().as_secs_f64() >= d {
                info!("Run duration of {:.02} s reached, stopping", d);
                break;
            }
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(cycle_period_s).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period_s
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }
    }

    // ---- SHUTDOWN ----

    info!(
        "Stopped after {} cycles in mode {:?}",
        ds.num_cycles,
        ds.arm_ctrl.mode()
    );
    if ds.arm_ctrl.mode() == ArmCtrlMode::AwaitingStart {
        warn!("Tracking never began");
    }

    if let Some(ref mut obs) = observer {
        obs.finish(Some(&session));
    }

    // Close the sockets before the session
    drop(io);

    info!("End of execution");

    session.exit();

    Ok(())
}
