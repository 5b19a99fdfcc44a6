//! # Sensor Client
//!
//! The SensClient receives the arm's joint states and the poses of the models in the world from
//! the arm middleware. Data works in a publisher-subscriber model, the middleware publishes as
//! often as it likes and a background thread keeps only the latest snapshot of each kind.
//!
//! The control loop never blocks on the client. If no new data has arrived the previous snapshot
//! is returned again.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, warn};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

use comms_if::{
    eqpt::arm::{ArmSensData, JointState, ModelStates},
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct SensClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    joint_state: Arc<Mutex<Option<JointState>>>,
    model_states: Arc<Mutex<Option<ModelStates>>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SensClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not subscribe to the sensor stream: {0}")]
    SubscribeError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SensClient {
    /// Create a new instance of the SensClient, starting its background thread.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, SensClientError> {
        // The middleware may start after the controller, so don't wait for it
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            socket_options,
            &params.arm_sens_endpoint,
        )
        .map_err(SensClientError::SocketError)?;
        socket
            .set_subscribe(b"")
            .map_err(SensClientError::SubscribeError)?;

        // Create the data shared objects
        let bg_run = Arc::new(AtomicBool::new(true));
        let joint_state = Arc::new(Mutex::new(None));
        let model_states = Arc::new(Mutex::new(None));

        // Create clones of these to pass to the bg thread
        let bg_run_clone = bg_run.clone();
        let joint_state_clone = joint_state.clone();
        let model_states_clone = model_states.clone();

        let bg_jh = Some(thread::spawn(move || {
            bg_thread(socket, bg_run_clone, joint_state_clone, model_states_clone)
        }));

        Ok(Self {
            bg_jh,
            bg_run,
            joint_state,
            model_states,
        })
    }

    /// Get the latest joint state.
    pub fn joint_state(&self) -> Option<JointState> {
        *self
            .joint_state
            .lock()
            .expect("SensClient: joint_state mutex poisoned")
    }

    /// Get the latest model states.
    pub fn model_states(&self) -> Option<ModelStates> {
        self.model_states
            .lock()
            .expect("SensClient: model_states mutex poisoned")
            .clone()
    }
}

impl Drop for SensClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            jh.join().ok();
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, updates the data in the SensClient when the middleware publishes something
/// new.
fn bg_thread(
    socket: MonitoredSocket,
    run: Arc<AtomicBool>,
    joint_state: Arc<Mutex<Option<JointState>>>,
    model_states: Arc<Mutex<Option<ModelStates>>>,
) {
    while run.load(Ordering::Relaxed) {
        let msg = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message from the arm middleware");
                continue;
            }
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                error!("Error receiving message from the arm middleware: {:?}", e);
                break;
            }
        };

        let data: ArmSensData = match serde_json::from_str(&msg) {
            Ok(d) => d,
            Err(e) => {
                warn!("Error deserialising message from the arm middleware: {:?}", e);
                continue;
            }
        };

        match data {
            ArmSensData::JointState(js) => {
                *joint_state
                    .lock()
                    .expect("SensClient: joint_state mutex poisoned") = Some(js);
            }
            ArmSensData::ModelStates(ms) => {
                *model_states
                    .lock()
                    .expect("SensClient: model_states mutex poisoned") = Some(ms);
            }
        }
    }
}
