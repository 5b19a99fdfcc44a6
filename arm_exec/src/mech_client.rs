//! # Mechanisms Client
//!
//! This module publishes the joint position demands to the arm middleware.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::arm::JointDems,
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct MechClient {
    dems_socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum MechClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send demands to the middleware: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the data: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MechClient {
    /// Create a new instance of the mechanisms client.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, MechClientError> {
        // Publishers bind and never wait for subscribers
        let dems_socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            linger: 1,
            send_timeout: 10,
            ..Default::default()
        };

        let dems_socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            dems_socket_options,
            &params.arm_dems_endpoint,
        )
        .map_err(MechClientError::SocketError)?;

        Ok(Self { dems_socket })
    }

    /// Publish demands to the middleware.
    ///
    /// There is no acknowledgement, a demand published while nothing is subscribed is dropped.
    pub fn send_demands(&mut self, demands: &JointDems) -> Result<(), MechClientError> {
        let dems_str =
            serde_json::to_string(demands).map_err(MechClientError::SerializationError)?;

        self.dems_socket
            .send(dems_str.as_str(), 0)
            .map_err(MechClientError::SendError)
    }
}
