//! Joint demands monitor
//!
//! Subscribes to the joint demands published by the arm controller and prints them, which is
//! useful to check the controller's output without the middleware running.

use comms_if::{
    eqpt::arm::JointDems,
    net::{zmq, MonitoredSocket, SocketOptions},
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "arm_dems_monitor")]
struct Opt {
    /// Endpoint the controller publishes joint demands on
    #[structopt(default_value = "tcp://localhost:5011")]
    endpoint: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    let ctx = zmq::Context::new();

    let socket = MonitoredSocket::new(
        &ctx,
        zmq::SUB,
        SocketOptions::default(),
        &opt.endpoint,
    )?;
    socket.set_subscribe(b"")?;

    println!("Monitoring joint demands on {}", opt.endpoint);

    loop {
        let msg = socket.recv_msg(0)?;

        match msg.as_str().map(serde_json::from_str::<JointDems>) {
            Some(Ok(dems)) => {
                let values: Vec<String> = dems
                    .pos_rad
                    .iter()
                    .map(|(id, pos)| format!("{:?}={:+.4}", id, pos))
                    .collect();
                println!("{}", values.join(" "));
            }
            Some(Err(e)) => println!("Invalid demands: {}", e),
            None => println!("Non UTF-8 message"),
        }
    }
}
