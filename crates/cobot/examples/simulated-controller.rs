//! Minimal controller simulator: serves the TCP bridge protocol on
//! localhost so the client and CLI can be tried without an arm.
//!
//! Run with:
//!   cargo run -p cobot --example simulated-controller
//!
//! In another terminal:
//!   cargo run -p cobot --features cli -- --tcp 127.0.0.1 ready
//!   cargo run -p cobot --features cli -- --tcp 127.0.0.1 angles set 10 -5.25 0 0 0 0
//!   cargo run -p cobot --features cli -- --tcp 127.0.0.1 angles get

use std::sync::{Arc, Mutex};

use cobot::frame::{FrameError, FrameReader, FrameWriter};
use cobot::{Command, JointAngles};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(("127.0.0.1", cobot::transport::DEFAULT_TCP_PORT)).await?;
    eprintln!("Listening on {}", listener.local_addr()?);

    // Angles survive reconnects, like a real arm.
    let angles = Arc::new(Mutex::new(JointAngles::default()));

    loop {
        let (socket, addr) = listener.accept().await?;
        eprintln!("Client connected: {addr}");
        let angles = Arc::clone(&angles);

        tokio::spawn(async move {
            let (input, output) = socket.into_split();
            let mut reader = FrameReader::new(input);
            let writer = FrameWriter::new(output);

            loop {
                let frame = match reader.read_frame().await {
                    Ok(frame) => frame,
                    Err(FrameError::Framing(e)) => {
                        eprintln!("Skipping malformed frame: {e}");
                        continue;
                    }
                    Err(e) => {
                        eprintln!("Client {addr} disconnected: {e}");
                        break;
                    }
                };
                let reply = match Command::from_id(frame.command) {
                    Some(Command::IsPowerOn) => Some(vec![0x01]),
                    Some(Command::IsMoving) => Some(vec![0x00]),
                    Some(Command::GetAngles) => {
                        let current = *angles.lock().unwrap();
                        Some(current.encode().unwrap().to_vec())
                    }
                    Some(Command::SendAngles) => {
                        match JointAngles::from_payload(&frame.payload) {
                            Ok(target) => {
                                eprintln!("Moving to {target}");
                                *angles.lock().unwrap() = target;
                            }
                            Err(e) => eprintln!("Ignoring send-angles: {e}"),
                        }
                        None
                    }
                    _ => {
                        eprintln!("Ignoring command 0x{:02X}", frame.command);
                        None
                    }
                };
                if let Some(payload) = reply {
                    if writer.send(frame.command, &payload).await.is_err() {
                        break;
                    }
                }
            }
        });
    }
}
