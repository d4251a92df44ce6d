//! Wait for a controller to power on, then print its joint angles.
//!
//! Run with:
//!   cargo run -p cobot --example wait-and-read -- 192.168.1.20
//!
//! The address defaults to the local simulator (see `simulated-controller`).

use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1".to_string());

    let mut client = cobot::connect(&addr).await?;
    eprintln!("Connected to {addr}, waiting for power-on");

    tokio::time::timeout(Duration::from_secs(10), client.wait_for_ready()).await??;

    let angles = client.pull_angles().await?;
    println!("angles: {angles}");

    client.shutdown().await?;
    Ok(())
}
