//! End-to-end tests against a scripted controller on an in-memory pipe.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::BytesMut;
use cobot_client::{Client, ClientConfig, ClientError, Command, JointAngles};
use cobot_frame::{encode_frame, Frame, FrameReader};
use cobot_transport::{CobotStream, DEFAULT_DUPLEX_CAPACITY};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;

type Received = Arc<Mutex<Vec<Frame>>>;

/// Reads request frames and answers each with whatever bytes `script`
/// returns for it. Every request is recorded.
fn spawn_controller<F>(device: CobotStream, mut script: F) -> (JoinHandle<()>, Received)
where
    F: FnMut(&Frame, usize) -> Vec<u8> + Send + 'static,
{
    let received: Received = Arc::default();
    let log = Arc::clone(&received);
    let task = tokio::spawn(async move {
        let (input, mut output) = device.into_split();
        let mut reader = FrameReader::new(input);
        while let Ok(frame) = reader.read_frame().await {
            let seen = {
                let mut log = log.lock().unwrap();
                log.push(frame.clone());
                log.iter().filter(|f| f.command == frame.command).count()
            };
            let reply = script(&frame, seen);
            if !reply.is_empty() && output.write_all(&reply).await.is_err() {
                break;
            }
        }
    });
    (task, received)
}

fn reply(command: Command, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_frame(command.id(), payload, &mut buf).unwrap();
    buf.to_vec()
}

fn client_with(config: ClientConfig) -> (Client, CobotStream) {
    let (client_end, device_end) = CobotStream::duplex(DEFAULT_DUPLEX_CAPACITY);
    (Client::with_config(client_end, config).unwrap(), device_end)
}

fn count(received: &Received, command: Command) -> usize {
    received
        .lock()
        .unwrap()
        .iter()
        .filter(|frame| frame.command == command.id())
        .count()
}

#[tokio::test(start_paused = true)]
async fn wait_for_ready_stops_querying_once_powered() {
    let (client, device) = client_with(ClientConfig::default());
    let (_controller, received) = spawn_controller(device, |frame, seen| {
        assert_eq!(frame.command, Command::IsPowerOn.id());
        let on = u8::from(seen >= 3);
        reply(Command::IsPowerOn, &[on])
    });

    client.wait_for_ready().await.unwrap();
    assert_eq!(count(&received, Command::IsPowerOn), 3);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(count(&received, Command::IsPowerOn), 3);
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn wait_for_ready_repeats_query_while_silent() {
    let (client, device) = client_with(ClientConfig::default());
    let (_controller, received) = spawn_controller(device, |_, seen| {
        if seen < 4 {
            Vec::new()
        } else {
            reply(Command::IsPowerOn, &[1])
        }
    });

    let started = tokio::time::Instant::now();
    client.wait_for_ready().await.unwrap();
    assert_eq!(count(&received, Command::IsPowerOn), 4);
    assert!(started.elapsed() >= Duration::from_millis(900));
}

#[tokio::test(start_paused = true)]
async fn wait_for_ready_gives_up_after_tolerance() {
    let config = ClientConfig {
        power_off_tolerance: 2,
        ..ClientConfig::default()
    };
    let (client, device) = client_with(config);
    let (_controller, received) =
        spawn_controller(device, |_, _| reply(Command::IsPowerOn, &[0]));

    let err = client.wait_for_ready().await.unwrap_err();
    assert!(matches!(err, ClientError::NotPoweredOn));
    assert_eq!(count(&received, Command::IsPowerOn), 3);
}

#[tokio::test(start_paused = true)]
async fn zero_tolerance_fails_on_first_off_report() {
    let config = ClientConfig {
        power_off_tolerance: 0,
        ..ClientConfig::default()
    };
    let (client, device) = client_with(config);
    let (_controller, received) =
        spawn_controller(device, |_, _| reply(Command::IsPowerOn, &[0]));

    let err = client.wait_for_ready().await.unwrap_err();
    assert!(matches!(err, ClientError::NotPoweredOn));
    assert_eq!(count(&received, Command::IsPowerOn), 1);
}

#[tokio::test]
async fn pull_edit_push_angles() {
    let (mut client, device) = client_with(ClientConfig::default());
    let (controller, received) = spawn_controller(device, |frame, _| {
        if frame.command == Command::GetAngles.id() {
            let mut payload = vec![0x03, 0xE8];
            payload.extend_from_slice(&[0u8; 10]);
            reply(Command::GetAngles, &payload)
        } else {
            Vec::new()
        }
    });

    let angles = *client.pull_angles().await.unwrap();
    assert_eq!(angles, JointAngles::new([10.0, 0.0, 0.0, 0.0, 0.0, 0.0]));

    client.angles_mut().0[1] = -5.25;
    client.push_angles(50).await.unwrap();
    client.shutdown().await.unwrap();
    controller.await.unwrap();

    let frames = received.lock().unwrap().clone();
    let pushed = frames
        .iter()
        .find(|frame| frame.command == Command::SendAngles.id())
        .expect("send-angles frame");
    assert_eq!(
        pushed.payload.as_ref(),
        &[0x03, 0xE8, 0xFD, 0xF3, 0, 0, 0, 0, 0, 0, 0, 0, 0x32]
    );
}

#[tokio::test]
async fn short_angles_reply_is_invalid() {
    let (client, device) = client_with(ClientConfig::default());
    let (_controller, _) =
        spawn_controller(device, |_, _| reply(Command::GetAngles, &[0x03, 0xE8]));

    let err = client.get_angles().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::InvalidResponse {
            command: Command::GetAngles,
            ..
        }
    ));
    assert!(client.is_connected());
}

#[tokio::test]
async fn concurrent_waits_share_one_reply() {
    let (client, device) = client_with(ClientConfig::default());
    let client = Arc::new(client);
    let (_controller, received) = spawn_controller(device, |_, seen| {
        // Answer only once both requests are in.
        if seen == 2 {
            let mut payload = vec![0x00, 0x02];
            payload.extend_from_slice(&[0u8; 10]);
            reply(Command::GetAngles, &payload)
        } else {
            Vec::new()
        }
    });

    let first = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.get_angles().await })
    };
    let second = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.get_angles().await })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.0[0], 0.02);
    assert_eq!(count(&received, Command::GetAngles), 2);
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test]
async fn resynchronizes_after_noise_and_corruption() {
    let (client, device) = client_with(ClientConfig::default());
    let (_controller, _) = spawn_controller(device, |frame, seen| {
        let command = Command::from_id(frame.command).unwrap();
        match (command, seen) {
            (Command::IsMoving, 1) => {
                // Garbage, then a reply whose footer is wrong.
                let mut wire = vec![0x13, 0xFE, 0x00, 0xFA, 0xFE, 0x13];
                let mut broken = reply(Command::IsMoving, &[1]);
                let last = broken.len() - 1;
                broken[last] = 0xFB;
                wire.extend(broken);
                wire
            }
            (Command::IsMoving, _) => {
                let mut wire = vec![0xFA, 0xFA, 0x01];
                wire.extend(reply(Command::IsMoving, &[0]));
                wire
            }
            _ => Vec::new(),
        }
    });

    let err = client
        .send_and_wait(Command::IsMoving, &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Framing {
            command: Command::IsMoving,
            ..
        }
    ));

    let reply = client.send_and_wait(Command::IsMoving, &[]).await.unwrap();
    assert_eq!(reply.as_ref(), &[0]);
}

#[tokio::test]
async fn controller_hangup_disconnects_waiters() {
    let (client, device) = client_with(ClientConfig::default());
    let controller = tokio::spawn(async move {
        let (input, _output) = device.into_split();
        let mut reader = FrameReader::new(input);
        let _ = reader.read_frame().await;
    });

    let err = client.get_angles().await.unwrap_err();
    assert!(matches!(err, ClientError::Disconnected(Command::GetAngles)));
    controller.await.unwrap();
    assert!(!client.is_connected());
}
