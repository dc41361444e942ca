//! # Runtime Integration Tests
//!
//! Full coordinator process over loopback: legacy config file, command
//! listener, real TCP delivery to a participant inbox.

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use coordinator_runtime::{CoordinatorRuntime, NodeConfig};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

async fn send_command(addr: SocketAddr, line: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(format!("{line}\n").as_bytes()).await.unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();
    reply
}

/// Accept delivery connections and forward each line.
async fn inbox() -> (u16, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx.send(line);
            }
        }
    });
    (port, rx)
}

fn legacy_config(persistence_secs: u64) -> NodeConfig {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "0").unwrap();
    writeln!(file, "{persistence_secs}").unwrap();
    let mut config = NodeConfig::load(file.path()).unwrap();
    config.listener.bind_addr = "127.0.0.1".parse().unwrap();
    config
}

#[tokio::test]
async fn test_live_fanout_over_tcp() {
    let mut runtime = CoordinatorRuntime::new(legacy_config(60));
    let addr = runtime.start().await.unwrap();

    let (port_a, mut inbox_a) = inbox().await;
    let (port_b, mut inbox_b) = inbox().await;
    assert_eq!(send_command(addr, &format!("register a 127.0.0.1 {port_a}")).await, "ack\n");
    assert_eq!(send_command(addr, &format!("register b 127.0.0.1 {port_b}")).await, "ack\n");

    assert_eq!(send_command(addr, "msend a hello there").await, "ack\n");

    let to_a = timeout(Duration::from_secs(2), inbox_a.recv()).await.unwrap();
    let to_b = timeout(Duration::from_secs(2), inbox_b.recv()).await.unwrap();
    assert_eq!(to_a.as_deref(), Some("msend a hello there"));
    assert_eq!(to_b.as_deref(), Some("msend a hello there"));

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_reconnect_replays_missed_messages_over_tcp() {
    let mut runtime = CoordinatorRuntime::new(legacy_config(60));
    let addr = runtime.start().await.unwrap();

    let (port_a, _inbox_a) = inbox().await;
    let (port_b, mut inbox_b) = inbox().await;
    send_command(addr, &format!("register a 127.0.0.1 {port_a}")).await;
    send_command(addr, &format!("register b 127.0.0.1 {port_b}")).await;
    send_command(addr, "disconnect b").await;

    send_command(addr, "msend a first").await;
    send_command(addr, "msend a second").await;
    assert!(
        timeout(Duration::from_millis(200), inbox_b.recv()).await.is_err(),
        "offline participant must not receive live messages"
    );

    let (new_port, mut new_inbox) = inbox().await;
    assert_eq!(send_command(addr, &format!("reconnect b {new_port}")).await, "ack\n");

    let first = timeout(Duration::from_secs(2), new_inbox.recv()).await.unwrap();
    let second = timeout(Duration::from_secs(2), new_inbox.recv()).await.unwrap();
    assert_eq!(first.as_deref(), Some("msend a first"));
    assert_eq!(second.as_deref(), Some("msend a second"));

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_participant_goes_offline() {
    let mut runtime = CoordinatorRuntime::new(legacy_config(60));
    let addr = runtime.start().await.unwrap();

    // Bind then drop to get a port nobody listens on.
    let dead_port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    send_command(addr, &format!("register ghost 127.0.0.1 {dead_port}")).await;
    assert_eq!(send_command(addr, "msend ghost anyone").await, "ack\n");

    let stats = mc_01_coordinator::CoordinatorApi::stats(runtime.coordinator().as_ref());
    assert_eq!(stats.registered, 1);
    assert_eq!(stats.online, 0);

    runtime.shutdown().await;
}
