use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use portfolio_content::Portfolio;
use proptest::prelude::*;
use termfolio_server::server::REJECT_MESSAGE;
use termfolio_server::{AdmissionController, Server, ServerConfig};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum Op {
    Acquire(usize),
    Release(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize).prop_map(Op::Acquire),
        (0..3usize).prop_map(Op::Release),
    ]
}

const ADDRESSES: [&str; 3] = ["10.0.0.1:4000", "10.0.0.1:4001", "[::1]:22"];

fn host(index: usize) -> &'static str {
    // The first two share a host.
    match index {
        0 | 1 => "10.0.0.1",
        _ => "::1",
    }
}

proptest! {
    #[test]
    fn counts_follow_a_simple_model_and_never_exceed_the_limit(
        max in 1usize..6,
        ops in proptest::collection::vec(op(), 0..200),
    ) {
        let controller = AdmissionController::new(max);
        let mut model: HashMap<&str, usize> = HashMap::new();

        for op in ops {
            match op {
                Op::Acquire(index) => {
                    let count = model.entry(host(index)).or_default();
                    let expected = *count < max;
                    prop_assert_eq!(controller.acquire(ADDRESSES[index]), expected);
                    if expected {
                        *count += 1;
                    }
                }
                Op::Release(index) => {
                    controller.release(ADDRESSES[index]);
                    if let Some(count) = model.get_mut(host(index)) {
                        *count = count.saturating_sub(1);
                    }
                }
            }
            model.retain(|_, count| *count > 0);

            for index in 0..ADDRESSES.len() {
                let active = controller.active_count(ADDRESSES[index]);
                prop_assert!(active <= max);
                prop_assert_eq!(active, model.get(host(index)).copied().unwrap_or(0));
            }
            prop_assert_eq!(controller.tracked_addresses(), model.len());
        }
    }
}

#[test]
fn sixth_session_from_one_address_is_rejected_until_a_slot_frees() {
    let controller = Arc::new(AdmissionController::default());
    let mut guards: Vec<_> = (0..5)
        .map(|port| controller.try_admit(&format!("192.0.2.7:{port}")))
        .collect::<Option<_>>()
        .expect("first five are admitted");

    assert!(controller.try_admit("192.0.2.7:99").is_none());
    assert!(controller.try_admit("192.0.2.8:1").is_some());

    guards.pop();
    assert!(controller.try_admit("192.0.2.7:99").is_some());
    drop(guards);
    assert_eq!(controller.active_count("192.0.2.7"), 0);
}

#[test]
fn concurrent_admission_never_exceeds_the_limit() {
    const THREADS: usize = 32;
    let controller = Arc::new(AdmissionController::new(5));
    let start = Arc::new(Barrier::new(THREADS));
    let hold = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|n| {
            let controller = Arc::clone(&controller);
            let start = Arc::clone(&start);
            let hold = Arc::clone(&hold);
            thread::spawn(move || {
                start.wait();
                let guard = controller.try_admit(&format!("198.51.100.1:{n}"));
                let admitted = guard.is_some();
                assert!(controller.active_count("198.51.100.1") <= 5);
                hold.wait();
                drop(guard);
                admitted
            })
        })
        .collect();

    let admitted = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .filter(|admitted| *admitted)
        .count();

    assert_eq!(admitted, 5);
    assert_eq!(controller.active_count("198.51.100.1"), 0);
    assert_eq!(controller.tracked_addresses(), 0);
}

fn local_config(max_sessions_per_address: usize) -> ServerConfig {
    ServerConfig {
        bind: "127.0.0.1:0".parse().expect("valid address"),
        content_path: PathBuf::from("unused"),
        gateway_url: "http://127.0.0.1:9".to_string(),
        max_sessions_per_address,
        idle_timeout: Duration::from_secs(60),
        mock_provider: false,
    }
}

#[tokio::test]
async fn server_rejects_connections_over_the_limit() {
    let server = Server::bind(&local_config(1), Arc::new(Portfolio::default()), None)
        .await
        .expect("bind");
    let address = server.local_addr().expect("local addr");
    let admission = server.admission();
    assert_eq!(admission.max_per_address(), 1);
    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(server.run_until(shutdown.clone()));

    let mut first = TcpStream::connect(address).await.expect("connect first");
    let mut greeting = [0u8; 5];
    first.read_exact(&mut greeting).await.expect("window size query");
    assert_eq!(&greeting, b"\x1b[18t");
    assert_eq!(admission.active_count("127.0.0.1"), 1);

    let mut second = TcpStream::connect(address).await.expect("connect second");
    let mut rejection = String::new();
    second
        .read_to_string(&mut rejection)
        .await
        .expect("read rejection");
    assert_eq!(rejection, REJECT_MESSAGE);

    shutdown.cancel();
    let mut rest = Vec::new();
    first.read_to_end(&mut rest).await.expect("drain first");
    assert!(String::from_utf8_lossy(&rest).ends_with("\x1b[?1049l"));

    serving.await.expect("server task").expect("server result");
    assert_eq!(admission.active_count("127.0.0.1"), 0);
}
