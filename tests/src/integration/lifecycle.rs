//! # Randomized Lifecycle Checks
//!
//! Drives the coordinator with random sequences of register, disconnect,
//! reconnect, deregister, publish, clock advances and crashed receivers,
//! and compares every delivery against a small reference model.
//!
//! The model tracks, per participant, its status, current port and
//! watermark (last delivered sequence number). After each step the
//! deliveries the coordinator actually made must equal the model's, per
//! participant and in order.

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::Arc;

    use mc_01_coordinator::test_utils::{ControllableTimeSource, RecordingTransport};
    use mc_01_coordinator::{
        Coordinator, CoordinatorApi, CoordinatorError, ParticipantAddr, ParticipantId,
        RetentionConfig,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const WINDOW_MS: u64 = 5_000;
    const NAMES: [&str; 4] = ["p0", "p1", "p2", "p3"];

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Status {
        Online,
        Offline,
    }

    #[derive(Debug)]
    struct ModelParticipant {
        status: Status,
        port: u16,
        watermark: u64,
    }

    /// Published message as the model remembers it.
    struct ModelMessage {
        seq: u64,
        timestamp: u64,
        body: String,
    }

    #[derive(Default)]
    struct Model {
        participants: BTreeMap<String, ModelParticipant>,
        messages: Vec<ModelMessage>,
        failing_ports: HashSet<u16>,
    }

    impl Model {
        fn in_window(message: &ModelMessage, now: u64) -> bool {
            now.saturating_sub(message.timestamp) <= WINDOW_MS
        }
    }

    fn id(name: &str) -> ParticipantId {
        ParticipantId::new(name).unwrap()
    }

    fn addr(port: u16) -> ParticipantAddr {
        ParticipantAddr::new("127.0.0.1", port)
    }

    /// Bodies delivered since `from`, grouped by participant name.
    fn new_deliveries(
        transport: &RecordingTransport,
        from: usize,
        owners: &HashMap<u16, String>,
    ) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (to, line) in transport.deliveries().into_iter().skip(from) {
            let owner = owners[&to.port].clone();
            grouped.entry(owner).or_default().push(line.body);
        }
        grouped
    }

    async fn run_sequence(seed: u64, steps: usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let clock = ControllableTimeSource::new(0);
        let transport = RecordingTransport::new();
        let coordinator = Coordinator::new(
            RetentionConfig::from_millis(WINDOW_MS),
            Arc::new(transport.clone()),
            Box::new(clock.clone()),
        );

        let mut model = Model::default();
        let mut owners: HashMap<u16, String> = HashMap::new();
        let mut next_port: u16 = 10_000;
        let mut now: u64 = 0;
        let mut seq: u64 = 0;

        for step in 0..steps {
            let seen = transport.deliveries().len();
            let name = NAMES[rng.gen_range(0..NAMES.len())];
            let mut expected: BTreeMap<String, Vec<String>> = BTreeMap::new();

            match rng.gen_range(0..100) {
                // register
                0..=14 => {
                    next_port += 1;
                    owners.insert(next_port, name.to_string());
                    coordinator.register(id(name), addr(next_port)).await.unwrap();

                    let watermark = model.participants.get(name).map_or(0, |p| p.watermark);
                    model.participants.insert(
                        name.to_string(),
                        ModelParticipant {
                            status: Status::Online,
                            port: next_port,
                            watermark,
                        },
                    );
                }
                // disconnect
                15..=27 => {
                    let result = coordinator.disconnect(&id(name)).await;
                    match model.participants.get_mut(name) {
                        Some(p) => {
                            result.unwrap();
                            p.status = Status::Offline;
                        }
                        None => assert!(matches!(
                            result,
                            Err(CoordinatorError::UnknownParticipant(_))
                        )),
                    }
                }
                // reconnect on a fresh port
                28..=42 => {
                    next_port += 1;
                    owners.insert(next_port, name.to_string());
                    let result = coordinator.reconnect(&id(name), None, next_port).await;
                    match model.participants.get_mut(name) {
                        Some(p) => {
                            let report = result.unwrap();
                            p.status = Status::Online;
                            p.port = next_port;
                            let owed: Vec<&ModelMessage> = model
                                .messages
                                .iter()
                                .filter(|m| m.seq > p.watermark && Model::in_window(m, now))
                                .collect();
                            assert_eq!(report.delivered, owed.len(), "step {step}");
                            if let Some(last) = owed.last() {
                                p.watermark = last.seq;
                                expected.insert(
                                    name.to_string(),
                                    owed.iter().map(|m| m.body.clone()).collect(),
                                );
                            }
                        }
                        None => assert!(matches!(
                            result,
                            Err(CoordinatorError::UnknownParticipant(_))
                        )),
                    }
                }
                // deregister
                43..=50 => {
                    let result = coordinator.deregister(&id(name)).await;
                    match model.participants.remove(name) {
                        Some(_) => {
                            result.unwrap();
                        }
                        None => assert!(result.is_err()),
                    }
                }
                // crash: the participant's receiver stops answering
                51..=55 => {
                    if let Some(p) = model.participants.get(name) {
                        transport.fail_address(&addr(p.port));
                        model.failing_ports.insert(p.port);
                    }
                }
                // advance the clock
                56..=69 => {
                    let millis = rng.gen_range(0..=3_000);
                    clock.advance_millis(millis);
                    now += millis;
                }
                // publish
                _ => {
                    seq += 1;
                    let body = format!("m{seq}");
                    let report = coordinator.publish(id(name), body.clone()).await.unwrap();
                    assert_eq!(report.message.seq, seq);

                    model.messages.push(ModelMessage {
                        seq,
                        timestamp: now,
                        body: body.clone(),
                    });
                    for (owner, p) in model.participants.iter_mut() {
                        if p.status != Status::Online {
                            continue;
                        }
                        if model.failing_ports.contains(&p.port) {
                            p.status = Status::Offline;
                        } else {
                            p.watermark = seq;
                            expected.insert(owner.clone(), vec![body.clone()]);
                        }
                    }
                }
            }

            let actual = new_deliveries(&transport, seen, &owners);
            assert_eq!(actual, expected, "seed {seed} step {step}");

            for (name, p) in &model.participants {
                let entry = coordinator.lookup(&id(name)).unwrap();
                assert_eq!(
                    entry.is_online(),
                    p.status == Status::Online,
                    "seed {seed} step {step}: status of {name}"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_random_sequences_match_model() {
        for seed in 0..25 {
            run_sequence(seed, 300).await;
        }
    }
}
