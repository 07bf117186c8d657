//! HTTP surface tests: real sockets, real inter-agent delivery

use async_trait::async_trait;
use emissary::agent::RaceAgent;
use emissary::errors::AgentError;
use emissary::execution::PayloadRunner;
use emissary::oracle::Oracle;
use emissary::races;
use emissary::server;
use emissary::store::StateStore;
use emissary::transport::PeerTransport;
use emissary::Result;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

struct SequenceOracle {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    /// Artificial latency per call, to hold turns in flight
    delay: Duration,
}

impl SequenceOracle {
    fn new<I: IntoIterator<Item = std::result::Result<String, String>>>(replies: I) -> Self {
        SequenceOracle {
            replies: Mutex::new(replies.into_iter().collect()),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Oracle for SequenceOracle {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(reason)) => Err(AgentError::OracleError(reason)),
            None => Ok("{}".to_string()),
        }
    }
}

/// Bind an agent's router on an ephemeral port, return its base URL
async fn serve(agent: Arc<RaceAgent>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server::router(agent)).await.unwrap();
    });
    format!("http://{addr}")
}

fn agent_with_peers(
    race_id: &str,
    dir: &TempDir,
    oracle: Arc<dyn Oracle>,
    peers: HashMap<String, String>,
) -> Arc<RaceAgent> {
    let db_path = dir.path().join(format!("{race_id}-state.db"));
    Arc::new(
        RaceAgent::from_parts(
            races::race_by_id(race_id).unwrap(),
            Arc::new(StateStore::open(&db_path).unwrap()),
            oracle,
            Arc::new(PeerTransport::new(peers).unwrap()),
            PayloadRunner::new(db_path, dir.path().to_path_buf(), Duration::from_secs(5)),
            10,
        )
        .unwrap(),
    )
}

fn lone_agent(race_id: &str, dir: &TempDir, oracle: Arc<dyn Oracle>) -> Arc<RaceAgent> {
    let mut peers = HashMap::new();
    peers.insert("kromath".to_string(), "http://127.0.0.1:1".to_string());
    agent_with_peers(race_id, dir, oracle, peers)
}

#[tokio::test]
async fn test_health_reports_race_and_day() {
    let dir = TempDir::new().unwrap();
    let base = serve(lone_agent(
        "zephyrians",
        &dir,
        Arc::new(SequenceOracle::new([])),
    ))
    .await;

    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["race"], "zephyrians");
    assert_eq!(body["currentDay"], 0);
}

#[tokio::test]
async fn test_receive_message_validation() {
    let dir = TempDir::new().unwrap();
    let base = serve(lone_agent(
        "zephyrians",
        &dir,
        Arc::new(SequenceOracle::new([])),
    ))
    .await;
    let client = reqwest::Client::new();
    let url = format!("{base}/receive-message");

    // Missing content
    let resp = client
        .post(&url)
        .json(&json!({ "fromRace": "kromath", "messageType": "public" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Bad message type
    let resp = client
        .post(&url)
        .json(&json!({
            "fromRace": "kromath",
            "messageType": "broadcast",
            "content": "hi"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Well-formed
    let resp = client
        .post(&url)
        .json(&json!({
            "fromRace": "kromath",
            "messageType": "secret",
            "content": "run this",
            "code": "echo hi"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["messageId"].is_i64());

    // Visible in the log, stamped day 0, pending
    let body: Value = reqwest::get(format!("{base}/api/messages"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let incoming = body["incoming"].as_array().unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0]["from_race"], "kromath");
    assert_eq!(incoming[0]["day_number"], 0);
    assert_eq!(incoming[0]["resolution"], "pending");
}

#[tokio::test]
async fn test_turn_delivers_to_live_peer() {
    let dir = TempDir::new().unwrap();

    let receiver = lone_agent("kromath", &dir, Arc::new(SequenceOracle::new([])));
    let receiver_base = serve(receiver.clone()).await;

    let mut peers = HashMap::new();
    peers.insert("kromath".to_string(), receiver_base.clone());
    let sender = agent_with_peers(
        "zephyrians",
        &dir,
        Arc::new(SequenceOracle::new([Ok(r#"{
            "public_messages": [{"to": "kromath", "content": "we come in peace", "code": null}],
            "relationship_updates": [{"race": "kromath", "trust_delta": 2, "notes": "promising"}],
            "personality_updates": [{"key": "curiosity", "value": 0.9}],
            "new_secrets": ["the nebula is dying"]
        }"#
        .to_string())])),
        peers,
    );
    let sender_base = serve(sender.clone()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{sender_base}/take-turn"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["day"], 1);
    assert_eq!(body["messagesSent"], 1);

    // The peer actually got it over the wire
    let body: Value = reqwest::get(format!("{receiver_base}/api/messages"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let incoming = body["incoming"].as_array().unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0]["from_race"], "zephyrians");
    assert_eq!(incoming[0]["content"], "we come in peace");
    // The receiver's own clock: still day 0
    assert_eq!(incoming[0]["day_number"], 0);

    // Sender-side views reflect the turn
    let body: Value = reqwest::get(format!("{sender_base}/api/state"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["raceId"], "zephyrians");
    assert_eq!(body["currentDay"], 1);
    let personality = body["personality"].as_array().unwrap();
    assert_eq!(personality.len(), 1);
    assert_eq!(personality[0]["key"], "curiosity");
    let secrets = body["secrets"].as_array().unwrap();
    assert_eq!(secrets.len(), 1);
    assert_eq!(secrets[0]["content"], "the nebula is dying");

    // Trust rows come back as an array consumers iterate
    let body: Value = reqwest::get(format!("{sender_base}/api/trust"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let trust = body["trustLevels"].as_array().unwrap();
    assert_eq!(trust.len(), 1);
    assert_eq!(trust[0]["race_id"], "kromath");
    assert_eq!(trust[0]["trust_level"], 2);
    assert_eq!(trust[0]["notes"], "promising");
    assert_eq!(trust[0]["is_ally"], false);
}

#[tokio::test]
async fn test_concurrent_take_turn_yields_conflict() {
    let dir = TempDir::new().unwrap();
    let oracle = Arc::new(
        SequenceOracle::new([Ok("{}".to_string()), Ok("{}".to_string())])
            .with_delay(Duration::from_millis(300)),
    );
    let base = serve(lone_agent("zephyrians", &dir, oracle)).await;
    let client = reqwest::Client::new();

    let first = {
        let client = client.clone();
        let url = format!("{base}/take-turn");
        tokio::spawn(async move { client.post(url).send().await.unwrap().status() })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = client
        .post(format!("{base}/take-turn"))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["retryable"], true);

    assert_eq!(first.await.unwrap(), 200);

    // Exactly one turn happened
    let body: Value = reqwest::get(format!("{base}/api/state"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["currentDay"], 1);
}

#[tokio::test]
async fn test_oracle_failure_maps_to_bad_gateway() {
    let dir = TempDir::new().unwrap();
    let base = serve(lone_agent(
        "zephyrians",
        &dir,
        Arc::new(SequenceOracle::new([Err("model overloaded".to_string())])),
    ))
    .await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/take-turn"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["retryable"], true);

    // Nothing happened
    let body: Value = reqwest::get(format!("{base}/api/state"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["currentDay"], 0);
    assert_eq!(body["lastTurnAt"], 0);
}

#[tokio::test]
async fn test_reset_returns_agent_to_day_zero() {
    let dir = TempDir::new().unwrap();
    let base = serve(lone_agent(
        "zephyrians",
        &dir,
        Arc::new(SequenceOracle::new([Ok(r#"{
            "resource_actions": [{"action": "gift", "target_race": "kromath", "resource_type": "energy", "amount": 400}]
        }"#
        .to_string())])),
    ))
    .await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/take-turn"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{base}/api/reset"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = reqwest::get(format!("{base}/api/state"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["currentDay"], 0);
    let resources = body["resources"].as_array().unwrap();
    let energy = resources
        .iter()
        .find(|r| r["resource_type"] == "energy")
        .unwrap();
    assert_eq!(energy["amount"], 1000);

    let body: Value = reqwest::get(format!("{base}/api/messages"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["outgoing"].as_array().unwrap().is_empty());
}
