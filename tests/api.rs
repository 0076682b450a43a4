use milan_core::oracle::Oracle;
use milan_core::server::{build_router, AppState};
use milan_core::ReferenceBody;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Spin up the service on an ephemeral port with no collaborator key.
async fn start_server() -> SocketAddr {
    let state = AppState {
        oracle: Arc::new(Oracle::new(
            None,
            "http://127.0.0.1:9/unreachable".to_string(),
            "test-model".to_string(),
        )),
        reference_body: ReferenceBody::Moon,
    };
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

async fn send_raw(addr: SocketAddr, request: String) -> (u16, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, body.to_string())
}

async fn get(addr: SocketAddr, path: &str) -> (u16, String) {
    let request =
        format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    send_raw(addr, request).await
}

async fn post_json(addr: SocketAddr, path: &str, body: &Value) -> (u16, Value) {
    let payload = body.to_string();
    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\
Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{payload}",
        payload.len()
    );
    let (status, body) = send_raw(addr, request).await;
    let parsed = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, parsed)
}

fn sample_request() -> Value {
    json!({
        "partner1": {"date": "1990-01-01", "time": "12:00", "place": "mumbai"},
        "partner2": {"date": "1992-05-15", "time": "18:30", "place": "delhi"}
    })
}

#[tokio::test]
async fn liveness_probes_answer() {
    let addr = start_server().await;
    for path in ["/", "/health"] {
        let (status, body) = get(addr, path).await;
        assert_eq!(status, 200, "{path}");
        let parsed: Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(parsed["status"], "healthy");
    }
}

#[tokio::test]
async fn compatibility_returns_a_complete_report() {
    let addr = start_server().await;
    let (status, body) = post_json(addr, "/api/compatibility", &sample_request()).await;
    assert_eq!(status, 200);
    assert_eq!(body["max_possible_score"], 36);

    let breakdown = body["breakdown"].as_object().expect("breakdown object");
    let gunas = [
        "varna",
        "vashya",
        "tara",
        "yoni",
        "graha_maitri",
        "gana",
        "bhakoot",
        "nadi",
    ];
    assert_eq!(breakdown.len(), gunas.len());
    let mut sum = 0_u64;
    for guna in gunas {
        let entry = &breakdown[guna];
        let score = entry["score"].as_u64().expect("score");
        let max = entry["max"].as_u64().expect("max");
        assert!(score <= max, "{guna}: {score} > {max}");
        sum += score;
    }
    assert_eq!(sum, body["gun_milan_score"].as_u64().expect("total"));

    assert!(["Excellent", "Good", "Moderate", "Poor"]
        .contains(&body["compatibility_level"].as_str().expect("level")));
    assert!(body["spiritual_alignment_score"].as_u64().expect("alignment") <= 100);
    for chart in ["partner1_chart", "partner2_chart"] {
        let lon = body[chart]["longitude"].as_f64().expect("longitude");
        assert!((0.0..360.0).contains(&lon));
        assert!(body[chart]["rashi"].is_string());
        assert!(body[chart]["nakshatra_lord"].is_string());
    }
}

#[tokio::test]
async fn identical_partners_hit_the_known_total() {
    let addr = start_server().await;
    let request = json!({
        "partner1": {"date": "1990-01-01", "time": "12:00", "place": "mumbai"},
        "partner2": {"date": "1990-01-01", "time": "12:00", "place": "mumbai"}
    });
    let (status, body) = post_json(addr, "/api/compatibility", &request).await;
    assert_eq!(status, 200);
    assert_eq!(body["gun_milan_score"], 25);
    assert_eq!(body["compatibility_level"], "Good");
    let issues: Vec<&str> = body["issues_detected"]
        .as_array()
        .expect("issues")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(issues.contains(&"nadi_dosha"));
    assert_eq!(body["spiritual_alignment_score"], 100);
    assert_eq!(body["partner1_chart"], body["partner2_chart"]);
}

#[tokio::test]
async fn responses_are_deterministic() {
    let addr = start_server().await;
    let (_, first) = post_json(addr, "/api/compatibility", &sample_request()).await;
    let (_, second) = post_json(addr, "/api/compatibility", &sample_request()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_partner_is_a_bad_request() {
    let addr = start_server().await;
    let request = json!({
        "partner1": {"date": "1990-01-01", "time": "12:00", "place": "mumbai"}
    });
    let (status, body) = post_json(addr, "/api/compatibility", &request).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Missing partner data");

    let (status, _) = post_json(addr, "/api/compatibility", &json!({})).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn bad_date_names_the_failing_partner() {
    let addr = start_server().await;
    let request = json!({
        "partner1": {"date": "01/01/1990", "time": "12:00", "place": "mumbai"},
        "partner2": {"date": "1992-05-15", "time": "18:30", "place": "delhi"}
    });
    let (status, body) = post_json(addr, "/api/compatibility", &request).await;
    assert_eq!(status, 400);
    let error = body["error"].as_str().expect("error");
    assert!(error.contains("partner1"), "got {error}");

    let request = json!({
        "partner1": {"date": "1990-01-01", "time": "12:00", "place": "mumbai"},
        "partner2": {"date": "1992-05-15", "time": "25:99", "place": "delhi"}
    });
    let (status, body) = post_json(addr, "/api/compatibility", &request).await;
    assert_eq!(status, 400);
    let error = body["error"].as_str().expect("error");
    assert!(error.contains("partner2"), "got {error}");
}

#[tokio::test]
async fn unknown_place_still_scores() {
    let addr = start_server().await;
    let request = json!({
        "partner1": {"date": "1990-01-01", "time": "12:00", "place": "atlantis"},
        "partner2": {"date": "1992-05-15", "time": "18:30", "place": "el dorado"}
    });
    let (status, body) = post_json(addr, "/api/compatibility", &request).await;
    assert_eq!(status, 200);
    assert_eq!(body["max_possible_score"], 36);
}

#[tokio::test]
async fn enhanced_degrades_without_a_key() {
    let addr = start_server().await;
    let request = json!({
        "partner1": {
            "name": "Asha", "date": "1990-01-01", "time": "12:00", "place": "mumbai"
        },
        "partner2": {
            "name": "Ravi", "date": "1992-05-15", "time": "18:30", "place": "delhi"
        }
    });
    let (status, body) = post_json(addr, "/api/compatibility/enhanced", &request).await;
    assert_eq!(status, 200);

    // Deterministic portion intact.
    let vedic = &body["vedic_data"];
    assert_eq!(vedic["max_possible_score"], 36);
    assert_eq!(vedic["partner1_details"]["name"], "Asha");
    assert!(vedic["breakdown"]["nadi"]["max"] == 8);

    // Collaborator failure is a structured error, not a dropped field.
    let error = body["enhanced_report"]["error"].as_str().expect("error");
    assert!(error.contains("not configured"), "got {error}");
}
