//! End-to-end tests of the HTTP surface with in-memory Slack and job fakes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use senora_actions::{ActionRegistry, FormTemplate};
use senora_gateway::dialog::{
    ACTION_SELECT, ACTION_SELECT_BLOCK, SELECTION_CALLBACK_ID, SUBMISSION_CALLBACK_ID,
};
use senora_gateway::{GatewayConfig, GatewayState, create_router};
use senora_jobs::{JobError, JobHandle, JobRequest, JobResult, JobTrigger};
use senora_slack::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER, compute_signature};
use senora_gateway::metrics;
use senora_slack::{
    ClientOptions, CredentialSource, Delivery, SlackApi, SlackClientCell, SlackCredentials,
    SlackError, SlackMessageContent, SlackResult, View,
};

const SIGNING_SECRET: &str = "test-signing-secret";

#[derive(Debug, Clone)]
struct Post {
    channel: String,
    text: String,
    thread_ts: Option<String>,
}

#[derive(Default)]
struct FakeSlack {
    posts: Mutex<Vec<Post>>,
    opened: Mutex<Vec<(String, View)>>,
    fail_posts: bool,
}

impl FakeSlack {
    fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    fn opened(&self) -> Vec<(String, View)> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn post_message(
        &self,
        channel: &str,
        content: SlackMessageContent,
    ) -> SlackResult<Delivery> {
        if self.fail_posts {
            return Err(SlackError::Channel("channel_not_found".to_string()));
        }
        self.posts.lock().unwrap().push(Post {
            channel: channel.to_string(),
            text: content.text.unwrap_or_default(),
            thread_ts: content.thread_ts,
        });
        Ok(Delivery {
            channel: channel.to_string(),
            ts: "1700000000.000100".to_string(),
        })
    }

    async fn open_view(&self, trigger_id: &str, view: &View) -> SlackResult<()> {
        self.opened
            .lock()
            .unwrap()
            .push((trigger_id.to_string(), view.clone()));
        Ok(())
    }

    async fn publish_view(&self, _user_id: &str, _view: &View) -> SlackResult<()> {
        Ok(())
    }
}

struct FakeJobs {
    requests: Mutex<Vec<JobRequest>>,
    fail: bool,
}

impl FakeJobs {
    fn new(fail: bool) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail,
        }
    }

    fn requests(&self) -> Vec<JobRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobTrigger for FakeJobs {
    async fn start(&self, request: &JobRequest) -> JobResult<JobHandle> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(JobError::Network("connection refused".to_string()));
        }
        Ok(JobHandle {
            id: format!("senora-{}:7", request.action),
            status: "IN_PROGRESS".to_string(),
            project: format!("senora-{}", request.action),
        })
    }
}

/// Secret store that is never reachable.
struct UnreachableSecrets;

#[async_trait]
impl CredentialSource for UnreachableSecrets {
    async fn fetch(&self) -> SlackResult<SlackCredentials> {
        Err(SlackError::Credentials("secret store unreachable".to_string()))
    }

    fn describe(&self) -> String {
        "unreachable".to_string()
    }
}

struct Harness {
    router: Router,
    state: Arc<GatewayState>,
    slack: Arc<FakeSlack>,
    jobs: Arc<FakeJobs>,
}

fn registry() -> ActionRegistry {
    ActionRegistry::from_templates(["restart", "deploy", "backup"].map(|name| {
        FormTemplate::new(name, View::modal(format!("Run {name}")).with_submit("Run"))
    }))
}

fn harness_with(slack: FakeSlack, jobs: FakeJobs, verify_signatures: bool) -> Harness {
    let mut config = GatewayConfig::default();
    config.slack.verify_signatures = verify_signatures;
    build_harness(config, slack, jobs, None)
}

fn build_harness(
    config: GatewayConfig,
    slack: FakeSlack,
    jobs: FakeJobs,
    cell: Option<SlackClientCell>,
) -> Harness {
    let slack = Arc::new(slack);
    let jobs = Arc::new(jobs);

    let cell = cell.unwrap_or_else(|| {
        SlackClientCell::ready(
            slack.clone(),
            SlackCredentials::new("xoxb-test", SIGNING_SECRET),
        )
    });
    let state = Arc::new(GatewayState::new(config, registry(), jobs.clone(), cell));

    Harness {
        router: create_router(Arc::clone(&state)),
        state,
        slack,
        jobs,
    }
}

fn unsigned_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.slack.verify_signatures = false;
    config
}

fn harness() -> Harness {
    harness_with(FakeSlack::default(), FakeJobs::new(false), false)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn json_body(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn slash_command(command: &str) -> Request<Body> {
    post_form(
        "/slack/commands",
        format!(
            "command={}&user_id=U1&user_name=ada&channel_id=C1&text=&trigger_id=t-1",
            urlencoding::encode(command)
        ),
    )
}

fn view_submission(callback_id: &str, metadata: &str, selected: Option<&str>) -> Request<Body> {
    let mut values = serde_json::json!({});
    if let Some(selected) = selected {
        values[ACTION_SELECT_BLOCK] = serde_json::json!({
            ACTION_SELECT: {"type": "static_select", "selected_option": {"value": selected}}
        });
    }
    let payload = serde_json::json!({
        "type": "view_submission",
        "trigger_id": "t-2",
        "user": {"id": "U1", "username": "ada", "name": "Ada Lovelace"},
        "view": {
            "id": "V1",
            "callback_id": callback_id,
            "private_metadata": metadata,
            "state": {"values": values}
        }
    });
    post_form(
        "/slack/interactions",
        format!("payload={}", urlencoding::encode(&payload.to_string())),
    )
}

/// Wait for spawned post-acknowledgment work.
async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn health_reports_actions() {
    let h = harness();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["actions"], 3);
}

#[tokio::test]
async fn notify_direct_message() {
    let h = harness();
    let (status, body) = send(
        &h.router,
        post_json(
            "/notify",
            serde_json::json!({"notification_type": "direct-message", "user_id": "U1", "message": "hi"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["message"], "Notification sent");

    let posts = h.slack.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].channel, "U1");
    assert_eq!(posts[0].text, "hi");
    assert!(posts[0].thread_ts.is_none());
}

#[tokio::test]
async fn notify_in_thread() {
    let h = harness();
    let (status, _) = send(
        &h.router,
        post_json(
            "/notify",
            serde_json::json!({"notification_type": "in-thread", "channel": "C1", "thread_ts": "1.5", "message": "done"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let posts = h.slack.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].channel, "C1");
    assert_eq!(posts[0].thread_ts.as_deref(), Some("1.5"));
}

#[tokio::test]
async fn notify_validation_failures_send_nothing() {
    let h = harness();
    let bad_requests = [
        serde_json::json!({"notification_type": "in-thread", "message": "done"}),
        serde_json::json!({"notification_type": "bogus", "message": "x", "user_id": "U1"}),
        serde_json::json!({"notification_type": "direct-message", "user_id": "U1"}),
        serde_json::json!({"notification_type": "direct-message", "message": "x"}),
    ];

    for body in bad_requests {
        let (status, response) = send(&h.router, post_json("/notify", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json_body(&response)["error"].is_string());
    }

    let request = Request::builder()
        .method("POST")
        .uri("/notify")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(h.slack.posts().is_empty());
}

#[tokio::test]
async fn notify_delivery_failure_is_500() {
    let h = harness_with(
        FakeSlack {
            fail_posts: true,
            ..Default::default()
        },
        FakeJobs::new(false),
        false,
    );

    let (status, body) = send(
        &h.router,
        post_json("/notify", serde_json::json!({"user_id": "U1", "message": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!json_body(&body)["error"].as_str().unwrap().contains("channel_not_found"));
}

#[tokio::test]
async fn slash_command_opens_sorted_selection() {
    let h = harness();
    let (status, body) = send(&h.router, slash_command("/senora")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    eventually(|| h.slack.opened().len() == 1).await;
    let (trigger_id, view) = h.slack.opened().remove(0);
    assert_eq!(trigger_id, "t-1");
    assert_eq!(view.callback_id.as_deref(), Some(SELECTION_CALLBACK_ID));

    let value = serde_json::to_value(&view).unwrap();
    let options: Vec<_> = value["blocks"][1]["element"]["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["value"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(options, vec!["backup", "deploy", "restart"]);
}

#[tokio::test]
async fn unknown_slash_command_is_ephemeral() {
    let h = harness();
    let (status, body) = send(&h.router, slash_command("/other")).await;

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["response_type"], "ephemeral");
    assert!(h.slack.opened().is_empty());
}

#[tokio::test]
async fn invalid_selection_returns_field_error() {
    let h = harness();
    let (status, body) = send(
        &h.router,
        view_submission(SELECTION_CALLBACK_ID, "", Some("drop-database")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["response_action"], "errors");
    assert_eq!(body["errors"][ACTION_SELECT_BLOCK], "Invalid action selected");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.jobs.requests().is_empty());
}

#[tokio::test]
async fn valid_selection_swaps_in_action_form() {
    let h = harness();
    let (status, body) = send(
        &h.router,
        view_submission(SELECTION_CALLBACK_ID, "", Some("deploy")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["response_action"], "update");
    assert_eq!(body["view"]["callback_id"], SUBMISSION_CALLBACK_ID);
    assert_eq!(body["view"]["private_metadata"], "deploy");
    assert_eq!(body["view"]["title"]["text"], "Run deploy");
}

#[tokio::test]
async fn final_submission_triggers_exactly_one_job() {
    let h = harness();
    let (status, body) = send(
        &h.router,
        view_submission(SUBMISSION_CALLBACK_ID, "deploy", None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    eventually(|| h.slack.posts().len() == 2).await;

    let requests = h.jobs.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].action, "deploy");
    assert_eq!(requests[0].user_id, "U1");
    assert_eq!(requests[0].user_name, "Ada Lovelace");
    assert_eq!(requests[0].payload["type"], "view_submission");

    let posts = h.slack.posts();
    assert!(posts.iter().all(|p| p.channel == "U1"));
    assert!(posts[1].text.contains("senora-deploy:7"));
}

#[tokio::test]
async fn job_failure_sends_one_failure_notice() {
    let h = harness_with(FakeSlack::default(), FakeJobs::new(true), false);
    let (status, _) = send(
        &h.router,
        view_submission(SUBMISSION_CALLBACK_ID, "deploy", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    eventually(|| h.slack.posts().len() == 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let posts = h.slack.posts();
    assert_eq!(posts.len(), 2);
    assert_eq!(h.jobs.requests().len(), 1);
    assert!(posts[1].text.contains("Failed to execute action *deploy*"));
    assert!(!posts[1].text.contains("connection refused"));
    assert!(!posts.iter().any(|p| p.text.contains("Build ID")));
}

#[tokio::test]
async fn stale_token_fails_without_job() {
    let h = harness();
    let (status, body) = send(
        &h.router,
        view_submission(SUBMISSION_CALLBACK_ID, "retired-action", None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["response_action"], "update");
    assert!(body["view"].get("submit").is_none());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.jobs.requests().is_empty());
    assert!(h.slack.posts().is_empty());
}

#[tokio::test]
async fn url_verification_echoes_challenge() {
    let h = harness();
    let (status, body) = send(
        &h.router,
        post_json(
            "/slack/events",
            serde_json::json!({"type": "url_verification", "token": "x", "challenge": "c-123"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["challenge"], "c-123");
}

#[tokio::test]
async fn mention_gets_thread_reply() {
    let h = harness();
    let (status, _) = send(
        &h.router,
        post_json(
            "/slack/events",
            serde_json::json!({
                "type": "event_callback",
                "event": {"type": "app_mention", "user": "U5", "text": "<@B1>", "channel": "C9", "ts": "3.3"}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    eventually(|| h.slack.posts().len() == 1).await;
    let post = h.slack.posts().remove(0);
    assert_eq!(post.channel, "C9");
    assert_eq!(post.thread_ts.as_deref(), Some("3.3"));
    assert!(post.text.contains("<@U5>"));
}

#[tokio::test]
async fn signed_requests_are_required_when_enabled() {
    let h = harness_with(FakeSlack::default(), FakeJobs::new(false), true);

    let (status, _) = send(&h.router, slash_command("/senora")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let body = "command=%2Fsenora&user_id=U1&trigger_id=t-9";
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        .to_string();

    let forged = Request::builder()
        .method("POST")
        .uri("/slack/commands")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(TIMESTAMP_HEADER, &timestamp)
        .header(
            SIGNATURE_HEADER,
            compute_signature("wrong-secret", &timestamp, body.as_bytes()).unwrap(),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&h.router, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let signed = Request::builder()
        .method("POST")
        .uri("/slack/commands")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(TIMESTAMP_HEADER, &timestamp)
        .header(
            SIGNATURE_HEADER,
            compute_signature(SIGNING_SECRET, &timestamp, body.as_bytes()).unwrap(),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&h.router, signed).await;
    assert_eq!(status, StatusCode::OK);

    eventually(|| h.slack.opened().len() == 1).await;
    assert_eq!(h.slack.opened()[0].0, "t-9");
}

#[tokio::test]
async fn notify_is_not_behind_slack_signatures() {
    let h = harness_with(FakeSlack::default(), FakeJobs::new(false), true);
    let (status, _) = send(
        &h.router,
        post_json("/notify", serde_json::json!({"user_id": "U1", "message": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn final_submission_starts_job_when_slack_is_unavailable() {
    let cell = SlackClientCell::new(Arc::new(UnreachableSecrets), ClientOptions::default());
    let h = build_harness(
        unsigned_config(),
        FakeSlack::default(),
        FakeJobs::new(false),
        Some(cell),
    );

    let (status, body) = send(
        &h.router,
        view_submission(SUBMISSION_CALLBACK_ID, "deploy", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    eventually(|| h.jobs.requests().len() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let requests = h.jobs.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].action, "deploy");
    assert_eq!(requests[0].user_id, "U1");
    assert!(h.slack.posts().is_empty());
}

#[tokio::test]
async fn unreadable_event_is_acknowledged() {
    let h = harness();
    let (status, body) = send(
        &h.router,
        post_json(
            "/slack/events",
            serde_json::json!({
                "type": "event_callback",
                "event": {"type": "message", "subtype": "message_deleted", "ts": "1.0"}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.slack.posts().is_empty());
}

#[tokio::test]
async fn metrics_count_dialog_and_notifications() {
    let h = harness();

    send(&h.router, slash_command("/senora")).await;
    eventually(|| h.slack.opened().len() == 1).await;
    send(
        &h.router,
        view_submission(SELECTION_CALLBACK_ID, "", Some("deploy")),
    )
    .await;
    send(
        &h.router,
        view_submission(SUBMISSION_CALLBACK_ID, "deploy", None),
    )
    .await;
    eventually(|| h.slack.posts().len() == 2).await;
    send(
        &h.router,
        post_json(
            "/notify",
            serde_json::json!({"notification_type": "in-thread", "channel": "C1", "thread_ts": "1.5", "message": "done"}),
        ),
    )
    .await;
    assert!(h.state.drain_tasks(Duration::from_secs(1)).await);

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::OK);

    let counters = &json_body(&body)["counters"];
    for name in [
        metrics::SLASH_COMMAND_RECEIVED,
        metrics::MODAL_OPENED,
        metrics::INITIAL_MODAL_SUBMITTED,
        metrics::ACTION_FORM_DISPLAYED,
        metrics::FINAL_MODAL_SUBMITTED,
        metrics::ACTION_EXECUTED,
        metrics::THREAD_REPLY_SENT,
    ] {
        assert_eq!(counters[name], 1, "{name}");
    }
    assert!(counters.get(metrics::ACTION_EXECUTION_ERROR).is_none());
}

#[tokio::test]
async fn metrics_route_can_be_disabled() {
    let mut config = unsigned_config();
    config.metrics_enabled = false;
    let h = build_harness(config, FakeSlack::default(), FakeJobs::new(false), None);

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shutdown_waits_for_background_work() {
    let h = harness();

    let finished = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&finished);
    h.state.spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        *flag.lock().unwrap() = true;
    });

    assert!(h.state.drain_tasks(Duration::from_secs(5)).await);
    assert!(*finished.lock().unwrap());
}

#[tokio::test]
async fn shutdown_gives_up_after_timeout() {
    let h = harness();
    h.state.spawn(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    assert!(!h.state.drain_tasks(Duration::from_millis(20)).await);
}
