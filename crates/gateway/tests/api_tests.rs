use axum::{
    body::Body,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use frontdesk_config::{AppConfig, DatabaseConfig};
use frontdesk_database::{
    initialize_database, Chat, DirectoryRepository, Role, Ticket, User, UserStatus,
};
use frontdesk_gateway::{create_router, GatewayState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

type TestResult<T = ()> = anyhow::Result<T>;

const WS: &str = "acme-support";

struct TestContext {
    _temp_dir: TempDir,
    state: GatewayState,
    directory: DirectoryRepository,
    owner: User,
    agent: User,
    stranger: User,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let config = AppConfig {
            database: DatabaseConfig {
                url: format!("sqlite://{}", temp_dir.path().join("gateway.db").display()),
                max_connections: 4,
            },
            ..AppConfig::default()
        };
        let pool = initialize_database(&config.database).await?;
        let directory = DirectoryRepository::new(pool.clone());

        directory.create_workspace(WS, "Acme Support").await?;
        let owner = directory
            .create_user("owner@acme.test", "Olivia Owner", UserStatus::Available)
            .await?;
        let agent = directory
            .create_user("agent@acme.test", "Andy Agent", UserStatus::Available)
            .await?;
        let stranger = directory
            .create_user("stranger@elsewhere.test", "Sam Stranger", UserStatus::Available)
            .await?;
        directory.add_member(WS, &owner.id, Role::Owner).await?;
        directory.add_member(WS, &agent.id, Role::Agent).await?;

        let support = directory.create_team(WS, "Support", true).await?;
        directory.add_team_member(&support.team_id, &agent.id).await?;
        directory.create_team(WS, "Nobody", false).await?;

        let state = GatewayState::new(pool, &config);

        Ok(Self {
            _temp_dir: temp_dir,
            state,
            directory,
            owner,
            agent,
            stranger,
        })
    }

    fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    fn token_for(&self, user: &User) -> TestResult<String> {
        Ok(self.state.tokens.issue(&user.id)?)
    }

    async fn seed_chat(&self, tickets: &[&str]) -> TestResult<Chat> {
        let mut chat = Chat::seeded(
            WS,
            "tg-42",
            "telegram",
            Some(self.owner.id.clone()),
            Ticket::open(tickets[0]),
        );
        for ticket_id in &tickets[1..] {
            chat.tickets.push(Ticket::open(*ticket_id));
        }
        self.directory.create_chat(&chat).await?;
        Ok(chat)
    }

    async fn send(&self, method: Method, uri: &str, user: &User, body: Value) -> TestResult<(StatusCode, Value)> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", self.token_for(user)?))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?;
        call(self.router(), request).await
    }

    async fn get(&self, uri: &str, user: &User) -> TestResult<(StatusCode, Value)> {
        let request = Request::builder()
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", self.token_for(user)?))
            .body(Body::empty())?;
        call(self.router(), request).await
    }
}

async fn call(router: Router, request: Request<Body>) -> TestResult<(StatusCode, Value)> {
    let response = router.oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

#[tokio::test]
async fn health_needs_no_token() -> TestResult {
    let ctx = TestContext::new().await?;
    let request = Request::builder().uri("/health").body(Body::empty())?;

    let (status, body) = call(ctx.router(), request).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> TestResult {
    let ctx = TestContext::new().await?;
    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())?;

    let (status, body) = call(ctx.router(), request).await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/messenger/ticket/status"].is_object());
    Ok(())
}

#[tokio::test]
async fn missing_or_bad_token_is_unauthorized() -> TestResult {
    let ctx = TestContext::new().await?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/messenger/ticket/status")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({}).to_string()))?;
    let (status, _) = call(ctx.router(), request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri(format!("/api/messenger/workspaces/{WS}/chats/none"))
        .header(AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())?;
    let (status, body) = call(ctx.router(), request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "401");
    Ok(())
}

#[tokio::test]
async fn reassign_to_user_moves_the_ticket() -> TestResult {
    let ctx = TestContext::new().await?;
    let source = ctx.seed_chat(&["T1", "T2"]).await?;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/messenger/ticket/reassign/user",
            &ctx.owner,
            json!({ "ticket_id": "T1", "workspace_id": WS, "email": "agent@acme.test" }),
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignee_user_id"], ctx.agent.id.as_str());
    assert_eq!(body["source_chat_id"], source.chat_id.as_str());
    assert_eq!(body["source_chat_deleted"], false);
    assert_eq!(body["destination_created"], true);

    let destination = body["destination_chat_id"].as_str().unwrap_or_default().to_string();
    let (status, chat) = ctx
        .get(&format!("/api/messenger/workspaces/{WS}/chats/{destination}"), &ctx.agent)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat["tickets"][0]["ticket_id"], "T1");
    assert_eq!(chat["source_client_id"], "tg-42");
    Ok(())
}

#[tokio::test]
async fn reassign_to_team_picks_a_member() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.seed_chat(&["T1"]).await?;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/messenger/ticket/reassign/team",
            &ctx.owner,
            json!({ "ticket_id": "T1", "workspace_id": WS, "team_name": "Support" }),
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignee_user_id"], ctx.agent.id.as_str());
    assert_eq!(body["source_chat_deleted"], true);
    assert!(body["team_id"].is_string());
    Ok(())
}

#[tokio::test]
async fn inbox_errors_become_http_statuses() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.seed_chat(&["T1"]).await?;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/messenger/ticket/reassign/user",
            &ctx.owner,
            json!({ "ticket_id": "missing", "workspace_id": WS, "email": "agent@acme.test" }),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/messenger/ticket/reassign/user",
            &ctx.stranger,
            json!({ "ticket_id": "T1", "workspace_id": WS, "email": "agent@acme.test" }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/messenger/ticket/reassign/team",
            &ctx.owner,
            json!({ "ticket_id": "T1", "workspace_id": WS, "team_name": "Nobody" }),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/messenger/ticket/status",
            &ctx.owner,
            json!({ "ticket_id": "T1", "workspace_id": WS, "status": "archived" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "400");
    Ok(())
}

#[tokio::test]
async fn status_update_is_persisted() -> TestResult {
    let ctx = TestContext::new().await?;
    let chat = ctx.seed_chat(&["T1"]).await?;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/messenger/ticket/status",
            &ctx.agent,
            json!({ "ticket_id": "T1", "workspace_id": WS, "status": "closed" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["previous"], "open");
    assert_eq!(body["status"], "closed");

    let (_, chat) = ctx
        .get(&format!("/api/messenger/workspaces/{WS}/chats/{}", chat.chat_id), &ctx.agent)
        .await?;
    assert_eq!(chat["tickets"][0]["status"], "closed");
    Ok(())
}

#[tokio::test]
async fn notes_and_tags_round_through_the_chat() -> TestResult {
    let ctx = TestContext::new().await?;
    let chat = ctx.seed_chat(&["T1"]).await?;

    let (status, event) = ctx
        .send(
            Method::POST,
            "/api/messenger/message",
            &ctx.agent,
            json!({
                "workspace_id": WS,
                "chat_id": chat.chat_id,
                "ticket_id": "T1",
                "type": "ticket_note",
                "message": "customer called back"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["type"], "ticket_note");
    assert_eq!(event["ticket_id"], "T1");

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/messenger/message",
            &ctx.agent,
            json!({
                "workspace_id": WS,
                "chat_id": chat.chat_id,
                "source": "chat_note",
                "message": "vip"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, tagged) = ctx
        .send(
            Method::PUT,
            &format!("/api/messenger/chats/{}/tags", chat.chat_id),
            &ctx.agent,
            json!({ "workspace_id": WS, "tags": ["billing", "  ", " urgent "] }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tagged["tags"], json!(["billing", "urgent"]));
    assert_eq!(tagged["notes"][0]["text"], "vip");
    assert_eq!(tagged["tickets"][0]["notes"][0]["text"], "customer called back");
    Ok(())
}

#[tokio::test]
async fn chats_are_not_readable_by_outsiders() -> TestResult {
    let ctx = TestContext::new().await?;
    let chat = ctx.seed_chat(&["T1"]).await?;

    let (status, _) = ctx
        .get(&format!("/api/messenger/workspaces/{WS}/chats/{}", chat.chat_id), &ctx.stranger)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
