use std::{fmt, net::SocketAddr};

use anyhow::Context;
use chrono::{Duration, Utc};
use cucumber::{gherkin::Step, given, then, when, World as _};
use planner::{
    config::AppConfig,
    db::{init_pool, run_migrations},
    error::AppError,
    models::trip::{parse_timestamp, TripRequest},
    services::mail::{MailLocale, OutboxMailer},
    state::AppState,
};
use tempfile::TempDir;
use url::Url;

#[derive(Debug, cucumber::World, Default)]
struct PlannerWorld {
    state: Option<TestState>,
    last_result: Option<Result<String, String>>,
}

impl PlannerWorld {
    fn test_state(&self) -> &TestState {
        self.state.as_ref().expect("state must be initialised first")
    }

    fn last_trip_id(&self) -> &str {
        match self.last_result.as_ref().expect("a trip request was made") {
            Ok(id) => id,
            Err(err) => panic!("last request failed: {err}"),
        }
    }

    async fn plan(&mut self, request: TripRequest) {
        let result = self
            .test_state()
            .app
            .planner
            .create_trip(request, Utc::now())
            .await
            .map_err(|err: AppError| err.to_string());
        self.last_result = Some(result);
    }
}

struct TestState {
    app: AppState,
    outbox: OutboxMailer,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let db_path = root.path().join("bdd.sqlite");
        let outbox_dir = root.path().join("outbox");

        let config = AppConfig {
            database_url: format!("sqlite://{}", db_path.to_string_lossy()),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            public_base_url: Url::parse("http://localhost:5000")?,
            web_origin: Url::parse("http://localhost:3000")?,
            mail_from_name: "Equipe Plann.er".into(),
            mail_from_address: "oi@planner.org".into(),
            mail_locale: MailLocale::PtBr,
            mail_outbox: Some(outbox_dir.clone()),
        };

        let db = init_pool(&config.database_url).await?;
        run_migrations(&db).await?;

        let outbox = OutboxMailer::new(outbox_dir);
        outbox.ensure_structure().await?;

        let app = AppState::new(config, db);
        Ok(Self {
            app,
            outbox,
            _root: root,
        })
    }
}

fn trip_request(
    owner: String,
    email: String,
    destination: String,
    starts_at: chrono::DateTime<Utc>,
    ends_at: chrono::DateTime<Utc>,
    invites: &str,
) -> TripRequest {
    TripRequest {
        destination,
        starts_at,
        ends_at,
        owner_name: owner,
        owner_email: email,
        emails_to_invite: invites
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

#[given("a fresh planner")]
async fn given_fresh_planner(world: &mut PlannerWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.last_result = None;
}

#[when(
    regex = r#"^"([^"]+)" with email "([^"]+)" plans a trip to "([^"]+)" from "([^"]+)" to "([^"]+)" inviting "([^"]*)"$"#
)]
async fn when_plan_with_dates(
    world: &mut PlannerWorld,
    owner: String,
    email: String,
    destination: String,
    starts: String,
    ends: String,
    invites: String,
) {
    let starts_at = parse_timestamp(&starts).expect("start date");
    let ends_at = parse_timestamp(&ends).expect("end date");
    let request = trip_request(owner, email, destination, starts_at, ends_at, &invites);
    world.plan(request).await;
}

/// Days are relative to today; tomorrow at this time is day 1.
#[when(
    regex = r#"^"([^"]+)" with email "([^"]+)" plans a trip to "([^"]+)" starting on day (-?\d+) and ending on day (-?\d+)$"#
)]
async fn when_plan_relative(
    world: &mut PlannerWorld,
    owner: String,
    email: String,
    destination: String,
    start_day: i64,
    end_day: i64,
) {
    let today = Utc::now();
    let starts_at = today + Duration::days(start_day);
    let ends_at = today + Duration::days(end_day);
    let request = trip_request(owner, email, destination, starts_at, ends_at, "");
    world.plan(request).await;
}

#[when("the owner follows the confirmation link")]
async fn when_confirm(world: &mut PlannerWorld) {
    let id = world.last_trip_id().to_string();
    world
        .test_state()
        .app
        .planner
        .confirm_trip(&id)
        .await
        .expect("confirm trip");
}

#[then("the trip is created")]
async fn then_trip_created(world: &mut PlannerWorld) {
    assert!(!world.last_trip_id().is_empty());
}

#[then("the stored participants are:")]
async fn then_participants(world: &mut PlannerWorld, step: &Step) {
    let table = step.table.as_ref().expect("participants table");
    let trips = world.test_state().app.planner.list_trips().await.expect("list");
    let trip = trips
        .iter()
        .find(|trip| trip.id == world.last_trip_id())
        .expect("created trip is listed");

    let expected: Vec<_> = table.rows.iter().skip(1).collect();
    assert_eq!(trip.participants.len(), expected.len());
    for (participant, row) in trip.participants.iter().zip(expected) {
        assert_eq!(participant.email, row[0]);
        assert_eq!(participant.is_owner.to_string(), row[1]);
        assert_eq!(participant.is_confirmed.to_string(), row[2]);
    }
}

#[then(regex = r#"^(\d+) confirmation mail was sent to "([^"]+)"$"#)]
async fn then_mail_sent(world: &mut PlannerWorld, count: usize, address: String) {
    let messages = world.test_state().outbox.load_messages().await.expect("outbox");
    let matching = messages.iter().filter(|m| m.to.address == address).count();
    assert_eq!(matching, count);
}

#[then(regex = r#"^the confirmation mail mentions "([^"]+)"$"#)]
async fn then_mail_mentions(world: &mut PlannerWorld, text: String) {
    let messages = world.test_state().outbox.load_messages().await.expect("outbox");
    let message = messages.last().expect("a mail was sent");
    assert!(message.html.contains(&text), "mail body: {}", message.html);
    let link = format!("/trips/{}/confirm", world.last_trip_id());
    assert!(message.html.contains(&link));
}

#[then(regex = r#"^the request fails with "([^"]+)"$"#)]
async fn then_request_fails(world: &mut PlannerWorld, message: String) {
    match world.last_result.as_ref().expect("a trip request was made") {
        Err(err) => assert_eq!(err, &message),
        Ok(id) => panic!("expected failure, created trip {id}"),
    }
}

#[then("no trip is stored")]
async fn then_no_trip(world: &mut PlannerWorld) {
    let trips = world.test_state().app.planner.list_trips().await.expect("list");
    assert!(trips.is_empty());
    let messages = world.test_state().outbox.load_messages().await.expect("outbox");
    assert!(messages.is_empty());
}

#[then(regex = r"^(\d+) trips are stored$")]
async fn then_trip_count(world: &mut PlannerWorld, count: usize) {
    let trips = world.test_state().app.planner.list_trips().await.expect("list");
    assert_eq!(trips.len(), count);
}

#[then("the trip is confirmed")]
async fn then_confirmed(world: &mut PlannerWorld) {
    let trips = world.test_state().app.planner.list_trips().await.expect("list");
    let trip = trips
        .iter()
        .find(|trip| trip.id == world.last_trip_id())
        .expect("trip is listed");
    assert!(trip.is_confirmed);
}

#[tokio::main]
async fn main() {
    PlannerWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
