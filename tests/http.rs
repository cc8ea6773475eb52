use std::sync::Arc;
use std::sync::Once;

use bytes::Bytes;
use once_cell::sync::OnceCell;
use serde_json::Value;
use slog::{self, o, Logger};
use warp::filters::BoxedFilter;
use warp::http::{Response, StatusCode};
use warp::test::RequestBuilder;
use warp::{Filter, Reply};

use otr_catalog::catalog::{Account, Profile};
use otr_catalog::db::mock::MockDb;
use otr_catalog::environment::{Config, Environment, SafeRenderer};
use otr_catalog::errors::CatalogError;
use otr_catalog::identity::mock::{MockGrant, MockProvider};
use otr_catalog::render::{HtmlRenderer, Page, Renderer};
use otr_catalog::routes;
use otr_catalog::session::{Session, SessionKeys, COOKIE_NAME};

static SLOG_SCOPE_GUARD: OnceCell<slog_scope::GlobalLoggerGuard> = OnceCell::new();

const CLIENT_ID: &str = "catalog.apps.example.com";

#[tokio::test]
async fn cataloging_works() {
    let catalog = make_catalog("cataloging_works");
    let mut visitor = catalog.visitor();
    visitor.sign_in("molly").await;

    let response = visitor.post_form("/genre/add", &[("name", " Comedy ")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let genre_path = location(&response);
    assert_eq!(visitor.session().flashes, vec!["Genre \"Comedy\" created."]);
    let genre_id = last_number(&genre_path);

    let response = visitor
        .post_form(
            &format!("/genre/{}/program/add", genre_id),
            &[
                ("name", "Fibber McGee and Molly"),
                ("yearBegan", "1935"),
                ("yearEnded", "1959"),
                ("description", ""),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let program_path = location(&response);
    assert!(program_path.starts_with(&format!("/genre/{}/program/", genre_id)));
    assert!(program_path.ends_with("/show"));

    let response = visitor.get(&program_path).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(&response).contains("Program &quot;Fibber McGee and Molly&quot; created."));

    let programs = visitor
        .get_json(&format!("/genre/{}/programs/JSON", genre_id))
        .await;
    let programs = programs["Programs"].as_array().expect("get Programs array");
    assert_eq!(programs.len(), 1);
    assert_eq!(programs[0]["name"], "Fibber McGee and Molly");
    assert_eq!(programs[0]["yearBegan"], 1935);
    assert_eq!(programs[0]["yearEnded"], 1959);
    assert_eq!(programs[0]["genre_id"], genre_id);
    assert_eq!(programs[0]["description"], Value::Null);
    let program_id = programs[0]["id"].as_i64().expect("get program ID");

    let program = visitor
        .get_json(&format!("/genre/{}/program/{}/JSON", genre_id, program_id))
        .await;
    assert_eq!(program["id"], program_id);

    let response = visitor
        .post_form(
            &format!("/genre/{}/program/{}/delete", genre_id, program_id),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), genre_path);

    let response = visitor
        .post_form(&format!("/genre/{}/delete", genre_id), &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(visitor.session().flashes, vec![
        "Program \"Fibber McGee and Molly\" deleted.",
        "Genre \"Comedy\" deleted.",
    ]);

    let genres = visitor.get_json("/genres/JSON").await;
    assert_eq!(genres, serde_json::json!({ "Genres": [] }));
}

#[tokio::test]
async fn duplicate_genres_are_rejected() {
    let catalog = make_catalog("duplicate_genres_are_rejected");
    let mut visitor = catalog.visitor();
    visitor.sign_in("molly").await;

    visitor.post_form("/genre/add", &[("name", "Drama")]).await;
    visitor.session_mut(|s| s.flashes.clear());

    let response = visitor.post_form("/genre/add", &[("name", "Drama")]).await;

    assert_eq!(location(&response), "/genre/add");
    assert_eq!(
        visitor.session().flashes,
        vec!["The genre you attempted to add already exists."]
    );

    let genres = visitor.get_json("/genres/JSON").await;
    assert_eq!(genres["Genres"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn unread_flashes_do_not_pile_up() {
    let catalog = make_catalog("unread_flashes_do_not_pile_up");
    let mut visitor = catalog.visitor();
    visitor.sign_in("molly").await;
    visitor.create_genre("Drama").await;

    for _ in 0..12 {
        visitor.post_form("/genre/add", &[("name", "Drama")]).await;
    }

    let session = visitor.session();
    assert_eq!(session.flashes.len(), 5);
    assert!(session
        .flashes
        .iter()
        .all(|m| m == "The genre you attempted to add already exists."));
    assert!(session.is_signed_in());
}

#[tokio::test]
async fn genre_names_are_bounded() {
    let catalog = make_catalog("genre_names_are_bounded");
    let mut visitor = catalog.visitor();
    visitor.sign_in("molly").await;

    let long_name = "x".repeat(101);

    for (name, message) in &[
        ("   ", "Genre name missing."),
        (
            long_name.as_str(),
            "Genre name must be between 1 and 100 characters in length.",
        ),
    ] {
        visitor.session_mut(|s| s.flashes.clear());

        let response = visitor.post_form("/genre/add", &[("name", *name)]).await;

        assert_eq!(location(&response), "/genre/add");
        assert_eq!(visitor.session().flashes, vec![message.to_owned()]);
    }

    let genres = visitor.get_json("/genres/JSON").await;
    assert_eq!(genres["Genres"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn program_years_are_checked() {
    let catalog = make_catalog("program_years_are_checked");
    let mut visitor = catalog.visitor();
    visitor.sign_in("molly").await;
    let genre_id = visitor.create_genre("Adventure").await;
    let add_path = format!("/genre/{}/program/add", genre_id);

    for (began, ended, message) in &[
        ("1919", "1930", "yearBegan must be an integer year between 1920 and 1980."),
        ("1930", "1981", "yearEnded must be an integer year between 1920 and 1980."),
        ("1950", "1949", "yearEnded must be greater than or equal to yearBegan."),
        ("", "1949", "yearBegan missing."),
    ] {
        visitor.session_mut(|s| s.flashes.clear());

        let response = visitor
            .post_form(
                &add_path,
                &[("name", "Challenge of the Yukon"), ("yearBegan", *began), ("yearEnded", *ended)],
            )
            .await;

        assert_eq!(location(&response), add_path);
        assert_eq!(visitor.session().flashes, vec![message.to_owned()]);
    }

    let programs = visitor
        .get_json(&format!("/genre/{}/programs/JSON", genre_id))
        .await;
    assert_eq!(programs["Programs"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn genres_with_programs_are_not_deleted() {
    let catalog = make_catalog("genres_with_programs_are_not_deleted");
    let mut visitor = catalog.visitor();
    visitor.sign_in("molly").await;
    let genre_id = visitor.create_genre("Western").await;
    visitor.create_program(genre_id, "Gunsmoke").await;
    visitor.session_mut(|s| s.flashes.clear());

    let delete_path = format!("/genre/{}/delete", genre_id);

    let response = visitor.get(&delete_path).await;
    assert_eq!(location(&response), format!("/genre/{}", genre_id));

    let response = visitor.post_form(&delete_path, &[]).await;
    assert_eq!(location(&response), format!("/genre/{}", genre_id));
    assert_eq!(
        visitor.session().flashes,
        vec![
            "You may not delete a genre which contains programs.",
            "You may not delete a genre which contains programs.",
        ]
    );

    let programs = visitor
        .get_json(&format!("/genre/{}/programs/JSON", genre_id))
        .await;
    assert_eq!(programs["Programs"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn program_names_are_unique_within_genre() {
    let catalog = make_catalog("program_names_are_unique_within_genre");
    let mut visitor = catalog.visitor();
    visitor.sign_in("molly").await;

    let comedy = visitor.create_genre("Comedy").await;
    let drama = visitor.create_genre("Drama").await;
    visitor.create_program(comedy, "Vic and Sade").await;
    let aces = visitor.create_program(comedy, "Easy Aces").await;
    visitor.create_program(drama, "Lux Radio Theatre").await;

    let response = visitor
        .post_form(
            &format!("/genre/{}/program/add", comedy),
            &[("name", "Vic and Sade"), ("yearBegan", "1932"), ("yearEnded", "1946")],
        )
        .await;
    assert_eq!(location(&response), format!("/genre/{}/program/add", comedy));
    assert_eq!(
        visitor.session().flashes.last().map(String::as_str),
        Some("The program you are attempting to add already exists.")
    );

    let edit_path = format!("/genre/{}/program/{}/edit", comedy, aces);

    let response = visitor
        .post_form(
            &edit_path,
            &[("name", "Vic and Sade"), ("yearBegan", "1932"), ("yearEnded", "1946")],
        )
        .await;
    assert_eq!(location(&response), edit_path);
    assert_eq!(
        visitor.session().flashes.last().map(String::as_str),
        Some("The program name you have entered already exists.")
    );

    // the same name in another genre is fine
    let response = visitor
        .post_form(
            &edit_path,
            &[("name", "Lux Radio Theatre"), ("yearBegan", "1932"), ("yearEnded", "1946")],
        )
        .await;
    assert_eq!(
        location(&response),
        format!("/genre/{}/program/{}/show", comedy, aces)
    );

    let program = visitor
        .get_json(&format!("/genre/{}/program/{}/JSON", comedy, aces))
        .await;
    assert_eq!(program["name"], "Lux Radio Theatre");
}

#[tokio::test]
async fn only_owners_may_change_records() {
    let catalog = make_catalog("only_owners_may_change_records");

    let mut owner = catalog.visitor();
    owner.sign_in("molly").await;
    let genre_id = owner.create_genre("Crime").await;
    let program_id = owner.create_program(genre_id, "Dragnet").await;

    let mut stranger = catalog.visitor();
    stranger.sign_in("fibber").await;

    let response = stranger
        .post_form(&format!("/genre/{}/edit", genre_id), &[("name", "Mayhem")])
        .await;
    assert_eq!(location(&response), format!("/genre/{}", genre_id));

    let response = stranger
        .post_form(&format!("/genre/{}/delete", genre_id), &[])
        .await;
    assert_eq!(location(&response), format!("/genre/{}", genre_id));

    let program_path = format!("/genre/{}/program/{}/show", genre_id, program_id);

    let response = stranger
        .post_form(
            &format!("/genre/{}/program/{}/edit", genre_id, program_id),
            &[("name", "Dragnet 2"), ("yearBegan", "1949"), ("yearEnded", "1957")],
        )
        .await;
    assert_eq!(location(&response), program_path);

    let response = stranger
        .get(&format!("/genre/{}/program/{}/delete", genre_id, program_id))
        .await;
    assert_eq!(location(&response), program_path);

    assert_eq!(
        stranger.session().flashes,
        vec![
            "You may not edit a genre which you did not create.",
            "You may not delete a genre which you did not create.",
            "You may not edit a program which you did not create.",
            "You may not delete a program which you did not create.",
        ]
    );

    let genres = stranger.get_json("/genres/JSON").await;
    assert_eq!(genres["Genres"][0]["name"], "Crime");

    let response = owner
        .post_form(&format!("/genre/{}/edit", genre_id), &[("name", "Police")])
        .await;
    assert_eq!(location(&response), "/");
    assert_eq!(
        owner.session().flashes.last().map(String::as_str),
        Some("Genre \"Police\" updated.")
    );
}

#[tokio::test]
async fn anonymous_visitors_are_sent_to_login() {
    let catalog = make_catalog("anonymous_visitors_are_sent_to_login");
    let mut visitor = catalog.visitor();

    let response = visitor.get("/genre/add").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert_eq!(visitor.session().target_path.as_deref(), Some("/genre/add"));

    let response = visitor.post_form("/genre/add", &[("name", "Comedy")]).await;
    assert_eq!(location(&response), "/login");

    let reply = visitor.sign_in("molly").await;
    assert_eq!(reply["dest"], "/genre/add");
    assert!(reply["msg"].as_str().unwrap_or_default().contains("Welcome, Molly McGee!"));

    let genres = visitor.get_json("/genres/JSON").await;
    assert_eq!(genres["Genres"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn login_targets_stay_on_site() {
    let catalog = make_catalog("login_targets_stay_on_site");
    let mut visitor = catalog.visitor();

    for target in &["/%09/evil.example", "/%0A/evil.example", "//evil.example"] {
        let response = visitor.get(&format!("/login?target_path={}", target)).await;
        assert_eq!(response.status(), StatusCode::OK, "login with {}", target);
        assert_eq!(visitor.session().target_path, None, "login with {}", target);
    }

    visitor.get("/login?target_path=/genre/add").await;
    assert_eq!(visitor.session().target_path.as_deref(), Some("/genre/add"));

    let reply = visitor.sign_in("molly").await;
    assert_eq!(reply["dest"], "/genre/add");
}

#[tokio::test]
async fn forged_state_is_rejected() {
    let catalog = make_catalog("forged_state_is_rejected");
    let mut visitor = catalog.visitor();

    visitor.get("/login").await;

    let response = visitor
        .send(
            warp::test::request()
                .method("POST")
                .path("/gconnect?state=FORGED")
                .header("x-requested-with", "XMLHttpRequest")
                .body("code-molly"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(&response), Value::from("Invalid state parameter."));
    assert_eq!(visitor.session().account_id, None);
    assert!(catalog.db.accounts().is_empty());

    let state = visitor.session().state.expect("get state from session");
    let response = visitor
        .send(
            warp::test::request()
                .method("POST")
                .path(&format!("/gconnect?state={}", state))
                .body("code-molly"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(catalog.db.accounts().is_empty());
}

#[tokio::test]
async fn reconnecting_is_idempotent() {
    let catalog = make_catalog("reconnecting_is_idempotent");
    let mut visitor = catalog.visitor();

    visitor.sign_in("molly").await;

    let state = visitor.session().state.expect("get state from session");
    let response = visitor
        .send(
            warp::test::request()
                .method("POST")
                .path(&format!("/gconnect?state={}", state))
                .header("x-requested-with", "XMLHttpRequest")
                .body("code-molly"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(&response),
        Value::from("Current user is already connected.")
    );
    assert_eq!(catalog.db.accounts().len(), 1);
}

#[tokio::test]
async fn logging_out_works() {
    let catalog = make_catalog("logging_out_works");
    let mut visitor = catalog.visitor();

    let response = visitor.get("/gdisconnect").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(&response), Value::from("Current user not connected."));

    let response = visitor.get("/disconnect").await;
    assert_eq!(location(&response), "/");
    assert_eq!(
        visitor.session().flashes,
        vec!["You were not logged in."]
    );

    visitor.sign_in("molly").await;
    visitor.session_mut(|s| s.flashes.clear());

    let response = visitor.get("/disconnect").await;
    assert_eq!(location(&response), "/");

    let session = visitor.session();
    assert_eq!(session.account_id, None);
    assert_eq!(session.access_token, None);
    assert_eq!(session.flashes, vec!["You have been successfully logged out."]);
    assert_eq!(catalog.provider.revoked(), vec!["access-token-molly"]);

    let response = visitor.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(&response).contains("You have been successfully logged out."));
    assert!(visitor.session().flashes.is_empty());
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let catalog = make_catalog("missing_records_are_not_found");
    let mut visitor = catalog.visitor();
    visitor.sign_in("molly").await;
    let comedy = visitor.create_genre("Comedy").await;
    let drama = visitor.create_genre("Drama").await;
    let program_id = visitor.create_program(comedy, "Vic and Sade").await;

    for path in &[
        "/genre/999".to_owned(),
        "/genre/999/programs/JSON".to_owned(),
        format!("/genre/{}/program/999/show", comedy),
        format!("/genre/{}/program/{}/show", drama, program_id),
        format!("/genre/{}/program/{}/JSON", drama, program_id),
    ] {
        let response = visitor.get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", path);

        let body = body_json(&response);
        assert!(body["message"].as_str().unwrap_or_default().contains("does not exist"));
    }

    let response = visitor.get("/genre/not-a-number").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn home_page_lists_latest_programs() {
    let catalog = make_catalog("home_page_lists_latest_programs");
    let mut visitor = catalog.visitor();
    visitor.sign_in("molly").await;
    let genre_id = visitor.create_genre("Mystery").await;
    visitor.create_program(genre_id, "Suspense").await;
    visitor.create_program(genre_id, "Inner Sanctum").await;
    visitor.session_mut(|s| s.flashes.clear());

    let response = visitor.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("server-timing"));

    let body = body_text(&response);
    let newer = body.find("Inner Sanctum").expect("find newer program");
    let older = body.find("Suspense").expect("find older program");
    assert!(newer < older);
}

#[tokio::test]
async fn rendering_failures_are_reported() {
    let catalog = make_catalog_with("rendering_failures_are_reported", Arc::new(BrokenRenderer));
    let mut visitor = catalog.visitor();

    let response = visitor.get("/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(&response);
    assert_eq!(body["operation"], "home");
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .starts_with("unable to render page"));
}

/// A renderer whose pages never come out.
struct BrokenRenderer;

impl Renderer for BrokenRenderer {
    fn render(&self, _page: &Page) -> Result<String, CatalogError> {
        Err(CatalogError::Render(std::fmt::Error))
    }

    fn welcome(&self, account: &Account) -> Result<String, CatalogError> {
        Ok(account.username.clone())
    }
}

struct Catalog {
    filter: BoxedFilter<(Box<dyn Reply>,)>,
    db: Arc<MockDb>,
    provider: Arc<MockProvider>,
    keys: Arc<SessionKeys>,
}

impl Catalog {
    fn visitor(&self) -> Visitor<'_> {
        Visitor {
            catalog: self,
            cookie: None,
        }
    }
}

/// A browser: remembers the session cookie between requests.
struct Visitor<'a> {
    catalog: &'a Catalog,
    cookie: Option<String>,
}

impl<'a> Visitor<'a> {
    async fn send(&mut self, request: RequestBuilder) -> Response<Bytes> {
        let request = match &self.cookie {
            Some(cookie) => request.header("cookie", format!("{}={}", COOKIE_NAME, cookie)),
            None => request,
        };

        let response = request.reply(&self.catalog.filter).await;

        if let Some(value) = response.headers().get("set-cookie") {
            let value = value.to_str().expect("convert set-cookie header to string");
            let pair = value.split(';').next().expect("get cookie pair");
            let token = pair
                .strip_prefix(&format!("{}=", COOKIE_NAME))
                .expect("get session cookie");
            self.cookie = Some(token.to_owned());
        }

        response
    }

    async fn get(&mut self, path: &str) -> Response<Bytes> {
        self.send(warp::test::request().method("GET").path(path)).await
    }

    async fn get_json(&mut self, path: &str) -> Value {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", path);
        body_json(&response)
    }

    async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> Response<Bytes> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();

        self.send(
            warp::test::request()
                .method("POST")
                .path(path)
                .header("content-type", "application/x-www-form-urlencoded")
                .body(body),
        )
        .await
    }

    fn session(&self) -> Session {
        self.cookie
            .as_ref()
            .and_then(|token| self.catalog.keys.decode(token))
            .unwrap_or_default()
    }

    /// Rewrites the session cookie as if the browser had been sent `change`d
    /// contents.
    fn session_mut(&mut self, change: impl FnOnce(&mut Session)) {
        let mut session = self.session();
        change(&mut session);
        self.cookie = Some(self.catalog.keys.encode(&session).expect("encode session"));
    }

    /// Signs in as the user the mock provider knows by `who`.
    async fn sign_in(&mut self, who: &str) -> Value {
        self.get("/login").await;
        let state = self.session().state.expect("get state from session");

        let response = self
            .send(
                warp::test::request()
                    .method("POST")
                    .path(&format!("/gconnect?state={}", state))
                    .header("x-requested-with", "XMLHttpRequest")
                    .body(format!("code-{}", who)),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK, "sign in as {}", who);

        let session = self.session();
        assert!(session.account_id.is_some());
        assert_eq!(
            session.flashes.last().map(String::as_str),
            Some("Login successful.")
        );
        self.session_mut(|s| s.flashes.clear());

        body_json(&response)
    }

    async fn create_genre(&mut self, name: &str) -> i64 {
        let response = self.post_form("/genre/add", &[("name", name)]).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        last_number(&location(&response))
    }

    async fn create_program(&mut self, genre_id: i64, name: &str) -> i64 {
        let response = self
            .post_form(
                &format!("/genre/{}/program/add", genre_id),
                &[("name", name), ("yearBegan", "1940"), ("yearEnded", "1950")],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let path = location(&response);
        let segments = path.split('/').collect::<Vec<_>>();
        assert_eq!(segments.last(), Some(&"show"));

        segments[segments.len() - 2]
            .parse()
            .expect("parse program ID from location")
    }
}

fn location(response: &Response<Bytes>) -> String {
    response
        .headers()
        .get("location")
        .expect("get location header")
        .to_str()
        .expect("convert location header to string")
        .to_owned()
}

fn last_number(path: &str) -> i64 {
    path.rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
        .expect("parse ID from path")
}

fn body_text(response: &Response<Bytes>) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}

fn body_json(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).expect("parse response as JSON")
}

fn profile(who: &str) -> Profile {
    let name = match who {
        "molly" => "Molly McGee",
        "fibber" => "Fibber McGee",
        other => other,
    };

    Profile {
        name: name.to_owned(),
        picture: Some(format!("https://example.com/{}.png", who)),
        email: format!("{}@example.com", who),
    }
}

fn make_catalog(test_name: &str) -> Catalog {
    make_catalog_with(test_name, Arc::new(HtmlRenderer))
}

fn make_catalog_with(test_name: &str, renderer: Arc<SafeRenderer>) -> Catalog {
    let logger = Arc::new(make_logger(test_name));

    let db = Arc::new(MockDb::new());

    let provider = Arc::new(MockProvider::new(CLIENT_ID));
    for who in &["molly", "fibber"] {
        provider.grant(
            format!("code-{}", who),
            MockGrant::new(*who, profile(who), CLIENT_ID),
        );
    }

    let keys = Arc::new(SessionKeys::new(
        format!("secret for {}", test_name),
        time::Duration::hours(1),
    ));

    let environment = Environment::new(
        logger.clone(),
        db.clone(),
        provider.clone(),
        keys.clone(),
        renderer,
        Config::default(),
    );

    let filter = routes::make_catalog_routes(environment)
        .recover(move |r| routes::format_rejection(logger.clone(), r))
        .map(|reply| Box::new(reply) as Box<dyn Reply>)
        .boxed();

    Catalog {
        filter,
        db,
        provider,
        keys,
    }
}

fn make_logger(test_name: &str) -> Logger {
    read_config();
    initialize_global_logger();

    slog_scope::logger().new(o!("test" => test_name.to_owned()))
}

fn initialize_global_logger() {
    SLOG_SCOPE_GUARD.get_or_init(|| slog_envlogger::init().expect("initialize slog-envlogger"));
}

fn read_config() {
    static INITIALIZED_CONFIG: Once = Once::new();

    INITIALIZED_CONFIG.call_once(|| {
        dotenv::dotenv().ok();
    });
}
