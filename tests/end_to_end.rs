//! Whole-framework tests: container, controllers, and pipeline together.

use std::sync::Arc;

use async_trait::async_trait;
use hyper::{Method, StatusCode};
use nacelle::prelude::*;
use regex::Regex;
use rstest::rstest;
use serde_json::{json, Value};

struct UserRepository {
	users: Vec<(&'static str, &'static str)>,
}

impl UserRepository {
	fn find(&self, id: &str) -> Option<Value> {
		self.users
			.iter()
			.find(|(user_id, _)| *user_id == id)
			.map(|(id, name)| json!({ "id": id, "name": name }))
	}
}

struct UsersController {
	repository: Arc<UserRepository>,
}

struct RequireApiKey;

#[async_trait]
impl Guard for RequireApiKey {
	async fn can_activate(&self, context: &ExecutionContext) -> PipelineResult<bool> {
		Ok(context.request().header("x-api-key") == Some("secret"))
	}
}

struct Envelope;

#[async_trait]
impl Interceptor for Envelope {
	async fn intercept(
		&self,
		context: &ExecutionContext,
		next: Arc<dyn CallHandler>,
	) -> PipelineResult<Value> {
		let data = next.handle().await?;
		Ok(json!({ "data": data, "handler": context.handler() }))
	}
}

async fn build_app() -> Router {
	let container = Container::new();
	container.register_value(UserRepository {
		users: vec![("42", "ada"), ("7", "grace")],
	});
	container.register_class(ClassDescriptor::new::<UsersController, _>(
		Scope::Singleton,
		vec![DependencyRequest::required(Token::of::<UserRepository>())],
		|deps| Ok(UsersController { repository: deps.get::<UserRepository>(0)? }),
	));
	container.register_class(ClassDescriptor::new::<RequireApiKey, _>(Scope::Singleton, vec![], |_| {
		Ok(RequireApiKey)
	}));
	container.register_class(ClassDescriptor::new::<Envelope, _>(Scope::Singleton, vec![], |_| Ok(Envelope)));

	let router = Router::new(Arc::new(container));
	router
		.register(
			ControllerDescriptor::new::<UsersController>("/users")
				.route(
					RouteDescriptor::get(
						"find",
						"/:id",
						RouteDescriptor::handler_for::<UsersController, _, _>(|controller, args| async move {
							let id = args[0].as_str().unwrap_or_default().to_string();
							controller
								.repository
								.find(&id)
								.ok_or_else(|| PipelineError::Handler(format!("no user `{id}`")))
						}),
					)
					.param(ParamSpec::new(ParamSource::ParamValue("id".into()))),
				)
				.route(
					RouteDescriptor::post(
						"create",
						"",
						RouteDescriptor::handler_for::<UsersController, _, _>(|_, args| async move {
							Ok(json!({ "name": args[0].value().cloned() }))
						}),
					)
					.param(ParamSpec::new(ParamSource::BodyField("name".into())).with_schema(SchemaFn::string()))
					.guard::<RequireApiKey>()
					.interceptor::<Envelope>(),
				),
		)
		.await
		.unwrap();
	router
}

fn get(uri: &str) -> Request {
	Request::builder().method(Method::GET).uri(uri).build().unwrap()
}

fn post(uri: &str, body: &str, api_key: Option<&str>) -> Request {
	let mut headers = hyper::HeaderMap::new();
	if let Some(key) = api_key {
		headers.insert("x-api-key", key.parse().unwrap());
	}
	Request::builder()
		.method(Method::POST)
		.uri(uri)
		.headers(headers)
		.body(body.to_string())
		.build()
		.unwrap()
}

#[rstest]
#[case("42", "ada")]
#[case("7", "grace")]
#[tokio::test]
async fn get_user_returns_the_repository_record(#[case] id: &str, #[case] name: &str) {
	let router = build_app().await;

	let response = router.dispatch(get(&format!("/users/{id}"))).await;

	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(
		response.json_body::<Value>().unwrap(),
		json!({ "id": id, "name": name })
	);
}

#[tokio::test]
async fn handler_errors_map_to_internal_server_error() {
	let router = build_app().await;

	let response = router.dispatch(get("/users/999")).await;

	assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	let body = response.json_body::<Value>().unwrap();
	assert!(body["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn create_requires_the_api_key_guard() {
	let router = build_app().await;

	let denied = router.dispatch(post("/users", r#"{"name":"lin"}"#, None)).await;
	assert_eq!(denied.status, StatusCode::FORBIDDEN);

	let allowed = router
		.dispatch(post("/users", r#"{"name":"lin"}"#, Some("secret")))
		.await;
	assert_eq!(allowed.status, StatusCode::CREATED);
	assert_eq!(
		allowed.json_body::<Value>().unwrap(),
		json!({ "data": { "name": "lin" }, "handler": "create" })
	);
}

#[tokio::test]
async fn invalid_body_fields_are_rejected_with_bad_request() {
	let router = build_app().await;

	let response = router
		.dispatch(post("/users", r#"{"name":7}"#, Some("secret")))
		.await;

	assert_eq!(response.status, StatusCode::BAD_REQUEST);
	let body = response.json_body::<Value>().unwrap();
	assert!(body["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn uuid_validated_routes_work_end_to_end() {
	struct FilesController;

	let container = Container::new();
	container.register_class(ClassDescriptor::new::<FilesController, _>(Scope::Singleton, vec![], |_| {
		Ok(FilesController)
	}));
	let router = Router::new(Arc::new(container));
	let uuid = Regex::new("^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap();
	router
		.register(
			ControllerDescriptor::new::<FilesController>("/files").route(
				RouteDescriptor::get(
					"download",
					"/:file",
					RouteDescriptor::handler_for::<FilesController, _, _>(|_, args| async move {
						Ok(json!({ "file": args[0].value().cloned() }))
					}),
				)
				.param(
					ParamSpec::new(ParamSource::ParamValue("file".into()))
						.with_schema(SchemaFn::matching(uuid, "UUID")),
				),
			),
		)
		.await
		.unwrap();

	let ok = router
		.dispatch(get("/files/123e4567-e89b-12d3-a456-426614174000"))
		.await;
	assert_eq!(ok.status, StatusCode::OK);

	let bad = router.dispatch(get("/files/readme.txt")).await;
	assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn router_serves_through_the_handler_trait() {
	let router = Arc::new(build_app().await);

	let response = Handler::handle(router.as_ref(), get("/users/42")).await.unwrap();
	assert_eq!(response.status, StatusCode::OK);
}
