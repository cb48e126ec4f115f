use std::error::Error;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use actix_web::{HttpResponse, Responder, get, post, put, web};
use impersonate_core::error::StorageResult;
use impersonate_core::io::{get_filename, list_files};
use impersonate_core::{Markov, MemoryStorage};
use log::{error, info, warn};
use serde::Deserialize;

use crate::config::ServerConfig;
use crate::session::{Session, State};

/// Greeting text used to seed the first response after `impersonate`
/// when no message was seen yet.
const FALLBACK_SEED: &str = "beans";

/// State shared by every worker.
pub struct AppState {
	pub markov: Markov<MemoryStorage>,
	pub session: Mutex<Session>,
	pub config: ServerConfig,
}

impl AppState {
	pub fn new(markov: Markov<MemoryStorage>, config: ServerConfig) -> Self {
		Self { markov, session: Mutex::new(Session::default()), config }
	}

	fn session(&self) -> Result<MutexGuard<'_, Session>, HttpResponse> {
		self.session
			.lock()
			.map_err(|_| HttpResponse::InternalServerError().body("Session lock failed"))
	}

	/// Trains every `<subject>.dat` corpus of the data folder whose subject
	/// has no model yet, and registers every subject.
	///
	/// Returns how many subjects were trained.
	pub async fn seed_subjects(&self) -> Result<usize, Box<dyn Error>> {
		let data_dir = &self.config.data_dir;
		let files = match list_files(data_dir, "dat") {
			Ok(files) => files,
			Err(e) => {
				warn!("No corpus in {}: {e}", data_dir.display());
				return Ok(0);
			}
		};

		let mut trained = 0;
		for file in &files {
			let subject = get_filename(file)?;
			if self.markov.store().size(&subject).await? == 0 {
				self.markov.train_file(data_dir.join(file), &subject).await?;
				trained += 1;
			}
			self.session.lock().map_err(|_| "Session lock failed")?.ensure_registered(&subject);
		}
		Ok(trained)
	}

	/// Registers every identity holding a model, so users learned before a
	/// restart can be impersonated. Known display names are kept.
	pub async fn restore_users(&self) -> Result<usize, Box<dyn Error>> {
		let identities = self.markov.store().identities().await?;
		let mut session = self.session.lock().map_err(|_| "Session lock failed")?;
		for identity in &identities {
			session.ensure_registered(identity);
		}
		Ok(identities.len())
	}

	/// Writes the storage snapshot into the data folder.
	pub fn save(&self) -> StorageResult<PathBuf> {
		std::fs::create_dir_all(&self.config.data_dir)?;
		let path = self.config.snapshot_path();
		self.markov.store().backend().save(&path)?;
		info!("Snapshot written to {}", path.display());
		Ok(path)
	}

	/// Generates a response, substituting the default response when empty.
	async fn respond(&self, text: &str, identity: &str, limit: usize) -> Result<String, HttpResponse> {
		match self.markov.respond(text, identity, limit).await {
			Ok(message) if message.is_empty() => Ok(self.markov.config().default_response.clone()),
			Ok(message) => Ok(message),
			Err(e) => {
				error!("Response for {identity} failed: {e}");
				Err(HttpResponse::InternalServerError().body(format!("Response failed: {e}")))
			}
		}
	}
}

#[derive(Deserialize)]
struct MessageQuery {
	user: String,
	name: Option<String>,
}

#[derive(Deserialize)]
struct ImpersonateQuery {
	name: Option<String>,
}

#[derive(Deserialize)]
struct TrainQuery {
	identity: String,
}

#[derive(Deserialize)]
struct RespondQuery {
	identity: String,
	text: Option<String>,
	limit: Option<usize>,
}

/// HTTP POST endpoint `/v1/message`
///
/// An ordinary chat message from `user`. Trains the author's model when
/// training is enabled and the message is long enough, then answers in the
/// impersonated user's style when impersonating. Otherwise `204`.
#[post("/v1/message")]
async fn post_message(data: web::Data<AppState>, query: web::Query<MessageQuery>, body: String) -> impl Responder {
	let text = body.trim();
	if text.is_empty() {
		return HttpResponse::BadRequest().body("Empty message");
	}

	let impersonating = {
		let mut session = match data.session() {
			Ok(s) => s,
			Err(e) => return e,
		};
		session.register(&query.user, query.name.as_deref().unwrap_or(&query.user));
		session.record_message(text);
		session.impersonating().map(str::to_owned)
	};

	let mode = data.config.mode;
	if mode.trains() && text.split_whitespace().count() >= data.config.min_words {
		if let Err(e) = data.markov.train(text, &query.user).await {
			error!("Training {} failed: {e}", query.user);
			return HttpResponse::InternalServerError().body(format!("Training failed: {e}"));
		}
	}

	match impersonating {
		Some(identity) if mode.responds() => match data.respond(text, &identity, 0).await {
			Ok(message) => HttpResponse::Ok().body(message),
			Err(e) => e,
		},
		_ => HttpResponse::NoContent().finish(),
	}
}

/// HTTP PUT endpoint `/v1/impersonate`
///
/// Starts impersonating the user best matching `name` and answers with a
/// first response to the last seen message.
#[put("/v1/impersonate")]
async fn put_impersonate(data: web::Data<AppState>, query: web::Query<ImpersonateQuery>) -> impl Responder {
	if !data.config.mode.responds() {
		return HttpResponse::BadRequest().body("Impersonation is disabled in train mode");
	}

	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty name"),
	};

	let (user, seed_text) = {
		let mut session = match data.session() {
			Ok(s) => s,
			Err(e) => return e,
		};
		let Some(user) = session.users_for_fuzzy_name(name).into_iter().next() else {
			return HttpResponse::NotFound().body(format!("I don't know any {name}."));
		};
		session.impersonate(&user.id);
		let seed_text = session.last_message().unwrap_or(FALLBACK_SEED).to_owned();
		(user, seed_text)
	};

	match data.respond(&seed_text, &user.id, 0).await {
		Ok(message) => HttpResponse::Ok().body(format!("impersonating {}\n{}", user.name, message)),
		Err(e) => e,
	}
}

/// HTTP PUT endpoint `/v1/stop`
#[put("/v1/stop")]
async fn put_stop(data: web::Data<AppState>) -> impl Responder {
	let mut session = match data.session() {
		Ok(s) => s,
		Err(e) => return e,
	};

	if !data.config.mode.responds() {
		return HttpResponse::Ok().body("Wat.");
	}

	match session.stop() {
		Some(id) => match session.user_name(&id) {
			Some(name) => HttpResponse::Ok().body(format!("stopped impersonating {name}")),
			None => HttpResponse::Ok().body("stopped"),
		},
		None => HttpResponse::Ok().body("Wat."),
	}
}

/// HTTP PUT endpoint `/v1/train`
///
/// Trains `identity` directly on the request body.
#[put("/v1/train")]
async fn put_train(data: web::Data<AppState>, query: web::Query<TrainQuery>, body: String) -> impl Responder {
	match data.markov.train(&body, &query.identity).await {
		Ok(true) => HttpResponse::Ok().body("Trained"),
		Ok(false) => HttpResponse::Ok().body("Ignored"),
		Err(e) => HttpResponse::InternalServerError().body(format!("Training failed: {e}")),
	}
}

/// HTTP GET endpoint `/v1/respond`
///
/// Generates a response for `identity`. An empty body means nothing was
/// learned; the default response is not substituted here.
#[get("/v1/respond")]
async fn get_respond(data: web::Data<AppState>, query: web::Query<RespondQuery>) -> impl Responder {
	let text = query.text.as_deref().unwrap_or("");
	match data.markov.respond(text, &query.identity, query.limit.unwrap_or(0)).await {
		Ok(message) => HttpResponse::Ok().body(message),
		Err(e) => HttpResponse::InternalServerError().body(format!("Response failed: {e}")),
	}
}

#[get("/v1/status")]
async fn get_status(data: web::Data<AppState>) -> impl Responder {
	let session = match data.session() {
		Ok(s) => s,
		Err(e) => return e,
	};
	let target = match session.state() {
		State::Impersonating(id) => session.user_name(id).unwrap_or(id).to_owned(),
		State::Idle => "none".to_owned(),
	};
	HttpResponse::Ok().body(format!("mode: {}\nimpersonating: {}", data.config.mode.as_str(), target))
}

#[get("/v1/subjects")]
async fn get_subjects(data: web::Data<AppState>) -> impl Responder {
	let subjects: Result<Vec<String>, _> = list_files(&data.config.data_dir, "dat")
		.and_then(|files| files.iter().map(get_filename).collect());
	match subjects {
		Ok(subjects) => HttpResponse::Ok().body(subjects.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list subjects"),
	}
}

#[put("/v1/save")]
async fn put_save(data: web::Data<AppState>) -> impl Responder {
	match data.save() {
		Ok(path) => HttpResponse::Ok().body(format!("Saved to {}", path.display())),
		Err(e) => HttpResponse::InternalServerError().body(format!("Failed to save: {e}")),
	}
}

/// Registers every endpoint.
pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(post_message)
		.service(put_impersonate)
		.service(put_stop)
		.service(put_train)
		.service(get_respond)
		.service(get_status)
		.service(get_subjects)
		.service(put_save);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Mode;
	use actix_web::body::to_bytes;
	use actix_web::http::StatusCode;
	use actix_web::{App, test};
	use impersonate_core::MarkovConfig;
	use std::sync::Arc;

	fn state(mode: Mode) -> web::Data<AppState> {
		state_in(mode, &ServerConfig::default().data_dir, MemoryStorage::new())
	}

	fn state_in(mode: Mode, data_dir: &std::path::Path, backend: MemoryStorage) -> web::Data<AppState> {
		let config = MarkovConfig { default_response: "...".to_owned(), ..MarkovConfig::default() };
		let markov = Markov::new(config, Arc::new(backend)).unwrap();
		let server = ServerConfig { mode, min_words: 2, data_dir: data_dir.to_path_buf(), ..ServerConfig::default() };
		web::Data::new(AppState::new(markov, server))
	}

	fn temp_dir(name: &str) -> PathBuf {
		let dir = std::env::temp_dir().join(format!("impersonate-server-{}-{}", name, std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		dir
	}

	async fn body_of(response: actix_web::dev::ServiceResponse) -> String {
		let bytes = to_bytes(response.into_body()).await.unwrap();
		String::from_utf8(bytes.to_vec()).unwrap()
	}

	macro_rules! app {
		($data:expr) => {
			test::init_service(App::new().app_data($data.clone()).configure(configure)).await
		};
	}

	#[actix_web::test]
	async fn messages_train_their_author() {
		let data = state(Mode::Train);
		let app = app!(data);

		let req = test::TestRequest::post()
			.uri("/v1/message?user=U1&name=Alice")
			.set_payload("hello there friend")
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::NO_CONTENT);

		// below min_words
		let req = test::TestRequest::post().uri("/v1/message?user=U1").set_payload("lonely").to_request();
		test::call_service(&app, req).await;

		let store = data.markov.store();
		assert_eq!(store.count("U1", "hello").await.unwrap(), 1);
		assert_eq!(store.count("U1", "lonely").await.unwrap(), 0);
	}

	#[actix_web::test]
	async fn impersonate_then_stop() {
		let data = state(Mode::TrainRespond);
		let app = app!(data);

		let req = test::TestRequest::post()
			.uri("/v1/message?user=U1&name=Alice")
			.set_payload("cats are great")
			.to_request();
		test::call_service(&app, req).await;

		let req = test::TestRequest::put().uri("/v1/impersonate?name=ali").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);
		assert_eq!(body_of(resp).await, "impersonating Alice\ncats are great");

		let req = test::TestRequest::post()
			.uri("/v1/message?user=U2&name=Bob")
			.set_payload("what about cats")
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);
		assert_eq!(body_of(resp).await, "cats are great");

		let req = test::TestRequest::put().uri("/v1/stop").to_request();
		assert_eq!(body_of(test::call_service(&app, req).await).await, "stopped impersonating Alice");

		let req = test::TestRequest::put().uri("/v1/stop").to_request();
		assert_eq!(body_of(test::call_service(&app, req).await).await, "Wat.");
	}

	#[actix_web::test]
	async fn unknown_user_cannot_be_impersonated() {
		let data = state(Mode::Respond);
		let app = app!(data);

		let req = test::TestRequest::put().uri("/v1/impersonate?name=nobody").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::NOT_FOUND);
		assert_eq!(body_of(resp).await, "I don't know any nobody.");
	}

	#[actix_web::test]
	async fn empty_model_uses_default_response() {
		let data = state(Mode::Respond);
		data.session.lock().unwrap().register("U9", "Silent");
		let app = app!(data);

		let req = test::TestRequest::put().uri("/v1/impersonate?name=silent").to_request();
		assert_eq!(body_of(test::call_service(&app, req).await).await, "impersonating Silent\n...");

		// respond mode never trains
		let req = test::TestRequest::post().uri("/v1/message?user=U9").set_payload("some words here").to_request();
		assert_eq!(body_of(test::call_service(&app, req).await).await, "...");
		assert_eq!(data.markov.store().size("U9").await.unwrap(), 0);
	}

	#[actix_web::test]
	async fn train_mode_refuses_impersonation() {
		let data = state(Mode::Train);
		let app = app!(data);

		let req = test::TestRequest::put().uri("/v1/impersonate?name=x").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put().uri("/v1/stop").to_request();
		assert_eq!(body_of(test::call_service(&app, req).await).await, "Wat.");
	}

	#[actix_web::test]
	async fn direct_train_and_respond() {
		let data = state(Mode::Train);
		let app = app!(data);

		let req = test::TestRequest::put().uri("/v1/train?identity=s").set_payload("to be or not").to_request();
		assert_eq!(body_of(test::call_service(&app, req).await).await, "Trained");

		let req = test::TestRequest::get().uri("/v1/respond?identity=s&text=be&limit=10").to_request();
		assert_eq!(body_of(test::call_service(&app, req).await).await, "to be or not");

		let req = test::TestRequest::get().uri("/v1/respond?identity=none").to_request();
		assert_eq!(body_of(test::call_service(&app, req).await).await, "");

		let req = test::TestRequest::get().uri("/v1/status").to_request();
		assert_eq!(body_of(test::call_service(&app, req).await).await, "mode: train\nimpersonating: none");
	}

	#[actix_web::test]
	async fn subjects_are_named_like_identities() {
		let dir = temp_dir("subjects");
		std::fs::write(dir.join("my.data.dat"), "x").unwrap();
		std::fs::write(dir.join("einstein.dat"), "x").unwrap();
		std::fs::write(dir.join("notes.txt"), "x").unwrap();
		let data = state_in(Mode::Train, &dir, MemoryStorage::new());
		let app = app!(data);

		let req = test::TestRequest::get().uri("/v1/subjects").to_request();
		let body = body_of(test::call_service(&app, req).await).await;
		std::fs::remove_dir_all(&dir).unwrap();

		assert_eq!(body, "einstein\nmy.data");
	}

	#[actix_web::test]
	async fn new_subjects_are_trained_after_a_restart() {
		let dir = temp_dir("seed");
		std::fs::write(dir.join("a.dat"), "alpha beta\n").unwrap();

		let first = state_in(Mode::Respond, &dir, MemoryStorage::new());
		assert_eq!(first.seed_subjects().await.unwrap(), 1);
		let snapshot = first.save().unwrap();

		std::fs::write(dir.join("b.dat"), "beta gamma delta\n").unwrap();
		let restarted = state_in(Mode::Respond, &dir, MemoryStorage::load(&snapshot).unwrap());
		assert_eq!(restarted.seed_subjects().await.unwrap(), 1);
		// already modelled subjects are not trained twice
		assert_eq!(restarted.markov.store().count("a", "alpha").await.unwrap(), 1);

		let app = app!(restarted);
		let req = test::TestRequest::put().uri("/v1/impersonate?name=b").to_request();
		let body = body_of(test::call_service(&app, req).await).await;
		std::fs::remove_dir_all(&dir).unwrap();

		assert_eq!(body, "impersonating b\nbeta gamma delta");
	}

	#[actix_web::test]
	async fn chat_users_survive_a_restart() {
		let dir = temp_dir("restore");
		let first = state_in(Mode::TrainRespond, &dir, MemoryStorage::new());
		{
			let app = app!(first);
			let req = test::TestRequest::post()
				.uri("/v1/message?user=U1&name=Alice")
				.set_payload("cats are great")
				.to_request();
			test::call_service(&app, req).await;
		}
		let snapshot = first.save().unwrap();

		let restarted = state_in(Mode::TrainRespond, &dir, MemoryStorage::load(&snapshot).unwrap());
		assert_eq!(restarted.restore_users().await.unwrap(), 1);
		let app = app!(restarted);
		let req = test::TestRequest::put().uri("/v1/impersonate?name=u1").to_request();
		let body = body_of(test::call_service(&app, req).await).await;
		std::fs::remove_dir_all(&dir).unwrap();

		// display names are not persisted, the id stands in until the user speaks
		assert_eq!(body, "impersonating U1\ncats are great");
	}
}
