//! Integration tests for the reqwest collection adapter against a fake service.

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use console::domain::controller::{DeleteOutcome, InteractionController, SubmitOutcome, UserAction};
use console::domain::ports::{RecordCollection, RecordCollectionError};
use console::domain::{Field, RecordDraft, RecordId};
use console::outbound::http::HttpRecordCollection;
use pagination::{QueryDescriptor, SortOrder};
use serde_json::{Value, json};
use url::Url;

const STAMP: &str = "2026-01-02T03:04:05Z";

#[derive(Default)]
struct FakeService {
    records: Mutex<Vec<Value>>,
    queries: Mutex<Vec<String>>,
    next_id: Mutex<u32>,
}

impl FakeService {
    fn seed(&self, name: &str, email: &str) -> String {
        let id = self.allocate_id();
        let body = json!({ "fullName": name, "email": email, "password": "secret" });
        self.records
            .lock()
            .expect("records mutex")
            .push(stored(&id, &body));
        id
    }

    fn allocate_id(&self) -> String {
        let mut next = self.next_id.lock().expect("id mutex");
        *next += 1;
        format!("u-{next}")
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("queries mutex").clone()
    }
}

fn stored(id: &str, body: &Value) -> Value {
    json!({
        "id": id,
        "fullName": body["fullName"],
        "email": body["email"],
        "password": body["password"],
        "createdAt": STAMP,
        "updatedAt": STAMP,
        "_links": { "self": { "href": format!("/api/users/{id}") } },
    })
}

fn message(text: &str) -> Value {
    json!({ "message": text })
}

async fn list(service: web::Data<FakeService>, request: HttpRequest) -> HttpResponse {
    service
        .queries
        .lock()
        .expect("queries mutex")
        .push(request.query_string().to_owned());
    let records = service.records.lock().expect("records mutex").clone();
    let total = records.len();
    let page = json!({
        "size": 10,
        "totalElements": total,
        "totalPages": total.div_ceil(10),
        "number": 0,
    });
    if records.is_empty() {
        return HttpResponse::Ok().json(json!({ "page": page }));
    }
    HttpResponse::Ok().json(json!({ "_embedded": { "users": records }, "page": page }))
}

async fn create(service: web::Data<FakeService>, body: web::Json<Value>) -> HttpResponse {
    if body["email"] == "taken@example.com" {
        return HttpResponse::Conflict().json(message("Email already taken"));
    }
    let id = service.allocate_id();
    let record = stored(&id, &body);
    service
        .records
        .lock()
        .expect("records mutex")
        .push(record.clone());
    HttpResponse::Created().json(record)
}

async fn update(
    service: web::Data<FakeService>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    let id = path.into_inner();
    let mut records = service.records.lock().expect("records mutex");
    let Some(slot) = records.iter_mut().find(|record| record["id"] == id.as_str()) else {
        return HttpResponse::NotFound().json(message(&format!("Record {id} not found")));
    };
    *slot = stored(&id, &body);
    HttpResponse::Ok().json(slot.clone())
}

async fn remove(service: web::Data<FakeService>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    if id == "locked" {
        return HttpResponse::InternalServerError().finish();
    }
    service
        .records
        .lock()
        .expect("records mutex")
        .retain(|record| record["id"] != id.as_str());
    HttpResponse::NoContent().finish()
}

async fn slow() -> HttpResponse {
    tokio::time::sleep(Duration::from_secs(2)).await;
    HttpResponse::Ok().json(json!({}))
}

struct FakeServer {
    origin: String,
    service: web::Data<FakeService>,
    handle: ServerHandle,
}

impl FakeServer {
    fn collection(&self) -> HttpRecordCollection {
        self.collection_at("api", Duration::from_secs(5))
    }

    fn collection_at(&self, prefix: &str, timeout: Duration) -> HttpRecordCollection {
        let base_url = Url::parse(&format!("{}/{prefix}", self.origin)).expect("base url");
        HttpRecordCollection::new(base_url, "users", timeout).expect("client")
    }
}

fn start_fake_server() -> FakeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let service = web::Data::new(FakeService::default());
    let app_service = service.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_service.clone())
            .route("/api/users", web::get().to(list))
            .route("/api/users", web::post().to(create))
            .route("/api/users/{id}", web::put().to(update))
            .route("/api/users/{id}", web::delete().to(remove))
            .route("/slow/users", web::get().to(slow))
    })
    .workers(1)
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    FakeServer {
        origin: format!("http://{addr}"),
        service,
        handle,
    }
}

fn first_page() -> QueryDescriptor {
    QueryDescriptor::new(0, 10).expect("valid descriptor")
}

#[actix_rt::test]
async fn reads_send_the_canonical_query() {
    let fake_server = start_fake_server();
    fake_server.service.seed("Ada Lovelace", "ada@example.com");
    let descriptor = QueryDescriptor::new(1, 10)
        .and_then(|d| d.with_filter("fullName", "Ada L"))
        .expect("valid descriptor")
        .with_global_filter(Some("ada"))
        .with_sorts([SortOrder::desc("fullName"), SortOrder::asc("email")]);

    fake_server
        .collection()
        .fetch_page(&descriptor)
        .await
        .expect("page");

    assert_eq!(
        fake_server.service.queries(),
        vec![
            "page=1&size=10&fullName=Ada+L&globalFilter=ada&sort=fullName,desc&sort=email,asc"
                .to_owned()
        ]
    );
    fake_server.handle.stop(true).await;
}

#[actix_rt::test]
async fn reads_decode_hal_pages() {
    let fake_server = start_fake_server();
    let id = fake_server.service.seed("Ada Lovelace", "ada@example.com");
    fake_server.service.seed("Grace Hopper", "grace@navy.mil");

    let page = fake_server
        .collection()
        .fetch_page(&first_page())
        .await
        .expect("page");

    assert_eq!(page.items().len(), 2);
    assert_eq!(page.items()[0].id().as_ref(), id);
    assert_eq!(page.items()[0].email(), "ada@example.com");
    assert_eq!(page.metadata().total_elements, 2);
    fake_server.handle.stop(true).await;
}

#[actix_rt::test]
async fn empty_collections_read_as_empty_pages() {
    let fake_server = start_fake_server();
    let page = fake_server
        .collection()
        .fetch_page(&first_page())
        .await
        .expect("page");

    assert!(page.items().is_empty());
    assert_eq!(page.metadata().total_elements, 0);
    assert!(!page.has_next_page());
    fake_server.handle.stop(true).await;
}

#[actix_rt::test]
async fn create_returns_the_stored_record() {
    let fake_server = start_fake_server();
    let draft = RecordDraft::new("Katherine Johnson", "katherine@nasa.gov", "orbits");

    let record = fake_server.collection().create(&draft).await.expect("create");

    assert_eq!(record.draft(), draft);
    assert_eq!(record.created_at().to_rfc3339(), "2026-01-02T03:04:05+00:00");
    fake_server.handle.stop(true).await;
}

#[actix_rt::test]
async fn rejected_writes_carry_the_server_message() {
    let fake_server = start_fake_server();
    let draft = RecordDraft::new("Impostor", "taken@example.com", "pw");

    let error = fake_server
        .collection()
        .create(&draft)
        .await
        .expect_err("conflict");

    assert!(matches!(
        error,
        RecordCollectionError::Rejected { status: 409, .. }
    ));
    assert_eq!(error.server_message(), Some("Email already taken"));
    fake_server.handle.stop(true).await;
}

#[actix_rt::test]
async fn updating_a_missing_record_is_rejected() {
    let fake_server = start_fake_server();
    let id = RecordId::new("u-404").expect("valid id");
    let draft = RecordDraft::new("Nobody", "nobody@example.com", "pw");

    let error = fake_server
        .collection()
        .update(&id, &draft)
        .await
        .expect_err("missing record");

    assert_eq!(error.server_message(), Some("Record u-404 not found"));
    fake_server.handle.stop(true).await;
}

#[actix_rt::test]
async fn failed_deletes_without_a_body_have_no_server_message() {
    let fake_server = start_fake_server();
    let id = RecordId::new("locked").expect("valid id");

    let error = fake_server
        .collection()
        .delete(&id)
        .await
        .expect_err("server error");

    assert!(matches!(
        error,
        RecordCollectionError::Rejected { status: 500, .. }
    ));
    assert_eq!(error.server_message(), None);
    fake_server.handle.stop(true).await;
}

#[actix_rt::test]
async fn slow_responses_time_out() {
    let fake_server = start_fake_server();
    let collection = fake_server.collection_at("slow", Duration::from_millis(200));

    let error = collection
        .fetch_page(&first_page())
        .await
        .expect_err("timeout");

    assert!(matches!(error, RecordCollectionError::Timeout { .. }));
    fake_server.handle.stop(false).await;
}

#[actix_rt::test]
async fn controller_round_trips_through_the_service() {
    let fake_server = start_fake_server();
    let doomed = fake_server.service.seed("Alan Turing", "alan@example.org");
    let port: Arc<dyn RecordCollection> = Arc::new(fake_server.collection());
    let mut controller = InteractionController::new(port, "users", 10).expect("valid page size");

    controller.dispatch(UserAction::OpenCreate).await;
    for (field, value) in [
        (Field::FullName, "Katherine Johnson"),
        (Field::Email, "katherine@nasa.gov"),
        (Field::Password, "orbits"),
    ] {
        controller
            .dispatch(UserAction::EditField {
                field,
                value: value.to_owned(),
            })
            .await;
    }
    let outcome = controller.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Saved(_)));

    let doomed = RecordId::new(doomed).expect("valid id");
    let deleted = controller.delete(&doomed, &|_: &RecordId| true).await;
    assert_eq!(deleted, DeleteOutcome::Deleted);

    let names: Vec<String> = controller
        .view()
        .data
        .items()
        .iter()
        .map(|record| record.full_name().to_owned())
        .collect();
    assert_eq!(names, vec!["Katherine Johnson".to_owned()]);
    fake_server.handle.stop(true).await;
}
