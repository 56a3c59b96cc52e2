use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ntex::http::StatusCode;
use ntex::util::Bytes;
use ntex::web;
use ntex::web::test::TestServer;
use ntex::web::HttpRequest;

/// One request as seen by the stub.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Answers every request with the canned reply for its method and records what it got.
#[derive(Clone)]
pub struct Stub {
    replies: Arc<HashMap<String, (u16, String)>>,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

impl Stub {
    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }
}

async fn reply(req: HttpRequest, body: Bytes, stub: web::types::State<Stub>) -> web::HttpResponse {
    let headers = req.headers().iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect();

    stub.recorded.lock().unwrap().push(Recorded {
        method: req.method().as_str().to_string(),
        path: req.path().to_string(),
        query: req.uri().query().unwrap_or_default().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    let (status, body) = stub.replies.get(req.method().as_str())
        .cloned()
        .unwrap_or((405, String::new()));
    web::HttpResponse::build(StatusCode::from_u16(status).unwrap())
        .content_type("application/json")
        .body(body)
}

/// Starts a server answering `(method, status, body)` for any path.
pub async fn start(replies: &[(&str, u16, &str)]) -> (TestServer, Stub) {
    let stub = Stub {
        replies: Arc::new(replies.iter()
            .map(|(method, status, body)| (method.to_string(), (*status, body.to_string())))
            .collect()),
        recorded: Arc::new(Mutex::new(Vec::new())),
    };

    let state = stub.clone();
    let srv = web::test::server(move || {
        web::App::new()
            .state(state.clone())
            .default_service(web::route().to(reply))
    });

    (srv, stub)
}
