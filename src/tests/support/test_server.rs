use std::net::TcpListener;
use std::sync::Mutex;

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpRequest, HttpServer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

/// Shared with handlers through `web::Data<Recorder>`.
#[derive(Default)]
pub struct Recorder {
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Recorder {
    pub fn record(&self, req: &HttpRequest, body: Option<Value>) {
        let authorization = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        self.requests.lock().unwrap().push(RecordedRequest {
            method: req.method().to_string(),
            path: req.path().to_string(),
            authorization,
            body,
        });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// A backend stand-in listening on an ephemeral local port.
pub struct TestBackend {
    base_url: String,
    recorder: web::Data<Recorder>,
    handle: ServerHandle,
}

impl TestBackend {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        let _ = self.handle.stop(false);
    }
}

/// Must be called from within a tokio runtime.
pub fn spawn_backend(routes: fn(&mut web::ServiceConfig)) -> TestBackend {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let port = listener.local_addr().expect("local addr").port();

    let recorder = web::Data::new(Recorder::default());
    let data = recorder.clone();
    let server = HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
        .workers(1)
        .listen(listener)
        .expect("listen on test listener")
        .run();

    let handle = server.handle();
    tokio::spawn(server);

    TestBackend {
        base_url: format!("http://127.0.0.1:{port}/api"),
        recorder,
        handle,
    }
}
