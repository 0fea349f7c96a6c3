//! Helpers shared by the end-to-end scenarios.

use std::io;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use pilot_core::action::{self, Action};
use pilot_core::decision::DecisionBackend;
use pilot_core::platform::{Pointer, Screen};
use pilot_core::types::{Observation, Point, Rect};

/// Mock model endpoint answering `POST route` with a fixed status and JSON
/// body. Owns the runtime the server is driven from, so the blocking
/// backends can call it from the test thread.
pub struct MockBackend {
    // dropped before the runtime
    server: MockServer,
    route: String,
    rt: Runtime,
}

impl MockBackend {
    pub fn start(route: &str, status: u16, body: impl Into<String>) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .context("cannot build runtime for mock server")?;
        let body = body.into();
        let server = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(status).set_body_raw(body, "application/json"))
                .mount(&server)
                .await;
            server
        });
        Ok(Self { server, route: route.to_string(), rt })
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), self.route)
    }

    /// Every request the server received, matched or not.
    pub fn requests(&self) -> Vec<Request> {
        self.rt.block_on(self.server.received_requests()).unwrap_or_default()
    }

    /// JSON body of the `i`th request.
    pub fn json_body(&self, i: usize) -> Result<serde_json::Value> {
        let req = self.requests().into_iter().nth(i).ok_or_else(|| anyhow::anyhow!("no request {}", i))?;
        Ok(req.body_json()?)
    }
}

/// Ask `backend` once and resolve the reply the way the loop does.
pub fn decide(backend: &dyn DecisionBackend, prompt: &str, obs: &Observation) -> Action {
    action::resolve(backend.generate_action(prompt, obs), obs.width(), obs.height())
}

/// Address nothing listens on.
pub fn dead_url() -> io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}/api/generate", addr))
}

/// `{"response": text}`, the reply shape both HTTP backends expect.
pub fn response_body(text: &str) -> String {
    serde_json::json!({ "response": text }).to_string()
}

/// Screen returning a flat frame of the requested size.
pub struct FlatScreen(pub Rgb<u8>);

impl Screen for FlatScreen {
    fn grab(&mut self, rect: &Rect) -> Result<RgbImage> {
        Ok(RgbImage::from_pixel(rect.width() as u32, rect.height() as u32, self.0))
    }
}

/// Pointer that records where it moved and clicked.
#[derive(Clone, Default)]
pub struct TracePointer {
    pub pos: Arc<Mutex<Point>>,
    pub moves: Arc<Mutex<Vec<Point>>>,
    pub clicks: Arc<Mutex<Vec<(Point, bool)>>>,
}

impl Pointer for TracePointer {
    fn position(&mut self) -> Result<Point> {
        Ok(*self.pos.lock().unwrap())
    }

    fn move_to(&mut self, p: Point) -> Result<()> {
        *self.pos.lock().unwrap() = p;
        self.moves.lock().unwrap().push(p);
        Ok(())
    }

    fn click(&mut self, shift: bool) -> Result<()> {
        let at = *self.pos.lock().unwrap();
        self.clicks.lock().unwrap().push((at, shift));
        Ok(())
    }
}
