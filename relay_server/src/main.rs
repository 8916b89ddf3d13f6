use crate::messages::RelayMessage;
use crate::registry::SubscriptionRegistry;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{web, App, Error, HttpRequest, HttpResponse, HttpServer};
use actix_ws::{self, Message};
use env_logger::Env;
use futures::StreamExt;
use log::{debug, error, info, warn};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::interval;
use uuid::Uuid;

mod config;
mod messages;
mod registry;

use config::CONFIG;

type Registry = Arc<Mutex<SubscriptionRegistry<actix_ws::Session>>>;

struct AppState {
    registry: Registry,
}

fn get_client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

/// Requests without an `Origin` header (server-to-server) are let through.
fn origin_allowed(req: &HttpRequest) -> bool {
    match req.headers().get(header::ORIGIN) {
        Some(origin) => origin
            .to_str()
            .map(|origin| CONFIG.is_origin_allowed(origin))
            .unwrap_or(false),
        None => true,
    }
}

/// Sends a `changed` frame to every subscriber of `resource` except `origin`.
/// Returns how many sessions accepted it.
async fn fan_out(registry: &Registry, resource: &str, origin: Option<&str>) -> usize {
    let targets = registry.lock().await.subscribers(resource, origin);
    if targets.is_empty() {
        debug!("No subscribers for {}", resource);
        return 0;
    }

    let frame = match serde_json::to_string(&RelayMessage::Changed {
        resource: resource.to_string(),
    }) {
        Ok(frame) => frame,
        Err(e) => {
            error!("Failed to encode change for {}: {:?}", resource, e);
            return 0;
        }
    };

    let mut delivered = 0;
    for (client_id, mut session) in targets {
        match session.text(frame.clone()).await {
            Ok(_) => delivered += 1,
            Err(e) => {
                warn!("Dropping client {} after failed send: {:?}", client_id, e);
                registry.lock().await.remove(&client_id);
            }
        }
    }
    debug!("Relayed change of {} to {} client(s)", resource, delivered);
    delivered
}

/// Any frame from a client counts as liveness, both for the socket loop and for
/// the stale-client sweep.
async fn mark_alive<S: Clone>(registry: &Mutex<SubscriptionRegistry<S>>, client_id: &str) -> Instant {
    registry.lock().await.touch(client_id);
    Instant::now()
}

async fn handle_relay_message(msg: RelayMessage, client_id: &str, registry: &Registry) {
    match msg {
        RelayMessage::Subscribe { resource } => {
            if registry.lock().await.subscribe(client_id, &resource) {
                info!("Client {} subscribed to {}", client_id, resource);
            }
        }
        RelayMessage::Unsubscribe { resource } => {
            if registry.lock().await.unsubscribe(client_id, &resource) {
                info!("Client {} unsubscribed from {}", client_id, resource);
            }
        }
        RelayMessage::Changed { resource } => {
            fan_out(registry, &resource, Some(client_id)).await;
        }
    }
}

async fn ws_handler(
    req: HttpRequest,
    body: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let client_ip = get_client_ip(&req);

    if !origin_allowed(&req) {
        error!("Invalid origin from IP: {}", client_ip);
        return Ok(HttpResponse::Forbidden().finish());
    }

    if app_state.registry.lock().await.len() >= CONFIG.max_connections {
        warn!("Connection limit reached, rejecting {}", client_ip);
        return Ok(HttpResponse::ServiceUnavailable().finish());
    }

    let (response, session, mut msg_stream) = actix_ws::handle(&req, body).map_err(|e| {
        error!("Failed to establish WebSocket connection: {:?}", e);
        e
    })?;

    let client_id = Uuid::new_v4().to_string();
    info!("Client {} connected from {}", client_id, client_ip);

    let registry = app_state.registry.clone();
    registry.lock().await.register(&client_id, session.clone());

    actix_web::rt::spawn(async move {
        let mut ws = session;
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = interval(CONFIG.heartbeat_interval.max(Duration::from_secs(1)));

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if Instant::now().duration_since(last_heartbeat) > CONFIG.client_timeout {
                        info!("Client {} heartbeat missed, disconnecting...", client_id);
                        break;
                    }

                    if let Err(e) = ws.ping(b"").await {
                        error!("Failed to send ping: {:?}", e);
                        break;
                    }
                }

                Some(msg) = msg_stream.next() => {
                    match msg {
                        Ok(Message::Text(text)) => {
                            last_heartbeat = mark_alive(&*registry, &client_id).await;
                            match serde_json::from_str::<RelayMessage>(&text) {
                                Ok(msg) => handle_relay_message(msg, &client_id, &registry).await,
                                Err(e) => error!("Failed to parse message: {:?}", e),
                            }
                        }
                        Ok(Message::Ping(bytes)) => {
                            last_heartbeat = mark_alive(&*registry, &client_id).await;
                            if let Err(e) = ws.pong(&bytes).await {
                                error!("Failed to send pong: {:?}", e);
                                break;
                            }
                        }
                        Ok(Message::Pong(_)) => {
                            last_heartbeat = mark_alive(&*registry, &client_id).await;
                        }
                        Ok(Message::Close(reason)) => {
                            info!("Client {} disconnected: {:?}", client_id, reason);
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("Error reading message: {:?}", e);
                            break;
                        }
                    }
                }
            }
        }

        registry.lock().await.remove(&client_id);
        let _ = ws.close(None).await;
        info!("WebSocket connection closed for {}", client_id);
    });

    Ok(response)
}

/// Lets back-ends that write records outside a socket announce the change.
async fn post_change(
    resource: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let resource = resource.into_inner();
    let delivered = fan_out(&app_state.registry, &resource, None).await;
    Ok(HttpResponse::Accepted().json(json!({ "resource": resource, "delivered": delivered })))
}

async fn cleanup_stale_clients(registry: Registry) {
    let mut ticker = interval((CONFIG.client_timeout / 2).max(Duration::from_secs(1)));
    loop {
        ticker.tick().await;

        let stale = {
            let mut registry = registry.lock().await;
            let ids = registry.stale(Instant::now(), CONFIG.client_timeout);
            ids.into_iter()
                .filter_map(|id| registry.remove(&id).map(|session| (id, session)))
                .collect::<Vec<_>>()
        };

        for (client_id, session) in stale.iter().cloned() {
            if let Err(e) = session.close(None).await {
                error!("Failed to close connection for client {}: {:?}", client_id, e);
            }
            debug!("Removed stale client: {}", client_id);
        }

        if !stale.is_empty() {
            info!(
                "Cleaned up {} stale clients, {} remaining",
                stale.len(),
                registry.lock().await.len()
            );
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let app_state = web::Data::new(AppState {
        registry: Arc::new(Mutex::new(SubscriptionRegistry::new())),
    });

    let registry_for_cleanup = app_state.registry.clone();
    tokio::spawn(async move {
        cleanup_stale_clients(registry_for_cleanup).await;
    });

    let bind_addr = format!("0.0.0.0:{}", CONFIG.port);
    info!("Starting relay server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin_fn(|origin, _req_head| {
                origin
                    .to_str()
                    .map(|origin| CONFIG.is_origin_allowed(origin))
                    .unwrap_or(false)
            })
            .allowed_methods(vec!["GET", "POST"])
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::clone(&app_state))
            .route(
                "/",
                web::get().to(|| async {
                    info!("Received request to root endpoint");
                    HttpResponse::Ok().body("Relay is running")
                }),
            )
            .route("/ws", web::get().to(ws_handler))
            .route("/changes/{resource}", web::post().to(post_change))
    })
    .bind(&bind_addr)?
    .workers(4)
    .max_connections(CONFIG.max_connections)
    .run();

    let srv = server.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            srv.stop(true).await;
        }
    });

    server.await
}
