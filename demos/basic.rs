//! Minimal tsu-dsl host: a hyper server with a matchit routing table mounting
//! DSL handlers.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/1
//!   curl http://localhost:3000/users/42               # 404
//!   curl http://localhost:3000/users/abc              # 400
//!   curl 'http://localhost:3000/users?sort=desc&limit=1'
//!   curl -X POST http://localhost:3000/users -d '{"name":"carol"}'
//!   curl 'http://localhost:3000/slow?ms=3000'         # 500 after 1 s

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hyper::service::{Service, service_fn};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info};

use tsu_dsl::extract::{enum_param, int_param, int_var, long_param};
use tsu_dsl::value::stream_iter;
use tsu_dsl::{
    Handler, HandlerService, Method, PathParams, Response, StatusCode, TimeUnit, Timeout,
    complete, complete_stream, complete_value, created, handler, not_found, ok, on_success,
};

#[derive(Clone, Debug, Serialize)]
struct User {
    id: i32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct NewUser {
    name: String,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Sort {
    Asc,
    Desc,
}

#[derive(Clone, Default)]
struct Users(Arc<Mutex<BTreeMap<i32, User>>>);

impl Users {
    fn with<R>(&self, f: impl FnOnce(&mut BTreeMap<i32, User>) -> R) -> R {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[derive(Default)]
struct Routes(HashMap<Method, matchit::Router<HandlerService>>);

impl Routes {
    fn on(mut self, method: Method, path: &str, h: impl Handler) -> Self {
        self.0
            .entry(method)
            .or_default()
            .insert(path, HandlerService::new(h))
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }
}

fn routes(users: Users) -> Routes {
    let by_id = users.clone();
    let listing = users.clone();
    Routes::default()
        .on(Method::GET, "/healthz", handler(|_| complete(StatusCode::OK)))
        .on(Method::GET, "/users/{id}", handler(move |ctx| {
            ctx.path_variable(int_var("id"), |id| {
                complete_value(StatusCode::OK, by_id.with(|u| u.get(&id).cloned())).or(not_found())
            })
        }))
        .on(Method::GET, "/users", handler(move |ctx| {
            let sort = enum_param::<Sort>("sort").optional_or(Sort::Asc);
            let limit = int_param("limit").optional();
            ctx.parameters((sort, limit), |(sort, limit)| {
                let mut all: Vec<User> = listing.with(|u| u.values().cloned().collect());
                if let Sort::Desc = sort {
                    all.reverse();
                }
                all.truncate(limit.map_or(all.len(), |n| n.max(0) as usize));
                complete_stream(StatusCode::OK, stream_iter(all))
            })
        }))
        .on(Method::POST, "/users", handler(move |ctx| {
            let users = users.clone();
            ctx.with_body(move |new: NewUser| {
                let user = users.with(|u| {
                    let id = u.keys().next_back().map_or(1, |last| last + 1);
                    let user = User { id, name: new.name };
                    u.insert(id, user.clone());
                    user
                });
                created(user)
            })
        }))
        .on(Method::GET, "/slow", handler(|ctx| {
            ctx.query_parameter(long_param("ms").optional_or(10), |ms| {
                let work = async move {
                    tokio::time::sleep(Duration::from_millis(ms.max(0) as u64)).await;
                    Ok::<_, tsu_dsl::Error>(ms)
                };
                on_success(work, Some(Timeout::new(1, TimeUnit::Seconds)), |ms| {
                    ok(format!("slept {ms} ms"))
                })
            })
        }))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let users = Users::default();
    users.with(|u| {
        u.insert(1, User { id: 1, name: "alice".into() });
        u.insert(2, User { id: 2, name: "bob".into() });
    });

    let addr: SocketAddr = ([0, 0, 0, 0], 3000).into();
    serve(addr, routes(users)).await.expect("server error");
}

/// Accept loop with graceful shutdown: stop accepting on SIGTERM / Ctrl-C,
/// then wait for in-flight connections.
async fn serve(addr: SocketAddr, routes: Routes) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let routes = Arc::new(routes);
    info!(%addr, "tsu-dsl demo listening");

    let mut tasks = tokio::task::JoinSet::new();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };
                let routes = Arc::clone(&routes);
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    let svc = service_fn(move |req| dispatch(Arc::clone(&routes), req));
                    if let Err(e) = ConnBuilder::new(TokioExecutor::new()).serve_connection(io, svc).await {
                        error!(%peer, "connection error: {e}");
                    }
                });
            }

            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}
    info!("tsu-dsl demo stopped");
    Ok(())
}

/// Routes one request, handing the matched path variables to the handler.
async fn dispatch(
    routes: Arc<Routes>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<tsu_dsl::ResponseBody>, std::convert::Infallible> {
    let (mut parts, body) = req.into_parts();
    let matched = routes.0.get(&parts.method).and_then(|tree| tree.at(parts.uri.path()).ok());
    let Some(matched) = matched else {
        return Ok(Response::empty(StatusCode::NOT_FOUND).into_inner());
    };
    parts.extensions.insert(matched.params.iter().collect::<PathParams>());
    let svc = matched.value.clone();
    svc.call(http::Request::from_parts(parts, body)).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
