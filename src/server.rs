//! 管理服务：根目录静态文件与 `POST /save`。

use axum::extract::{DefaultBodyLimit, Extension};
use axum::handler::HandlerWithoutStateExt;
use axum::http::{Method, Request, Uri};
use axum::routing::post;
use axum::{Router, middleware};
use axum_server::Handle;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpSocket;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info, info_span, warn};

use crate::config::{SHUTDOWN_GRACE_SECS, ServeArgs};
use crate::http::add_admin_headers;
use crate::listing::serve_listing;
use crate::save;
use crate::storage::Storage;

const LISTEN_BACKLOG: u32 = 1024;

/// 启动管理服务并阻塞至关闭；绑定失败仅记录日志并正常返回。
pub async fn run(args: ServeArgs) -> io::Result<()> {
    let storage = Storage::new(&args.root)?;
    if !tokio::fs::metadata(storage.root_path()).await?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", storage.root_path().display()),
        ));
    }
    let host = args
        .host
        .parse::<IpAddr>()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);

    let listener = match bind_listener(addr) {
        Ok(listener) => listener,
        Err(err) => {
            error!(%addr, error = %err, "failed to start admin server");
            warn!(
                port = args.port,
                "port is probably taken, stop other local servers and retry"
            );
            return Ok(());
        }
    };

    info!(root = %storage.root_path().display(), "serving site root");
    info!(%addr, "🚀 admin server listening");
    info!(
        panel = %format!("http://localhost:{}/admin.html", args.port),
        "admin panel available"
    );

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));
    serve(listener, router(Arc::new(storage)), handle).await
}

/// 构建路由：除 `POST /save` 外均由磁盘静态文件响应。
pub fn router(storage: Arc<Storage>) -> Router {
    let listing_storage = storage.clone();
    let listing = move |method: Method, uri: Uri| {
        let storage = listing_storage.clone();
        async move { serve_listing(&storage, method, uri).await }
    };
    let static_files = ServeDir::new(storage.root_path())
        .call_fallback_on_method_not_allowed(true)
        .fallback(listing.into_service());

    Router::new()
        .route(
            "/save",
            post(save::save_file)
                .fallback_service(static_files.clone())
                .layer(DefaultBodyLimit::disable()),
        )
        .fallback_service(static_files)
        .layer(middleware::from_fn(add_admin_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    info_span!(
                        env!("CARGO_CRATE_NAME"),
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(Extension(storage))
}

/// 绑定监听端口（启用 SO_REUSEADDR）；需在 tokio 运行时内调用。
pub fn bind_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)?.into_std()
}

pub async fn serve(listener: std::net::TcpListener, app: Router, handle: Handle) -> io::Result<()> {
    axum_server::from_tcp(listener)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received termination signal shutting down");
    handle.graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_GRACE_SECS)));
}
