//! HTTP/HTTPS server with bounded graceful shutdown.
//!
//! [`GracefulServer`] binds an address to an axum [`Router`] and serves it with
//! axum-server until a [`CancellationToken`] fires. Shutdown then follows the
//! two-phase policy in [`coordinator`](super::coordinator): drain first, force
//! close when the deadline passes.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::Router;
use axum_server::Handle;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};

use super::coordinator::{CycleOutcome, ShutdownCoordinator};
use super::options::{HttpTimeouts, ShutdownDeadline, TlsSettings};
use super::serve::{Server, Transport};
use super::tls;
use crate::error::ServeError;

/// A bound, not yet started HTTP server.
///
/// Configure it with the `with_*` methods, then start one cycle with
/// [`serve_with_shutdown`](Self::serve_with_shutdown) or
/// [`serve_tls_with_shutdown`](Self::serve_tls_with_shutdown). Both consume the
/// server, so a stopped server cannot be restarted.
pub struct GracefulServer {
    addr: SocketAddr,
    router: Router,
    handle: Handle,
    timeouts: Option<HttpTimeouts>,
    tls: Option<TlsSettings>,
    shutdown_timeout: ShutdownDeadline,
    closed: AtomicBool,
    done: watch::Sender<bool>,
}

impl GracefulServer {
    /// Create a server for `addr` handled by `router`, with a 5 second shutdown
    /// deadline and no extra timeouts.
    pub fn bind(addr: SocketAddr, router: Router) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            addr,
            router,
            handle: Handle::new(),
            timeouts: None,
            tls: None,
            shutdown_timeout: ShutdownDeadline::default(),
            closed: AtomicBool::new(false),
            done,
        }
    }

    /// Set the drain deadline, after which active connections are force-closed.
    /// A zero duration keeps the default.
    pub fn with_shutdown_timeout(mut self, timeout: impl Into<ShutdownDeadline>) -> Self {
        self.shutdown_timeout = timeout.into();
        self
    }

    pub fn with_timeouts(mut self, timeouts: HttpTimeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Apply [`HttpTimeouts::cloudflare`].
    pub fn with_cloudflare_timeouts(self) -> Self {
        self.with_timeouts(HttpTimeouts::cloudflare())
    }

    /// Use `settings` when serving TLS instead of [`TlsSettings::default`].
    pub fn with_tls_settings(mut self, settings: TlsSettings) -> Self {
        self.tls = Some(settings);
        self
    }

    /// Apply [`TlsSettings::cloudflare`].
    pub fn with_cloudflare_tls(self) -> Self {
        self.with_tls_settings(TlsSettings::cloudflare())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown_timeout(&self) -> ShutdownDeadline {
        self.shutdown_timeout
    }

    /// A handle for observing the server from outside, e.g. its bound address
    /// via [`Handle::listening`].
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Serve plain HTTP until `cancel` fires, then shut down gracefully.
    ///
    /// Cancellation is not an error: a clean drain yields
    /// [`CycleOutcome::Stopped`], a drain that outlives the deadline yields
    /// [`CycleOutcome::TimedOut`] after the remaining connections were closed.
    pub async fn serve_with_shutdown(self, cancel: CancellationToken) -> CycleOutcome {
        self.run_cycle(Transport::Plain, cancel).await
    }

    /// Serve HTTPS with the certificate chain and key in the given PEM files.
    ///
    /// See [`serve_with_shutdown`](Self::serve_with_shutdown).
    pub async fn serve_tls_with_shutdown(
        self,
        cancel: CancellationToken,
        cert_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> CycleOutcome {
        let transport = Transport::Tls {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        };
        self.run_cycle(transport, cancel).await
    }

    async fn run_cycle(self, transport: Transport, cancel: CancellationToken) -> CycleOutcome {
        ShutdownCoordinator::new(self.shutdown_timeout)
            .supervise(&self, &transport, &cancel)
            .await
    }

    /// The router with per-request layers derived from the timeouts.
    fn app(&self) -> Router {
        let mut app = self.router.clone();
        let Some(timeouts) = self.timeouts else {
            return app;
        };

        if let Some(read) = timeouts.read {
            app = app.layer(RequestBodyTimeoutLayer::new(read));
        }
        if let Some(write) = timeouts.write {
            app = app.layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, write));
        }
        app
    }

    fn configure_http(&self, builder: &mut Builder<TokioExecutor>) {
        let Some(timeouts) = self.timeouts else {
            return;
        };

        let mut http1 = builder.http1();
        http1.timer(TokioTimer::new());
        if let Some(timeout) = timeouts.header_read_timeout() {
            http1.header_read_timeout(timeout);
        }
        http1.keep_alive(timeouts.keep_alive());
    }

    async fn serve_transport(&self, transport: &Transport) -> Result<(), ServeError> {
        let app = self.app();

        match transport {
            Transport::Plain => {
                tracing::info!(addr = %self.addr, "Starting HTTP server");

                let mut server = axum_server::bind(self.addr).handle(self.handle.clone());
                self.configure_http(server.http_builder());
                server
                    .serve(app.into_make_service())
                    .await
                    .map_err(transport_error)?;
            }
            Transport::Tls { cert_path, key_path } => {
                tracing::info!(
                    addr = %self.addr,
                    cert = %cert_path.display(),
                    key = %key_path.display(),
                    "Starting HTTPS server"
                );

                let config = tls::load_rustls_config(cert_path, key_path, self.tls.as_ref())?;
                let mut server =
                    axum_server::bind_rustls(self.addr, config).handle(self.handle.clone());
                self.configure_http(server.http_builder());
                server
                    .serve(app.into_make_service())
                    .await
                    .map_err(transport_error)?;
            }
        }

        // axum-server only returns Ok after the handle was shut down
        Err(ServeError::Closed)
    }
}

/// Errors only `bind` can produce are reported as bind failures.
///
/// axum-server retries failed `accept` calls internally, so the remaining
/// errors come from setting up the listener.
fn transport_error(e: io::Error) -> ServeError {
    match e.kind() {
        io::ErrorKind::AddrInUse
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::PermissionDenied => ServeError::Bind(e),
        _ => ServeError::Io(e),
    }
}

#[async_trait]
impl Server for GracefulServer {
    async fn serve(&self, transport: &Transport) -> Result<(), ServeError> {
        let result = if self.closed.load(Ordering::SeqCst) {
            Err(ServeError::Closed)
        } else {
            self.serve_transport(transport).await
        };
        self.done.send_replace(true);
        result
    }

    async fn drain(&self) -> Result<(), ServeError> {
        self.closed.store(true, Ordering::SeqCst);
        let mut done = self.done.subscribe();

        tracing::debug!(
            connections = self.handle.connection_count(),
            "Stopped accepting connections, waiting for in-flight requests"
        );
        self.handle.graceful_shutdown(None);

        if let Err(e) = done.wait_for(|stopped| *stopped).await {
            // unreachable while `self` owns the sender
            tracing::debug!(error = %e, "Serve loop status channel closed");
        }
        Ok(())
    }

    async fn hard_stop(&self) -> Result<(), ServeError> {
        self.closed.store(true, Ordering::SeqCst);
        tracing::warn!(
            connections = self.handle.connection_count(),
            "Force-closing connections"
        );
        self.handle.shutdown();
        Ok(())
    }
}

impl std::fmt::Debug for GracefulServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GracefulServer")
            .field("addr", &self.addr)
            .field("timeouts", &self.timeouts)
            .field("tls", &self.tls)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::time::Duration;

    fn test_server() -> GracefulServer {
        let router = Router::new().route("/", get(|| async { "ok" }));
        GracefulServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), router)
    }

    #[test]
    fn builder_applies_presets() {
        let server = test_server()
            .with_cloudflare_timeouts()
            .with_cloudflare_tls()
            .with_shutdown_timeout(Duration::from_secs(12));

        assert_eq!(server.timeouts, Some(HttpTimeouts::cloudflare()));
        assert!(server.tls.is_some());
        assert_eq!(server.shutdown_timeout().as_duration(), Duration::from_secs(12));
    }

    #[test]
    fn zero_shutdown_timeout_keeps_default() {
        let server = test_server().with_shutdown_timeout(Duration::ZERO);
        assert_eq!(server.shutdown_timeout(), ShutdownDeadline::default());
    }

    #[test]
    fn bind_errors_are_classified() {
        let in_use = io::Error::new(io::ErrorKind::AddrInUse, "in use");
        assert!(matches!(transport_error(in_use), ServeError::Bind(_)));

        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(transport_error(reset), ServeError::Io(_)));
    }

    #[tokio::test]
    async fn serve_after_stop_reports_closed() {
        let server = test_server();
        server.hard_stop().await.unwrap();

        let err = server.serve(&Transport::Plain).await.unwrap_err();
        assert!(err.is_closed());
        // done was published, so a late drain does not hang
        tokio::time::timeout(Duration::from_millis(100), server.drain())
            .await
            .expect("drain should not wait for a server that never started")
            .unwrap();
    }
}
