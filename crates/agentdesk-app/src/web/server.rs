use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::web::routes::{create_router, AppState};

/// HTTP front end for the documentation and review agents
pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        // API callable from any origin
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
        let app = create_router(state).layer(cors).layer(TraceLayer::new_for_http());
        Self { addr, app }
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;
        let base = format!("http://{}", listener.local_addr()?);

        println!("🌐 Web server listening on {}", base);
        for (label, route) in [("Chat", "/ui/chat"), ("Code review", "/ui/review"), ("Health", "/health")] {
            println!("   {}: {}{}", label, base, route);
        }

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        println!("👋 Web server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
