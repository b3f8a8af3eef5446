use std::net::SocketAddr;
use tokio::net::TcpListener;

use longbox::{build_app, cli, db};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:data/longbox.db".to_string());

    let pool = db::init_pool(&database_url).await;

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("create-user") => {
            let Some(name) = args.get(2) else {
                eprintln!("Usage: longbox create-user <name> [email]");
                std::process::exit(1);
            };
            if let Err(e) = cli::create_user(&pool, name, args.get(3).map(String::as_str)).await {
                eprintln!("Failed to create user: {e}");
                std::process::exit(1);
            }
        }
        Some("seed") => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: longbox seed <file.json>");
                std::process::exit(1);
            };
            if let Err(e) = cli::seed_recommended(&pool, path).await {
                eprintln!("Failed to seed recommended collections: {e}");
                std::process::exit(1);
            }
        }
        Some(other) => {
            eprintln!("Unknown command: {other}");
            std::process::exit(1);
        }
        None => {
            let secure_cookies = std::env::var("SECURE_COOKIES")
                .map(|v| v == "1" || v == "true")
                .unwrap_or(false);

            let port: u16 = std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000);

            let app = build_app(pool, secure_cookies).await;

            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = TcpListener::bind(addr).await.expect("Failed to bind");

            tracing::info!("listening on {}", addr);
            axum::serve(listener, app).await.expect("Server error");
        }
    }
}
