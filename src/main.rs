use rental_watch::rocket;

#[rocket::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("rental_watch=info".parse().unwrap()))
        .init();

    if let Err(e) = rocket().launch().await {
        tracing::error!(error = %e, "server shut down with an error");
        std::process::exit(1);
    }
}
