use actix_web::{App, HttpServer};
use color_eyre::eyre::Report;
use coolwebs_server::{db, log, server};
use dotenv::dotenv;
use std::env;
use tracing::info;

#[actix_rt::main]
async fn main() -> Result<(), Report> {
    dotenv().ok();
    log::init()?;

    let database_url = env::var("DATABASE_URL")?;
    let pool = db::new_pool(&database_url).await?;
    server::register_db_actor(pool);
    server::register_system_actors();

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_owned());
    info!("Starting CoolWebs server on {}", bind_addr);

    HttpServer::new(|| App::new().configure(server::configure))
        .bind(&bind_addr)?
        .run()
        .await?;

    Ok(())
}
