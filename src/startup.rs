use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::SessionManager;
use crate::configuration::{ApplicationSettings, PolkaSettings};
use crate::logger::RequestLogger;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    current_account, health_check, login, polka_webhook, refresh, register, reset, revoke,
};

pub fn run(
    listener: TcpListener,
    sessions: SessionManager,
    application: ApplicationSettings,
    polka: PolkaSettings,
) -> Result<Server, std::io::Error> {
    let sessions_data = web::Data::new(sessions.clone());
    let application_data = web::Data::new(application);
    let polka_data = web::Data::new(polka);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)

            // Shared, read-only state
            .app_data(sessions_data.clone())
            .app_data(application_data.clone())
            .app_data(polka_data.clone())

            .service(web::scope("/admin").route("/reset", web::post().to(reset)))
            .service(
                web::scope("/api")
                    .route("/healthz", web::get().to(health_check))
                    .route("/users", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke))
                    .route("/polka/webhooks", web::post().to(polka_webhook))
                    // Protected routes (require a valid access token)
                    .service(
                        web::scope("/users/me")
                            .wrap(JwtMiddleware::new(sessions.clone()))
                            .route("", web::get().to(current_account)),
                    ),
            )

            // Static file serving
            .service(fs::Files::new("/app", "./public").index_file("index.html"))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
