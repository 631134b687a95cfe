use actix_files::Files;
use actix_identity::IdentityMiddleware;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, middleware, web};
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
use dotenvy::dotenv;
use pushkind_common::db::establish_connection_pool;
use pushkind_common::middleware::RedirectUnauthorized;
use pushkind_common::routes::{logout, not_assigned};
use tera::Tera;

use scent_store::config::StoreConfig;
use scent_store::repository::DieselRepository;
use scent_store::routes::api::{api_v1_cart, api_v1_products};
use scent_store::routes::cart::{add_cart_item, remove_cart_item, show_cart, update_cart_item};
use scent_store::routes::checkout::{show_checkout, show_confirmation, submit_checkout};
use scent_store::routes::dashboard::show_dashboard;
use scent_store::routes::orders::{show_order, show_orders, update_order_status};
use scent_store::routes::products::{
    add_product, delete_product, edit_product, show_products, upload_products,
};
use scent_store::routes::storefront::{show_collections, show_home, show_product};
use scent_store::services::dashboard::LiveCatalog;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let secret_key = config.session_key();
    let common_config = config.common();
    let domain = config.domain.clone();

    let pool = match establish_connection_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = DieselRepository::new(pool);
    let live = web::Data::new(LiveCatalog::start(&repo));

    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let tera = match Tera::new("templates/**/*") {
        Ok(t) => t,
        Err(e) => {
            log::error!("Parsing error(s): {e}");
            std::process::exit(1);
        }
    };

    log::info!("Listening on {}:{}", config.address, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false) // set to true in prod
                    .cookie_domain(Some(format!(".{domain}")))
                    .build(),
            )
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(Files::new("/assets", "./assets"))
            .service(not_assigned)
            .service(
                web::scope("/api")
                    .service(api_v1_products)
                    .service(api_v1_cart),
            )
            .service(
                web::scope("/admin")
                    .wrap(RedirectUnauthorized)
                    .service(show_dashboard)
                    .service(show_products)
                    .service(add_product)
                    .service(upload_products)
                    .service(edit_product)
                    .service(delete_product)
                    .service(show_orders)
                    .service(show_order)
                    .service(update_order_status)
                    .service(logout),
            )
            .service(show_home)
            .service(show_collections)
            .service(show_product)
            .service(show_cart)
            .service(add_cart_item)
            .service(remove_cart_item)
            .service(update_cart_item)
            .service(show_checkout)
            .service(submit_checkout)
            .service(show_confirmation)
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(repo.clone()))
            .app_data(live.clone())
            .app_data(web::Data::new(common_config.clone()))
    })
    .bind((config.address.clone(), config.port))?
    .run()
    .await
}
