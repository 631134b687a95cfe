use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{base_context, redirect, render_template};
use tera::Tera;

use crate::forms::orders::UpdateOrderStatusForm;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, orders};

#[get("/orders")]
pub async fn show_orders(
    params: web::Query<orders::OrdersQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match orders::load_orders_page(repo.get_ref(), &user, params.into_inner()) {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                &user,
                "orders",
                &server_config.auth_service_url,
            );
            context.insert("orders", &data.orders);
            context.insert("search", &data.search);
            context.insert("status", &data.status);
            context.insert("statuses", &data.statuses);
            context.insert("pending_count", &data.pending_count);
            context.insert("delivered_count", &data.delivered_count);
            context.insert("page", &data.page);
            context.insert("total_pages", &data.total_pages);
            render_template(&tera, "admin/orders/index.html", &context)
        }
        Err(ServiceError::Unauthorized) => {
            FlashMessage::error("Insufficient permissions.").send();
            redirect("/na")
        }
        Err(err) => {
            log::error!("Failed to list orders: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/orders/{order_id}")]
pub async fn show_order(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let order_id = path.into_inner();

    match orders::load_order(repo.get_ref(), &user, order_id) {
        Ok(order) => {
            let mut context = base_context(
                &flash_messages,
                &user,
                "orders",
                &server_config.auth_service_url,
            );
            context.insert("order", &order);
            render_template(&tera, "admin/orders/detail.html", &context)
        }
        Err(ServiceError::Unauthorized) => {
            FlashMessage::error("Insufficient permissions.").send();
            redirect("/na")
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Order not found.").send();
            redirect("/admin/orders")
        }
        Err(err) => {
            log::error!("Failed to load order {order_id}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/orders/{order_id}/status")]
pub async fn update_order_status(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Form<UpdateOrderStatusForm>,
) -> impl Responder {
    let order_id = path.into_inner();
    let back = format!("/admin/orders/{order_id}");

    match orders::update_order_status(repo.get_ref(), &user, order_id, form.into_inner()) {
        Ok(order) => {
            FlashMessage::success(format!(
                "Order #{} is now {}.",
                order.id,
                order.status.label()
            ))
            .send();
            redirect(&back)
        }
        Err(ServiceError::Unauthorized) => {
            FlashMessage::error("Insufficient permissions.").send();
            redirect("/na")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect(&back)
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Order not found.").send();
            redirect("/admin/orders")
        }
        Err(ServiceError::Conflict) => {
            FlashMessage::error("This order cannot be moved to that status.").send();
            redirect(&back)
        }
        Err(err) => {
            log::error!("Failed to update status of order {order_id}: {err}");
            FlashMessage::error("Failed to update order status.").send();
            redirect(&back)
        }
    }
}
