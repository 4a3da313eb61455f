//! Shared application state and the API router.

use axum::extract::FromRef;
use axum::routing::{get, post, put};
use axum::{middleware, Router};
use std::sync::Arc;

use crate::handlers::{
    audit_handlers, auth_handlers, brand_handlers, category_handlers, customer_handlers,
    employee_handlers, hero_handlers, order_handlers, product_handlers, review_handlers,
    shipping_handlers,
};
use crate::middleware::auth_middleware::auth_middleware;
use crate::services::audit_service::AuditLogService;
use crate::services::auth_service::AuthService;
use crate::services::brand_service::BrandService;
use crate::services::category_service::CategoryService;
use crate::services::customer_service::CustomerService;
use crate::services::employee_service::EmployeeService;
use crate::services::hero_service::HeroService;
use crate::services::order_service::OrderService;
use crate::services::product_service::ProductService;
use crate::services::review_service::ReviewService;
use crate::services::shipping_service::ShippingService;

/// Every service the handlers reach through `State`. Handlers keep the
/// single-service `State<Arc<dyn XService>>` shape via the `FromRef` impls
/// below.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub category_service: Arc<dyn CategoryService>,
    pub product_service: Arc<dyn ProductService>,
    pub brand_service: Arc<dyn BrandService>,
    pub order_service: Arc<dyn OrderService>,
    pub customer_service: Arc<dyn CustomerService>,
    pub employee_service: Arc<dyn EmployeeService>,
    pub review_service: Arc<dyn ReviewService>,
    pub shipping_service: Arc<dyn ShippingService>,
    pub hero_service: Arc<dyn HeroService>,
    pub audit_log_service: Arc<dyn AuditLogService>,
}

impl FromRef<AppState> for Arc<dyn AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CategoryService> {
    fn from_ref(state: &AppState) -> Self {
        state.category_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ProductService> {
    fn from_ref(state: &AppState) -> Self {
        state.product_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn BrandService> {
    fn from_ref(state: &AppState) -> Self {
        state.brand_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn OrderService> {
    fn from_ref(state: &AppState) -> Self {
        state.order_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CustomerService> {
    fn from_ref(state: &AppState) -> Self {
        state.customer_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn EmployeeService> {
    fn from_ref(state: &AppState) -> Self {
        state.employee_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ReviewService> {
    fn from_ref(state: &AppState) -> Self {
        state.review_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ShippingService> {
    fn from_ref(state: &AppState) -> Self {
        state.shipping_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn HeroService> {
    fn from_ref(state: &AppState) -> Self {
        state.hero_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn AuditLogService> {
    fn from_ref(state: &AppState) -> Self {
        state.audit_log_service.clone()
    }
}

/// API routes: a public login route plus the bearer-protected back office.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/categories",
            get(category_handlers::list_categories_handler)
                .post(category_handlers::create_category_handler),
        )
        .route(
            "/api/categories/{id}",
            get(category_handlers::get_category_handler)
                .put(category_handlers::update_category_handler)
                .delete(category_handlers::delete_category_handler),
        )
        .route(
            "/api/products",
            get(product_handlers::list_products_handler)
                .post(product_handlers::create_product_handler),
        )
        .route(
            "/api/products/{id}",
            get(product_handlers::get_product_handler)
                .put(product_handlers::update_product_handler)
                .delete(product_handlers::delete_product_handler),
        )
        .route(
            "/api/brands",
            get(brand_handlers::list_brands_handler).post(brand_handlers::create_brand_handler),
        )
        .route(
            "/api/brands/{id}",
            get(brand_handlers::get_brand_handler)
                .put(brand_handlers::update_brand_handler)
                .delete(brand_handlers::delete_brand_handler),
        )
        .route(
            "/api/orders",
            get(order_handlers::list_orders_handler).post(order_handlers::create_order_handler),
        )
        .route(
            "/api/orders/{id}",
            get(order_handlers::get_order_handler)
                .put(order_handlers::update_order_handler)
                .delete(order_handlers::delete_order_handler),
        )
        .route(
            "/api/customers",
            get(customer_handlers::list_customers_handler),
        )
        .route(
            "/api/customers/{id}",
            get(customer_handlers::get_customer_handler)
                .put(customer_handlers::update_customer_handler)
                .delete(customer_handlers::delete_customer_handler),
        )
        .route(
            "/api/employees",
            get(employee_handlers::list_employees_handler)
                .post(employee_handlers::create_employee_handler),
        )
        .route(
            "/api/employees/{id}",
            get(employee_handlers::get_employee_handler)
                .put(employee_handlers::update_employee_handler)
                .delete(employee_handlers::delete_employee_handler),
        )
        .route("/api/reviews", get(review_handlers::list_reviews_handler))
        .route(
            "/api/reviews/{id}",
            put(review_handlers::update_review_handler)
                .delete(review_handlers::delete_review_handler),
        )
        .route(
            "/api/shipping",
            get(shipping_handlers::list_shipping_handler)
                .post(shipping_handlers::create_shipping_handler),
        )
        .route(
            "/api/shipping/{id}",
            put(shipping_handlers::update_shipping_handler)
                .delete(shipping_handlers::delete_shipping_handler),
        )
        .route(
            "/api/heroes",
            get(hero_handlers::list_heroes_handler).post(hero_handlers::create_hero_handler),
        )
        .route(
            "/api/heroes/{id}",
            put(hero_handlers::update_hero_handler).delete(hero_handlers::delete_hero_handler),
        )
        .route("/api/audit", get(audit_handlers::list_audit_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(auth_handlers::login_handler))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
