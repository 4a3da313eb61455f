use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use store_admin::handlers::category_handlers::DeleteCategoryResponse;
use store_admin::handlers::ErrorResponse;
use store_admin::models::{
    AuditEntry, AuthToken, Brand, Category, CategoryTableRow, CreateBrandRequest,
    CreateCategoryRequest, CreateEmployeeRequest, CreateHeroRequest, CreateOrderRequest,
    CreateProductRequest, CreateShippingRequest, Customer, Employee, HeroSlide, LoginRequest,
    Order, OrderItem, Product, Review, ShippingZone, UpdateBrandRequest, UpdateCategoryRequest,
    UpdateCustomerRequest, UpdateEmployeeRequest, UpdateHeroRequest, UpdateOrderRequest,
    UpdateProductRequest, UpdateReviewRequest, UpdateShippingRequest,
};
use store_admin::repositories::audit_repository::PostgresAuditRepository;
use store_admin::repositories::brand_repository::PostgresBrandRepository;
use store_admin::repositories::category_repository::PostgresCategoryRepository;
use store_admin::repositories::customer_repository::PostgresCustomerRepository;
use store_admin::repositories::employee_repository::PostgresEmployeeRepository;
use store_admin::repositories::hero_repository::PostgresHeroRepository;
use store_admin::repositories::order_repository::PostgresOrderRepository;
use store_admin::repositories::product_repository::PostgresProductRepository;
use store_admin::repositories::review_repository::PostgresReviewRepository;
use store_admin::repositories::shipping_repository::PostgresShippingRepository;
use store_admin::services::audit_service::{AuditLogServiceImpl, AuditRecorder};
use store_admin::services::auth_service::AuthServiceImpl;
use store_admin::services::brand_service::BrandServiceImpl;
use store_admin::services::category_service::CategoryServiceImpl;
use store_admin::services::customer_service::CustomerServiceImpl;
use store_admin::services::employee_service::EmployeeServiceImpl;
use store_admin::services::hero_service::HeroServiceImpl;
use store_admin::services::order_service::OrderServiceImpl;
use store_admin::services::product_service::ProductServiceImpl;
use store_admin::services::review_service::ReviewServiceImpl;
use store_admin::services::shipping_service::ShippingServiceImpl;
use store_admin::state::{router, AppState};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        store_admin::handlers::auth_handlers::login_handler,
        store_admin::handlers::category_handlers::list_categories_handler,
        store_admin::handlers::category_handlers::get_category_handler,
        store_admin::handlers::category_handlers::create_category_handler,
        store_admin::handlers::category_handlers::update_category_handler,
        store_admin::handlers::category_handlers::delete_category_handler,
        store_admin::handlers::product_handlers::list_products_handler,
        store_admin::handlers::product_handlers::get_product_handler,
        store_admin::handlers::product_handlers::create_product_handler,
        store_admin::handlers::product_handlers::update_product_handler,
        store_admin::handlers::product_handlers::delete_product_handler,
        store_admin::handlers::brand_handlers::list_brands_handler,
        store_admin::handlers::brand_handlers::get_brand_handler,
        store_admin::handlers::brand_handlers::create_brand_handler,
        store_admin::handlers::brand_handlers::update_brand_handler,
        store_admin::handlers::brand_handlers::delete_brand_handler,
        store_admin::handlers::order_handlers::list_orders_handler,
        store_admin::handlers::order_handlers::get_order_handler,
        store_admin::handlers::order_handlers::create_order_handler,
        store_admin::handlers::order_handlers::update_order_handler,
        store_admin::handlers::order_handlers::delete_order_handler,
        store_admin::handlers::customer_handlers::list_customers_handler,
        store_admin::handlers::customer_handlers::get_customer_handler,
        store_admin::handlers::customer_handlers::update_customer_handler,
        store_admin::handlers::customer_handlers::delete_customer_handler,
        store_admin::handlers::employee_handlers::list_employees_handler,
        store_admin::handlers::employee_handlers::get_employee_handler,
        store_admin::handlers::employee_handlers::create_employee_handler,
        store_admin::handlers::employee_handlers::update_employee_handler,
        store_admin::handlers::employee_handlers::delete_employee_handler,
        store_admin::handlers::review_handlers::list_reviews_handler,
        store_admin::handlers::review_handlers::update_review_handler,
        store_admin::handlers::review_handlers::delete_review_handler,
        store_admin::handlers::shipping_handlers::list_shipping_handler,
        store_admin::handlers::shipping_handlers::create_shipping_handler,
        store_admin::handlers::shipping_handlers::update_shipping_handler,
        store_admin::handlers::shipping_handlers::delete_shipping_handler,
        store_admin::handlers::hero_handlers::list_heroes_handler,
        store_admin::handlers::hero_handlers::create_hero_handler,
        store_admin::handlers::hero_handlers::update_hero_handler,
        store_admin::handlers::hero_handlers::delete_hero_handler,
        store_admin::handlers::audit_handlers::list_audit_handler,
    ),
    components(schemas(
        ErrorResponse,
        LoginRequest,
        AuthToken,
        Category,
        CategoryTableRow,
        CreateCategoryRequest,
        UpdateCategoryRequest,
        DeleteCategoryResponse,
        Product,
        CreateProductRequest,
        UpdateProductRequest,
        Brand,
        CreateBrandRequest,
        UpdateBrandRequest,
        Order,
        OrderItem,
        CreateOrderRequest,
        UpdateOrderRequest,
        Customer,
        UpdateCustomerRequest,
        Employee,
        CreateEmployeeRequest,
        UpdateEmployeeRequest,
        Review,
        UpdateReviewRequest,
        ShippingZone,
        CreateShippingRequest,
        UpdateShippingRequest,
        HeroSlide,
        CreateHeroRequest,
        UpdateHeroRequest,
        AuditEntry,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Employee authentication"),
        (name = "categories", description = "Category hierarchy"),
        (name = "products", description = "Catalog products"),
        (name = "brands", description = "Catalog brands"),
        (name = "orders", description = "Customer orders"),
        (name = "customers", description = "Storefront customers"),
        (name = "employees", description = "Back-office staff"),
        (name = "reviews", description = "Review moderation"),
        (name = "shipping", description = "Shipping zones"),
        (name = "heroes", description = "Promotional slides"),
        (name = "audit", description = "Audit trail")
    ),
    info(
        title = "Store Admin API",
        version = "0.1.0",
        description = "Administrative back office for an online store",
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "store_admin=info,tower_http=info".into()),
        )
        .init();

    // Get configuration from environment
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    tracing::info!("connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("migrations completed");

    // Initialize repositories
    let category_repository = Arc::new(PostgresCategoryRepository::new(pool.clone()));
    let product_repository = Arc::new(PostgresProductRepository::new(pool.clone()));
    let brand_repository = Arc::new(PostgresBrandRepository::new(pool.clone()));
    let order_repository = Arc::new(PostgresOrderRepository::new(pool.clone()));
    let customer_repository = Arc::new(PostgresCustomerRepository::new(pool.clone()));
    let employee_repository = Arc::new(PostgresEmployeeRepository::new(pool.clone()));
    let review_repository = Arc::new(PostgresReviewRepository::new(pool.clone()));
    let shipping_repository = Arc::new(PostgresShippingRepository::new(pool.clone()));
    let hero_repository = Arc::new(PostgresHeroRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));

    // Every mutating service shares one recorder.
    let audit_recorder = Arc::new(AuditRecorder::new(audit_repository.clone()));

    // Initialize services
    let state = AppState {
        auth_service: Arc::new(AuthServiceImpl::new(employee_repository.clone(), jwt_secret)),
        category_service: Arc::new(CategoryServiceImpl::new(
            category_repository,
            audit_recorder.clone(),
        )),
        product_service: Arc::new(ProductServiceImpl::new(
            product_repository,
            audit_recorder.clone(),
        )),
        brand_service: Arc::new(BrandServiceImpl::new(
            brand_repository,
            audit_recorder.clone(),
        )),
        order_service: Arc::new(OrderServiceImpl::new(
            order_repository,
            audit_recorder.clone(),
        )),
        customer_service: Arc::new(CustomerServiceImpl::new(
            customer_repository,
            audit_recorder.clone(),
        )),
        employee_service: Arc::new(EmployeeServiceImpl::new(
            employee_repository,
            audit_recorder.clone(),
        )),
        review_service: Arc::new(ReviewServiceImpl::new(
            review_repository,
            audit_recorder.clone(),
        )),
        shipping_service: Arc::new(ShippingServiceImpl::new(
            shipping_repository,
            audit_recorder.clone(),
        )),
        hero_service: Arc::new(HeroServiceImpl::new(hero_repository, audit_recorder)),
        audit_log_service: Arc::new(AuditLogServiceImpl::new(audit_repository)),
    };

    // Build router with routes
    let app = router(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "server running");

    axum::serve(listener, app).await?;

    Ok(())
}
