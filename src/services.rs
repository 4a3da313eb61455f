pub mod audit_service;
pub mod auth_service;
pub mod brand_service;
pub mod category_service;
pub mod customer_service;
pub mod employee_service;
pub mod hero_service;
pub mod order_service;
pub mod product_service;
pub mod review_service;
pub mod shipping_service;
