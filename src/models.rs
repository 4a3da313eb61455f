pub mod audit;
pub mod auth;
pub mod brand;
pub mod category;
pub mod customer;
pub mod employee;
pub mod hero;
pub mod order;
pub mod product;
pub mod review;
pub mod shipping;

pub use audit::{AuditContext, AuditEntry, AuditLogFilter, AuditStatus, NewAuditEntry};
pub use auth::{AuthToken, AuthenticatedEmployee, LoginRequest};
pub use brand::{Brand, CreateBrandRequest, UpdateBrandRequest};
pub use category::{
    Category, CategoryDeletion, CategoryTableRow, CreateCategoryRequest, UpdateCategoryRequest,
};
pub use customer::{Customer, UpdateCustomerRequest};
pub use employee::{CreateEmployeeRequest, Employee, UpdateEmployeeRequest};
pub use hero::{CreateHeroRequest, HeroSlide, UpdateHeroRequest};
pub use order::{CreateOrderRequest, Order, OrderItem, OrderStatus, UpdateOrderRequest};
pub use product::{CreateProductRequest, Product, UpdateProductRequest};
pub use review::{Review, UpdateReviewRequest};
pub use shipping::{CreateShippingRequest, ShippingZone, UpdateShippingRequest};
