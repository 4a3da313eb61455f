//! Permission strings and the gate that evaluates them.
//!
//! Every mutating route names a required permission as `"<entity>.<verb>"`.
//! Employees carry a granted set; a grant of `"<entity>.*"` covers every verb
//! on that entity and `"*"` covers everything.

/// Decides whether a granted permission set satisfies a required permission.
pub trait PermissionGate: Send + Sync {
    fn allows(&self, granted: &[String], required: &str) -> bool;
}

/// Default gate: exact match plus `*` and `<entity>.*` wildcards.
pub struct WildcardGate;

impl PermissionGate for WildcardGate {
    fn allows(&self, granted: &[String], required: &str) -> bool {
        granted.iter().any(|grant| {
            if grant == required || grant == "*" {
                return true;
            }
            match grant.strip_suffix(".*") {
                Some(prefix) => required
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('.')),
                None => false,
            }
        })
    }
}

pub mod perm {
    pub const CATEGORIES_CREATE: &str = "categories.create";
    pub const CATEGORIES_UPDATE: &str = "categories.update";
    pub const CATEGORIES_DELETE: &str = "categories.delete";
    pub const PRODUCTS_CREATE: &str = "products.create";
    pub const PRODUCTS_UPDATE: &str = "products.update";
    pub const PRODUCTS_DELETE: &str = "products.delete";
    pub const BRANDS_CREATE: &str = "brands.create";
    pub const BRANDS_UPDATE: &str = "brands.update";
    pub const BRANDS_DELETE: &str = "brands.delete";
    pub const ORDERS_CREATE: &str = "orders.create";
    pub const ORDERS_UPDATE: &str = "orders.update";
    pub const ORDERS_DELETE: &str = "orders.delete";
    pub const CUSTOMERS_UPDATE: &str = "customers.update";
    pub const CUSTOMERS_DELETE: &str = "customers.delete";
    pub const EMPLOYEES_CREATE: &str = "employees.create";
    pub const EMPLOYEES_UPDATE: &str = "employees.update";
    pub const EMPLOYEES_DELETE: &str = "employees.delete";
    pub const REVIEWS_UPDATE: &str = "reviews.update";
    pub const REVIEWS_DELETE: &str = "reviews.delete";
    pub const SHIPPING_CREATE: &str = "shipping.create";
    pub const SHIPPING_UPDATE: &str = "shipping.update";
    pub const SHIPPING_DELETE: &str = "shipping.delete";
    pub const HEROES_CREATE: &str = "heroes.create";
    pub const HEROES_UPDATE: &str = "heroes.update";
    pub const HEROES_DELETE: &str = "heroes.delete";
}
