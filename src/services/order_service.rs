use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::audit::AuditContext;
use crate::models::order::{CreateOrderRequest, Order, OrderStatus, UpdateOrderRequest};
use crate::repositories::order_repository::OrderRepository;
use crate::repositories::RepositoryError;
use crate::services::audit_service::{self, AuditRecorder};

const TARGET_MODEL: &str = "Order";

/// Order service errors
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for OrderError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => OrderError::NotFound,
            RepositoryError::ConstraintViolation(msg) => OrderError::Validation(msg),
            RepositoryError::DatabaseError(msg) => OrderError::DatabaseError(msg),
        }
    }
}

#[async_trait]
pub trait OrderService: Send + Sync {
    async fn list(&self) -> Result<Vec<Order>, OrderError>;
    async fn get(&self, id: Uuid) -> Result<Order, OrderError>;
    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateOrderRequest,
    ) -> Result<Order, OrderError>;
    /// Status changes and shipping corrections; any status transition is
    /// accepted here.
    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateOrderRequest,
    ) -> Result<Order, OrderError>;
    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), OrderError>;
}

/// Implementation of OrderService
pub struct OrderServiceImpl {
    repository: Arc<dyn OrderRepository>,
    audit: Arc<AuditRecorder>,
}

impl OrderServiceImpl {
    pub fn new(repository: Arc<dyn OrderRepository>, audit: Arc<AuditRecorder>) -> Self {
        Self { repository, audit }
    }

    async fn fail(
        &self,
        ctx: &AuditContext,
        action: &str,
        target_id: Option<Uuid>,
        error: OrderError,
    ) -> OrderError {
        self.audit
            .failure(ctx, action, TARGET_MODEL, target_id, &error.to_string())
            .await;
        error
    }

    fn snapshot(order: &Order) -> Value {
        serde_json::to_value(order).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl OrderService for OrderServiceImpl {
    async fn list(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.repository.find_all().await?)
    }

    async fn get(&self, id: Uuid) -> Result<Order, OrderError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound)
    }

    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateOrderRequest,
    ) -> Result<Order, OrderError> {
        const ACTION: &str = "order.create";

        if request.items.is_empty() {
            let error = OrderError::Validation("Order must contain at least one item".to_string());
            return Err(self.fail(ctx, ACTION, None, error).await);
        }

        let items_total: Decimal = request
            .items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum();

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            customer_id: request.customer_id,
            items: request.items,
            status: OrderStatus::Pending,
            shipping_address: request.shipping_address,
            shipping_cost: request.shipping_cost,
            total: items_total + request.shipping_cost,
            created_at: now,
            updated_at: now,
        };

        let created = match self.repository.insert(&order).await {
            Ok(created) => created,
            Err(error) => return Err(self.fail(ctx, ACTION, None, error.into()).await),
        };

        let changes = audit_service::creation_changes(&Self::snapshot(&created));
        self.audit
            .success(
                ctx,
                ACTION,
                TARGET_MODEL,
                Some(created.id),
                changes,
                json!({ "customer_id": created.customer_id, "item_count": created.items.len() }),
            )
            .await;
        Ok(created)
    }

    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateOrderRequest,
    ) -> Result<Order, OrderError> {
        const ACTION: &str = "order.update";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), OrderError::NotFound).await),
        };

        let mut updated = existing.clone();
        if let Some(status) = request.status {
            updated.status = status;
        }
        if let Some(shipping_address) = request.shipping_address.clone() {
            updated.shipping_address = shipping_address;
        }
        if let Some(shipping_cost) = request.shipping_cost {
            // Keep the total consistent with the adjusted cost.
            updated.total = updated.total - updated.shipping_cost + shipping_cost;
            updated.shipping_cost = shipping_cost;
        }
        updated.updated_at = Utc::now();

        let stored = match self.repository.update(&updated).await {
            Ok(stored) => stored,
            Err(error) => return Err(self.fail(ctx, ACTION, Some(id), error.into()).await),
        };

        let fields = request.changed_fields();
        let changes = audit_service::diff(
            &Self::snapshot(&existing),
            &Self::snapshot(&stored),
            fields.iter().copied(),
        );
        self.audit
            .success(
                ctx,
                ACTION,
                TARGET_MODEL,
                Some(stored.id),
                changes,
                json!({ "fields": fields }),
            )
            .await;
        Ok(stored)
    }

    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), OrderError> {
        const ACTION: &str = "order.delete";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), OrderError::NotFound).await),
        };

        if let Err(error) = self.repository.delete(id).await {
            return Err(self.fail(ctx, ACTION, Some(id), error.into()).await);
        }

        let changes = audit_service::deletion_changes(&Self::snapshot(&existing));
        self.audit
            .success(
                ctx,
                ACTION,
                TARGET_MODEL,
                Some(id),
                changes,
                json!({ "customer_id": existing.customer_id }),
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::OrderItem;
    use crate::services::audit_service::testing::MockAuditRepository;
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Mutex;

    struct MockOrderRepository {
        orders: Mutex<HashMap<Uuid, Order>>,
    }

    impl MockOrderRepository {
        fn new() -> Self {
            Self {
                orders: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl OrderRepository for MockOrderRepository {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
            Ok(self.orders.lock().unwrap().get(&id).cloned())
        }

        async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
            Ok(self.orders.lock().unwrap().values().cloned().collect())
        }

        async fn insert(&self, order: &Order) -> Result<Order, RepositoryError> {
            self.orders.lock().unwrap().insert(order.id, order.clone());
            Ok(order.clone())
        }

        async fn update(&self, order: &Order) -> Result<Order, RepositoryError> {
            let mut orders = self.orders.lock().unwrap();
            if !orders.contains_key(&order.id) {
                return Err(RepositoryError::NotFound);
            }
            orders.insert(order.id, order.clone());
            Ok(order.clone())
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
            self.orders
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        }
    }

    fn service() -> (OrderServiceImpl, Arc<MockAuditRepository>) {
        let audit_log = Arc::new(MockAuditRepository::new());
        let service = OrderServiceImpl::new(
            Arc::new(MockOrderRepository::new()),
            Arc::new(AuditRecorder::new(audit_log.clone())),
        );
        (service, audit_log)
    }

    fn ctx() -> AuditContext {
        AuditContext {
            actor_id: Uuid::new_v4(),
            actor_name: "Test Admin".to_string(),
            ip_address: None,
            user_agent: None,
        }
    }

    fn create_request() -> CreateOrderRequest {
        CreateOrderRequest {
            customer_id: Uuid::new_v4(),
            items: vec![OrderItem {
                product_id: Uuid::new_v4(),
                name: "Trail Runner".to_string(),
                quantity: 2,
                unit_price: Decimal::from_str("59.90").unwrap(),
            }],
            shipping_address: "1 Main St".to_string(),
            shipping_cost: Decimal::from_str("5.00").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_computes_total() {
        let (service, _) = service();
        let created = service.create(&ctx(), create_request()).await.unwrap();
        assert_eq!(created.status, OrderStatus::Pending);
        assert_eq!(created.total, Decimal::from_str("124.80").unwrap());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_order() {
        let (service, _) = service();
        let mut request = create_request();
        request.items.clear();
        let result = service.create(&ctx(), request).await;
        assert!(matches!(result.unwrap_err(), OrderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_status_change_is_audited() {
        let (service, audit_log) = service();
        let created = service.create(&ctx(), create_request()).await.unwrap();

        let request = UpdateOrderRequest {
            status: Some(OrderStatus::Shipped),
            ..Default::default()
        };
        service.update(&ctx(), created.id, request).await.unwrap();

        let entry = audit_log.recorded().into_iter().last().unwrap();
        assert_eq!(entry.action, "order.update");
        assert_eq!(
            entry.changes["status"],
            json!({ "oldValue": "pending", "newValue": "shipped" })
        );
    }

    #[tokio::test]
    async fn test_shipping_cost_change_keeps_total_consistent() {
        let (service, _) = service();
        let created = service.create(&ctx(), create_request()).await.unwrap();

        let request = UpdateOrderRequest {
            shipping_cost: Some(Decimal::from_str("10.00").unwrap()),
            ..Default::default()
        };
        let updated = service.update(&ctx(), created.id, request).await.unwrap();
        assert_eq!(updated.total, Decimal::from_str("129.80").unwrap());
    }
}
