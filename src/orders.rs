use crate::access::require_staff;
use crate::error::ServiceError;
use crate::models::{LineDetails, OrderSummary, Role};
use crate::store::Store;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct OrderLineView {
    #[serde(flatten)]
    pub line: LineDetails,
    pub subtotal: Decimal,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub summary: OrderSummary,
    pub lines: Vec<OrderLineView>,
}

/// Every order, newest first, with its lines. Managers and admins only.
pub fn list_orders<S: Store>(store: &mut S, role: Role) -> Result<Vec<OrderWithLines>, ServiceError> {
    require_staff(role)?;
    let summaries = store.order_summaries()?;
    let ids: Vec<i32> = summaries.iter().map(|summary| summary.order.id).collect();
    let lines = store.order_lines(&ids)?;

    let orders = summaries
        .into_iter()
        .map(|summary| {
            let order_lines = lines
                .iter()
                .filter(|details| details.line.order_id == summary.order.id)
                .map(|details| OrderLineView {
                    subtotal: details.line.subtotal(),
                    line: details.clone(),
                })
                .collect();
            OrderWithLines {
                summary,
                lines: order_lines,
            }
        })
        .collect();
    Ok(orders)
}
