use serde::Deserialize;

use crate::domain::UnknownVariant;
use crate::domain::order::OrderStatus;

/// Status dropdown submitted from the orders table and the order detail view.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusForm {
    pub status: String,
}

impl UpdateOrderStatusForm {
    pub fn into_status(self) -> Result<OrderStatus, UnknownVariant> {
        OrderStatus::try_from(self.status.as_str())
    }
}
