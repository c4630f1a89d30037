use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

fn one() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[serde(default = "one")]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}
