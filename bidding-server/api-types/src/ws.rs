use {
    crate::DealerId,
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::ToSchema,
};

/// A committed price change, fanned out to every viewer of the auction. The
/// same shape is used for the snapshot a viewer receives on connect, with
/// `dealer_id` set to null.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq, Eq)]
pub struct PriceUpdate {
    #[schema(example = 1100)]
    pub price:     i64,
    #[schema(value_type = Option<i64>)]
    pub dealer_id: Option<DealerId>,
}
