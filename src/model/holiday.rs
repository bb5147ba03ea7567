use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Company-wide day off. At most one per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    #[schema(example = "2025-10-20", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "Diwali")]
    pub name: String,

    #[schema(example = "Festival of lights", nullable = true)]
    pub description: Option<String>,
}
