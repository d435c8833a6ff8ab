#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Customer {
    pub id: String,
    pub name: String,
}
