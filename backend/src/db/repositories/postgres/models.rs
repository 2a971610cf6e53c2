use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::{Map, Value};

use super::schema::documents;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // collection and updated_at are only filtered on
pub struct DocumentRow {
    pub path: String,
    pub collection: String,
    pub data: Value,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRow {
    /// Field map of the row; a non-object payload reads as empty.
    pub fn into_fields(self) -> Map<String, Value> {
        match self.data {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = documents)]
pub struct NewDocumentRow {
    pub path: String,
    pub collection: String,
    pub data: Value,
    pub updated_at: DateTime<Utc>,
}
