//! Collection queries: equality, range and membership filters plus compound ordering.
//!
//! Evaluation lives here so every backend filters and sorts identically.

use serde_json::Value;
use std::cmp::Ordering;

use super::document::{CollectionPath, Document};

/// Field a filter or ordering refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    /// A top-level field of the document data.
    Field(String),
    /// The document id (last path segment).
    DocumentId,
}

impl From<&str> for FieldPath {
    fn from(field: &str) -> Self {
        FieldPath::Field(field.to_string())
    }
}

impl FieldPath {
    fn resolve<'a>(&self, doc: &'a Document, id_holder: &'a Value) -> Option<&'a Value> {
        match self {
            FieldPath::Field(name) => doc.get(name),
            FieldPath::DocumentId => Some(id_holder),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Field value equals one of the values of an array operand.
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: FieldPath,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    fn accepts(&self, actual: &Value) -> bool {
        let ord = || compare_values(actual, &self.value);
        match self.op {
            FilterOp::Eq => ord() == Ordering::Equal,
            // Range filters only match values of the same type class.
            FilterOp::Lt => same_class(actual, &self.value) && ord() == Ordering::Less,
            FilterOp::Lte => same_class(actual, &self.value) && ord() != Ordering::Greater,
            FilterOp::Gt => same_class(actual, &self.value) && ord() == Ordering::Greater,
            FilterOp::Gte => same_class(actual, &self.value) && ord() != Ordering::Less,
            FilterOp::In => self.value.as_array().is_some_and(|candidates| {
                candidates
                    .iter()
                    .any(|c| compare_values(actual, c) == Ordering::Equal)
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: FieldPath,
    pub direction: Direction,
}

/// Query over a single collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: CollectionPath,
    filters: Vec<Filter>,
    order_by: Vec<OrderBy>,
    limit: Option<usize>,
}

impl Query {
    pub fn collection(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, field: impl Into<FieldPath>, op: FilterOp, value: Value) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value,
        });
        self
    }

    pub fn where_eq(self, field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value.into())
    }

    pub fn where_lte(self, field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Lte, value.into())
    }

    pub fn where_in(self, field: impl Into<FieldPath>, values: Vec<Value>) -> Self {
        self.filter(field, FilterOp::In, Value::Array(values))
    }

    pub fn order_by(mut self, field: impl Into<FieldPath>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn collection_path(&self) -> &CollectionPath {
        &self.collection
    }

    /// Collection path as a string, for error contexts.
    pub fn collection_str(&self) -> &str {
        self.collection.as_str()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn orderings(&self) -> &[OrderBy] {
        &self.order_by
    }

    /// Whether `doc` lives in the queried collection and passes every filter.
    ///
    /// Documents missing a filtered or ordered field never match.
    pub fn matches(&self, doc: &Document) -> bool {
        if !self.collection.contains(&doc.path) {
            return false;
        }
        let id = Value::String(doc.id().to_string());
        let filters_pass = self.filters.iter().all(|filter| {
            filter
                .field
                .resolve(doc, &id)
                .is_some_and(|actual| filter.accepts(actual))
        });
        filters_pass
            && self
                .order_by
                .iter()
                .all(|o| o.field.resolve(doc, &id).is_some())
    }

    /// Filter, sort and truncate a candidate set.
    ///
    /// Documents equal on every ordering key are ordered by path.
    pub fn apply(&self, candidates: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut docs: Vec<Document> = candidates.into_iter().filter(|d| self.matches(d)).collect();
        docs.sort_by(|a, b| self.compare_docs(a, b));
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }

    fn compare_docs(&self, a: &Document, b: &Document) -> Ordering {
        let a_id = Value::String(a.id().to_string());
        let b_id = Value::String(b.id().to_string());
        for order in &self.order_by {
            let ord = match (order.field.resolve(a, &a_id), order.field.resolve(b, &b_id)) {
                (Some(x), Some(y)) => compare_values(x, y),
                _ => Ordering::Equal,
            };
            let ord = match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.path.cmp(&b.path)
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn same_class(a: &Value, b: &Value) -> bool {
    type_rank(a) == type_rank(b)
}

fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Ordering {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => {
            let x = a.as_f64().unwrap_or(f64::NAN);
            let y = b.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
    }
}

/// Total order over JSON values: null < bool < number < string < array < object.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xa, ya) in x.iter().zip(y.iter()) {
                let ord = compare_values(xa, ya);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            // Objects only need a stable order; compare by serialized form.
            Value::Object(x.clone())
                .to_string()
                .cmp(&Value::Object(y.clone()).to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::DocumentPath;
    use serde_json::json;

    fn doc(path: &str, data: Value) -> Document {
        let data = match data {
            Value::Object(map) => map,
            _ => panic!("test documents must be objects"),
        };
        Document::new(DocumentPath::parse(path).unwrap(), data)
    }

    fn matches_collection() -> CollectionPath {
        CollectionPath::parse("leagues/l1/tournaments/t1/matches").unwrap()
    }

    #[test]
    fn test_compare_values_cross_type_order() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(true), &json!(0)), Ordering::Less);
        assert_eq!(compare_values(&json!(10), &json!("1")), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(2.0)), Ordering::Equal);
        assert_eq!(compare_values(&json!(-1), &json!(3)), Ordering::Less);
    }

    #[test]
    fn test_equality_and_range_filters() {
        let docs = vec![
            doc("leagues/l1/tournaments/t1/matches/m1", json!({"status": "completed", "matchdayNumber": 1})),
            doc("leagues/l1/tournaments/t1/matches/m2", json!({"status": "completed", "matchdayNumber": 3})),
            doc("leagues/l1/tournaments/t1/matches/m3", json!({"status": "scheduled", "matchdayNumber": 2})),
            doc("leagues/l1/tournaments/t1/matches/m4", json!({"status": "completed", "matchdayNumber": "2"})),
        ];

        let query = Query::collection(matches_collection())
            .where_eq("status", "completed")
            .where_lte("matchdayNumber", 2);
        let result = query.apply(docs);

        let ids: Vec<&str> = result.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["m1"]);
    }

    #[test]
    fn test_compound_ordering_with_path_tie_break() {
        let docs = vec![
            doc("leagues/l1/tournaments/t1/standings/c", json!({"points": 6, "scoreDifference": 3})),
            doc("leagues/l1/tournaments/t1/standings/a", json!({"points": 6, "scoreDifference": 3})),
            doc("leagues/l1/tournaments/t1/standings/b", json!({"points": 9, "scoreDifference": -1})),
            doc("leagues/l1/tournaments/t1/standings/d", json!({"points": 6, "scoreDifference": 5})),
        ];
        let query = Query::collection(
            CollectionPath::parse("leagues/l1/tournaments/t1/standings").unwrap(),
        )
        .order_by("points", Direction::Descending)
        .order_by("scoreDifference", Direction::Descending);

        let ids: Vec<String> = query.apply(docs).iter().map(|d| d.id().to_string()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_membership_filter_on_document_id() {
        let docs = vec![
            doc("leagues/l1/teams/a", json!({"name": "A"})),
            doc("leagues/l1/teams/b", json!({"name": "B"})),
            doc("leagues/l1/teams/c", json!({"name": "C"})),
        ];
        let query = Query::collection(CollectionPath::parse("leagues/l1/teams").unwrap())
            .where_in(FieldPath::DocumentId, vec![json!("a"), json!("c"), json!("zz")]);

        let ids: Vec<String> = query.apply(docs).iter().map(|d| d.id().to_string()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_missing_order_field_excludes_document() {
        let docs = vec![
            doc("leagues/l1/players/p1", json!({"name": "Ann"})),
            doc("leagues/l1/players/p2", json!({"number": 4})),
        ];
        let query = Query::collection(CollectionPath::parse("leagues/l1/players").unwrap())
            .order_by("name", Direction::Ascending);
        assert_eq!(query.apply(docs).len(), 1);
    }

    #[test]
    fn test_other_collections_never_match() {
        let docs = vec![
            doc("leagues/l1/tournaments/t2/matches/m1", json!({"status": "completed"})),
            doc("leagues/l2/tournaments/t1/matches/m1", json!({"status": "completed"})),
        ];
        let query = Query::collection(matches_collection()).where_eq("status", "completed");
        assert!(query.apply(docs).is_empty());
    }

    #[test]
    fn test_limit_truncates_after_sort() {
        let docs = (1..=5)
            .map(|n| doc(&format!("leagues/l1/players/p{}", n), json!({"number": n})))
            .collect::<Vec<_>>();
        let query = Query::collection(CollectionPath::parse("leagues/l1/players").unwrap())
            .order_by("number", Direction::Descending)
            .limit(2);
        let numbers: Vec<i64> = query
            .apply(docs)
            .iter()
            .filter_map(|d| d.get("number").and_then(Value::as_i64))
            .collect();
        assert_eq!(numbers, vec![5, 4]);
    }
}
