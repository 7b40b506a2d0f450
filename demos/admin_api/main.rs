//! Car admin list API
//!
//! Serves `/cars` and `/modifications` from in-memory data, with every list
//! query validated against the resource whitelist.
//!
//! ```text
//! cargo run --example admin_api
//! curl 'http://127.0.0.1:3000/modifications?sort=-installation_date&filter[car_id]=1&include=car'
//! curl 'http://127.0.0.1:3000/cars?sort=price'   # 422
//! ```

use list_query::prelude::*;
use std::cmp::Ordering;

fn cars() -> Vec<Value> {
    vec![
        json!({ "id": 1, "name": "Corolla", "brand": "Toyota", "model": "E210", "year": 2021, "created_at": "2024-01-10" }),
        json!({ "id": 2, "name": "Civic", "brand": "Honda", "model": "FL", "year": 2022, "created_at": "2024-02-03" }),
        json!({ "id": 3, "name": "Supra", "brand": "Toyota", "model": "A90", "year": 2020, "created_at": "2024-03-21" }),
    ]
}

fn modifications() -> Vec<Value> {
    vec![
        json!({ "id": 1, "car_id": 1, "name": "Cold air intake", "installation_date": "2024-04-01", "is_active": true, "created_at": "2024-04-01" }),
        json!({ "id": 2, "car_id": 3, "name": "Turbo kit", "installation_date": "2024-05-12", "is_active": true, "created_at": "2024-05-10" }),
        json!({ "id": 3, "car_id": 1, "name": "Coilovers", "installation_date": "2024-06-30", "is_active": false, "created_at": "2024-06-29" }),
    ]
}

/// Text form used to compare a field against a filter value
fn field_text(item: &Value, field: &str) -> String {
    match &item[field] {
        Value::String(s) => s.clone(),
        Value::Bool(b) => {
            if *b {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        other => other.to_string(),
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Stand-in for a data-access layer
fn run_query(mut items: Vec<Value>, options: &ValidatedQueryOptions) -> PaginatedResponse<Value> {
    items.retain(|item| {
        options
            .filters
            .iter()
            .all(|(field, value)| field_text(item, field) == *value)
    });

    if let Some(search) = &options.search {
        let needle = search.to_lowercase();
        items.retain(|item| field_text(item, "name").to_lowercase().contains(&needle));
    }

    if let Some(sort) = &options.sort {
        items.sort_by(|a, b| {
            let ord = compare(&a[&sort.field], &b[&sort.field]);
            if sort.is_descending() { ord.reverse() } else { ord }
        });
    }

    let total = items.len() as u64;
    let page: Vec<Value> = items
        .into_iter()
        .skip(options.offset() as usize)
        .take(options.limit() as usize)
        .collect();
    PaginatedResponse::new(page, options, total)
}

async fn list_cars(query: ListQuery<Cars>) -> Json<PaginatedResponse<Value>> {
    let mut response = run_query(cars(), &query);
    if query.includes("modifications") {
        let all = modifications();
        for car in &mut response.data {
            let related: Vec<Value> = all
                .iter()
                .filter(|m| m["car_id"] == car["id"])
                .cloned()
                .collect();
            car["modifications"] = Value::Array(related);
        }
    }
    Json(response)
}

async fn list_modifications(query: ListQuery<Modifications>) -> Json<PaginatedResponse<Value>> {
    let mut response = run_query(modifications(), &query);
    if query.includes("car") {
        let all = cars();
        for modification in &mut response.data {
            let car = all
                .iter()
                .find(|c| c["id"] == modification["car_id"])
                .cloned()
                .unwrap_or(Value::Null);
            modification["car"] = car;
        }
    }
    Json(response)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    ListRouterBuilder::new()
        .list::<Cars, _, _>(list_cars)
        .list::<Modifications, _, _>(list_modifications)
        .serve("127.0.0.1:3000")
        .await
}
