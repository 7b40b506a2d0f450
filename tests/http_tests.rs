//! HTTP tests for the `ListQuery` extractor and `ListRouterBuilder`

use axum::http::StatusCode;
use axum_test::TestServer;
use list_query::prelude::*;

async fn list_modifications(query: ListQuery<Modifications>) -> Json<Value> {
    let options = query.into_inner();
    Json(json!({
        "page": options.page,
        "per_page": options.per_page,
        "sort": options.sort.as_ref().map(|s| s.to_param()),
        "search": options.search,
        "filters": options.filters,
        "includes": options.includes,
    }))
}

async fn list_cars(query: ListQuery<Cars>) -> Json<PaginatedResponse<Value>> {
    let cars = vec![
        json!({ "name": "Corolla", "brand": "Toyota" }),
        json!({ "name": "Civic", "brand": "Honda" }),
    ];
    let total = cars.len() as u64;
    Json(PaginatedResponse::new(cars, &query, total))
}

fn make_server() -> TestServer {
    let app = ListRouterBuilder::new()
        .list::<Modifications, _, _>(list_modifications)
        .list::<Cars, _, _>(list_cars)
        .build();
    TestServer::try_new(app).unwrap()
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = make_server();

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_resources_endpoint_lists_mounted_resources() {
        let server = make_server();

        let response = server.get("/resources").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["resources"], json!(["modifications", "cars"]));
    }
}

mod list_tests {
    use super::*;

    #[tokio::test]
    async fn test_valid_query_reaches_handler() {
        let server = make_server();

        let response = server
            .get("/modifications")
            .add_raw_query_param("sort=-installation_date&filter[car_id]=7&page=2&include=car")
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["page"], 2);
        assert_eq!(body["per_page"], 15);
        assert_eq!(body["sort"], "-installation_date");
        assert_eq!(body["filters"], json!({ "car_id": "7" }));
        assert_eq!(body["includes"], json!(["car"]));
    }

    #[tokio::test]
    async fn test_no_query_uses_defaults() {
        let server = make_server();

        let response = server.get("/modifications").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["page"], 1);
        assert_eq!(body["sort"], Value::Null);
        assert_eq!(body["filters"], json!({}));
    }

    #[tokio::test]
    async fn test_paginated_response_shape() {
        let server = make_server();

        let response = server
            .get("/cars")
            .add_raw_query_param("sort=-year&filter[brand]=Toyota&per_page=1")
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["pagination"]["per_page"], 1);
        assert_eq!(body["pagination"]["total"], 2);
        assert_eq!(body["pagination"]["has_next"], true);
    }
}

mod rejection_tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_query_returns_422_with_every_field() {
        let server = make_server();

        let response = server
            .get("/modifications")
            .add_raw_query_param("sort=price&filter[owner]=me&include=driver&page=0")
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let fields = body["details"]["fields"].as_array().unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f["field"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["page", "sort", "filter[owner]", "include"]);

        let reasons: Vec<&str> = fields.iter().map(|f| f["reason"].as_str().unwrap()).collect();
        assert_eq!(
            reasons,
            vec![
                "invalid_pagination",
                "invalid_enum_value",
                "unknown_filter_field",
                "unknown_include_value",
            ]
        );
    }

    #[tokio::test]
    async fn test_whitelists_are_per_resource() {
        let server = make_server();

        // car_id is a modifications filter, not a cars filter
        server
            .get("/modifications")
            .add_raw_query_param("filter[car_id]=3")
            .await
            .assert_status_ok();

        server
            .get("/cars")
            .add_raw_query_param("filter[car_id]=3")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_search_too_long_rejected() {
        let server = make_server();

        let response = server
            .get("/cars")
            .add_raw_query_param(&format!("search={}", "a".repeat(256)))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        assert_eq!(body["details"]["fields"][0]["reason"], "field_too_long");
    }
}
