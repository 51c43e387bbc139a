// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use serde_json::json;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

use alma_remote::RemoteGateway;
use alma_store::{Gateway, GatewayError, ListFilter};

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid content type header")
}

#[test]
fn unreachable_backend_surfaces_a_connection_error() {
    let gateway = RemoteGateway::new("http://127.0.0.1:1", None, Duration::from_millis(50))
        .expect("gateway should initialize");
    let error = gateway
        .list("fees", &ListFilter::new())
        .expect_err("nothing listens on port 1");
    assert!(matches!(error, GatewayError::Connection(_)));
}

#[test]
fn list_sends_filters_and_api_key_and_decodes_rows() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/tables/fees?student_id=7");
        let has_key = request
            .headers()
            .iter()
            .any(|header| {
                header.field.equiv("x-api-key") && header.value.as_str() == "secret-key"
            });
        assert!(has_key, "api key header missing");

        let body = json!([
            {"id": 1, "student_id": 7, "amount_cents": 50_000},
            {"id": 2, "student_id": 7, "amount_cents": 20_000},
        ])
        .to_string();
        let response = Response::from_string(body)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let gateway = RemoteGateway::new(&addr, Some("secret-key"), Duration::from_secs(1))?;
    let rows = gateway
        .list("fees", &ListFilter::new().eq("student_id", 7))
        .map_err(|error| anyhow!("{error}"))?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("amount_cents"), Some(&json!(50_000)));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn insert_posts_the_row_and_returns_the_assigned_id() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/tables/companies");
        assert_eq!(request.method(), &tiny_http::Method::Post);

        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("read request body");
        assert!(body.contains("Trellis Systems"));

        let response = Response::from_string(
            json!({"id": 41, "name": "Trellis Systems", "industry": "Software"}).to_string(),
        )
        .with_status_code(201)
        .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let gateway = RemoteGateway::new(&addr, None, Duration::from_secs(1))?;
    let row = gateway
        .insert(
            "companies",
            json!({"name": "Trellis Systems", "industry": "Software"})
                .as_object()
                .expect("object")
                .clone(),
        )
        .map_err(|error| anyhow!("{error}"))?;
    assert_eq!(row.get("id"), Some(&json!(41)));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn update_patches_and_delete_maps_missing_rows_to_not_found() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("patch request expected");
        assert_eq!(request.url(), "/tables/fees/9");
        assert_eq!(request.method(), &tiny_http::Method::Patch);
        let response = Response::from_string(
            json!({"id": 9, "paid_cents": 50_000, "amount_cents": 50_000}).to_string(),
        )
        .with_status_code(200)
        .with_header(json_header());
        request.respond(response).expect("response should succeed");

        let request = server.recv().expect("delete request expected");
        assert_eq!(request.url(), "/tables/fees/12");
        assert_eq!(request.method(), &tiny_http::Method::Delete);
        let response = Response::from_string(json!({"error": "no such row"}).to_string())
            .with_status_code(404)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let gateway = RemoteGateway::new(&addr, None, Duration::from_secs(1))?;
    let updated = gateway
        .update(
            "fees",
            9,
            json!({"paid_cents": 50_000}).as_object().expect("object").clone(),
        )
        .map_err(|error| anyhow!("{error}"))?;
    assert_eq!(updated.get("paid_cents"), Some(&json!(50_000)));

    let missing = gateway.delete("fees", 12).expect_err("missing row");
    match missing {
        GatewayError::NotFound { table, id } => {
            assert_eq!(table, "fees");
            assert_eq!(id, 12);
        }
        other => panic!("expected NotFound, got {other}"),
    }

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn permission_and_constraint_failures_map_to_their_variants() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("first request expected");
        let response = Response::from_string(json!({"error": "api key revoked"}).to_string())
            .with_status_code(403)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");

        let request = server.recv().expect("second request expected");
        let response =
            Response::from_string(json!({"error": "amount_cents must be positive"}).to_string())
                .with_status_code(422)
                .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let gateway = RemoteGateway::new(&addr, Some("stale"), Duration::from_secs(1))?;

    let denied = gateway
        .list("fees", &ListFilter::new())
        .expect_err("revoked key");
    match denied {
        GatewayError::Denied(message) => assert_eq!(message, "api key revoked"),
        other => panic!("expected Denied, got {other}"),
    }

    let rejected = gateway
        .insert(
            "fees",
            json!({"amount_cents": -1}).as_object().expect("object").clone(),
        )
        .expect_err("constraint violation");
    match rejected {
        GatewayError::Rejected(message) => {
            assert_eq!(message, "amount_cents must be positive");
        }
        other => panic!("expected Rejected, got {other}"),
    }

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn non_json_success_bodies_are_decode_errors() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string("<html>load balancer splash</html>")
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let gateway = RemoteGateway::new(&addr, None, Duration::from_secs(1))?;
    let error = gateway
        .list("books", &ListFilter::new())
        .expect_err("html is not rows");
    assert!(matches!(error, GatewayError::Decode(_)));

    handle.join().expect("server thread should join");
    Ok(())
}
