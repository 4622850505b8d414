//! API integration tests
//!
//! These drive a running server with a seeded `admin`/`admin` staff account.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";
const MEDIA_URL: &str = "http://localhost:8080";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// A CPF that no other test run has used
fn unique_cpf() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64;
    let n = (nanos / 1000 + SEQUENCE.fetch_add(1, Ordering::SeqCst)) % 100_000_000_000;
    format!("{:011}", n)
}

async fn create_client(client: &Client, token: &str) -> Value {
    let response = client
        .post(format!("{}/clientes/", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "nome": "Maria Teste",
            "cpf": unique_cpf(),
            "email": "maria@example.com",
            "telefone": "11999990000",
            "endereco": "Rua A, 1",
            "data_nascimento": "1990-05-10"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn create_equipment(client: &Client, token: &str, rate: &str) -> Value {
    let response = client
        .post(format!("{}/equipamentos/", BASE_URL))
        .bearer_auth(token)
        .json(&json!({"nome": "Betoneira Teste", "valor_diario": rate}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn get_json(client: &Client, token: &str, path: &str) -> Value {
    let response = client
        .get(format!("{}{}", BASE_URL, path))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success(), "GET {} -> {}", path, response.status());
    response.json().await.expect("Failed to parse response")
}

/// Amounts travel as decimal strings
fn amount(value: &Value) -> f64 {
    value.as_str().expect("amount is not a string").parse().unwrap()
}

async fn delete(client: &Client, token: &str, path: &str) -> StatusCode {
    client
        .delete(format!("{}{}", BASE_URL, path))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .status()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["username"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let body = get_json(&client, &token, "/auth/me").await;
    assert_eq!(body["username"], "admin");
    assert_eq!(body["is_staff"], true);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    for path in ["/clientes/", "/equipamentos/", "/alugueis/", "/dashboard/stats/"] {
        let response = client
            .get(format!("{}{}", BASE_URL, path))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", path);
    }
}

#[tokio::test]
#[ignore]
async fn test_client_crud_and_duplicate_cpf() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let created = create_client(&client, &token).await;
    let id = created["id"].as_i64().expect("No client ID");
    let cpf = created["cpf"].as_str().unwrap().to_string();
    assert_eq!(cpf.len(), 14, "CPF is stored formatted: {}", cpf);

    // Same digits, different punctuation
    let digits: String = cpf.chars().filter(|c| c.is_ascii_digit()).collect();
    let response = client
        .post(format!("{}/clientes/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "nome": "Outra Pessoa",
            "cpf": digits,
            "email": "outra@example.com",
            "telefone": "11988887777",
            "endereco": "Rua B, 2",
            "data_nascimento": "1985-01-01"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("CPF"));

    let response = client
        .put(format!("{}/clientes/{}/", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({
            "nome": "Maria Alterada",
            "cpf": cpf,
            "email": "maria@example.com",
            "telefone": "11999990000",
            "endereco": "Rua C, 3",
            "data_nascimento": "1990-05-10"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["nome"], "Maria Alterada");

    assert_eq!(delete(&client, &token, &format!("/clientes/{}/", id)).await, StatusCode::NO_CONTENT);
    let response = client
        .get(format!("{}/clientes/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_client_rejects_unknown_fields() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/clientes/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({"nome": "X", "apelido": "Y"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_equipment_multipart_photo() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let form = multipart::Form::new()
        .text("nome", "Serra Circular")
        .text("status", "disponivel")
        .text("valor_diario", "48.00")
        .part(
            "foto",
            multipart::Part::bytes(b"\x89PNG fake".to_vec()).file_name("serra.png"),
        );
    let response = client
        .post(format!("{}/equipamentos/", BASE_URL))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_i64().unwrap();
    assert_eq!(amount(&body["valor_diario"]), 48.0);
    assert_eq!(amount(&body["valor_por_hora"]), 2.0);
    let photo_url = body["foto"].as_str().expect("No photo URL").to_string();

    // Photos are only served to staff
    let response = client
        .get(format!("{}{}", MEDIA_URL, photo_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = client
        .get(format!("{}{}", MEDIA_URL, photo_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.headers()["content-type"], "image/png");

    // Partial multipart update keeps the other fields
    let form = multipart::Form::new().text("status", "manutencao");
    let response = client
        .patch(format!("{}/equipamentos/{}/", BASE_URL, id))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "manutencao");
    assert_eq!(body["nome"], "Serra Circular");
    assert_eq!(body["foto"], photo_url.as_str());

    assert_eq!(delete(&client, &token, &format!("/equipamentos/{}/", id)).await, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_rental_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let renter = create_client(&client, &token).await;
    let equipment = create_equipment(&client, &token, "240.00").await;
    let equipment_path = format!("/equipamentos/{}/", equipment["id"]);
    assert_eq!(equipment["status"], "disponivel");

    let response = client
        .post(format!("{}/alugueis/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "cliente": renter["id"].to_string(),
            "equipamento": equipment["id"],
            "data_inicio": "2024-01-01T00:00:00Z",
            "status": "aberto"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let rental: Value = response.json().await.unwrap();
    let rental_id = rental["id"].as_i64().unwrap();
    assert!(rental["valor_total"].is_null());
    assert_eq!(get_json(&client, &token, &equipment_path).await["status"], "alugado");

    let response = client
        .post(format!("{}/alugueis/{}/close/", BASE_URL, rental_id))
        .bearer_auth(&token)
        .json(&json!({"status": "fechado", "data_fim": "2024-01-02T00:00:00Z"}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let closed: Value = response.json().await.unwrap();
    assert_eq!(closed["status"], "fechado");
    assert_eq!(amount(&closed["valor_total"]), 240.0);
    assert_eq!(closed["duracao_horas"].as_str().unwrap().parse::<f64>().unwrap(), 24.0);
    assert_eq!(get_json(&client, &token, &equipment_path).await["status"], "disponivel");

    // End before start is refused
    let response = client
        .put(format!("{}/alugueis/{}/", BASE_URL, rental_id))
        .bearer_auth(&token)
        .json(&json!({"data_fim": "2023-12-31T00:00:00Z"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(delete(&client, &token, &format!("/alugueis/{}/", rental_id)).await, StatusCode::NO_CONTENT);
    assert_eq!(delete(&client, &token, &format!("/clientes/{}/", renter["id"])).await, StatusCode::NO_CONTENT);
    assert_eq!(delete(&client, &token, &equipment_path).await, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_deleting_active_rental_frees_equipment() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let renter = create_client(&client, &token).await;
    let equipment = create_equipment(&client, &token, "10.00").await;
    let equipment_path = format!("/equipamentos/{}/", equipment["id"]);

    let response = client
        .post(format!("{}/alugueis/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "cliente": renter["id"],
            "equipamento": equipment["id"],
            "data_inicio": "2024-06-01T09:00",
            "status": "em_andamento"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let rental: Value = response.json().await.unwrap();
    assert_eq!(get_json(&client, &token, &equipment_path).await["status"], "alugado");

    assert_eq!(delete(&client, &token, &format!("/alugueis/{}/", rental["id"])).await, StatusCode::NO_CONTENT);
    assert_eq!(get_json(&client, &token, &equipment_path).await["status"], "disponivel");

    delete(&client, &token, &format!("/clientes/{}/", renter["id"])).await;
    delete(&client, &token, &equipment_path).await;
}

#[tokio::test]
#[ignore]
async fn test_expiry_sweep() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let renter = create_client(&client, &token).await;
    let equipment = create_equipment(&client, &token, "24.00").await;
    let equipment_path = format!("/equipamentos/{}/", equipment["id"]);

    let response = client
        .post(format!("{}/alugueis/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "cliente": renter["id"],
            "equipamento": equipment["id"],
            "data_inicio": "2024-02-27T00:00:00Z",
            "data_fim": "2024-02-28T00:00:00Z",
            "status": "aberto",
            "observacoes": "Entrega na obra"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let rental: Value = response.json().await.unwrap();
    // The charge is settled as soon as an end date exists
    assert_eq!(amount(&rental["valor_total"]), 24.0);

    let response = client
        .post(format!("{}/alugueis/check-expired/", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert!(body["closed_count"].as_u64().unwrap() >= 1);
    assert!(body["message"].is_string());

    let swept = get_json(&client, &token, &format!("/alugueis/{}/", rental["id"])).await;
    assert_eq!(swept["status"], "fechado");
    let notes = swept["observacoes"].as_str().unwrap();
    assert!(notes.starts_with("Entrega na obra\n[Auto-closed on "));
    assert_eq!(get_json(&client, &token, &equipment_path).await["status"], "disponivel");

    delete(&client, &token, &format!("/clientes/{}/", renter["id"])).await;
    delete(&client, &token, &equipment_path).await;
}

#[tokio::test]
#[ignore]
async fn test_get_dashboard_stats() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let body = get_json(&client, &token, "/dashboard/stats/").await;
    assert!(body["active_rentals"].is_number());
    assert!(body["monthly_revenue"].is_string());
    assert!(body["available_equipment"].is_number());
    assert!(body["recent_rentals"].as_array().unwrap().len() <= 5);
    for status in ["disponivel", "alugado", "manutencao", "indisponivel"] {
        assert!(body["equipment_stats"][status]["count"].is_number(), "{}", status);
        assert!(body["equipment_stats"][status]["label"].is_string(), "{}", status);
    }
}

#[tokio::test]
#[ignore]
async fn test_routes_accept_missing_trailing_slash() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let with_slash = get_json(&client, &token, "/equipamentos/").await;
    let without_slash = get_json(&client, &token, "/equipamentos").await;
    assert!(with_slash.is_array());
    assert!(without_slash.is_array());
}
