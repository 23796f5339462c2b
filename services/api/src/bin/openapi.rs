//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the grocery account API.
//!
//! Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    let api_doc = ApiDoc::openapi();
    let path_count = api_doc.paths.paths.len();
    std::fs::write(&output, api_doc.to_pretty_json()?)?;

    println!("Wrote {} paths to {}", path_count, output);
    Ok(())
}
