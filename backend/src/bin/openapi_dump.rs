//! Print the OpenAPI document as JSON.

use color_eyre::eyre::{Context, Result};
use podium::doc::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    color_eyre::install()?;
    let document = ApiDoc::openapi()
        .to_pretty_json()
        .wrap_err("failed to serialise the OpenAPI document")?;
    println!("{document}");
    Ok(())
}
