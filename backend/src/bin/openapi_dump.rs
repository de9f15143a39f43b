//! Print the OpenAPI document as JSON.

use std::io::{self, Write};

use color_eyre::eyre::Result;
use routeshare::doc::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    color_eyre::install()?;
    let json = ApiDoc::openapi().to_pretty_json()?;
    writeln!(io::stdout().lock(), "{json}")?;
    Ok(())
}
