//! Model listing

use std::io::Write;

use qanda_core::{log_operation_start, log_operation_success, GenerationClient, QandaResult};

/// Print every model that can answer `generateContent` requests.
///
/// Returns how many were printed.
pub async fn print_generation_models<W: Write>(
    client: &dyn GenerationClient,
    mut output: W,
) -> QandaResult<usize> {
    log_operation_start!("list_models");

    let models = client.list_models().await?;
    let usable: Vec<_> = models
        .iter()
        .filter(|model| model.supports_generation())
        .collect();

    writeln!(output, "Available Gemini models you can use right now:\n")?;
    for model in &usable {
        match &model.display_name {
            Some(display_name) => writeln!(output, "  {}  ({})", model.name, display_name)?,
            None => writeln!(output, "  {}", model.name)?,
        }
    }
    writeln!(
        output,
        "\nSet llm.model (or QANDA_MODEL) to any of the names above."
    )?;

    log_operation_success!("list_models", total = models.len(), usable = usable.len());
    Ok(usable.len())
}
