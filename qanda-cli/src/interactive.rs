//! Interactive question loop

use std::io::{BufRead, Write};
use std::sync::OnceLock;

use qanda_core::{log_operation_error, performance, GenerationClient, QandaResult};
use regex::Regex;

pub const PROMPT: &str = "Ask a question (or type 'quit' to exit): ";

/// Inputs that end the session, compared case-insensitively
pub const EXIT_WORDS: [&str; 3] = ["quit", "exit", "bye"];

static PUNCTUATION: OnceLock<Regex> = OnceLock::new();

/// Lowercase, strip punctuation and collapse whitespace.
///
/// Only shown to the user; the question is sent as typed.
pub fn normalize(text: &str) -> String {
    let punctuation = PUNCTUATION.get_or_init(|| Regex::new(r"[^\w\s]").unwrap());
    let lowered = text.to_lowercase();
    punctuation
        .replace_all(&lowered, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_exit_word(input: &str) -> bool {
    EXIT_WORDS
        .iter()
        .any(|word| input.eq_ignore_ascii_case(word))
}

/// Read questions from `input` until an exit word or end of input, answering
/// each with `client`. Generation errors are printed and the loop continues.
pub async fn run_loop<R, W>(
    client: &dyn GenerationClient,
    mut input: R,
    mut output: W,
) -> QandaResult<()>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "\n{}", PROMPT)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        let question = line.trim();
        if is_exit_word(question) {
            break;
        }
        if question.is_empty() {
            writeln!(output, "Please type something!")?;
            continue;
        }

        writeln!(output, "Processed: {}", normalize(question))?;

        match performance::measure_async("generate", client.generate(question)).await {
            Ok(answer) => {
                writeln!(output, "\nAnswer:")?;
                writeln!(output, "{}", answer)?;
            }
            Err(e) => {
                log_operation_error!("generate", e, model = %client.model_name());
                writeln!(output, "Error: {}", e.cause())?;
            }
        }
    }

    tracing::info!("Interactive session ended");
    Ok(())
}
