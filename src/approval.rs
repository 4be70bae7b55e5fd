//! Interactive confirmation before raw `defaults` commands run.

use std::io::{Read, Write};

use crate::Result;
use crate::defaults::StoreOp;
use crate::sys::{self, Deadline};

const RULE_WIDTH: usize = 51;

/// List `operations` on `output` and ask for confirmation on `input`.
///
/// Only `y` or `yes` (any case) approve. End of input declines. Cancelling
/// `deadline` (Ctrl-C) abandons the wait with [`crate::Error::Cancelled`];
/// its time limit is not applied while waiting for the answer.
pub fn confirm<R, W>(
    operations: &[StoreOp],
    input: R,
    output: &mut W,
    deadline: &Deadline,
) -> Result<bool>
where
    R: Read + Send + 'static,
    W: Write,
{
    writeln!(output, "The following raw defaults commands will be executed:")?;
    writeln!(output, "{}", "=".repeat(RULE_WIDTH))?;
    for (index, operation) in operations.iter().enumerate() {
        writeln!(output, "{:>3}. {}", index + 1, operation)?;
    }
    writeln!(output)?;
    write!(output, "Do you want to proceed? [y/N]: ")?;
    output.flush()?;

    let answer = sys::read_line_cancellable(input, deadline).inspect_err(|_| {
        let _ = writeln!(output);
    })?;
    let Some(answer) = answer else {
        writeln!(output)?;
        return Ok(false);
    };
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::defaults::ValueKind;
    use std::io::Cursor;

    fn ops() -> Vec<StoreOp> {
        vec![
            StoreOp::Write {
                domain: "com.apple.dock".to_string(),
                key: "autohide".to_string(),
                kind: ValueKind::Bool,
                value: "true".to_string(),
            },
            StoreOp::Delete {
                domain: "com.apple.dock".to_string(),
                key: "tilesize".to_string(),
            },
        ]
    }

    fn ask(answer: &str) -> (bool, String) {
        let input = Cursor::new(answer.as_bytes().to_vec());
        let mut output = Vec::new();
        let approved = confirm(&ops(), input, &mut output, &Deadline::none()).unwrap();
        (approved, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_prompt_lists_operations() {
        let (_, output) = ask("n\n");
        assert!(output.starts_with("The following raw defaults commands will be executed:\n"));
        assert!(output.contains(&"=".repeat(51)));
        assert!(output.contains("  1. defaults write com.apple.dock autohide -bool true"));
        assert!(output.contains("  2. defaults delete com.apple.dock tilesize"));
        assert!(output.contains("Do you want to proceed? [y/N]: "));
    }

    #[test]
    fn test_yes_answers_approve() {
        for answer in ["y\n", "Y\n", "yes\n", " YES \n"] {
            assert!(ask(answer).0, "{:?}", answer);
        }
    }

    #[test]
    fn test_other_answers_decline() {
        for answer in ["\n", "n\n", "no\n", "sure\n", "yy\n"] {
            assert!(!ask(answer).0, "{:?}", answer);
        }
    }

    #[test]
    fn test_end_of_input_declines() {
        assert!(!ask("").0);
    }

    #[test]
    fn test_cancelled_prompt_is_an_error() {
        let deadline = Deadline::none();
        deadline.cancel();
        let mut output = Vec::new();
        let result = confirm(&ops(), Cursor::new(b"y\n".to_vec()), &mut output, &deadline);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
