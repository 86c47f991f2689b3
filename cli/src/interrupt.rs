use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use janitor_orchestrator::InterruptGuard;

/// Ctrl+C only raises a flag; the orchestrator asks at its next page boundary
/// and the operator confirms on stdin.
pub struct PromptingInterrupt {
    requested: Arc<AtomicBool>,
}

impl PromptingInterrupt {
    pub fn install() -> Result<Self> {
        let requested = Arc::new(AtomicBool::new(false));
        let requested_clone = requested.clone();
        ctrlc::set_handler(move || {
            requested_clone.store(true, Ordering::SeqCst);
        })?;
        Ok(Self { requested })
    }
}

impl InterruptGuard for PromptingInterrupt {
    fn abort_requested(&self) -> bool {
        let stdin = io::stdin();
        self.ask(&mut stdin.lock(), &mut io::stdout())
    }
}

impl PromptingInterrupt {
    /// Clears a pending Ctrl+C and asks the operator. The read blocks, so it
    /// runs via `block_in_place`, which needs the multi-threaded runtime.
    fn ask(&self, input: &mut impl BufRead, output: &mut impl Write) -> bool {
        if !self.requested.swap(false, Ordering::SeqCst) {
            return false;
        }
        // Unreadable stdin counts as a yes
        tokio::task::block_in_place(|| confirm_quit(input, output).unwrap_or(true))
    }
}

/// Ask until the answer is `y` or `n`. End of input confirms.
fn confirm_quit(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<bool> {
    loop {
        write!(output, "Really quit? (y/n)> ")?;
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            return Ok(true);
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => continue,
        }
    }
}
