use async_trait::async_trait;
use sysaidmin_core::{Decision, Interrupt, Operator};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

const BADGE_WIDTH: usize = 6;
const BADGE_STYLE: &str = "\x1b[37;48;2;0;113;102m";
const PROMPT_STYLE: &str = "\x1b[92m";
const RESET: &str = "\x1b[0m";

/// Terminal-backed operator: sectioned colored output, line-oriented input,
/// and the confirmation gate racing the session's interrupt signal.
pub struct TerminalOperator {
    interrupt: Interrupt,
    // One reader for the whole session, so type-ahead past the first line
    // stays buffered for the next prompt.
    stdin: Mutex<BufReader<Stdin>>,
}

impl TerminalOperator {
    pub fn new(interrupt: Interrupt) -> Self {
        Self {
            interrupt,
            stdin: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    async fn write(&self, text: &str) {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(text.as_bytes()).await;
        let _ = stdout.flush().await;
    }

    async fn show_section(&self, section: &str, message: &str) {
        self.write(&render_section(section, message)).await;
    }

    async fn read_line(&self) -> Option<String> {
        let mut reader = self.stdin.lock().await;
        let mut line = String::new();

        match reader.read_line(&mut line).await {
            Ok(0) => None, // EOF
            Ok(_) => Some(strip_newline(line)),
            Err(_) => None,
        }
    }
}

#[async_trait]
impl Operator for TerminalOperator {
    async fn show_assistant(&self, text: &str) {
        self.show_section("AI", text).await;
    }

    async fn show_output(&self, text: &str) {
        self.show_section("OUT", text).await;
    }

    async fn show_notice(&self, text: &str) {
        self.show_section("SYSAI", text).await;
    }

    async fn confirm_command(&self, command: &str) -> Decision {
        self.show_section("AI", &format!("Want to run: {}", command))
            .await;
        self.write("Press Enter to run it, Ctrl-C to abort...\n").await;

        tokio::select! {
            line = self.read_line() => {
                match line {
                    // Any acknowledgement input proceeds, including an empty line.
                    Some(_) => Decision::Proceed,
                    None => {
                        tracing::info!("Input stream closed at confirmation gate");
                        Decision::Abort
                    }
                }
            }
            _ = self.interrupt.triggered() => {
                self.write("\n").await;
                Decision::Abort
            }
        }
    }

    async fn prompt_reply(&self) -> Option<String> {
        self.write(&format!("\n{}Your response: {}", PROMPT_STYLE, RESET))
            .await;
        let reply = self.read_line().await?;
        self.write("\n").await;
        self.show_section("USER", &reply).await;
        Some(reply)
    }
}

/// Render a message with a right-aligned colored section badge on each line.
fn render_section(section: &str, message: &str) -> String {
    let pad = " ".repeat(BADGE_WIDTH.saturating_sub(section.len()));
    let mut rendered = String::new();

    for line in message.trim_matches('\n').lines() {
        rendered.push_str(&format!(
            "{}{} {} {}    {}\n",
            pad, BADGE_STYLE, section, RESET, line
        ));
    }

    rendered.push('\n');
    rendered
}

/// Strip exactly one trailing newline (and a preceding carriage return).
fn strip_newline(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
