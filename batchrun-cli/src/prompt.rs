//! Interactive teardown confirmation

use async_trait::async_trait;
use batchrun_workflow::{TeardownConfirm, TeardownTarget};
use std::io::Write;
use tracing::warn;

/// Asks on the terminal before deleting a job or pool
///
/// The default answer is yes; only `n` or `no` keeps the resource.
pub struct StdinConfirm;

#[async_trait]
impl TeardownConfirm for StdinConfirm {
    async fn confirm(&self, target: &TeardownTarget) -> bool {
        let question = match target {
            TeardownTarget::Job(_) => "Delete job? [yes] no: ",
            TeardownTarget::Pool(_) => "Delete pool? [yes] no: ",
        };

        let answer = tokio::task::spawn_blocking(move || {
            print!("{}", question);
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            Ok::<_, std::io::Error>(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(e)) => {
                warn!("Could not read answer, keeping {}: {}", target, e);
                false
            }
            Err(e) => {
                warn!("Prompt task failed, keeping {}: {}", target, e);
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer != "n" && answer != "no"
}
