//! `apo config` command - interactive connection setup

use std::io::{self, BufRead, Write};

use apo_core::config::Config;
use apo_core::source::DataSource;

use crate::client::AzureClient;

const ORG_LABEL: &str = "Organization";
const PAT_LABEL: &str = "Personal Access Token (PAT)";

/// Ask for one value, keeping `current` when the answer is blank.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    current: &mut String,
    show_current: bool,
) -> io::Result<()> {
    if show_current {
        write!(output, "{} [{}]: ", label, current)?;
    } else {
        write!(output, "{}: ", label)?;
    }
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    if !answer.is_empty() {
        *current = answer.to_string();
    }
    Ok(())
}

/// Walk through organization, project and PAT. The token is never echoed back.
pub fn prompt_config<R: BufRead, W: Write>(
    config: &mut Config,
    input: &mut R,
    output: &mut W,
) -> io::Result<()> {
    writeln!(output)?;
    writeln!(output, "🔧 Azure DevOps Configuration")?;
    writeln!(output, "{}", "─".repeat(40))?;

    prompt(input, output, ORG_LABEL, &mut config.organization, true)?;
    prompt(input, output, "Project", &mut config.project, true)?;
    prompt(input, output, PAT_LABEL, &mut config.pat, false)?;
    Ok(())
}

/// Run the config command
pub async fn run_config() -> anyhow::Result<()> {
    // A broken file should not block reconfiguring.
    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config");
        Config::default()
    });

    {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        prompt_config(&mut config, &mut input, &mut output)?;
    }

    let path = config.save()?;
    println!("\n✅ Configuration saved to {}", path.display());
    tracing::info!(path = %path.display(), "config saved");

    print!("\nTesting connection... ");
    io::stdout().flush()?;

    let projects = match AzureClient::new(&config) {
        Ok(client) => client.list_projects().await,
        Err(e) => Err(e),
    };
    match projects {
        Ok(projects) => {
            println!("✅ Connected! Found {} project(s).", projects.len());
            println!("\nRun 'apo' to launch the TUI!");
        }
        Err(e) => {
            println!("❌\n   {}", e);
            tracing::warn!(error = %e, "connection test failed");
        }
    }

    Ok(())
}
