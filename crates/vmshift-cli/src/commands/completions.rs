use super::EXIT_SUCCESS;
use clap::CommandFactory;
use clap_complete::Shell;
use std::io::Write;

pub fn run<C: CommandFactory>(shell: Shell) -> Result<u8, String> {
    let mut out = std::io::stdout().lock();
    render::<C>(shell, &mut out);
    out.flush()
        .map_err(|e| format!("failed to write {shell} completions: {e}"))?;
    Ok(EXIT_SUCCESS)
}

/// Completion script for `C`, named after the command itself.
fn render<C: CommandFactory>(shell: Shell, out: &mut dyn Write) {
    let mut cmd = C::command();
    let bin = cmd.get_name().to_owned();
    clap_complete::generate(shell, &mut cmd, bin, out);
}
