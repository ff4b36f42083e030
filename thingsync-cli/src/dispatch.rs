use anyhow::{Context, Result, bail};
use tracing::info;

fn opener() -> &'static str {
    if cfg!(target_os = "macos") { "open" } else { "xdg-open" }
}

/// Hand `url` to the OS URL handler, or print it when `dry_run` is set.
pub fn open_url(url: &str, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("{url}");
        return Ok(());
    }

    let name = opener();
    let bin = which::which(name).with_context(|| format!("{name} not found on PATH"))?;

    let output = std::process::Command::new(bin)
        .arg(url)
        .output()
        .with_context(|| format!("running {name}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{name} failed: {stderr}");
    }

    info!(scheme = url.split(':').next().unwrap_or(""), "dispatched request");
    Ok(())
}
