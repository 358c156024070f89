use std::path::Path;
use std::process::Command;

use strim_worker::TrimConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_file = std::env::args_os().nth(1);
    let config = TrimConfig::load(config_file.as_deref().map(Path::new))?;

    println!(
        "strim-selfcheck: root_folder={} workers={}",
        config.root_folder.display(),
        config.worker_count
    );
    if let Some(destination) = config.output_root() {
        ensure_destination(destination).await?;
    }
    ensure_tool("ffmpeg")?;
    ensure_tool("ffprobe")?;

    println!("strim-selfcheck: ok");
    Ok(())
}

async fn ensure_destination<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {}", path.display(), e))?;
    Ok(())
}

fn ensure_tool(name: &str) -> anyhow::Result<()> {
    let output = Command::new(name)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", name, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} -version failed: {:?}",
            name,
            output.status
        ));
    }
    Ok(())
}
