//! Output for the inspection commands.
//!
//! Shared by one-shot subcommands and the interactive shell; everything
//! writes to an `AsyncWrite` so both stdout and test buffers work.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use mcafs_kernel::{AssetFs, FileSystem, NodeId, ReadOptions, Session, Stat, VirtualTree};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Print the loaded indexes and any manifests that failed.
pub async fn indexes<W>(fs: &AssetFs, json: bool, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if json {
        let mut text = serde_json::to_string_pretty(fs.indexes())?;
        text.push('\n');
        out.write_all(text.as_bytes()).await?;
        return Ok(());
    }

    let mut text = format!(
        "{:<24} {:>8} {:>8} {:>8}  {}\n",
        "INDEX", "FILES", "SKIPPED", "REPLACED", "MOUNT"
    );
    for info in fs.indexes() {
        let _ = writeln!(
            text,
            "{:<24} {:>8} {:>8} {:>8}  {}",
            info.name, info.files, info.skipped, info.overwritten, info.mount
        );
    }
    for failure in fs.failures() {
        let _ = writeln!(text, "{:<24} failed: {}", failure.name, failure.error);
    }
    out.write_all(text.as_bytes()).await?;
    Ok(())
}

/// One `ls` line: kind, declared size, mtime in epoch seconds, name.
///
/// Files whose object is missing from the store are marked `?`.
pub fn format_entry(stat: &Stat) -> String {
    let (kind, suffix) = if stat.is_dir() {
        ('d', "/")
    } else if stat.present {
        ('-', "")
    } else {
        ('?', "")
    };
    format!(
        "{kind} {:>10} {:>12} {}{suffix}",
        stat.size,
        epoch_secs(stat.mtime),
        stat.name
    )
}

fn epoch_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub async fn ls<W>(session: &Session, path: &str, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut text = String::new();
    for stat in session.list(path).await? {
        text.push_str(&format_entry(&stat));
        text.push('\n');
    }
    out.write_all(text.as_bytes()).await?;
    Ok(())
}

pub async fn stat<W>(session: &Session, path: &str, json: bool, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let stat = session.get(path).await?;
    let text = if json {
        serde_json::to_string_pretty(&stat)?
    } else {
        format!(
            "path:    {}\nkind:    {:?}\nsize:    {}\nmtime:   {}\npresent: {}",
            session.resolve_path(path)?,
            stat.kind,
            stat.size,
            epoch_secs(stat.mtime),
            stat.present
        )
    };
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    Ok(())
}

/// Stream a file's bytes starting at `offset`.
pub async fn cat<W>(session: &Session, path: &str, offset: u64, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut stream = session.read(path, ReadOptions::from_offset(offset)).await?;
    let copied = tokio::io::copy(&mut stream, out).await?;
    tracing::debug!(path, offset, copied, "streamed object");
    Ok(())
}

/// Draw the directory tree below `path`, at most `depth` levels deep.
pub async fn tree<W>(session: &Session, path: &str, depth: Option<usize>, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let absolute = session.resolve_path(path)?;
    let vtree = session.assets().tree();
    let dir = vtree.resolve_dir(NodeId::ROOT, &absolute)?;

    let mut text = format!("{absolute}\n");
    render(vtree, dir, "", 0, depth, &mut text);
    out.write_all(text.as_bytes()).await?;
    Ok(())
}

fn render(
    tree: &VirtualTree,
    dir: NodeId,
    prefix: &str,
    level: usize,
    depth: Option<usize>,
    text: &mut String,
) {
    if depth.is_some_and(|max| level >= max) {
        return;
    }
    let children = tree.children_of(dir);
    let last = children.len().saturating_sub(1);
    for (i, &child) in children.iter().enumerate() {
        let node = tree.node(child);
        let (branch, indent) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let suffix = if node.is_dir() { "/" } else { "" };
        let _ = writeln!(text, "{prefix}{branch}{}{suffix}", node.name());
        if node.is_dir() {
            render(tree, child, &format!("{prefix}{indent}"), level + 1, depth, text);
        }
    }
}
