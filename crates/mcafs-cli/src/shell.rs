//! Interactive browsing over one session.
//!
//! Reads one command per line. Errors are printed and the loop goes on;
//! write commands reach the session and report why they can't succeed.

use anyhow::{Context, Result, bail};
use mcafs_kernel::{FileSystem, Session, WriteOptions};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::commands;

const HELP: &str = "\
commands:
  pwd                   print the current directory
  cd [path]             change directory (default /)
  ls [path]             list a directory
  stat <path>           show one entry
  cat <path> [offset]   print a file, optionally from a byte offset
  tree [path] [depth]   draw the tree below a directory
  put mkdir rm mv chmod rejected, the filesystem is read-only
  help                  this text
  exit, quit            leave the shell
";

enum Flow {
    Continue,
    Exit,
}

/// Run the shell until `exit` or end of input.
pub async fn run<R, W>(mut session: Session, input: R, out: &mut W, prompt: bool) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tracing::info!(session = session.id(), "shell started");
    let mut lines = input.lines();
    loop {
        if prompt {
            let cwd = session.current_directory();
            out.write_all(format!("mcafs:{cwd}> ").as_bytes()).await?;
            out.flush().await?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };

        match execute(&mut session, command, args, out).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(error) => {
                tracing::debug!(session = session.id(), command, %error, "command failed");
                out.write_all(format!("{command}: {error:#}\n").as_bytes())
                    .await?;
            }
        }
        out.flush().await?;
    }
    tracing::info!(session = session.id(), "shell finished");
    Ok(())
}

async fn execute<W>(session: &mut Session, command: &str, args: &[&str], out: &mut W) -> Result<Flow>
where
    W: AsyncWrite + Unpin,
{
    match command {
        "pwd" => {
            let cwd = session.current_directory();
            out.write_all(format!("{cwd}\n").as_bytes()).await?;
        }
        "cd" => {
            session.chdir(args.first().copied().unwrap_or("/")).await?;
        }
        "ls" => commands::ls(session, args.first().copied().unwrap_or("."), out).await?,
        "stat" => commands::stat(session, required(args, 0, "path")?, false, out).await?,
        "cat" => {
            let offset = match args.get(1) {
                Some(raw) => raw.parse::<u64>().with_context(|| format!("bad offset {raw:?}"))?,
                None => 0,
            };
            commands::cat(session, required(args, 0, "path")?, offset, out).await?;
            out.write_all(b"\n").await?;
        }
        "tree" => {
            let depth = match args.get(1) {
                Some(raw) => Some(raw.parse::<usize>().with_context(|| format!("bad depth {raw:?}"))?),
                None => None,
            };
            commands::tree(session, args.first().copied().unwrap_or("."), depth, out).await?;
        }
        "put" => {
            session
                .write(required(args, 0, "path")?, WriteOptions::default())
                .await?;
        }
        "mkdir" => {
            session.mkdir(required(args, 0, "path")?).await?;
        }
        "rm" => session.delete(required(args, 0, "path")?).await?,
        "mv" => {
            session
                .rename(required(args, 0, "source")?, required(args, 1, "target")?)
                .await?
        }
        "chmod" => {
            let raw = required(args, 0, "mode")?;
            let mode = u32::from_str_radix(raw, 8).with_context(|| format!("bad mode {raw:?}"))?;
            session.chmod(required(args, 1, "path")?, mode).await?;
        }
        "help" => out.write_all(HELP.as_bytes()).await?,
        "exit" | "quit" => return Ok(Flow::Exit),
        _ => bail!("unknown command, try `help`"),
    }
    Ok(Flow::Continue)
}

fn required<'a>(args: &[&'a str], index: usize, what: &str) -> Result<&'a str> {
    match args.get(index) {
        Some(arg) => Ok(*arg),
        None => bail!("missing {what}"),
    }
}
