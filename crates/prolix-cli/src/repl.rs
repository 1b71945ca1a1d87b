//! Interactive lookup loop.
//!
//! Each input line is a word to look up. `?prefix` lists completions, `#N`
//! follows the N-th cross-reference of the last definition shown, and `:q`
//! or end of input leaves.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::render;
use prolix_core::{Error, Result};
use prolix_resolve::Resolver;

const PROMPT: &str = "> ";

const HELP: &str = "\
Type a word and press enter to look it up.
  ?prefix   list words starting with prefix
  #N        follow the N-th \"See also\" reference
  :help     show this help
  :q        quit";

/// Read commands from `input` until `:q` or end of input.
///
/// Invalid queries are reported and the loop carries on; storage failures
/// end the session.
pub fn run<R: BufRead, W: Write>(
    resolver: &Resolver,
    suggest_limit: usize,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    let mut refs: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(out)?;
            break;
        }
        let line = match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) => line,
            Err(_) => {
                let e = Error::InvalidQuery("query is not valid UTF-8".into());
                writeln!(out, "{}", e)?;
                continue;
            }
        };
        let line = line.trim();

        match line {
            "" => continue,
            ":q" | ":quit" | ":exit" => break,
            ":help" | ":h" => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            _ => {}
        }

        let outcome = if let Some(prefix) = line.strip_prefix('?') {
            match resolver.suggest(prefix, suggest_limit) {
                Ok(items) => render::suggestions(out, prefix.trim(), &items).map_err(Error::Io),
                Err(e) => Err(e),
            }
        } else if let Some(n) = line.strip_prefix('#') {
            match n.trim().parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
                Some(i) if i < refs.len() => {
                    let target = refs[i].clone();
                    debug!("following reference #{} -> {}", i + 1, target);
                    show(resolver, &target, out, &mut refs)
                }
                _ => {
                    writeln!(out, "No reference {} (there are {}).", line, refs.len())?;
                    Ok(())
                }
            }
        } else {
            show(resolver, line, out, &mut refs)
        };

        match outcome {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => writeln!(out, "{}", e)?,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn show<W: Write>(
    resolver: &Resolver,
    word: &str,
    out: &mut W,
    refs: &mut Vec<String>,
) -> Result<()> {
    let senses = resolver.lookup(word)?;
    let found = render::definitions(out, word.trim(), &senses).map_err(Error::Io)?;
    // A miss keeps the previous references usable.
    if !senses.is_empty() {
        *refs = found;
    }
    Ok(())
}
