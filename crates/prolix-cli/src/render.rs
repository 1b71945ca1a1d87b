//! Plain-text rendering of lookup results and reports.

use std::io::{self, Write};

use prolix_resolve::{cross_references, Resolution, Suggestion};
use prolix_store::{StoreStats, ValidationReport};

/// Print the senses for `query`, or an explanatory line when there are none.
///
/// Returns the cross-references found across the printed definitions,
/// numbered from 1 in the output.
pub fn definitions<W: Write>(
    out: &mut W,
    query: &str,
    senses: &[Resolution],
) -> io::Result<Vec<String>> {
    if senses.is_empty() {
        writeln!(out, "No definition found for '{}'.", query)?;
        return Ok(Vec::new());
    }

    let noun = if senses.len() == 1 { "definition" } else { "definitions" };
    writeln!(out, "{} ({} {})", query, senses.len(), noun)?;

    let mut refs: Vec<String> = Vec::new();
    for (i, sense) in senses.iter().enumerate() {
        writeln!(out)?;
        if sense.headword != sense.matched_word {
            writeln!(out, "{:>2}. [{} → {}]", i + 1, sense.matched_word, sense.headword)?;
        } else {
            writeln!(out, "{:>2}. [{}]", i + 1, sense.matched_word)?;
        }
        for line in sense.text.lines() {
            writeln!(out, "    {}", line)?;
        }
        for r in cross_references(&sense.text) {
            if !refs.contains(&r) {
                refs.push(r);
            }
        }
    }

    if !refs.is_empty() {
        writeln!(out)?;
        let listed: Vec<String> = refs
            .iter()
            .enumerate()
            .map(|(i, r)| format!("#{} {}", i + 1, r))
            .collect();
        writeln!(out, "See also: {}", listed.join("  "))?;
    }
    Ok(refs)
}

pub fn suggestions<W: Write>(out: &mut W, prefix: &str, items: &[Suggestion]) -> io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "No words start with '{}'.", prefix);
    }
    for s in items {
        writeln!(out, "  {:<24} {:>6}  {:.3}", s.word, s.frequency, s.score)?;
    }
    Ok(())
}

pub fn stats<W: Write>(out: &mut W, stats: &StoreStats) -> io::Result<()> {
    writeln!(out, "=== Prolix Dictionary ===")?;
    writeln!(out)?;
    writeln!(out, "Title:          {}", stats.title.as_deref().unwrap_or("(untitled)"))?;
    writeln!(out, "Path:           {}", stats.db_path.as_deref().unwrap_or(":memory:"))?;
    writeln!(out, "Size:           {:.1} MB", stats.db_size_mb)?;
    writeln!(out, "Definitions:    {}", stats.definitions)?;
    writeln!(out, "Index entries:  {}", stats.index_entries)?;
    writeln!(out, "Distinct words: {}", stats.distinct_words)?;
    writeln!(out, "Loaded at:      {}", stats.loaded_at.as_deref().unwrap_or("unknown"))?;
    Ok(())
}

pub fn validation_report<W: Write>(out: &mut W, report: &ValidationReport) -> io::Result<()> {
    writeln!(out, "=== Prolix Validation Report ===")?;
    writeln!(out)?;
    writeln!(out, "Data file valid:  {}", if report.db_valid { "YES" } else { "NO" })?;
    writeln!(out, "Definitions:      {}", report.definitions)?;
    writeln!(out, "Index entries:    {}", report.index_entries)?;
    writeln!(out, "Distinct words:   {}", report.distinct_words)?;

    if !report.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Warnings:")?;
        for w in &report.warnings {
            writeln!(out, "  - {}", w)?;
        }
    }

    if !report.errors.is_empty() {
        writeln!(out)?;
        writeln!(out, "Errors:")?;
        for e in &report.errors {
            writeln!(out, "  - {}", e)?;
        }
    }

    writeln!(out)?;
    if report.errors.is_empty() && report.db_valid {
        writeln!(out, "Status: READY FOR USE")
    } else {
        writeln!(out, "Status: NOT USABLE")
    }
}
